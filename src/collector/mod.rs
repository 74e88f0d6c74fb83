//! Background comment collection against a [`CommentSource`].
//!
//! Live collection polls on its own thread while segments download; the
//! caller stops and joins it once the broadcast finishes. Replay comments
//! are paged synchronously.

mod filter;
mod source;

pub use filter::CommentFilter;
pub use source::{CommentSource, CommentsPage, SourceError};

use crate::captions::{Comment, CommentsFile};
use livestream_common::BroadcastMeta;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("comment source failed: {0}")]
    Source(#[from] SourceError),

    #[error("failed to save comments to {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: livestream_common::Error,
    },

    #[error("comment collector thread panicked")]
    Panicked,
}

/// Handle to a running live collector.
pub struct CommentCollector {
    stop_signal: Arc<AtomicBool>,
    handle: JoinHandle<Result<Vec<Comment>, CollectorError>>,
}

impl CommentCollector {
    /// Start polling `source` for `broadcast` every `interval`.
    ///
    /// Matching comments are written to `dest` whenever the collection grows.
    pub fn spawn<S>(
        source: S,
        broadcast: BroadcastMeta,
        filter: CommentFilter,
        interval: Duration,
        dest: PathBuf,
    ) -> Self
    where
        S: CommentSource + 'static,
    {
        let stop_signal = Arc::new(AtomicBool::new(false));
        let worker = LiveWorker {
            source,
            broadcast,
            filter,
            interval,
            dest,
            stop_signal: Arc::clone(&stop_signal),
            comments: Vec::new(),
        };
        let handle = thread::spawn(move || worker.run());
        Self {
            stop_signal,
            handle,
        }
    }

    /// Ask the collector to stop after its current request.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::Relaxed);
        self.handle.thread().unpark();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the collector and return everything it kept.
    pub fn join(self) -> Result<Vec<Comment>, CollectorError> {
        self.handle.join().map_err(|_| CollectorError::Panicked)?
    }
}

struct LiveWorker<S> {
    source: S,
    broadcast: BroadcastMeta,
    filter: CommentFilter,
    interval: Duration,
    dest: PathBuf,
    stop_signal: Arc<AtomicBool>,
    comments: Vec<Comment>,
}

impl<S: CommentSource> LiveWorker<S> {
    fn run(mut self) -> Result<Vec<Comment>, CollectorError> {
        tracing::info!("Collecting comments for broadcast {}", self.broadcast.id);

        let result = self.poll_until_done();
        // Keep what was collected even if the source failed.
        let saved = save(&self.broadcast, &self.comments, &self.dest);
        result?;
        saved?;

        tracing::info!("{} comments collected", self.comments.len());
        Ok(self.comments)
    }

    fn poll_until_done(&mut self) -> Result<(), CollectorError> {
        let id = self.broadcast.id.clone();
        let mut since_ts = 0;

        while !self.stopped() {
            match self.source.heartbeat(&id) {
                Ok(status) if !status.is_ongoing() => {
                    tracing::info!("Broadcast {} is now '{}'", id, status);
                    break;
                }
                Ok(_) => {}
                Err(SourceError::Transient(e)) => {
                    tracing::warn!("Heartbeat error: {}", e);
                }
                Err(SourceError::Ended) => break,
                Err(e) => return Err(e.into()),
            }

            match self.source.fetch_comments_page(&id, since_ts) {
                Ok(page) => {
                    since_ts = page.next_ts.unwrap_or(since_ts);
                    let before = self.comments.len();
                    self.comments
                        .extend(page.comments.into_iter().filter(|c| self.filter.matches(c)));
                    if self.comments.len() > before {
                        if let Err(e) = save(&self.broadcast, &self.comments, &self.dest) {
                            tracing::warn!("{}", e);
                        }
                    }
                }
                Err(SourceError::Transient(e)) => {
                    tracing::warn!("Comment collection error: {}", e);
                }
                Err(SourceError::Ended) => break,
                Err(e) => return Err(e.into()),
            }

            self.wait();
        }

        Ok(())
    }

    fn stopped(&self) -> bool {
        self.stop_signal.load(Ordering::Relaxed)
    }

    fn wait(&self) {
        let deadline = Instant::now() + self.interval;
        while !self.stopped() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
    }
}

fn save(broadcast: &BroadcastMeta, comments: &[Comment], dest: &Path) -> Result<(), CollectorError> {
    CommentsFile::for_broadcast(broadcast, comments.to_vec())
        .save(dest)
        .map_err(|source| CollectorError::Save {
            path: dest.to_path_buf(),
            source,
        })
}

/// Page through the comments of a finished broadcast.
///
/// Stops on an empty page, a missing or zero next offset, or an offset past
/// the broadcast's duration. When anything was kept and `dest` is given, it
/// is written there with a zero buffered duration.
pub fn collect_replay<S: CommentSource>(
    source: &mut S,
    broadcast: &BroadcastMeta,
    filter: &CommentFilter,
    interval: Duration,
    dest: Option<&Path>,
) -> Result<Vec<Comment>, CollectorError> {
    let mut collected = Vec::new();
    let mut offset = 0;

    loop {
        let page = source.fetch_replay_page(&broadcast.id, offset)?;
        let empty = page.comments.is_empty();
        collected.extend(page.comments.into_iter().filter(|c| filter.matches(c)));

        let next = page.next_ts.unwrap_or(0);
        let past_end = broadcast
            .duration
            .is_some_and(|duration| next > 0 && duration < next as f64);
        if empty || next == 0 || past_end {
            break;
        }
        offset = next;
        thread::sleep(interval);
    }

    tracing::info!("{} comments collected", collected.len());

    if let Some(dest) = dest {
        if !collected.is_empty() {
            let mut file = CommentsFile::for_broadcast(broadcast, collected.clone());
            file.initial_buffered_duration = Some(0.0);
            file.save(dest).map_err(|source| CollectorError::Save {
                path: dest.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(collected)
}
