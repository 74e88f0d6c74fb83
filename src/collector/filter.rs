use crate::captions::Comment;
use crate::config::CommentsConfig;
use std::collections::HashSet;

/// Which commenters are worth keeping.
#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    /// User ids or usernames.
    pub commenters: HashSet<String>,
    pub collect_verified: bool,
}

impl CommentFilter {
    pub fn new<I, S>(commenters: I, collect_verified: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commenters: commenters.into_iter().map(Into::into).collect(),
            collect_verified,
        }
    }

    pub fn from_config(config: &CommentsConfig) -> Self {
        Self::new(config.commenters.iter().cloned(), config.collect_verified)
    }

    pub fn matches(&self, comment: &Comment) -> bool {
        let body = comment.body();
        if self.collect_verified && body.user.is_verified {
            return true;
        }
        if self.commenters.contains(&body.user.username) {
            return true;
        }
        body.user_id()
            .is_some_and(|id| self.commenters.contains(&id))
    }
}
