mod cli;

use livestream_dl::{
    assemble::{check_status, AssembleError, AssembleOptions, Assembler, RepairPolicy},
    captions::{self, CommentsFile},
    config::{self, Config},
    naming::{self, NamingError},
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use livestream_av::{FfmpegMuxer, Muxer};
use livestream_common::BroadcastMeta;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            eprintln!("Error: {:?}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Exit code for the most specific known error in the chain.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<AssembleError>()
                .map(AssembleError::exit_code)
                .or_else(|| cause.downcast_ref::<NamingError>().map(NamingError::exit_code))
        })
        .unwrap_or(1)
}

fn run(cli: Cli) -> Result<()> {
    let config = if cli.ignore_config {
        Config::default()
    } else {
        config::load_config_or_default(cli.config.as_deref())?
    };

    let log_file = cli.log.clone().or_else(|| config.log_file.clone());
    init_logging(cli.verbose || config.verbose, log_file.as_deref())?;

    match cli.command {
        Commands::Assemble {
            broadcast_json,
            segments_dir,
            output,
            comments,
            cleanup,
            skip_mux,
            repair_init,
        } => {
            let meta = load_broadcast(&broadcast_json)?;

            let output = match output {
                Some(path) => path,
                None => generated_output(&meta, &config)?,
            };

            let mut options = AssembleOptions::new(segments_dir, output);
            options.comments = comments;
            options.cleanup = cleanup || config.output.cleanup;
            options.skip_mux = skip_mux || config.assemble.skip_mux;
            options.repair = repair_init
                .or_else(|| config.assemble.repair_init_segment.clone())
                .map(RepairPolicy::new);
            options.default_comments_delay = config.comments.default_delay_secs;

            assemble(&meta, options, &config)
        }
        Commands::Captions {
            broadcast_json,
            comments_json,
            output,
        } => write_captions(&broadcast_json, &comments_json, &output, &config),
        Commands::CheckTools => check_tools(&config),
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("livestream-dl {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if verbose {
            "livestream_dl=debug,livestream_av=debug,livestream_media=trace,livestream_common=debug"
                .to_string()
        } else {
            "livestream_dl=info,livestream_av=info,livestream_media=warn".to_string()
        }
    });

    let file_layer = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {:?}", path))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(env_filter))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

fn load_broadcast(path: &Path) -> Result<BroadcastMeta> {
    BroadcastMeta::load(path)
        .map_err(|e| AssembleError::invalid_input(e.to_string()))
        .with_context(|| format!("Failed to load broadcast json file: {:?}", path))
}

fn generated_output(meta: &BroadcastMeta, config: &Config) -> Result<PathBuf> {
    let prefix = naming::filename_prefix(meta, &config.output.filename_format, chrono::Utc::now())
        .context("Invalid output.filename_format")?;
    Ok(config.output.dir.join(format!("{}.mp4", prefix)))
}

fn assemble(meta: &BroadcastMeta, options: AssembleOptions, config: &Config) -> Result<()> {
    check_status(meta)?;

    let muxer = if options.skip_mux {
        None
    } else {
        Some(
            FfmpegMuxer::discover(config.tools.ffmpeg_path.as_deref())
                .context("ffmpeg is required to assemble video")?,
        )
    };

    tracing::info!("Assembling broadcast {} from {:?}", meta.id, options.segments_dir);
    let muxer = muxer.as_ref().map(|m| m as &dyn Muxer);
    let report = Assembler::new(options, muxer).run(meta)?;

    for generation in &report.generations {
        match generation.output {
            Some(ref output) => println!("Generated file: {}", output.display()),
            None => {
                println!("Audio stream: {}", generation.audio_path.display());
                println!("Video stream: {}", generation.video_path.display());
            }
        }
    }
    for srt in &report.captions {
        println!("Comments written to: {}", srt.display());
    }
    if report.removed_segments > 0 {
        println!("Removed {} segment files", report.removed_segments);
    }

    Ok(())
}

fn write_captions(
    broadcast_json: &Path,
    comments_json: &Path,
    output: &Path,
    config: &Config,
) -> Result<()> {
    let meta = load_broadcast(broadcast_json)?;
    let comments = CommentsFile::load(comments_json)
        .map_err(|e| AssembleError::invalid_input(e.to_string()))
        .with_context(|| format!("Cannot load comments json file: {:?}", comments_json))?;

    let blocks = captions::captions_for(&meta, &comments, config.comments.default_delay_secs);
    let written = captions::write_srt(output, &blocks)
        .with_context(|| format!("Failed to write {:?}", output))?;

    if written {
        println!("Comments written to: {}", output.display());
    } else {
        println!("No comments to write.");
    }
    Ok(())
}

fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let configured = config
        .tools
        .ffmpeg_path
        .clone()
        .or_else(|| std::env::var_os(livestream_av::FFMPEG_BINARY_ENV).map(PathBuf::from));
    let tools = livestream_av::check_tools(configured.as_deref());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install ffmpeg or set tools.ffmpeg_path.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    println!("  Output dir: {}", config.output.dir.display());
    println!("  Filename format: {}", config.output.filename_format);
    println!("  Cleanup: {}", config.output.cleanup);
    println!("  Skip mux: {}", config.assemble.skip_mux);
    println!(
        "  Repair init segment: {}",
        config
            .assemble
            .repair_init_segment
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "disabled".to_string())
    );
    println!("  Commenters: {}", config.comments.commenters.len());

    Ok(())
}
