// src/main.rs

use anyhow::Context;
use anytype_loader::{AnytypeLoader, CommandLineInput, FetchOutcome, LoaderConfig};
use clap::Parser;
use futures::StreamExt;
use log::LevelFilter;
use log4rs::{
    append::console::{ConsoleAppender, Target},
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;
use std::io::{self, BufWriter, Write};

type RecordSink = Box<dyn Write + Send>;

/// Sets up logging configuration.
///
/// Console output goes to stderr; stdout carries the records.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join("anytype_loader.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    let stderr_appender = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Tally of what a run produced.
#[derive(Debug, Default)]
struct RunSummary {
    emitted: usize,
    skipped: usize,
    failed: usize,
}

impl RunSummary {
    /// Writes emitted records as JSON lines and counts everything else.
    fn record(&mut self, outcome: FetchOutcome, out: &mut RecordSink) -> anyhow::Result<()> {
        match outcome {
            FetchOutcome::Emitted(record) => {
                serde_json::to_writer(&mut *out, &record)?;
                out.write_all(b"\n")?;
                self.emitted += 1;
            }
            FetchOutcome::Skipped { .. } => self.skipped += 1,
            FetchOutcome::Failed {
                space_id,
                object_id,
                error,
            } => {
                match object_id {
                    Some(object_id) => {
                        log::error!("Object {} in {}: {}", object_id, space_id, error)
                    }
                    None => log::error!("Listing space {}: {}", space_id, error),
                }
                self.failed += 1;
            }
        }
        Ok(())
    }
}

fn open_output(cli: &CommandLineInput) -> anyhow::Result<RecordSink> {
    Ok(match anytype_loader::output_path(cli) {
        Some(path) => {
            let file = fs::File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

/// Loads one object at a time on a blocking thread.
fn run_sequential(config: LoaderConfig, mut out: RecordSink) -> anyhow::Result<RunSummary> {
    let loader = AnytypeLoader::new(config)?;
    let mut summary = RunSummary::default();

    for outcome in loader.lazy_outcomes()? {
        summary.record(outcome, &mut out)?;
    }
    out.flush()?;

    Ok(summary)
}

/// Loads objects concurrently over the pooled client, releasing it afterwards.
async fn run_concurrent(config: LoaderConfig, mut out: RecordSink) -> anyhow::Result<RunSummary> {
    let loader = AnytypeLoader::builder(config).connect().await?;
    let mut summary = RunSummary::default();

    let drained = async {
        let mut outcomes = loader.alazy_outcomes().await?;
        while let Some(outcome) = outcomes.next().await {
            summary.record(outcome, &mut out)?;
        }
        out.flush()?;
        Ok::<_, anyhow::Error>(())
    }
    .await;

    loader.aclose().await;
    drained?;
    Ok(summary)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = LoaderConfig::resolve(&cli)?;
    let out = open_output(&cli)?;

    let summary = if cli.concurrent {
        run_concurrent(config, out).await?
    } else {
        tokio::task::spawn_blocking(move || run_sequential(config, out)).await??
    };

    eprintln!(
        "📄 Loaded {} record(s) ({} skipped, {} failed).",
        summary.emitted, summary.skipped, summary.failed
    );
    if let Some(path) = anytype_loader::output_path(&cli) {
        eprintln!("✓ Records saved to {}", path.display());
    }

    if summary.failed > 0 {
        anyhow::bail!("{} object(s) could not be loaded", summary.failed);
    }
    Ok(())
}
