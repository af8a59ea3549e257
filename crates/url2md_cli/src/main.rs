mod cli;
mod sources;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use engine_logging::{engine_error, engine_info, engine_warn};
use tokio_util::sync::CancellationToken;
use url2md_core::CrawlStats;
use url2md_engine::{
    delay_from_secs, ensure_output_dir, CrawlError, CrawlOptions,
    CrawlOrchestrator, EngineConfig, PageConverter, SitemapResolver,
};

use crate::cli::Cli;

const EXIT_FAILURE: u8 = 1;
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    engine_logging::initialize(cli.log_level(), cli.log_destination());

    match run(cli).await {
        Ok(outcome) => outcome.exit_code(),
        Err(err) => {
            engine_error!("{:#}", err);
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

enum Outcome {
    Completed,
    Aborted,
    Interrupted,
}

impl Outcome {
    fn exit_code(&self) -> ExitCode {
        match self {
            Outcome::Completed => ExitCode::SUCCESS,
            Outcome::Aborted => ExitCode::from(EXIT_FAILURE),
            Outcome::Interrupted => ExitCode::from(EXIT_INTERRUPTED),
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<Outcome> {
    let delay = delay_from_secs(cli.delay)?;
    let mut config = EngineConfig::default_with_output(&cli.output_dir);
    config.filename_strategy = cli.filename.into();
    ensure_output_dir(&config.output_dir)
        .with_context(|| format!("cannot use output directory {}", cli.output_dir.display()))?;

    let converter = PageConverter::new(config);
    let sitemaps = SitemapResolver::new(converter.fetcher());
    let urls = sources::collect_urls(&cli, &sitemaps).await?;

    let options = CrawlOptions {
        max_depth: cli.max_depth,
        max_urls: cli.max_urls,
        delay,
        continue_on_error: !cli.stop_on_error,
    };
    let cancel = CancellationToken::new();
    watch_for_interrupt(cancel.clone());
    let orchestrator = CrawlOrchestrator::new(converter, options).with_cancellation(cancel);

    engine_info!("Output directory: {}", cli.output_dir.display());
    let result = if cli.crawl {
        if urls.len() > 1 {
            engine_warn!("Crawl mode starts from {} only", urls[0]);
        }
        orchestrator.crawl_by_path(&urls[0]).await
    } else {
        orchestrator.process_batch(&urls).await
    };

    let (stats, aborted) = match result {
        Ok(stats) => (stats, false),
        Err(err) => {
            engine_error!("{}", err);
            let CrawlError::Aborted { stats, .. } = err;
            (*stats, true)
        }
    };
    report(&stats);

    Ok(if stats.interrupted {
        Outcome::Interrupted
    } else if aborted {
        Outcome::Aborted
    } else {
        Outcome::Completed
    })
}

/// Cancels `cancel` on Ctrl-C; the in-flight request still completes.
fn watch_for_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            engine_warn!("Interrupted, stopping after the current request");
            cancel.cancel();
        }
    });
}

fn report(stats: &CrawlStats) {
    for line in stats.report().lines() {
        engine_info!("{}", line);
    }
}
