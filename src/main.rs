// src/main.rs
use catalog_scraper::{
    clear_all_data, AppError, Command, CommandLineInput, CrawlConfig, CrawlReport, Crawler,
};
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

/// Exit status of a crawl stopped by SIGINT/SIGTERM.
const EXIT_INTERRUPTED: u8 = 130;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let log_file_path = std::env::temp_dir().join("catalog_scraper.log");
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] {T} - {m}{n}"
    } else {
        "{d(%Y-%m-%d %H:%M:%S)} {m}{n}"
    };

    let stdout_appender = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}",
        )))
        .build(&log_file_path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stdout")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::debug!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// How a command ended, when it did not fail.
enum Outcome {
    Completed(CrawlReport),
    Interrupted(CrawlReport),
    Cleaned(PathBuf),
}

impl Outcome {
    fn exit_code(&self) -> ExitCode {
        match self {
            Outcome::Completed(_) | Outcome::Cleaned(_) => ExitCode::SUCCESS,
            Outcome::Interrupted(_) => ExitCode::from(EXIT_INTERRUPTED),
        }
    }

    fn report(&self) {
        match self {
            Outcome::Completed(report) => {
                println!("✓ Crawl finished: {}", summarize(report));
            }
            Outcome::Interrupted(report) => {
                println!("⚠️  Crawl interrupted: {}", summarize(report));
            }
            Outcome::Cleaned(root) => {
                println!("✓ Data folder {} is empty", root.display());
            }
        }
    }
}

fn summarize(report: &CrawlReport) -> String {
    format!(
        "{} of {} pages fetched ({} failed, {} skipped), {} rows written to {}",
        report.pages_fetched,
        report.page_count,
        report.pages_failed,
        report.pages_skipped,
        report.rows_written,
        report.session_dir.display()
    )
}

/// Resolves when the process is asked to stop; returns the signal name.
async fn shutdown_signal() -> &'static str {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Can't listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                log::warn!("Can't listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}

/// Runs one crawl session, racing it against the shutdown signals.
///
/// A signal cancels the crawl; the session still performs its final flush
/// before this returns.
async fn run_start(config: CrawlConfig) -> Result<Outcome, AppError> {
    let crawler = Crawler::connect(config).await?;
    let cancel = CancellationToken::new();

    let mut crawl = tokio::spawn({
        let cancel = cancel.clone();
        async move { crawler.start(cancel).await }
    });

    tokio::select! {
        result = &mut crawl => {
            let report = result??;
            cancel.cancel();
            return Ok(Outcome::Completed(report));
        }
        signal = shutdown_signal() => {
            log::info!("Signal '{}' was caught. Exiting", signal);
            cancel.cancel();
        }
    }

    let report = crawl.await??;
    Ok(Outcome::Interrupted(report))
}

fn run_clean(config: &CrawlConfig) -> Result<Outcome, AppError> {
    clear_all_data(&config.data_root)?;
    Ok(Outcome::Cleaned(config.data_root.clone()))
}

async fn run(cli: &CommandLineInput) -> Result<Outcome, AppError> {
    let config = CrawlConfig::resolve(cli)?;
    match cli.command {
        Command::Start { .. } => run_start(config).await,
        Command::Clean => run_clean(&config),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CommandLineInput::parse();

    if let Err(e) = setup_logging(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&cli).await {
        Ok(outcome) => {
            outcome.report();
            outcome.exit_code()
        }
        Err(e) => {
            log::error!("{}", e);
            if let (Command::Start { .. }, AppError::DataRootUnavailable { path, .. }) =
                (&cli.command, &e)
            {
                eprintln!(
                    "❌ Data folder {} is missing. Run `catalog-scraper clean` to create it.",
                    path.display()
                );
            }
            ExitCode::FAILURE
        }
    }
}
