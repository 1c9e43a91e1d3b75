use book_monitor::catalog::OpenLibraryClient;
use book_monitor::channels::{EmailConfig, SmtpNotifier};
use book_monitor::config::MonitorConfig;
use book_monitor::error::{Error, Result};
use book_monitor::pipeline::{KeywordDecision, Monitor, MonitorDeps, RunSummary};
use book_monitor::store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Install rustls crypto provider before any TLS usage
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    match run_once().await {
        Ok(_) => Ok(()),
        Err(Error::Config(e)) => {
            eprintln!("Error: {e}");
            eprintln!("  export EMAIL_ADDRESS=... EMAIL_PASSWORD=... RECIPIENT_EMAIL=...");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

/// Load config and state, check every genre once, then save state.
async fn run_once() -> Result<RunSummary> {
    let config = MonitorConfig::from_env()?;
    let email_config = EmailConfig::from_env()?;

    tracing::info!("Running scheduled check...");
    tracing::info!(
        genres = %config.genres.join(","),
        data_file = %config.data_file.display(),
        "Book monitor v{}",
        env!("CARGO_PKG_VERSION")
    );

    let deps = MonitorDeps {
        catalog: Box::new(OpenLibraryClient::new(&config.catalog)?),
        decider: Box::new(KeywordDecision::new(config.reject_terms.iter().cloned())),
        notifier: Box::new(SmtpNotifier::new(email_config, config.catalog.base_url.clone())),
    };
    let monitor = Monitor::new(&config, deps)?;

    let mut memory = MemoryStore::load(&config.data_file).await;
    let summary = monitor.run(&mut memory).await?;
    memory.save().await?;

    tracing::info!(
        approved = summary.approved,
        remembered = memory.len(),
        "Check complete."
    );
    Ok(summary)
}
