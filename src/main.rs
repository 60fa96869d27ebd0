use anyhow::Context;
use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use queue_monitor::collector::{HttpCatalogSource, StatusCollector};
use queue_monitor::config::Config;
use queue_monitor::monitor::{DefaultQueueMonitor, QueueMonitor, SystemClock, WorkingHoursMonitor};
use queue_monitor::notify::{LogNotifier, Notifier, TelegramNotifier};
use queue_monitor::persistence::{FileStore, StateRepository};
use queue_monitor::runner::Runner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "queue_monitor=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    info!(
        url = %config.status_api_url,
        group = %config.collector.group,
        queue_id = %config.collector.queue_id,
        destination = %config.destination,
        "Loaded configuration"
    );

    let client = reqwest::Client::builder()
        .timeout(config.http_client_timeout)
        .build()
        .context("failed to build HTTP client")?;

    match config.telegram.clone() {
        Some(telegram) => {
            info!("Sending notifications to Telegram");
            run(config, client.clone(), TelegramNotifier::new(client, telegram)).await
        }
        None => {
            info!("No Telegram bot token configured, notifications will only be logged");
            run(config, client, LogNotifier).await
        }
    }
}

async fn run<N: Notifier + 'static>(
    config: Config,
    client: reqwest::Client,
    notifier: N,
) -> anyhow::Result<()> {
    let source = HttpCatalogSource::new(client, config.status_api_url.clone());
    let collector = StatusCollector::new(source, config.collector.clone());
    let monitor = DefaultQueueMonitor::new(collector, notifier, config.destination.clone())
        .with_policy(config.delivery_failure_policy);

    match config.working_hours {
        Some(hours) => {
            info!(
                start_hour = hours.start_hour,
                end_hour = hours.end_hour,
                "Checking only during working hours"
            );
            let monitor = WorkingHoursMonitor::new(monitor, SystemClock, hours);
            run_until_signal(&config, monitor).await
        }
        None => run_until_signal(&config, monitor).await,
    }
}

async fn run_until_signal<M: QueueMonitor + 'static>(
    config: &Config,
    monitor: M,
) -> anyhow::Result<()> {
    let store = FileStore::open(&config.state_dir).with_context(|| {
        format!("failed to open state directory {}", config.state_dir.display())
    })?;
    let repository = StateRepository::new(store, config.state_ttl);
    let runner = Runner::new(monitor, repository, config.poll.clone());

    let mut sigint = signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(runner.run(shutdown.clone()));

    tokio::select! {
        _ = sigint.recv() => (),
        _ = sigterm.recv() => (),
    }
    info!("Caught signal to exit");

    shutdown.cancel();
    let final_state = handle.await.context("queue monitor task failed")?;
    info!(
        state = final_state.state_name.as_deref().unwrap_or("unknown"),
        "Shutdown complete"
    );
    Ok(())
}
