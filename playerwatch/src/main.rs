use anyhow::Context as _;
use playerwatch::config::{Config, Policy};
use playerwatch::engine::{A2sSource, Engine, SnapshotSource};
use playerwatch::modes::{AllMode, ModeEvaluator, ThresholdMode};
use playerwatch::notify::DiscordNotifier;
use playerwatch_store::{FileCooldownStore, SqliteDedupStore};
use tokio::time::MissedTickBehavior;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for structured logging
    #[cfg(debug_assertions)]
    let log_level = tracing::Level::DEBUG;
    #[cfg(not(debug_assertions))]
    let log_level = tracing::Level::INFO;

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();
    tracing::info!("Starting playerwatch...");

    let once = std::env::args().any(|arg| arg == "--once");
    let config = Config::from_env().context("invalid configuration")?;
    tracing::info!(
        "Configuration: mode={}, server={}, poll={}s, query_timeout={}s",
        config.policy.name(),
        config.server_address,
        config.poll_interval.as_secs(),
        config.query_timeout.as_secs()
    );

    let source = A2sSource::new(config.server_address.clone(), config.query_timeout);
    let notifier = DiscordNotifier::new(config.webhook_url.clone());

    match config.policy.clone() {
        Policy::All { dedup_db_path } => {
            let dedup = SqliteDedupStore::open(&dedup_db_path)
                .await
                .context("failed to open dedup store")?;
            run(Engine::new(source, AllMode::new(dedup, notifier)), &config, once).await
        }
        Policy::Threshold {
            count,
            cooldown,
            cooldown_file,
        } => {
            let store = FileCooldownStore::new(cooldown_file);
            let evaluator = ThresholdMode::new(store, notifier, count, cooldown);
            run(Engine::new(source, evaluator), &config, once).await
        }
    }
}

/// The service loop. An external scheduler (cron, a systemd timer) can own
/// the timing instead by invoking the binary with `--once`.
async fn run<S, E>(engine: Engine<S, E>, config: &Config, once: bool) -> anyhow::Result<()>
where
    S: SnapshotSource,
    E: ModeEvaluator,
{
    if once {
        let outcome = engine.run_cycle().await?;
        tracing::info!(?outcome, "cycle finished");
        return Ok(());
    }

    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        match engine.run_cycle().await {
            Ok(outcome) => tracing::info!(?outcome, "cycle finished"),
            // Not fatal: stores were left so that the next cycle either
            // retries the missed notification or tolerates a duplicate.
            Err(e) => tracing::error!(error = %e, "cycle failed"),
        }
    }
}
