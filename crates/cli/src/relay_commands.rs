use std::{sync::Arc, time::Duration};

use {
    anyhow::{Context, Result},
    tracing::info,
};

use {
    herald_config::HeraldConfig,
    herald_relay::{CachedResolver, CheckReport, Checker, FlushReport, Forwarder, Relay},
    herald_store::{ItemStore, SqliteItemStore},
    herald_telegram::{BotIdentityResolver, PreviewFetcher, TelegramSink},
};

use crate::{Commands, config_commands::ensure_valid};

/// Open the item store at the configured path.
pub async fn open_store(config: &HeraldConfig) -> Result<Arc<SqliteItemStore>> {
    let path = herald_config::database_path(config);
    let store = SqliteItemStore::open(&path)
        .await
        .with_context(|| format!("failed to open item store at {}", path.display()))?;
    info!(path = %path.display(), "item store opened");
    Ok(Arc::new(store))
}

/// Run `run`, `check` or `flush`. The store is closed whatever the outcome.
pub async fn handle(command: Commands, config: &HeraldConfig) -> Result<()> {
    ensure_valid(config)?;

    let store = open_store(config).await?;
    let result = dispatch(command, config, store.clone()).await;
    store.close().await;
    result
}

async fn dispatch(
    command: Commands,
    config: &HeraldConfig,
    store: Arc<SqliteItemStore>,
) -> Result<()> {
    let relay = build_relay(config, store).await?;

    match command {
        Commands::Check => print_check(&relay.check().await?),
        Commands::Flush => print_flush(&relay.flush().await?),
        _ => {
            let report = relay.run().await?;
            print_check(&report.check);
            print_flush(&report.flush);
        },
    }
    Ok(())
}

async fn build_relay(config: &HeraldConfig, store: Arc<SqliteItemStore>) -> Result<Relay> {
    let timeout = Duration::from_secs(config.check.request_timeout_secs);

    let bot = herald_telegram::build_bot(&config.bot.token, timeout)?;
    herald_telegram::verify_bot(&bot).await?;

    let resolver = CachedResolver::new(Arc::new(BotIdentityResolver::new(bot.clone())));
    let fetcher = PreviewFetcher::new(timeout)?;
    let sink = TelegramSink::new(bot).with_max_retries(config.forward.retry_after_max_retries);

    let store: Arc<dyn ItemStore> = store;
    let checker = Checker::new(store.clone(), Arc::new(resolver), Arc::new(fetcher))
        .with_workers(config.check.workers)
        .with_request_timeout(timeout);
    let forwarder = Forwarder::new(store, Arc::new(sink))
        .with_send_delay(Duration::from_millis(config.forward.send_delay_ms));

    Ok(Relay::new(
        checker,
        forwarder,
        config.group_chat_id,
        config.thread_map(),
    ))
}

fn print_check(report: &CheckReport) {
    for (handle, channel) in &report.channels {
        println!("  @{handle}: {} new", channel.new_links.len());
    }
    for skipped in &report.skipped {
        println!("  @{}: skipped ({})", skipped.handle, skipped.reason);
    }
    println!(
        "Checked {} channel(s), {} new item(s), {} skipped.",
        report.channels.len(),
        report.new_items(),
        report.skipped.len()
    );
}

fn print_flush(report: &FlushReport) {
    for link in &report.failed {
        println!("  failed: {link}");
    }
    for handle in &report.unrouted {
        println!("  no thread mapped for @{handle}");
    }
    println!(
        "Forwarded {} link(s), {} failed, {} unrouted channel(s).",
        report.delivered.len(),
        report.failed.len(),
        report.unrouted.len()
    );
}
