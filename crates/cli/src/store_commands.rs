use std::time::Duration;

use {anyhow::Result, tracing::warn};

use {
    herald_channels::IdentityResolver,
    herald_config::HeraldConfig,
    herald_store::{Backlog, ItemStore, SqliteItemStore},
    herald_telegram::BotIdentityResolver,
};

use crate::{config_commands::ensure_valid, relay_commands::open_store};

/// Print undelivered links per channel.
pub async fn backlog(config: &HeraldConfig) -> Result<()> {
    let store = open_store(config).await?;
    let result = store.list_undelivered().await;
    store.close().await;

    print!("{}", render_backlog(&result?));
    Ok(())
}

/// Print store totals and the newest recorded post of each configured channel.
pub async fn status(config: &HeraldConfig) -> Result<()> {
    ensure_valid(config)?;

    let store = open_store(config).await?;
    let result = print_status(config, &store).await;
    store.close().await;
    result
}

async fn print_status(config: &HeraldConfig, store: &SqliteItemStore) -> Result<()> {
    let stats = store.stats().await?;
    println!(
        "{} item(s) recorded, {} undelivered.",
        stats.total, stats.undelivered
    );

    let timeout = Duration::from_secs(config.check.request_timeout_secs);
    let resolver = BotIdentityResolver::new(herald_telegram::build_bot(&config.bot.token, timeout)?);

    for target in config.channel_targets() {
        let identity = match resolver.resolve(&target.handle).await {
            Ok(identity) => identity,
            Err(e) => {
                warn!(handle = %target.handle, error = %e, "could not resolve channel");
                println!("  @{} -> thread {}: unresolved", target.handle, target.thread_id);
                continue;
            },
        };
        let latest = store
            .latest_item_id(identity)
            .await?
            .map_or_else(|| "nothing recorded".to_string(), |id| format!("latest post {id}"));
        println!(
            "  @{} -> thread {}: {latest}",
            target.handle, target.thread_id
        );
    }
    Ok(())
}

fn render_backlog(backlog: &Backlog) -> String {
    if backlog.is_empty() {
        return "Backlog is empty.\n".to_string();
    }

    let mut out = String::new();
    for (handle, links) in backlog.iter() {
        out.push_str(&format!("@{handle} ({})\n", links.len()));
        for link in links {
            out.push_str(&format!("  {link}\n"));
        }
    }
    out
}
