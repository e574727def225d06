use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use meme_alpha_scanner::config::Config;
use meme_alpha_scanner::cooldown::StateStore;
use meme_alpha_scanner::dexscreener::{DexClient, EndpointPool};
use meme_alpha_scanner::discovery;
use meme_alpha_scanner::domain::Alert;
use meme_alpha_scanner::error::ScanError;
use meme_alpha_scanner::monitoring;
use meme_alpha_scanner::render::gmgn_url;
use meme_alpha_scanner::scanner;

#[tokio::main]
async fn main() -> Result<()> {
    // Load local .env if present (no-op in prod/cron envs)
    let _ = dotenvy::dotenv();

    monitoring::init_tracing();

    // Fails fast before any network access.
    let cfg = Config::load()?;
    info!(?cfg, "boot");

    let store = StateStore::new(&cfg.state_path);
    let state = store.load();
    let now_ms = Utc::now().timestamp_millis();

    let pool = EndpointPool::new(cfg.api_urls.clone())?;
    let client = Arc::new(DexClient::new(pool, Duration::from_secs(cfg.http_timeout_secs))?);

    let feeds = discovery::fetch_feeds(&client)
        .await
        .map_err(ScanError::Discovery)?;
    let candidates =
        discovery::aggregate_candidates(&feeds.in_priority_order(), &cfg.chains, cfg.limit_tokens);
    let boosted = discovery::boosted_set(&feeds.boost_feeds(), &cfg.chains);
    info!(candidates = candidates.len(), boosted = boosted.len(), "discovery.done");

    let outcome = scanner::run_scan(&cfg, client, candidates, boosted, state, now_ms).await;

    // Alerts go out before the state write, so a persist failure can never
    // discard computed output.
    let emitted = emit(&cfg, &outcome.alerts);

    if cfg.dry_run {
        info!("dry run: cooldown state left untouched");
    } else {
        store.save(&outcome.state).map_err(ScanError::Persist)?;
    }

    match emitted {
        // Happens when piping into `head` etc.; not a scan failure.
        Err(e) if is_broken_pipe(&e) => Ok(()),
        other => other,
    }
}

fn is_broken_pipe(e: &anyhow::Error) -> bool {
    e.downcast_ref::<std::io::Error>()
        .is_some_and(|io| io.kind() == std::io::ErrorKind::BrokenPipe)
}

fn emit(cfg: &Config, alerts: &[Alert]) -> Result<()> {
    let mut out = std::io::stdout().lock();
    for alert in alerts {
        if cfg.emit_json {
            writeln!(out, "{}", serde_json::to_string(alert)?)?;
        } else if cfg.only_gmgn {
            if let Some(link) = gmgn_url(&cfg.gmgn_track, &alert.chain_id, &alert.token_address) {
                writeln!(out, "{link}")?;
            }
        } else {
            writeln!(out, "{}\n", alert.text)?;
        }
    }
    Ok(())
}
