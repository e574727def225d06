use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::cooldown::{pair_key, CooldownMap, CooldownState};
use crate::dexscreener::{best_pair, PairSource};
use crate::domain::{Alert, Candidate, ALERT_KIND};
use crate::ranking::dedup_and_rank;
use crate::render::{gmgn_url, render_alert};
use crate::scoring::{score_pair, Thresholds};

/// Result of one scan. The caller decides how to emit the alerts and
/// whether to persist the updated state.
pub struct ScanOutcome {
    pub alerts: Vec<Alert>,
    pub state: CooldownState,
}

#[derive(Clone)]
struct WorkerCtx {
    source: Arc<dyn PairSource>,
    cooldown: Arc<CooldownMap>,
    boosted: Arc<HashSet<String>>,
    thresholds: Thresholds,
    alert_score: u32,
    gmgn_track: String,
    now_ms: i64,
}

/// Drive enrichment + scoring over all candidates with a fixed worker
/// pool pulling from a shared queue. Every candidate is attempted exactly
/// once; individual failures are dropped without touching siblings.
pub async fn run_scan(
    cfg: &Config,
    source: Arc<dyn PairSource>,
    candidates: Vec<Candidate>,
    boosted: HashSet<String>,
    state: CooldownState,
    now_ms: i64,
) -> ScanOutcome {
    let cooldown = Arc::new(CooldownMap::new(&state, cfg.cooldown_ms()));
    let ctx = WorkerCtx {
        source,
        cooldown: Arc::clone(&cooldown),
        boosted: Arc::new(boosted),
        thresholds: cfg.thresholds(),
        alert_score: cfg.alert_score,
        gmgn_track: cfg.gmgn_track.clone(),
        now_ms,
    };

    let queue: Arc<[Candidate]> = candidates.into();
    let next = Arc::new(AtomicUsize::new(0));
    let collected: Arc<Mutex<Vec<Alert>>> = Arc::new(Mutex::new(Vec::new()));

    let workers = cfg.concurrency.min(queue.len()).max(1);
    info!(candidates = queue.len(), workers, "scan.start");

    let mut set = tokio::task::JoinSet::new();
    for _ in 0..workers {
        let ctx = ctx.clone();
        let queue = Arc::clone(&queue);
        let next = Arc::clone(&next);
        let collected = Arc::clone(&collected);
        set.spawn(async move {
            loop {
                let i = next.fetch_add(1, Ordering::Relaxed);
                let Some(cand) = queue.get(i) else { break };
                match process_candidate(&ctx, cand).await {
                    Ok(Some(alert)) => {
                        collected
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push(alert);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        debug!(
                            chain = %cand.chain_id,
                            token = %cand.token_address,
                            error = %e,
                            "candidate dropped"
                        );
                    }
                }
            }
        });
    }
    while let Some(joined) = set.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "scan worker aborted");
        }
    }

    let raw = std::mem::take(
        &mut *collected.lock().unwrap_or_else(PoisonError::into_inner),
    );
    let alerts = dedup_and_rank(raw);

    let mut state = state;
    state.sent_pairs = cooldown.snapshot();
    state.last_run_ms = now_ms;

    info!(alerts = alerts.len(), "scan.done");
    ScanOutcome { alerts, state }
}

/// One candidate end to end: enrich, cooldown check, score, gate, then an
/// atomic cooldown reservation before the alert is built.
async fn process_candidate(ctx: &WorkerCtx, cand: &Candidate) -> Result<Option<Alert>> {
    let pairs = ctx.source.token_pairs(&cand.token_address).await?;
    let Some(best) = best_pair(&pairs, &cand.chain_id) else {
        // No pair on this chain: not an error, just nothing tradable yet.
        return Ok(None);
    };

    let key = pair_key(&best.chain_id, &best.pair_address);
    if ctx.cooldown.is_cooling(&key, ctx.now_ms) {
        return Ok(None);
    }

    let scored = score_pair(&best, ctx.boosted.contains(&cand.key()), &ctx.thresholds);
    if !scored.pass || scored.score < ctx.alert_score {
        return Ok(None);
    }

    if !ctx.cooldown.try_reserve(&key, ctx.now_ms) {
        // A sibling worker claimed this pair first.
        return Ok(None);
    }

    let link = gmgn_url(&ctx.gmgn_track, &best.chain_id, &cand.token_address);
    let text = render_alert(&best, &scored, link.as_deref());
    Ok(Some(Alert {
        kind: ALERT_KIND.to_string(),
        when_ms: ctx.now_ms,
        chain_id: best.chain_id.clone(),
        token_address: cand.token_address.clone(),
        pair_address: best.pair_address.clone(),
        url: best.url.clone(),
        symbol: best.base_token.symbol.clone(),
        name: best.base_token.name.clone(),
        score: scored.score,
        reasons: scored.reasons,
        metrics: scored.metrics,
        text,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dexscreener::{BaseToken, Liquidity, Pair, Txns, TxnWindow, Volume};
    use anyhow::bail;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StubSource {
        pairs: HashMap<String, Vec<Pair>>,
        fail: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn new() -> Self {
            Self {
                pairs: HashMap::new(),
                fail: HashSet::new(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn with_pair(mut self, token: &str, pair: Pair) -> Self {
            self.pairs.entry(token.to_string()).or_default().push(pair);
            self
        }

        fn failing(mut self, token: &str) -> Self {
            self.fail.insert(token.to_string());
            self
        }
    }

    #[async_trait]
    impl PairSource for StubSource {
        async fn token_pairs(&self, token_address: &str) -> Result<Vec<Pair>> {
            self.calls.lock().unwrap().push(token_address.to_string());
            if self.fail.contains(token_address) {
                bail!("HTTP 502");
            }
            Ok(self.pairs.get(token_address).cloned().unwrap_or_default())
        }
    }

    fn good_pair(token: &str, pair_addr: &str, liq: f64) -> Pair {
        Pair {
            chain_id: "solana".into(),
            pair_address: pair_addr.into(),
            base_token: BaseToken {
                address: Some(token.into()),
                symbol: Some("MEME".into()),
                name: Some("Meme".into()),
            },
            liquidity: Liquidity { usd: Some(liq) },
            volume: Volume { m5: Some(8_000.0), h1: Some(40_000.0) },
            txns: Txns { m5: TxnWindow { buys: Some(30), sells: Some(20) } },
            fdv: Some(2_000_000.0),
            url: Some(format!("https://dexscreener.com/solana/{pair_addr}")),
        }
    }

    fn cand(token: &str) -> Candidate {
        Candidate { chain_id: "solana".into(), token_address: token.into() }
    }

    fn cfg() -> Config {
        use clap::Parser;
        Config::try_parse_from(["meme-alpha-scanner"]).unwrap()
    }

    const NOW: i64 = 10_000_000;

    #[tokio::test]
    async fn failures_and_no_pair_candidates_drop_without_aborting_the_run() {
        let source = StubSource::new()
            .with_pair("GOOD", good_pair("GOOD", "P1", 50_000.0))
            .failing("BROKEN");
        let source = Arc::new(source);

        let outcome = run_scan(
            &cfg(),
            Arc::clone(&source) as Arc<dyn PairSource>,
            vec![cand("BROKEN"), cand("EMPTY"), cand("GOOD")],
            HashSet::new(),
            CooldownState::default(),
            NOW,
        )
        .await;

        assert_eq!(outcome.alerts.len(), 1);
        assert_eq!(outcome.alerts[0].pair_address, "P1");
        assert_eq!(outcome.alerts[0].score, 85);
        assert!(outcome.alerts[0].text.contains("score 85/100"));

        // Every candidate attempted exactly once.
        let mut calls = source.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(calls, vec!["BROKEN", "EMPTY", "GOOD"]);
    }

    #[tokio::test]
    async fn two_candidates_resolving_to_one_pair_alert_once() {
        // Two discovery entries whose best pair is the same pool.
        let source = StubSource::new()
            .with_pair("T1", good_pair("T1", "SHARED", 50_000.0))
            .with_pair("T2", good_pair("T2", "SHARED", 50_000.0));

        let outcome = run_scan(
            &cfg(),
            Arc::new(source),
            vec![cand("T1"), cand("T2")],
            HashSet::new(),
            CooldownState::default(),
            NOW,
        )
        .await;

        assert_eq!(outcome.alerts.len(), 1);
        assert_eq!(outcome.state.sent_pairs.get("solana:SHARED"), Some(&NOW));
    }

    #[tokio::test]
    async fn cooled_down_pair_is_suppressed_until_window_opens() {
        let mut state = CooldownState::default();
        // Sent 10 minutes ago; window is 30.
        state.sent_pairs.insert("solana:P1".into(), NOW - 10 * 60_000);

        let source = Arc::new(StubSource::new().with_pair("GOOD", good_pair("GOOD", "P1", 50_000.0)));
        let outcome = run_scan(
            &cfg(),
            Arc::clone(&source) as Arc<dyn PairSource>,
            vec![cand("GOOD")],
            HashSet::new(),
            state.clone(),
            NOW,
        )
        .await;
        assert!(outcome.alerts.is_empty());
        // Suppressed entry keeps its original timestamp.
        assert_eq!(outcome.state.sent_pairs.get("solana:P1"), Some(&(NOW - 10 * 60_000)));

        // 30+ minutes later the same pair alerts again.
        let later = NOW + 25 * 60_000;
        let outcome = run_scan(
            &cfg(),
            source,
            vec![cand("GOOD")],
            HashSet::new(),
            state,
            later,
        )
        .await;
        assert_eq!(outcome.alerts.len(), 1);
        assert_eq!(outcome.state.sent_pairs.get("solana:P1"), Some(&later));
    }

    #[tokio::test]
    async fn failing_gate_or_score_emits_nothing_and_reserves_nothing() {
        // Liquidity below the floor: pass=false.
        let source = StubSource::new().with_pair("LOW", good_pair("LOW", "P1", 10_000.0));
        let outcome = run_scan(
            &cfg(),
            Arc::new(source),
            vec![cand("LOW")],
            HashSet::new(),
            CooldownState::default(),
            NOW,
        )
        .await;
        assert!(outcome.alerts.is_empty());
        assert!(outcome.state.sent_pairs.is_empty());
    }

    #[tokio::test]
    async fn boosted_candidates_are_flagged_and_penalized() {
        let source = StubSource::new().with_pair("B", good_pair("B", "P1", 50_000.0));
        let boosted: HashSet<String> = ["solana:B".to_string()].into_iter().collect();

        let outcome = run_scan(
            &cfg(),
            Arc::new(source),
            vec![cand("B")],
            boosted,
            CooldownState::default(),
            NOW,
        )
        .await;

        assert_eq!(outcome.alerts.len(), 1);
        let alert = &outcome.alerts[0];
        assert_eq!(alert.score, 80); // 85 - 5 boost penalty
        assert!(alert.reasons.iter().any(|r| r == "boosted"));
    }

    #[tokio::test]
    async fn alerts_come_out_in_deterministic_rank_order() {
        let source = StubSource::new()
            .with_pair("T1", good_pair("T1", "P1", 40_000.0))
            .with_pair("T2", good_pair("T2", "P2", 60_000.0))
            .with_pair("T3", good_pair("T3", "P3", 50_000.0));

        let outcome = run_scan(
            &cfg(),
            Arc::new(source),
            vec![cand("T1"), cand("T2"), cand("T3")],
            HashSet::new(),
            CooldownState::default(),
            NOW,
        )
        .await;

        let order: Vec<&str> = outcome.alerts.iter().map(|a| a.pair_address.as_str()).collect();
        // Higher liquidity scores higher with everything else equal.
        assert_eq!(order, vec!["P2", "P3", "P1"]);
        assert_eq!(outcome.state.last_run_ms, NOW);
    }
}
