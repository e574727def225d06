use crate::dexscreener::Pair;
use crate::domain::{ScoreMetrics, ScoreResult};

/// Flat score deduction when FDV/liquidity exceeds the configured ratio.
pub const FDV_RATIO_PENALTY: f64 = 15.0;

/// Flat score deduction for paid-boosted tokens. Marketing != validation.
pub const BOOST_PENALTY: f64 = 5.0;

/// Gate thresholds. Defaults mirror the CLI defaults.
#[derive(Debug, Clone)]
pub struct Thresholds {
    pub min_liq_usd: f64,
    pub min_vol_m5: f64,
    pub min_vol_h1: f64,
    pub min_txns_m5: u64,
    pub max_fdv_liq: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_liq_usd: 30_000.0,
            min_vol_m5: 5_000.0,
            min_vol_h1: 30_000.0,
            min_txns_m5: 30,
            max_fdv_liq: 200.0,
        }
    }
}

/// Pure gate + 0..=100 score for one pair.
///
/// Hard floors (liquidity, both volumes, tx count) each flip `pass` and
/// record a reason; all violations are recorded, not just the first. The
/// FDV/liquidity ratio and the boosted flag never veto, they only cost
/// score. Sub-scores cap at 40 (liquidity), 35 (volume), 20 (activity) so
/// the total reads as a percentage of the heuristic maximum.
pub fn score_pair(pair: &Pair, boosted: bool, t: &Thresholds) -> ScoreResult {
    let liq = pair.liquidity_usd();
    let vol5 = pair.volume_m5();
    let vol1 = pair.volume_h1();
    let tx5 = pair.txns_m5();
    let fdv = pair.fdv_usd();
    let fdv_l = if liq > 0.0 { fdv / liq } else { f64::INFINITY };

    let mut reasons = Vec::new();
    let mut pass = true;

    if liq < t.min_liq_usd {
        pass = false;
        reasons.push(format!("liq<${:.0}", t.min_liq_usd));
    }
    if vol5 < t.min_vol_m5 {
        pass = false;
        reasons.push(format!("vol5<${:.0}", t.min_vol_m5));
    }
    if vol1 < t.min_vol_h1 {
        pass = false;
        reasons.push(format!("vol1<${:.0}", t.min_vol_h1));
    }
    if tx5 < t.min_txns_m5 {
        pass = false;
        reasons.push(format!("tx5<{}", t.min_txns_m5));
    }

    // Zero liquidity makes the ratio unbounded: still flagged, but the flat
    // penalty only applies to finite ratios.
    let fdv_over = fdv_l > t.max_fdv_liq;
    if fdv_over {
        reasons.push(format!("fdv/liq>{:.0}", t.max_fdv_liq));
    }
    if boosted {
        reasons.push("boosted".to_string());
    }

    let s_liq = (liq / t.min_liq_usd * 20.0).min(40.0);
    let s_vol = (vol1 / t.min_vol_h1 * 20.0 + vol5 / t.min_vol_m5 * 10.0).min(35.0);
    let s_tx = (tx5 as f64 / t.min_txns_m5 as f64 * 10.0).min(20.0);
    let mut score = s_liq + s_vol + s_tx;

    if fdv_over && fdv_l.is_finite() {
        score -= FDV_RATIO_PENALTY;
    }
    if boosted {
        score -= BOOST_PENALTY;
    }
    let score = score.clamp(0.0, 100.0).round() as u32;

    ScoreResult {
        pass,
        score,
        reasons,
        metrics: ScoreMetrics { liq, vol5, vol1, tx5, fdv, fdv_l },
    }
}
