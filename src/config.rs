use clap::Parser;

use crate::error::ScanError;
use crate::scoring::Thresholds;

/// Dexscreener meme-alpha scanner. One scan per invocation; alerts on
/// stdout, logs on stderr.
///
/// Every knob is a flag with an env-var fallback so cron wrappers can set
/// defaults in the environment and override per run.
#[derive(Debug, Clone, Parser)]
#[command(name = "meme-alpha-scanner", version)]
pub struct Config {
    /// Comma-separated chain ids to accept (e.g. solana,base).
    #[arg(long, env = "ALPHA_CHAINS", default_value = "solana", value_delimiter = ',')]
    pub chains: Vec<String>,

    /// Max candidates taken from the discovery feeds.
    #[arg(long = "limit", env = "ALPHA_LIMIT_TOKENS", default_value_t = 60)]
    pub limit_tokens: usize,

    /// Re-alert suppression window per pair, in minutes.
    #[arg(long = "cooldown-min", env = "ALPHA_COOLDOWN_MIN", default_value_t = 30)]
    pub cooldown_min: u64,

    // Thresholds (tuneable)
    #[arg(long = "min-liq", env = "ALPHA_MIN_LIQ_USD", default_value_t = 30_000.0)]
    pub min_liq_usd: f64,

    #[arg(long = "min-vol-m5", env = "ALPHA_MIN_VOL_M5", default_value_t = 5_000.0)]
    pub min_vol_m5: f64,

    #[arg(long = "min-vol-h1", env = "ALPHA_MIN_VOL_H1", default_value_t = 30_000.0)]
    pub min_vol_h1: f64,

    #[arg(long = "min-txns-m5", env = "ALPHA_MIN_TXNS_M5", default_value_t = 30)]
    pub min_txns_m5: u64,

    /// FDV/liquidity ratio above which score is penalized (never a veto).
    #[arg(long = "max-fdv-liq", env = "ALPHA_MAX_FDV_LIQ", default_value_t = 200.0)]
    pub max_fdv_liq: f64,

    /// Minimum score for a passing pair to actually alert.
    #[arg(long = "alert-score", env = "ALPHA_ALERT_SCORE", default_value_t = 60)]
    pub alert_score: u32,

    /// Worker pool size for pair enrichment.
    #[arg(long, env = "ALPHA_CONCURRENCY", default_value_t = 6)]
    pub concurrency: usize,

    /// Per-request HTTP timeout.
    #[arg(long = "timeout-secs", env = "ALPHA_HTTP_TIMEOUT_SECS", default_value_t = 15)]
    pub http_timeout_secs: u64,

    /// Cooldown state file.
    #[arg(
        long = "state-path",
        env = "ALPHA_STATE_PATH",
        default_value = "memory/dexscreener-alpha-state.json"
    )]
    pub state_path: String,

    /// Dexscreener API base url(s); multiple values rotate round-robin.
    #[arg(
        long = "api-url",
        env = "ALPHA_API_URLS",
        value_delimiter = ',',
        default_value = "https://api.dexscreener.com"
    )]
    pub api_urls: Vec<String>,

    /// GMGN referral/tracking code embedded in alert links.
    #[arg(long = "gmgn-track", env = "GMGN_TRACK", default_value = "KbZpyS5i")]
    pub gmgn_track: String,

    /// Evaluate without persisting cooldown updates.
    #[arg(long = "dry-run", env = "ALPHA_DRY_RUN")]
    pub dry_run: bool,

    /// Emit one JSON object per alert instead of text.
    #[arg(long = "emit-json")]
    pub emit_json: bool,

    /// Emit only the GMGN link per alert.
    #[arg(long = "only-gmgn", env = "ONLY_GMGN")]
    pub only_gmgn: bool,
}

impl Config {
    /// Parse argv + env, then validate. Must be called before any network
    /// access so configuration errors fail fast.
    pub fn load() -> Result<Self, ScanError> {
        let mut cfg = Self::parse();
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    fn normalize(&mut self) {
        trim_list(&mut self.chains);
        trim_list(&mut self.api_urls);
    }

    pub fn validate(&self) -> Result<(), ScanError> {
        if self.chains.is_empty() {
            return Err(ScanError::Config(
                "no chains configured; use --chains solana,base".into(),
            ));
        }
        if self.api_urls.is_empty() {
            return Err(ScanError::Config("no API base url configured".into()));
        }
        if self.concurrency == 0 {
            return Err(ScanError::Config("--concurrency must be at least 1".into()));
        }
        if self.limit_tokens == 0 {
            return Err(ScanError::Config("--limit must be at least 1".into()));
        }
        Ok(())
    }

    pub fn cooldown_ms(&self) -> i64 {
        self.cooldown_min as i64 * 60_000
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            min_liq_usd: self.min_liq_usd,
            min_vol_m5: self.min_vol_m5,
            min_vol_h1: self.min_vol_h1,
            min_txns_m5: self.min_txns_m5,
            max_fdv_liq: self.max_fdv_liq,
        }
    }
}

fn trim_list(items: &mut Vec<String>) {
    *items = items
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
}
