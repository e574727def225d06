use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Round-robin selector over configured API base urls.
///
/// An explicit object handed to the client, not module-global state, so
/// tests and callers can inject their own pool.
#[derive(Debug)]
pub struct EndpointPool {
    urls: Vec<String>,
    next: AtomicUsize,
}

impl EndpointPool {
    pub fn new(urls: Vec<String>) -> Result<Self> {
        let urls: Vec<String> = urls
            .into_iter()
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .collect();
        if urls.is_empty() {
            bail!("endpoint pool needs at least one base url");
        }
        Ok(Self { urls, next: AtomicUsize::new(0) })
    }

    pub fn pick(&self) -> &str {
        let i = self.next.fetch_add(1, Ordering::Relaxed);
        &self.urls[i % self.urls.len()]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseToken {
    pub address: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Liquidity {
    pub usd: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Volume {
    pub m5: Option<f64>,
    pub h1: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TxnWindow {
    pub buys: Option<u64>,
    pub sells: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Txns {
    pub m5: TxnWindow,
}

/// One live trading pair as returned by `/latest/dex/tokens/{address}`.
/// Everything optional: Dexscreener omits fields freely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Pair {
    pub chain_id: String,
    pub pair_address: String,
    pub base_token: BaseToken,
    pub liquidity: Liquidity,
    pub volume: Volume,
    pub txns: Txns,
    pub fdv: Option<f64>,
    pub url: Option<String>,
}

impl Pair {
    pub fn liquidity_usd(&self) -> f64 {
        self.liquidity.usd.unwrap_or(0.0)
    }

    pub fn volume_m5(&self) -> f64 {
        self.volume.m5.unwrap_or(0.0)
    }

    pub fn volume_h1(&self) -> f64 {
        self.volume.h1.unwrap_or(0.0)
    }

    /// Buys + sells over the last 5 minutes.
    pub fn txns_m5(&self) -> u64 {
        self.txns.m5.buys.unwrap_or(0) + self.txns.m5.sells.unwrap_or(0)
    }

    pub fn fdv_usd(&self) -> f64 {
        self.fdv.unwrap_or(0.0)
    }
}

/// One row of a discovery feed (token profiles or boosts). Feeds carry more
/// fields; only chain + token identity matter here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenRecord {
    pub chain_id: Option<String>,
    pub token_address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct TokenPairsResponse {
    pairs: Option<Vec<Pair>>,
}

/// Seam between the scheduler and the network, so the worker pool can be
/// driven by a stub in tests.
#[async_trait]
pub trait PairSource: Send + Sync {
    /// All known pairs for a token, across chains.
    async fn token_pairs(&self, token_address: &str) -> Result<Vec<Pair>>;
}

pub struct DexClient {
    pool: EndpointPool,
    http: Client,
}

impl DexClient {
    pub fn new(pool: EndpointPool, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent("meme-alpha-scanner/0.1")
            .build()?;
        Ok(Self { pool, http })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.pool.pick(), path);
        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    pub async fn latest_token_profiles(&self) -> Result<Vec<TokenRecord>> {
        self.get_json("/token-profiles/latest/v1").await
    }

    pub async fn top_boosts(&self) -> Result<Vec<TokenRecord>> {
        self.get_json("/token-boosts/top/v1").await
    }

    pub async fn latest_boosts(&self) -> Result<Vec<TokenRecord>> {
        self.get_json("/token-boosts/latest/v1").await
    }
}

#[async_trait]
impl PairSource for DexClient {
    async fn token_pairs(&self, token_address: &str) -> Result<Vec<Pair>> {
        let resp: TokenPairsResponse =
            self.get_json(&format!("/latest/dex/tokens/{token_address}")).await?;
        Ok(resp.pairs.unwrap_or_default())
    }
}

/// Best tradable pair for a candidate: restrict to its chain, take highest
/// liquidity, break ties on 1h volume. None when the token has no pair on
/// that chain.
pub fn best_pair(pairs: &[Pair], chain_id: &str) -> Option<Pair> {
    pairs
        .iter()
        .filter(|p| p.chain_id == chain_id)
        .max_by(|a, b| {
            a.liquidity_usd()
                .total_cmp(&b.liquidity_usd())
                .then(a.volume_h1().total_cmp(&b.volume_h1()))
        })
        .cloned()
}
