use serde::{Deserialize, Serialize};

/// `kind` tag on every emitted alert record.
pub const ALERT_KIND: &str = "dexscreener_meme_alpha";

/// One discovered token. Identity is (chain, address); lives for a single
/// run only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub chain_id: String,
    pub token_address: String,
}

impl Candidate {
    /// Dedup / boost-lookup key. Token addresses are not chain-unique.
    pub fn key(&self) -> String {
        format!("{}:{}", self.chain_id, self.token_address)
    }
}

/// Raw metrics a score was derived from. `fdv_l` is +inf when liquidity is
/// zero; serde_json renders non-finite floats as null, which downstream
/// JSON consumers expect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreMetrics {
    pub liq: f64,
    pub vol5: f64,
    pub vol1: f64,
    pub tx5: u64,
    pub fdv: f64,
    #[serde(rename = "fdvL")]
    pub fdv_l: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    pub pass: bool,
    pub score: u32,
    pub reasons: Vec<String>,
    pub metrics: ScoreMetrics,
}

/// Immutable output record for one pair that passed the gate outside its
/// cooldown window. Field names match the JSON-lines format the web
/// dashboard parses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub kind: String,
    pub when_ms: i64,
    pub chain_id: String,
    pub token_address: String,
    pub pair_address: String,
    pub url: Option<String>,
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub score: u32,
    pub reasons: Vec<String>,
    pub metrics: ScoreMetrics,
    pub text: String,
}
