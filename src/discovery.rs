use std::collections::HashSet;

use anyhow::{Context, Result};

use crate::dexscreener::{DexClient, TokenRecord};
use crate::domain::Candidate;

/// The three upstream listing feeds, in priority order: organic profiles
/// first, then paid boosts.
pub struct DiscoveryFeeds {
    pub latest_profiles: Vec<TokenRecord>,
    pub boosts_top: Vec<TokenRecord>,
    pub boosts_latest: Vec<TokenRecord>,
}

impl DiscoveryFeeds {
    pub fn in_priority_order(&self) -> [&[TokenRecord]; 3] {
        [&self.latest_profiles, &self.boosts_top, &self.boosts_latest]
    }

    pub fn boost_feeds(&self) -> [&[TokenRecord]; 2] {
        [&self.boosts_top, &self.boosts_latest]
    }
}

/// Fetch all discovery feeds up front, concurrently. Any single feed
/// failing fails the whole run; per-candidate tolerance only starts later,
/// at enrichment.
pub async fn fetch_feeds(client: &DexClient) -> Result<DiscoveryFeeds> {
    let (latest_profiles, boosts_top, boosts_latest) = tokio::try_join!(
        client.latest_token_profiles(),
        client.top_boosts(),
        client.latest_boosts(),
    )
    .context("fetching discovery feeds")?;

    Ok(DiscoveryFeeds { latest_profiles, boosts_top, boosts_latest })
}

/// Ordered dedup on (chain, token). First occurrence wins, so feed order is
/// implicit source priority; truncated at `limit` across feed boundaries.
pub fn aggregate_candidates(
    sources: &[&[TokenRecord]],
    chains: &[String],
    limit: usize,
) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    'feeds: for src in sources {
        for row in *src {
            let Some((chain, token)) = record_identity(row, chains) else { continue };
            if !seen.insert(format!("{chain}:{token}")) {
                continue;
            }
            out.push(Candidate {
                chain_id: chain.to_string(),
                token_address: token.to_string(),
            });
            if out.len() >= limit {
                break 'feeds;
            }
        }
    }
    out
}

/// `chain:token` keys present in the paid-boost feeds. Consulted only for
/// score penalization, never for admission.
pub fn boosted_set(sources: &[&[TokenRecord]], chains: &[String]) -> HashSet<String> {
    let mut set = HashSet::new();
    for src in sources {
        for row in *src {
            if let Some((chain, token)) = record_identity(row, chains) {
                set.insert(format!("{chain}:{token}"));
            }
        }
    }
    set
}

fn record_identity<'a>(row: &'a TokenRecord, chains: &[String]) -> Option<(&'a str, &'a str)> {
    let chain = row.chain_id.as_deref()?;
    let token = row.token_address.as_deref()?;
    if token.is_empty() || !chains.iter().any(|c| c == chain) {
        return None;
    }
    Some((chain, token))
}
