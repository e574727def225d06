use std::collections::HashMap;

use crate::domain::Alert;

/// Collapse duplicate pair identities (higher score wins, first arrival on
/// ties), then impose a total order so output is identical regardless of
/// worker scheduling: score desc, then 1h volume, liquidity, 5m tx count,
/// with the pair key as a final deterministic tie-break.
pub fn dedup_and_rank(alerts: Vec<Alert>) -> Vec<Alert> {
    let mut uniq: HashMap<String, Alert> = HashMap::new();
    for alert in alerts {
        let Some(key) = alert_key(&alert) else { continue };
        match uniq.get(&key) {
            Some(prev) if prev.score >= alert.score => {}
            _ => {
                uniq.insert(key, alert);
            }
        }
    }

    let mut out: Vec<Alert> = uniq.into_values().collect();
    out.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| b.metrics.vol1.total_cmp(&a.metrics.vol1))
            .then_with(|| b.metrics.liq.total_cmp(&a.metrics.liq))
            .then_with(|| b.metrics.tx5.cmp(&a.metrics.tx5))
            .then_with(|| a.pair_address.cmp(&b.pair_address))
    });
    out
}

fn alert_key(alert: &Alert) -> Option<String> {
    if !alert.pair_address.is_empty() {
        Some(alert.pair_address.clone())
    } else if !alert.token_address.is_empty() {
        Some(alert.token_address.clone())
    } else {
        None
    }
}
