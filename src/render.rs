use crate::dexscreener::Pair;
use crate::domain::ScoreResult;

/// Compact money formatting for alert text: $1.23K / $4.56M / $7.89B.
pub fn fmt_money(x: f64) -> String {
    if !x.is_finite() {
        return "-".to_string();
    }
    let abs = x.abs();
    if abs >= 1e9 {
        format!("${:.2}B", x / 1e9)
    } else if abs >= 1e6 {
        format!("${:.2}M", x / 1e6)
    } else if abs >= 1e3 {
        format!("${:.2}K", x / 1e3)
    } else {
        format!("${x:.0}")
    }
}

/// GMGN deep link carrying the tracking code. Only chains GMGN serves.
pub fn gmgn_url(track: &str, chain_id: &str, token_address: &str) -> Option<String> {
    if token_address.is_empty() {
        return None;
    }
    match chain_id {
        "solana" => Some(format!("https://gmgn.ai/sol/token/{track}_{token_address}")),
        "base" => Some(format!("https://gmgn.ai/base/token/{track}_{token_address}")),
        _ => None,
    }
}

/// Human-readable multi-line rendering of one alert.
pub fn render_alert(pair: &Pair, scored: &ScoreResult, link: Option<&str>) -> String {
    let base = &pair.base_token;
    let sym = base.symbol.as_deref().unwrap_or("???");
    let m = &scored.metrics;

    let mut lines = Vec::new();
    lines.push(format!("Meme alpha (Dexscreener) score {}/100", scored.score));
    match base.name.as_deref().filter(|n| !n.is_empty()) {
        Some(name) => lines.push(format!("{sym} ({name})")),
        None => lines.push(sym.to_string()),
    }
    if let Some(link) = link {
        lines.push(link.to_string());
    }
    lines.push(format!(
        "liq {} | vol5 {} | vol1 {} | tx5 {}",
        fmt_money(m.liq),
        fmt_money(m.vol5),
        fmt_money(m.vol1),
        m.tx5
    ));
    if m.fdv_l.is_finite() {
        lines.push(format!("FDV {} | FDV/L {:.1}", fmt_money(m.fdv), m.fdv_l));
    }
    if !scored.reasons.is_empty() {
        lines.push(format!("flags: {}", scored.reasons.join(", ")));
    }
    lines.push(format!("token: {}", base.address.as_deref().unwrap_or("-")));
    lines.join("\n")
}
