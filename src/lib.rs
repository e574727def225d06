//! Dexscreener meme-alpha scanner.
//!
//! Discovers newly listed/promoted tokens, enriches each with its best
//! live trading pair, scores against liquidity/volume/activity floors,
//! suppresses re-alerts through a persisted cooldown map, and emits a
//! deduplicated, deterministically ordered alert stream.

pub mod config;
pub mod cooldown;
pub mod dexscreener;
pub mod discovery;
pub mod domain;
pub mod error;
pub mod monitoring;
pub mod ranking;
pub mod render;
pub mod scanner;
pub mod scoring;
