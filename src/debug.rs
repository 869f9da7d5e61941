// src/debug.rs
//! Dev-only diagnostics: logging gate and anonymized ids for campaign names.

use sha2::{Digest, Sha256};
use std::fmt::Write as _;

pub const ENV_DEV_LOG: &str = "DASHBOARD_DEV_LOG";

/// Dev logging gate: DASHBOARD_DEV_LOG=1 AND dev env (debug or SHUTTLE_ENV in {local,development,dev})
pub fn dev_logging_enabled() -> bool {
    let on = std::env::var(ENV_DEV_LOG).ok().as_deref() == Some("1");
    if !on {
        return false;
    }
    if cfg!(debug_assertions) {
        return true;
    }
    matches!(
        std::env::var("SHUTTLE_ENV")
            .unwrap_or_default()
            .to_ascii_lowercase()
            .as_str(),
        "local" | "development" | "dev"
    )
}

/// 12 hex chars of SHA-256. Campaign names are never logged raw.
pub fn anon_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let mut out = String::with_capacity(12);
    for b in digest.iter().take(6) {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_hash_is_short_and_stable() {
        let a = anon_hash("Promo Blast");
        assert_eq!(a.len(), 12);
        assert_eq!(a, anon_hash("Promo Blast"));
        assert_ne!(a, anon_hash("Promo blast"));
    }
}
