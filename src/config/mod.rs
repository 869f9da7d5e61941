// src/config/mod.rs
pub mod insight;

pub use insight::InsightConfig;
