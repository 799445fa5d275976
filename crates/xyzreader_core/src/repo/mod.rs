//! Repository layer for persisted articles.
//!
//! # Responsibility
//! - Define the article storage contract used by the SQLite dataset provider.
//! - Keep SQL details out of the dataset and controller layers.
//!
//! # Invariants
//! - Writes validate articles before touching storage.
//! - Reads reject invalid persisted rows instead of masking them.

pub mod article_repo;
