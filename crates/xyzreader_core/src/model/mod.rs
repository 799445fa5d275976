//! Domain model for reader articles.
//!
//! # Responsibility
//! - Define the article record shared by the collection and detail screens.
//! - Keep identity (`ArticleId`) separate from list position.
//!
//! # Invariants
//! - Every article is identified by a stable `ArticleId` that survives reloads.
//! - Positions never appear in the model; they belong to snapshots.

pub mod article;
