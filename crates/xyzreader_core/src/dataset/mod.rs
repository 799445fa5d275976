//! Dataset snapshots, providers and per-screen snapshot slots.
//!
//! # Responsibility
//! - Model the ordered article dataset as immutable snapshots.
//! - Define the asynchronous provider contract both screens load through.
//! - Track each screen's load tickets and readiness independently.
//!
//! # Invariants
//! - A position is only meaningful against the snapshot that produced it.
//! - Screens never share a snapshot slot; they may hold different snapshots.

pub mod provider;
pub mod slot;
pub mod snapshot;
