//! Shared-element transition naming and the open/close handshake.
//!
//! # Responsibility
//! - Derive anchor names from stable article ids.
//! - Define the values exchanged between the collection and the navigator.
//! - Reconcile a close report against the collection's own snapshot.
//!
//! # Invariants
//! - Anchor names are a pure function of `ArticleId`; both screens agree
//!   without sharing state.
//! - Positions crossing a screen boundary are hints; ids are authoritative.

pub mod anchor;
pub mod handshake;
