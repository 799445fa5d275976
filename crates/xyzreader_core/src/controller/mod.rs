//! Screen controllers driving the collection/detail handshake.
//!
//! # Responsibility
//! - Own each screen's explicit state machine and private snapshot slot.
//! - Turn user events and load completions into handshake values.
//!
//! # Invariants
//! - Controllers run on one logical UI thread; no internal locking.
//! - Load completions are the only asynchronous inputs.

pub mod collection;
pub mod navigator;
