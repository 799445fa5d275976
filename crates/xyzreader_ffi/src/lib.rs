//! Flutter bridge crate for the reader core.

pub mod api;
