//! Extractors guarding the private routes
pub(crate) mod auth;
