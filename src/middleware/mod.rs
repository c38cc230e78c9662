//! Middleware module for the ServerGuard HTTP server
//!
//! Provides authentication extractors (Bearer token / API key / query token).

pub mod auth;
