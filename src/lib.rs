//! ServerGuard - remote server administration backend
//!
//! HTTP and WebSocket surface over the `serverguard-core` session engines:
//! remote terminals, screen streaming with input control, one-shot
//! commands and a health endpoint.

#![forbid(unsafe_code)]

pub mod api;
pub mod cli;
pub mod logging;
pub mod middleware;
pub mod server;
pub mod websocket;
