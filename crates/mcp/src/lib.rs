//! Stdio tool server exposing the skill catalog and installer.
//!
//! JSON-RPC 2.0, one message per line on stdin, one response per line on
//! stdout. Logs go to stderr so the channel stays clean.
//!
//! - protocol types (`types`)
//! - tool definitions and dispatch (`tools`)
//! - `skills://` resources (`resources`)
//! - request routing (`server`)
//! - the line-delimited loop (`transport`)

pub mod error;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;
pub mod types;

pub use {
    error::{Error, Result},
    server::McpServer,
    transport::{serve, serve_stdio},
};
