//! HTTP API over the skill service.
//!
//! JSON in and out. Validation errors are 400, unknown skills and doc files
//! are 404, and operational failures are 200 with `success: false`. Every
//! response carries `X-Content-Type-Options: nosniff` and
//! `X-Frame-Options: DENY`.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;

pub use server::{build_app, serve};
