//! Graphics Bootstrap Common Library
//!
//! This crate provides the shared data model, configuration loading and the
//! driver trait for all graphics bootstrap workspace crates.
//!
//! # Module Structure
//!
//! - [`types`] - Application metadata, negotiated names, diagnostic classification
//! - [`driver`] - `Driver` backend trait, request types, `DiagnosticSink`
//! - [`error`] - Bootstrap error taxonomy and lifecycle stages
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Negotiated names and reference defaults
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml` with alias for shorter imports:
//! ```toml
//! [dependencies]
//! gfx = { package = "gfx_common", path = "../gfx_common" }
//! ```
//!
//! Then import:
//! ```rust
//! use gfx_common::prelude::*;
//! ```

pub mod config;
pub mod consts;
pub mod driver;
pub mod error;
pub mod prelude;
pub mod types;
