//! Foodgram Core - Shared domain types.
//!
//! This crate provides the types shared by the Foodgram components:
//! - `api` - Recipe sharing HTTP API
//! - `cli` - Command-line tools for migrations and data loading
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP. Every value type validates on construction, so a value that
//! exists is a value that may be stored.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, validated names, measures and relation kinds

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
