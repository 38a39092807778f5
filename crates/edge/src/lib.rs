//! Still Waters Counselling edge proxy.
//!
//! An offline-first caching proxy that sits in front of the site. GET
//! requests are answered by per-path strategies over three versioned cache
//! buckets, so visited pages, styles and API reads stay available when the
//! site cannot be reached. Everything else goes straight to the origin.
//!
//! # Modules
//!
//! - [`router`] - strategy selection and the four caching strategies
//! - [`lifecycle`] - install, activation and preloading
//! - [`storage`] - memory and disk bucket backends
//! - [`network`] - origin client
//! - [`server`] - axum front end and the message channel

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod buckets;
pub mod config;
pub mod error;
pub mod exchange;
pub mod lifecycle;
pub mod network;
pub mod offline;
pub mod router;
pub mod server;
pub mod storage;

#[cfg(test)]
mod testing;

pub use buckets::{Buckets, CACHE_VERSION};
pub use exchange::{EdgeRequest, EdgeResponse};
pub use lifecycle::{EdgeWorker, Lifecycle, Precache};
pub use router::CacheRouter;
pub use server::app;
