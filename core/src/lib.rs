//! paylist-core — filtered, paginated, sortable payment listings over a
//! record store.

pub mod bulk;
pub mod config;
pub mod counts;
pub mod engine;
pub mod error;
pub mod event;
pub mod filter;
pub mod fixtures;
pub mod format;
pub mod payment;
pub mod rng;
pub mod store;
pub mod types;
