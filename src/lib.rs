//! healthdash: a reporting service over public health and economic indicator extracts.
//!
//! Every page runs the same linear pipeline, parameterised by a declarative `PageSpec`:
//! load (`storage`), reshape/join/filter (`pipeline`), statistics (`stats`) and
//! presentation (`present`). `server` exposes the catalog over HTTP.

pub mod catalog;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod present;
pub mod server;
pub mod stats;
pub mod storage;
