//! # appforge-core
//!
//! Core types for the appforge build service.
//!
//! appforge accepts a brief describing a web application, has a model generate
//! the source files, publishes them to a hosted repository and reports the
//! result to an evaluation endpoint. A second round may revise a previously
//! published repository.
//!
//! ## Core Paradigm
//!
//! - A task is identified by `{task}-{round}` (round 1 builds, round 2 revises)
//! - Every accepted task starts `processing` and ends in exactly one terminal status
//! - Only validation errors reach the caller; pipeline failures live in the task record

pub mod config;
mod error;
pub mod fail_open;
mod types;

pub use config::AppforgeConfig;
pub use error::{AppforgeError, Result};
pub use types::*;
