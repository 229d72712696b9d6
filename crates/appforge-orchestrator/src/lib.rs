//! # appforge-orchestrator
//!
//! Drives accepted requests through generate, publish and notify.
//!
//! This crate provides:
//! - Task record store and trust-on-first-use secret registry
//! - Pure pipeline state machine
//! - Build and revision pipelines over the collaborator traits
//! - Bounded, supervised scheduling of pipeline runs
//! - Request acceptance (validation, secret check, round-1 precondition)

mod dispatcher;
mod orchestrator;
mod scheduler;
mod secrets;
mod state_machine;
mod store;

pub use dispatcher::Dispatcher;
pub use orchestrator::{repository_description, repository_name, Orchestrator};
pub use scheduler::RunScheduler;
pub use secrets::{InMemorySecretRegistry, SecretRegistry};
pub use state_machine::{transition, Action, PipelineEvent, PipelineState};
pub use store::{InMemoryTaskStore, TaskStore};
