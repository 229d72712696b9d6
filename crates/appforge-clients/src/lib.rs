//! # appforge-clients
//!
//! Clients for the external systems an appforge pipeline talks to.
//!
//! - [`CodeGenerator`]: turns a brief and its checks into named source files
//! - [`RepositoryPublisher`]: creates or updates a hosted repository and its site
//! - [`Notifier`]: delivers the evaluation payload with bounded retries
//!
//! Each seam is a trait so the orchestrator can be exercised with mocks.

mod attachments;
mod auth;
mod generator;
mod notifier;
mod publisher;
mod templates;
mod types;

pub use attachments::{decode_data_url, remove_staged, stage_attachments};
pub use auth::{model_api_key, provider_token};
pub use generator::{
    build_prompt, parse_generated_files, CodeGenerator, GenerationRequest, ModelCodeGenerator,
    TemplateGenerator,
};
pub use notifier::{
    backoff_delay, DeliveryTransport, EvaluationNotifier, HttpTransport, Notifier, Sleeper,
    TokioSleeper,
};
pub use publisher::{pages_url, GitHubPublisher, RepositoryPublisher};
pub use templates::{template_file, template_files, REQUIRED_FILES};
