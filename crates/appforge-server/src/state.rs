//! Application state and service wiring

use appforge_clients::{
    CodeGenerator, EvaluationNotifier, GitHubPublisher, ModelCodeGenerator, TemplateGenerator,
};
use appforge_core::AppforgeConfig;
use appforge_orchestrator::{
    Dispatcher, InMemorySecretRegistry, InMemoryTaskStore, Orchestrator, RunScheduler,
};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub dispatcher: Dispatcher,
    /// Request body cap for the submission endpoints
    pub max_body_bytes: usize,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(dispatcher: Dispatcher, max_body_bytes: usize) -> SharedState {
        Arc::new(Self {
            dispatcher,
            max_body_bytes,
        })
    }
}

/// Everything the binary needs to run and shut down
pub struct Services {
    pub state: SharedState,
    pub notifier: Arc<EvaluationNotifier>,
}

/// Build the production service graph from configuration
///
/// `model_key` selects the model-backed generator; without it the
/// template generator is used.
pub fn wire(config: &AppforgeConfig, provider_token: String, model_key: Option<String>) -> Services {
    let generator: Arc<dyn CodeGenerator> = match model_key {
        Some(key) => {
            tracing::info!("Using model generator ({})", config.generator.model);
            Arc::new(ModelCodeGenerator::new(&config.generator, key))
        }
        None => {
            tracing::warn!(
                "{} not set, using template generator",
                config.generator.api_key_env
            );
            Arc::new(TemplateGenerator)
        }
    };

    let publisher = Arc::new(GitHubPublisher::new(&config.publisher, provider_token));
    let notifier = Arc::new(EvaluationNotifier::new(&config.notifier));
    let store = Arc::new(InMemoryTaskStore::new());

    let orchestrator = Orchestrator::new(generator, publisher, notifier.clone(), store)
        .with_attachment_dir(config.pipeline.attachment_dir());
    let scheduler = RunScheduler::new(Arc::new(orchestrator), config.pipeline.max_concurrent_runs);
    let dispatcher = Dispatcher::new(Arc::new(InMemorySecretRegistry::new()), scheduler);

    Services {
        state: AppState::new(dispatcher, config.server.max_body_bytes),
        notifier,
    }
}
