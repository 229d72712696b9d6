//! Mock collaborators shared by the orchestrator integration tests

#![allow(dead_code)]

use appforge_clients::{CodeGenerator, GenerationRequest, Notifier, RepositoryPublisher};
use appforge_core::{
    AppforgeError, EvaluationPayload, GeneratedFiles, PublishedSite, Result, TaskRecord,
    TaskRequest,
};
use appforge_orchestrator::{InMemoryTaskStore, Orchestrator, TaskStore};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn request(task: &str, round: u8) -> TaskRequest {
    TaskRequest {
        email: "a@x.com".into(),
        secret: "s1".into(),
        task: task.into(),
        round,
        nonce: format!("nonce-{}", round),
        brief: "todo app".into(),
        checks: vec!["must load".into()],
        evaluation_url: "http://eval/".into(),
        attachments: vec![],
    }
}

pub fn files(names: &[&str]) -> GeneratedFiles {
    names
        .iter()
        .map(|name| (name.to_string(), format!("content of {}", name)))
        .collect()
}

#[derive(Default)]
pub struct MockGenerator {
    pub fail: Option<String>,
    pub output: GeneratedFiles,
    pub requests: Mutex<Vec<GenerationRequest>>,
    /// Whether every staged attachment existed when generation ran
    pub attachments_present: Mutex<Vec<bool>>,
}

impl MockGenerator {
    pub fn returning(output: GeneratedFiles) -> Self {
        Self {
            output,
            ..Self::default()
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            fail: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CodeGenerator for MockGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedFiles> {
        self.requests.lock().unwrap().push(request.clone());
        self.attachments_present
            .lock()
            .unwrap()
            .push(request.attachments.iter().all(|p| p.exists()));
        match &self.fail {
            Some(reason) => Err(AppforgeError::Generation(reason.clone())),
            None => Ok(self.output.clone()),
        }
    }
}

/// Generator that panics, for supervision tests
pub struct PanickingGenerator;

#[async_trait]
impl CodeGenerator for PanickingGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedFiles> {
        panic!("generator blew up");
    }
}

/// Generator that tracks how many calls overlap
#[derive(Default)]
pub struct SlowGenerator {
    pub active: AtomicUsize,
    pub peak: AtomicUsize,
}

#[async_trait]
impl CodeGenerator for SlowGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<GeneratedFiles> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(files(&["index.html"]))
    }
}

#[derive(Default)]
pub struct MockPublisher {
    pub fail_publish: bool,
    pub fail_commit: bool,
    pub created: Mutex<Vec<(String, GeneratedFiles, String)>>,
    pub updated: Mutex<Vec<(String, GeneratedFiles)>>,
}

impl MockPublisher {
    pub fn site(name: &str) -> PublishedSite {
        PublishedSite {
            repo_url: format!("https://github.com/octo/{}", name),
            pages_url: format!("https://octo.github.io/{}", name),
        }
    }

    pub fn created(&self) -> Vec<(String, GeneratedFiles, String)> {
        self.created.lock().unwrap().clone()
    }

    pub fn updated(&self) -> Vec<(String, GeneratedFiles)> {
        self.updated.lock().unwrap().clone()
    }
}

#[async_trait]
impl RepositoryPublisher for MockPublisher {
    async fn create_repository(
        &self,
        name: &str,
        files: &GeneratedFiles,
        description: &str,
    ) -> Result<PublishedSite> {
        if self.fail_publish {
            return Err(AppforgeError::Publish("repository quota exceeded".into()));
        }
        self.created
            .lock()
            .unwrap()
            .push((name.to_string(), files.clone(), description.to_string()));
        Ok(Self::site(name))
    }

    async fn update_repository(&self, name: &str, files: &GeneratedFiles) -> Result<PublishedSite> {
        if self.fail_publish {
            return Err(AppforgeError::Publish("repository gone".into()));
        }
        self.updated
            .lock()
            .unwrap()
            .push((name.to_string(), files.clone()));
        Ok(Self::site(name))
    }

    async fn latest_commit(&self, _name: &str) -> Result<String> {
        if self.fail_commit {
            Err(AppforgeError::Api("branch lookup failed".into()))
        } else {
            Ok("c0ffee".to_string())
        }
    }
}

pub struct MockNotifier {
    pub deliver: bool,
    pub submitted: Mutex<Vec<(EvaluationPayload, String)>>,
}

impl MockNotifier {
    pub fn delivering(deliver: bool) -> Self {
        Self {
            deliver,
            submitted: Mutex::new(Vec::new()),
        }
    }

    pub fn submitted(&self) -> Vec<(EvaluationPayload, String)> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn submit(&self, payload: &EvaluationPayload, url: &str) -> bool {
        self.submitted
            .lock()
            .unwrap()
            .push((payload.clone(), url.to_string()));
        self.deliver
    }
}

pub struct Harness<G = MockGenerator> {
    pub generator: Arc<G>,
    pub publisher: Arc<MockPublisher>,
    pub notifier: Arc<MockNotifier>,
    pub store: Arc<InMemoryTaskStore>,
    pub orchestrator: Arc<Orchestrator>,
}

impl<G: CodeGenerator + 'static> Harness<G> {
    pub fn new(generator: G, publisher: MockPublisher, notifier: MockNotifier) -> Self {
        let generator = Arc::new(generator);
        let publisher = Arc::new(publisher);
        let notifier = Arc::new(notifier);
        let store = Arc::new(InMemoryTaskStore::new());
        let orchestrator = Arc::new(
            Orchestrator::new(
                generator.clone(),
                publisher.clone(),
                notifier.clone(),
                store.clone(),
            )
            .with_attachment_dir(std::env::temp_dir().join("appforge-tests")),
        );
        Self {
            generator,
            publisher,
            notifier,
            store,
            orchestrator,
        }
    }

    /// Record the request as accepted, as the dispatcher would
    pub fn accept(&self, request: &TaskRequest) {
        self.store.put(TaskRecord::accepted(request.clone()));
    }
}
