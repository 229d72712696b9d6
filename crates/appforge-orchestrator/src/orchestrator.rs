//! Build and revision pipelines
//!
//! A run stages attachments, generates files, publishes them and notifies
//! the evaluator, in that order. Stages are not rolled back: a repository
//! published before a later failure stays published.

use crate::state_machine::{transition, Action, PipelineEvent, PipelineState};
use crate::store::TaskStore;
use appforge_clients::{
    remove_staged, stage_attachments, CodeGenerator, GenerationRequest, Notifier,
    RepositoryPublisher,
};
use appforge_core::fail_open::fail_open_or;
use appforge_core::{
    AppforgeError, BuildRequest, EvaluationPayload, PublishedSite, RequestKind, Result,
    RevisionRequest, TaskId, TaskRequest, TaskStatus, UNKNOWN_COMMIT,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Instrument;

const DESCRIPTION_BRIEF_CHARS: usize = 100;

/// Fresh repository name for a build: the task plus a short random suffix
pub fn repository_name(task: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", task, &id[..8])
}

/// Repository description derived from the brief
pub fn repository_description(brief: &str) -> String {
    let head: String = brief.chars().take(DESCRIPTION_BRIEF_CHARS).collect();
    format!("Generated app for: {}...", head)
}

/// Runs pipelines against the collaborator traits
pub struct Orchestrator {
    generator: Arc<dyn CodeGenerator>,
    publisher: Arc<dyn RepositoryPublisher>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn TaskStore>,
    attachment_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(
        generator: Arc<dyn CodeGenerator>,
        publisher: Arc<dyn RepositoryPublisher>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn TaskStore>,
    ) -> Self {
        Self {
            generator,
            publisher,
            notifier,
            store,
            attachment_dir: std::env::temp_dir(),
        }
    }

    /// Directory staged attachments are written to
    pub fn with_attachment_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.attachment_dir = dir.into();
        self
    }

    pub fn attachment_dir(&self) -> &Path {
        &self.attachment_dir
    }

    pub fn store(&self) -> &Arc<dyn TaskStore> {
        &self.store
    }

    /// Run the build pipeline for an accepted round-1 request
    ///
    /// The record `{task}-1` must already exist. Returns the terminal status
    /// that was written to it.
    pub async fn run_build(&self, request: &BuildRequest) -> TaskStatus {
        self.run(RequestKind::Build, request).await
    }

    /// Run the revision pipeline for an accepted round-2 request
    pub async fn run_revision(&self, request: &RevisionRequest) -> TaskStatus {
        self.run(RequestKind::Revision, request).await
    }

    async fn run(&self, kind: RequestKind, request: &TaskRequest) -> TaskStatus {
        let id = request.task_id();
        let span = tracing::info_span!("pipeline", task_id = %id, %kind);

        async move {
            let mut run = PipelineRun::new(self.store.as_ref(), id, kind);
            run.advance(PipelineEvent::Start);

            let outcome = match kind {
                RequestKind::Build => self.build_stages(&mut run, request).await,
                RequestKind::Revision => self.revision_stages(&mut run, request).await,
            };
            if let Err(e) = outcome {
                run.advance(PipelineEvent::Failed {
                    reason: e.to_string(),
                });
            }

            run.state.status()
        }
        .instrument(span)
        .await
    }

    async fn build_stages(&self, run: &mut PipelineRun<'_>, request: &TaskRequest) -> Result<()> {
        let files = self.generate(run, request, None).await?;

        let repo_name = repository_name(&request.task);
        let site = self
            .publisher
            .create_repository(&repo_name, &files, &repository_description(&request.brief))
            .await?;
        self.store.set_repository(&run.id, &repo_name)?;
        run.advance(PipelineEvent::Published {
            repo_url: site.repo_url.clone(),
        });

        self.deliver(run, request, &repo_name, &site).await;
        Ok(())
    }

    async fn revision_stages(
        &self,
        run: &mut PipelineRun<'_>,
        request: &TaskRequest,
    ) -> Result<()> {
        let build = self.store.get(&TaskId::build_of(&request.task))?;
        let repo_name = build.repo_name.ok_or_else(|| {
            AppforgeError::NotFound(format!("No repository recorded for {}", build.id))
        })?;
        run.advance(PipelineEvent::RepositoryResolved {
            repo_name: repo_name.clone(),
        });

        let files = self.generate(run, request, Some(repo_name.clone())).await?;

        let site = self.publisher.update_repository(&repo_name, &files).await?;
        self.store.set_repository(&run.id, &repo_name)?;
        run.advance(PipelineEvent::Published {
            repo_url: site.repo_url.clone(),
        });

        self.deliver(run, request, &repo_name, &site).await;
        Ok(())
    }

    async fn generate(
        &self,
        run: &mut PipelineRun<'_>,
        request: &TaskRequest,
        existing_repo: Option<String>,
    ) -> Result<appforge_core::GeneratedFiles> {
        let attachments = stage_attachments(&request.attachments, &self.attachment_dir).await;
        run.advance(PipelineEvent::AttachmentsStaged {
            count: attachments.len(),
        });

        let generation = GenerationRequest {
            brief: request.brief.clone(),
            checks: request.checks.clone(),
            attachments,
            existing_repo,
        };
        let generated = self.generator.generate(&generation).await;
        remove_staged(&generation.attachments).await;

        let files = generated?;
        run.advance(PipelineEvent::FilesGenerated { count: files.len() });
        Ok(files)
    }

    /// Commit lookup and notification; neither can fail the run
    async fn deliver(
        &self,
        run: &mut PipelineRun<'_>,
        request: &TaskRequest,
        repo_name: &str,
        site: &PublishedSite,
    ) {
        let commit_sha = fail_open_or(
            "read latest commit",
            self.publisher.latest_commit(repo_name),
            UNKNOWN_COMMIT.to_string(),
        )
        .await;
        run.advance(PipelineEvent::CommitResolved {
            sha: commit_sha.clone(),
        });

        let payload = EvaluationPayload::new(request, site, commit_sha);
        let delivered = self.notifier.submit(&payload, &request.evaluation_url).await;

        run.advance(if delivered {
            PipelineEvent::NotificationDelivered
        } else {
            PipelineEvent::NotificationExhausted
        });
    }
}

/// One run's state plus the store its actions write to
struct PipelineRun<'a> {
    store: &'a dyn TaskStore,
    id: TaskId,
    state: PipelineState,
}

impl<'a> PipelineRun<'a> {
    fn new(store: &'a dyn TaskStore, id: TaskId, kind: RequestKind) -> Self {
        Self {
            store,
            id,
            state: PipelineState::Accepted { kind },
        }
    }

    fn advance(&mut self, event: PipelineEvent) {
        let current = std::mem::replace(
            &mut self.state,
            PipelineState::Finished {
                status: TaskStatus::Failed,
            },
        );
        let (next, actions) = transition(current, event);
        self.state = next;

        for action in actions {
            match action {
                Action::Log { message } => match self.state.status() {
                    TaskStatus::Failed | TaskStatus::EvaluationFailed => {
                        tracing::error!("{}", message)
                    }
                    _ => tracing::info!("{}", message),
                },
                Action::RecordStatus { status } => {
                    if let Err(e) = self.store.set_status(&self.id, status) {
                        tracing::error!("Failed to record status {} for {}: {}", status, self.id, e);
                    }
                }
            }
        }
    }
}
