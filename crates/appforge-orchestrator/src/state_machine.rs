//! Pure state machine for a single pipeline run
//!
//! No async and no I/O. The orchestrator performs each stage, feeds the
//! outcome in as an event and executes the returned actions.
//!
//! - `transition(state, event) -> (state, actions)` is deterministic
//! - Finished states are absorbing: any event leaves them unchanged with no actions
//! - An event a live state cannot handle finishes the run as `failed` (never panics)
//! - The terminal status is written exactly once, by the transition that finishes the run

use appforge_core::{RequestKind, TaskStatus};

/// Where a pipeline run currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    /// Accepted, not yet started
    Accepted { kind: RequestKind },
    /// Revision only: looking up the round-1 repository
    ResolvingRepository,
    StagingAttachments,
    Generating,
    Publishing,
    /// Reading back the head commit (best effort)
    ResolvingCommit,
    Notifying,
    Finished { status: TaskStatus },
}

impl PipelineState {
    /// Status as the task record should report it
    pub fn status(&self) -> TaskStatus {
        match self {
            Self::Finished { status } => *status,
            _ => TaskStatus::Processing,
        }
    }
}

/// Outcome of a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    Start,
    RepositoryResolved { repo_name: String },
    AttachmentsStaged { count: usize },
    FilesGenerated { count: usize },
    Published { repo_url: String },
    CommitResolved { sha: String },
    NotificationDelivered,
    NotificationExhausted,
    Failed { reason: String },
}

/// Side effects requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Log { message: String },
    /// Write the terminal status to the task record
    RecordStatus { status: TaskStatus },
}

fn log(message: impl Into<String>) -> Action {
    Action::Log {
        message: message.into(),
    }
}

fn finish(status: TaskStatus, message: String) -> (PipelineState, Vec<Action>) {
    (
        PipelineState::Finished { status },
        vec![log(message), Action::RecordStatus { status }],
    )
}

/// Pure state transition function
pub fn transition(state: PipelineState, event: PipelineEvent) -> (PipelineState, Vec<Action>) {
    use PipelineEvent as E;
    use PipelineState as S;

    match (state, event) {
        (S::Finished { status }, _) => (S::Finished { status }, vec![]),

        (S::Accepted { kind }, E::Start) => match kind {
            RequestKind::Build => (S::StagingAttachments, vec![log("Starting build pipeline")]),
            RequestKind::Revision => (
                S::ResolvingRepository,
                vec![log("Starting revision pipeline")],
            ),
        },

        (S::ResolvingRepository, E::RepositoryResolved { repo_name }) => (
            S::StagingAttachments,
            vec![log(format!("Revising repository {}", repo_name))],
        ),

        (S::StagingAttachments, E::AttachmentsStaged { count }) => (
            S::Generating,
            vec![log(format!("Staged {} attachments, generating code", count))],
        ),

        (S::Generating, E::FilesGenerated { count }) => (
            S::Publishing,
            vec![log(format!("Generated {} files, publishing", count))],
        ),

        (S::Publishing, E::Published { repo_url }) => (
            S::ResolvingCommit,
            vec![log(format!("Published {}", repo_url))],
        ),

        (S::ResolvingCommit, E::CommitResolved { sha }) => (
            S::Notifying,
            vec![log(format!("Notifying evaluator of commit {}", sha))],
        ),

        (S::Notifying, E::NotificationDelivered) => finish(
            TaskStatus::Completed,
            "Evaluation delivered, task completed".to_string(),
        ),

        (S::Notifying, E::NotificationExhausted) => finish(
            TaskStatus::EvaluationFailed,
            "Evaluation delivery exhausted its attempts".to_string(),
        ),

        (_, E::Failed { reason }) => finish(TaskStatus::Failed, format!("Pipeline failed: {}", reason)),

        (state, event) => finish(
            TaskStatus::Failed,
            format!("Invalid transition: {:?} cannot handle {:?}", state, event),
        ),
    }
}
