//! # appforge-server
//!
//! HTTP surface of the appforge build service.
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /` | liveness banner |
//! | `GET /health` | `{status, version}` |
//! | `POST /api/deploy` | accept a round-1 build |
//! | `POST /api/revise` | accept a round-2 revision |
//! | `GET /api/status/:task_id` | current task record |

mod error;
mod server;
mod state;

pub use error::ApiError;
pub use server::{router, serve, AcceptedResponse, HealthResponse, StatusResponse};
pub use state::{wire, AppState, Services, SharedState};
