//! In-memory stand-in for the HR backend's recruitment endpoints.

pub mod engine;
pub mod router;
pub mod seed;
pub mod service;
pub mod store;

pub use engine::{
    parse_interview_date, InvalidTransition, SandboxRecord, TransitionEngine, TransitionPayload,
};
pub use router::{sandbox_router, API_PREFIX};
pub use seed::{applications_from_csv, applications_from_path, demo_applications, SeedError};
pub use service::{SandboxError, SandboxService, TransitionCommand};
pub use store::{InMemoryPipelineRepository, PipelineRepository, RepositoryError};
