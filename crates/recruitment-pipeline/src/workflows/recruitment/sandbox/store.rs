use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::super::domain::ApplicationId;
use super::engine::SandboxRecord;

/// Storage abstraction so the sandbox service can be exercised in isolation.
pub trait PipelineRepository: Send + Sync {
    fn insert(&self, record: SandboxRecord) -> Result<(), RepositoryError>;
    fn update(&self, record: SandboxRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<SandboxRecord>, RepositoryError>;
    /// Every record, ordered by id.
    fn all(&self) -> Result<Vec<SandboxRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryPipelineRepository {
    records: Arc<Mutex<HashMap<ApplicationId, SandboxRecord>>>,
}

impl InMemoryPipelineRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<ApplicationId, SandboxRecord>>, RepositoryError>
    {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }
}

impl PipelineRepository for InMemoryPipelineRepository {
    fn insert(&self, record: SandboxRecord) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let id = record.application.id.clone();
        if guard.contains_key(&id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(id, record);
        Ok(())
    }

    fn update(&self, record: SandboxRecord) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let id = record.application.id.clone();
        if !guard.contains_key(&id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(id, record);
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<SandboxRecord>, RepositoryError> {
        Ok(self.lock()?.get(id).cloned())
    }

    fn all(&self) -> Result<Vec<SandboxRecord>, RepositoryError> {
        let mut records: Vec<SandboxRecord> = self.lock()?.values().cloned().collect();
        records.sort_by(|a, b| a.application.id.cmp(&b.application.id));
        Ok(records)
    }
}
