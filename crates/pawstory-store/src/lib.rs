//! Repositories for jobs and projects.
//!
//! Pipelines and handlers depend on the [`JobStore`] and [`ProjectStore`]
//! traits; the in-memory implementations back them with a
//! `tokio::sync::RwLock<HashMap>`. Write locks are held only for the
//! duration of a single update closure.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use pawstory_models::{Job, JobId, Project, ProjectId};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("job not found: {0}")]
    JobNotFound(JobId),

    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
}

/// Mutation applied under the write lock.
pub type UpdateFn<T> = Box<dyn FnOnce(&mut T) + Send>;

/// Repository of highlight jobs.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert(&self, job: Job);
    async fn get(&self, id: &JobId) -> Option<Job>;
    async fn list(&self) -> Vec<Job>;
    /// Apply a mutation to one job, returning the updated copy.
    async fn update(&self, id: &JobId, mutate: UpdateFn<Job>) -> StoreResult<Job>;
}

/// Repository of story projects.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn insert(&self, project: Project);
    async fn get(&self, id: &ProjectId) -> Option<Project>;
    async fn list(&self) -> Vec<Project>;
    /// Apply a mutation to one project, returning the updated copy.
    async fn update(&self, id: &ProjectId, mutate: UpdateFn<Project>) -> StoreResult<Project>;
}

/// In-memory [`JobStore`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryJobStore {
    jobs: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: Job) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }

    async fn get(&self, id: &JobId) -> Option<Job> {
        self.jobs.read().await.get(id).cloned()
    }

    async fn list(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.read().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    async fn update(&self, id: &JobId, mutate: UpdateFn<Job>) -> StoreResult<Job> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| StoreError::JobNotFound(id.clone()))?;
        mutate(job);
        job.touch();
        Ok(job.clone())
    }
}

/// In-memory [`ProjectStore`].
#[derive(Debug, Default, Clone)]
pub struct InMemoryProjectStore {
    projects: Arc<RwLock<HashMap<ProjectId, Project>>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn insert(&self, project: Project) {
        self.projects
            .write()
            .await
            .insert(project.id.clone(), project);
    }

    async fn get(&self, id: &ProjectId) -> Option<Project> {
        self.projects.read().await.get(id).cloned()
    }

    async fn list(&self) -> Vec<Project> {
        let mut projects: Vec<Project> = self.projects.read().await.values().cloned().collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        projects
    }

    async fn update(&self, id: &ProjectId, mutate: UpdateFn<Project>) -> StoreResult<Project> {
        let mut projects = self.projects.write().await;
        let project = projects
            .get_mut(id)
            .ok_or_else(|| StoreError::ProjectNotFound(id.clone()))?;
        mutate(project);
        project.touch();
        Ok(project.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pawstory_models::{JobStatus, ToneMode};

    #[tokio::test]
    async fn test_job_insert_get_update() {
        let store = InMemoryJobStore::new();
        let job = Job::new("video.mp4".into(), "frames".into());
        let id = job.id.clone();
        store.insert(job).await;

        let updated = store
            .update(&id, Box::new(|j| j.start()))
            .await
            .unwrap();
        assert_eq!(updated.status, JobStatus::Processing);

        let fetched = store.get(&id).await.unwrap();
        assert_eq!(fetched.status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn test_job_update_missing() {
        let store = InMemoryJobStore::new();
        let id = JobId::new();
        let result = store.update(&id, Box::new(|_| {})).await;
        assert!(matches!(result, Err(StoreError::JobNotFound(_))));
    }

    #[tokio::test]
    async fn test_project_list_newest_first() {
        let store = InMemoryProjectStore::new();
        let older = Project::new("first", "Biscuit", ToneMode::Playful);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let newer = Project::new("second", "Mochi", ToneMode::Playful);

        store.insert(older).await;
        store.insert(newer).await;

        let listed = store.list().await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "second");
    }
}
