use crate::{ApplicationError, IndexManager, IndexName, KeyValueStore, LedgerConfig, load_record};
use domain::{DomainError, Project, Record};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Service for project records and their membership lists.
pub struct ProjectService {
    store: Arc<dyn KeyValueStore>,
    indices: IndexManager,
    config: LedgerConfig,
}

impl ProjectService {
    pub fn new(store: Arc<dyn KeyValueStore>, indices: IndexManager, config: LedgerConfig) -> Self {
        Self {
            store,
            indices,
            config,
        }
    }

    /// Creates an empty project stored under its space-to-underscore key,
    /// then appends that key to the project index. Returns the key.
    #[instrument(skip(self))]
    pub async fn create_project(&self, name: &str) -> Result<String, ApplicationError> {
        info!("Attempting to create project");
        let project = Project::new(name).map_err(|e| {
            warn!("Rejected project name: {}", e);
            e
        })?;
        let key = project.key();

        let existing = load_record::<Project>(self.store.as_ref(), &key)
            .await
            .map_err(|e| {
                error!(key = %key, "Failed to get project name: {}", e);
                ApplicationError::StoreError(format!("Failed to get project name: {}", e))
            })?;
        if existing.is_some_and(|p| p.name == project.name) {
            warn!(key = %key, "Create failed: project already exists");
            return Err(ApplicationError::AlreadyExists {
                kind: "project",
                key: project.name,
            });
        }

        let bytes = project.encode()?;
        self.indices
            .store_created(self.config.creation_policy, IndexName::Project, &key, bytes)
            .await?;
        info!(key = %key, "Project created");
        Ok(key)
    }

    /// Adds each id not yet in the project's member list, keeping first-seen order.
    ///
    /// An absent project key is not an error: the ids are added to an empty,
    /// nameless record written at `project_key`.
    #[instrument(skip(self, member_ids), fields(count = member_ids.len()))]
    pub async fn add_project_members<S>(
        &self,
        project_key: &str,
        member_ids: &[S],
    ) -> Result<(), ApplicationError>
    where
        S: AsRef<str> + Sync,
    {
        info!("Attempting to add project members");
        if member_ids.is_empty() {
            return Err(DomainError::NoMembers.into());
        }

        let mut project = self.fetch(project_key).await?;
        let added = project.add_members(member_ids);
        debug!(added = ?added, skipped = member_ids.len() - added.len(), "Membership merged");

        let bytes = project.encode()?;
        self.store.put(project_key, &bytes).await.map_err(|e| {
            error!("Failed to write project: {}", e);
            e
        })?;
        info!(added = added.len(), "Project members added");
        Ok(())
    }

    /// Removes `member_id` from the project's members. A non-member is a silent no-op.
    #[instrument(skip(self))]
    pub async fn remove_project_member(
        &self,
        project_key: &str,
        member_id: &str,
    ) -> Result<(), ApplicationError> {
        info!("Attempting to remove project member");
        let mut project = self.fetch(project_key).await?;
        if project.remove_member(member_id) {
            debug!("Member found and removed");
        } else {
            debug!("Member not in project; nothing to remove");
        }

        let bytes = project.encode()?;
        self.store.put(project_key, &bytes).await.map_err(|e| {
            error!("Failed to write project: {}", e);
            ApplicationError::StoreError(format!(
                "Failed to delete member from project state: {}",
                e
            ))
        })?;
        Ok(())
    }

    /// Decoded project stored at `key`, if any.
    #[instrument(skip(self))]
    pub async fn get_project(&self, key: &str) -> Result<Option<Project>, ApplicationError> {
        load_record::<Project>(self.store.as_ref(), key).await
    }

    /// Project keys in the project index, in creation order.
    #[instrument(skip(self))]
    pub async fn list_projects(&self) -> Result<Vec<String>, ApplicationError> {
        Ok(self.indices.load(IndexName::Project).await?.into())
    }

    /// Loads the project for a membership change; absent becomes the zero record.
    async fn fetch(&self, key: &str) -> Result<Project, ApplicationError> {
        let project = load_record::<Project>(self.store.as_ref(), key)
            .await
            .map_err(|e| {
                error!(key = %key, "Failed to get project: {}", e);
                ApplicationError::NotFound(format!("Failed to get project: {}", e))
            })?;
        Ok(project.unwrap_or_else(|| {
            warn!(key = %key, "Project not present; membership goes to an empty record");
            Project::default()
        }))
    }
}
