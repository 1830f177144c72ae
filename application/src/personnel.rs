use crate::{
    ApplicationError, IndexManager, IndexName, KeyValueStore, LedgerConfig, PersonnelRequest,
    load_record,
};
use domain::{Personnel, Record};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Service for creating and updating personnel records.
pub struct PersonnelService {
    store: Arc<dyn KeyValueStore>,
    indices: IndexManager,
    config: LedgerConfig,
}

impl PersonnelService {
    pub fn new(store: Arc<dyn KeyValueStore>, indices: IndexManager, config: LedgerConfig) -> Self {
        Self {
            store,
            indices,
            config,
        }
    }

    /// Creates a personnel record at key `id` and appends `id` to the personnel index.
    ///
    /// Fails with `AlreadyExists` when the record stored at `id` already
    /// carries that id. Validation happens before any store access.
    #[instrument(skip(self, request), fields(id = %request.id))]
    pub async fn add_personnel(&self, request: &PersonnelRequest) -> Result<(), ApplicationError> {
        info!("Attempting to add employee");
        let personnel = request.parse().map_err(|e| {
            warn!("Rejected employee input: {}", e);
            e
        })?;

        if self
            .fetch(&personnel.id)
            .await?
            .is_some_and(|existing| existing.is_stored_under(&personnel.id))
        {
            warn!("Add failed: employee already exists");
            return Err(ApplicationError::AlreadyExists {
                kind: "employee",
                key: personnel.id,
            });
        }

        let bytes = personnel.encode()?;
        self.indices
            .store_created(
                self.config.creation_policy,
                IndexName::Personnel,
                &personnel.id,
                bytes,
            )
            .await?;
        info!("Employee added");
        Ok(())
    }

    /// Overwrites all five fields of the record at `id`.
    ///
    /// There is no existence check: updating an unknown id writes a fresh
    /// record, which is never added to the personnel index.
    #[instrument(skip(self, request), fields(id = %request.id))]
    pub async fn update_personnel(
        &self,
        request: &PersonnelRequest,
    ) -> Result<(), ApplicationError> {
        info!("Attempting to update employee");
        let personnel = request.parse().map_err(|e| {
            warn!("Rejected employee input: {}", e);
            e
        })?;

        if self.fetch(&personnel.id).await?.is_none() {
            warn!("No stored employee; writing a new unindexed record");
        }

        let bytes = personnel.encode()?;
        self.store.put(&personnel.id, &bytes).await.map_err(|e| {
            error!("Failed to write employee: {}", e);
            e
        })?;
        info!("Employee updated");
        Ok(())
    }

    /// Decoded record at `id`, or `None` if nothing was ever stored there.
    #[instrument(skip(self))]
    pub async fn get_personnel(&self, id: &str) -> Result<Option<Personnel>, ApplicationError> {
        self.fetch(id).await
    }

    /// Ids in the personnel index, in creation order.
    #[instrument(skip(self))]
    pub async fn list_personnel(&self) -> Result<Vec<String>, ApplicationError> {
        Ok(self.indices.load(IndexName::Personnel).await?.into())
    }

    async fn fetch(&self, id: &str) -> Result<Option<Personnel>, ApplicationError> {
        load_record::<Personnel>(self.store.as_ref(), id)
            .await
            .map_err(|e| {
                error!(id = %id, "Failed to get employee: {}", e);
                ApplicationError::StoreError(format!("Failed to get employee: {}", e))
            })
    }
}
