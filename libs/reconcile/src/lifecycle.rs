//! Application lifecycle: create, read, update, delete, import.
//!
//! Each entry point is one full reconciliation pass against the control
//! plane. Mutating passes finish with a fresh read so the returned record
//! always reflects what the control plane actually stored, assigned ids and
//! advanced version included.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use streamplane_api::ControlPlane;
use tracing::{debug, info, warn};

use crate::diff;
use crate::dispatch::MutationDispatcher;
use crate::error::ReconcileError;
use crate::mapper;
use crate::model::{AppSpec, ApplicationRecord};
use crate::poll::DeletionPoller;
use crate::retry::RetryPolicy;
use crate::version::VersionTracker;

/// Drives an application's lifecycle against a control plane.
pub struct ApplicationReconciler<C> {
    client: C,
    retry: RetryPolicy,
    poller: DeletionPoller,
}

impl<C: ControlPlane> ApplicationReconciler<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            poller: DeletionPoller::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_deletion_poller(mut self, poller: DeletionPoller) -> Self {
        self.poller = poller;
        self
    }

    /// Create the application and return the observed record.
    ///
    /// The create call is retried through the permission-propagation window,
    /// since a freshly granted execution role is the most common reason a
    /// first create bounces.
    pub async fn create(&self, spec: &AppSpec) -> Result<ApplicationRecord, ReconcileError> {
        spec.validate()?;

        let request = mapper::create_request(spec);
        let response = self
            .retry
            .run(|| self.client.create_application(&request))
            .await
            .map_err(|err| ReconcileError::api("creating application", err))?;
        info!(application = %spec.name, arn = %response.arn, "created application");

        self.read(&spec.name).await
    }

    /// Read the current remote state, tags included.
    pub async fn read(&self, name: &str) -> Result<ApplicationRecord, ReconcileError> {
        let detail = self
            .client
            .describe_application(name)
            .await
            .map_err(|err| ReconcileError::api("describing application", err))?;
        let mut record = mapper::record_from_detail(&detail)?;

        record.spec.tags = self
            .client
            .list_tags(&detail.arn)
            .await
            .map_err(|err| ReconcileError::api("listing tags", err))?;
        Ok(record)
    }

    /// Refresh a held record from the remote state. Returns `false` and
    /// clears the record's identity when the application no longer exists,
    /// so the caller can schedule a re-create instead of failing.
    pub async fn refresh(&self, record: &mut ApplicationRecord) -> Result<bool, ReconcileError> {
        match self.read(&record.spec.name).await {
            Ok(fresh) => {
                *record = fresh;
                Ok(true)
            }
            Err(err) if err.is_not_found() => {
                warn!(application = %record.spec.name, "application disappeared remotely");
                record.clear_identity();
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    /// Converge the remote application to `desired` and return the fresh
    /// record. A no-op when nothing differs.
    pub async fn update(&self, desired: &AppSpec) -> Result<ApplicationRecord, ReconcileError> {
        desired.validate()?;

        let detail = self
            .client
            .describe_application(&desired.name)
            .await
            .map_err(|err| ReconcileError::api("describing application", err))?;

        let operations = diff::plan(desired, &detail)?;
        debug!(
            application = %desired.name,
            operations = operations.len(),
            "planned reconciliation pass"
        );

        let mut tracker = VersionTracker::new(detail.version_id);
        MutationDispatcher::with_retry_policy(&self.client, self.retry)
            .apply(&desired.name, &mut tracker, &operations)
            .await?;

        self.reconcile_tags(&detail.arn, &desired.tags).await?;
        self.read(&desired.name).await
    }

    /// Delete the application and wait until it is gone. Deleting an
    /// application that no longer exists succeeds.
    pub async fn delete(
        &self,
        name: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), ReconcileError> {
        match self.client.delete_application(name, created_at).await {
            Ok(()) => {}
            Err(err) if err.code == streamplane_api::ErrorCode::NotFound => {
                debug!(application = name, "application already deleted");
                return Ok(());
            }
            Err(err) => return Err(ReconcileError::api("deleting application", err)),
        }

        self.poller.wait_until_deleted(&self.client, name).await
    }

    /// Bring remote tags in line with the desired set.
    async fn reconcile_tags(
        &self,
        arn: &str,
        desired: &BTreeMap<String, String>,
    ) -> Result<(), ReconcileError> {
        let current = self
            .client
            .list_tags(arn)
            .await
            .map_err(|err| ReconcileError::api("listing tags", err))?;

        let (remove, upsert) = tag_changes(&current, desired);
        if remove.is_empty() && upsert.is_empty() {
            return Ok(());
        }

        self.client
            .update_tags(arn, &remove, &upsert)
            .await
            .map_err(|err| ReconcileError::api("updating tags", err))
    }
}

fn tag_changes(
    current: &BTreeMap<String, String>,
    desired: &BTreeMap<String, String>,
) -> (Vec<String>, BTreeMap<String, String>) {
    let remove = current
        .keys()
        .filter(|key| !desired.contains_key(*key))
        .cloned()
        .collect();
    let upsert = desired
        .iter()
        .filter(|(key, value)| current.get(*key) != Some(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    (remove, upsert)
}

/// Derive the application name from an opaque compound import id.
///
/// Import ids are colon-separated; the last segment identifies the resource
/// and may carry an `application/` type prefix.
pub fn import_application_name(id: &str) -> Result<String, ReconcileError> {
    let last = id
        .rsplit(':')
        .next()
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| ReconcileError::InvalidImportId(id.to_string()))?;

    let name = last.strip_prefix("application/").unwrap_or(last);
    if name.is_empty() || name.contains('/') {
        return Err(ReconcileError::InvalidImportId(id.to_string()));
    }
    Ok(name.to_string())
}
