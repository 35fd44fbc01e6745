//! The control-plane operation contract.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::ApiError;
use crate::types::{
    ApplicationDetail, CreateApplicationRequest, CreateApplicationResponse, InputSpec, LogSinkSpec,
    OutputSpec, ReferenceDataSourceSpec, UpdateApplicationRequest,
};

/// Typed client for the streamplane application API.
///
/// Every mutating call except `create_application` carries the caller's
/// last-known application version; a stale version fails with
/// [`ErrorCode::Conflict`](crate::ErrorCode::Conflict). The `add_*` calls
/// fail if the targeted sub-resource slot is already populated -- the API
/// offers no combined upsert.
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// Create a new application. Fails with `Conflict` if an application of
    /// the same name exists.
    async fn create_application(
        &self,
        request: &CreateApplicationRequest,
    ) -> Result<CreateApplicationResponse, ApiError>;

    /// Describe the named application. Fails with `NotFound` if absent.
    async fn describe_application(&self, name: &str) -> Result<ApplicationDetail, ApiError>;

    /// Apply a partial configuration update.
    async fn update_application(
        &self,
        name: &str,
        request: &UpdateApplicationRequest,
    ) -> Result<(), ApiError>;

    /// Attach a log sink. The observed log-sink slot must be empty.
    async fn add_log_sink(
        &self,
        name: &str,
        current_version: u64,
        sink: &LogSinkSpec,
    ) -> Result<(), ApiError>;

    /// Attach a streaming input. The observed input slot must be empty.
    async fn add_input(
        &self,
        name: &str,
        current_version: u64,
        input: &InputSpec,
    ) -> Result<(), ApiError>;

    /// Attach one output destination.
    async fn add_output(
        &self,
        name: &str,
        current_version: u64,
        output: &OutputSpec,
    ) -> Result<(), ApiError>;

    /// Attach a reference data source. The observed slot must be empty.
    async fn add_reference_data_source(
        &self,
        name: &str,
        current_version: u64,
        source: &ReferenceDataSourceSpec,
    ) -> Result<(), ApiError>;

    /// Delete the application. `created_at` must match the application's
    /// creation timestamp exactly. Fails with `NotFound` if already gone;
    /// deletion itself completes asynchronously.
    async fn delete_application(&self, name: &str, created_at: DateTime<Utc>)
        -> Result<(), ApiError>;

    /// List the tags attached to the resource identified by `arn`.
    async fn list_tags(&self, arn: &str) -> Result<BTreeMap<String, String>, ApiError>;

    /// Remove the named tag keys and upsert the given tag pairs.
    async fn update_tags(
        &self,
        arn: &str,
        remove: &[String],
        upsert: &BTreeMap<String, String>,
    ) -> Result<(), ApiError>;
}
