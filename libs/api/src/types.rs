//! Wire types for the streamplane application API.
//!
//! Requests are spec-shaped (what the caller wants), responses are
//! description-shaped (what the control plane observed, including assigned
//! sub-resource ids, status, version and timestamps).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Creating,
    Ready,
    Running,
    Updating,
    Deleting,
    Failed,
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationStatus::Creating => write!(f, "CREATING"),
            ApplicationStatus::Ready => write!(f, "READY"),
            ApplicationStatus::Running => write!(f, "RUNNING"),
            ApplicationStatus::Updating => write!(f, "UPDATING"),
            ApplicationStatus::Deleting => write!(f, "DELETING"),
            ApplicationStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// A named group of key/value properties passed to the application runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyGroup {
    pub group_id: String,
    pub properties: BTreeMap<String, String>,
}

// =============================================================================
// Requests
// =============================================================================

/// Payload for `create_application`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplicationRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub runtime: String,
    pub execution_role_arn: String,
    pub configuration: ConfigurationSpec,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log_sinks: Vec<LogSinkSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

/// Full configuration block supplied on create.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigurationSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeContentSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_groups: Vec<PropertyGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshots_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<SqlConfigurationSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streams: Option<StreamsConfigurationSpec>,
}

/// Application code, either inline or referencing a stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeContentSpec {
    pub content_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_location: Option<ObjectLocation>,
}

/// Location of a code object in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket_arn: String,
    pub file_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SqlConfigurationSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_data_sources: Vec<ReferenceDataSourceSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamsConfigurationSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<CheckpointSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring: Option<MonitoringSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<ParallelismSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpointing_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_interval_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_pause_between_checkpoints_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_type: Option<String>,
    pub log_level: String,
    pub metrics_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelismSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autoscaling_enabled: Option<bool>,
    pub parallelism: u32,
    pub parallelism_per_unit: u32,
}

/// A streaming input attached to a SQL application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSpec {
    pub name_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_stream_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing_function_arn: Option<String>,
    pub schema: SchemaSpec,
}

/// A destination attached to a SQL application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_stream_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_format_type: Option<String>,
}

/// A static reference table backed by an object-store file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDataSourceSpec {
    pub table_name: String,
    pub bucket_arn: String,
    pub file_key: String,
    pub schema: SchemaSpec,
}

/// Record schema shared by inputs and reference data sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSpec {
    pub columns: Vec<RecordColumnSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    pub format: RecordFormatSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordColumnSpec {
    pub name: String,
    pub sql_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFormatSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_mapping: Option<CsvMappingSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_mapping: Option<JsonMappingSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvMappingSpec {
    pub record_column_delimiter: String,
    pub record_row_delimiter: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonMappingSpec {
    pub record_row_path: String,
}

/// A log sink routing application events to a log stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSinkSpec {
    pub log_stream_arn: String,
}

/// Payload for `update_application`.
///
/// The control plane applies only the populated parts; the version must
/// match the remote side exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateApplicationRequest {
    pub current_version: u64,
    pub delta: ConfigurationDelta,
}

/// Partial configuration carried by an update call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationDelta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeContentSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_groups: Option<Vec<PropertyGroup>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshots_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streams: Option<StreamsConfigurationSpec>,
}

impl ConfigurationDelta {
    /// True when the delta carries no change at all.
    pub fn is_empty(&self) -> bool {
        self.code.is_none()
            && self.property_groups.is_none()
            && self.snapshots_enabled.is_none()
            && self.streams.is_none()
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Response to `create_application`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateApplicationResponse {
    pub arn: String,
    pub version_id: u64,
}

/// Observed state of an application as described by the control plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDetail {
    pub arn: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub runtime: String,
    pub execution_role_arn: String,
    pub status: ApplicationStatus,
    pub version_id: u64,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeContentSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_groups: Vec<PropertyGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshots_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<SqlConfigurationDescription>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub streams: Option<StreamsConfigurationSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log_sinks: Vec<LogSinkDescription>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SqlConfigurationDescription {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputDescription>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputDescription>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_data_sources: Vec<ReferenceDataSourceDescription>,
}

/// An input as observed, including control-plane-assigned fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputDescription {
    pub id: String,
    #[serde(flatten)]
    pub spec: InputSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_position: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub in_app_stream_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDescription {
    pub id: String,
    #[serde(flatten)]
    pub spec: OutputSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceDataSourceDescription {
    pub id: String,
    #[serde(flatten)]
    pub spec: ReferenceDataSourceSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSinkDescription {
    pub id: String,
    pub log_stream_arn: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_deserializes_with_flattened_sub_resources() {
        let json = r#"{
            "arn": "arn:sp:analytics:us:123:application/orders",
            "name": "orders",
            "runtime": "SQL-1_0",
            "execution_role_arn": "arn:sp:iam::123:role/exec",
            "status": "RUNNING",
            "version_id": 4,
            "created_at": "2026-01-12T08:30:00Z",
            "sql": {
                "inputs": [{
                    "id": "1.1",
                    "name_prefix": "src",
                    "stream_arn": "arn:sp:stream:us:123:stream/orders",
                    "schema": {
                        "columns": [{"name": "order_id", "sql_type": "VARCHAR(16)"}],
                        "format": {
                            "format_type": "JSON",
                            "json_mapping": {"record_row_path": "$"}
                        }
                    }
                }]
            },
            "log_sinks": [{"id": "2.1", "log_stream_arn": "arn:sp:logs:us:123:stream/app"}]
        }"#;

        let detail: ApplicationDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.status, ApplicationStatus::Running);
        assert_eq!(detail.version_id, 4);
        let sql = detail.sql.unwrap();
        assert_eq!(sql.inputs[0].id, "1.1");
        assert_eq!(sql.inputs[0].spec.name_prefix, "src");
        assert_eq!(detail.log_sinks[0].id, "2.1");
    }

    #[test]
    fn empty_delta_reports_empty() {
        assert!(ConfigurationDelta::default().is_empty());
        let delta = ConfigurationDelta {
            snapshots_enabled: Some(true),
            ..Default::default()
        };
        assert!(!delta.is_empty());
    }
}
