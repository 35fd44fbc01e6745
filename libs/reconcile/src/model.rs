//! Domain model for a declared streaming application.
//!
//! [`AppSpec`] is the desired configuration supplied by the caller;
//! [`ApplicationRecord`] is the declared record an external framework holds,
//! combining the spec with read-only fields observed from the control plane.
//! Invalid combinations (two runtime families, inline code plus an object
//! reference) are unrepresentable by construction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use streamplane_api::types::{ApplicationStatus, PropertyGroup};

use crate::error::ReconcileError;

/// Maximum number of output destinations an application may declare.
pub const MAX_OUTPUTS: usize = 3;

/// Runtime environment of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeEnvironment {
    /// SQL runtime family.
    Sql1_0,
    /// Streaming-engine runtime family.
    Streams1_6,
    Streams1_8,
}

impl RuntimeEnvironment {
    pub fn as_wire(&self) -> &'static str {
        match self {
            RuntimeEnvironment::Sql1_0 => "SQL-1_0",
            RuntimeEnvironment::Streams1_6 => "STREAMS-1_6",
            RuntimeEnvironment::Streams1_8 => "STREAMS-1_8",
        }
    }

    pub fn from_wire(s: &str) -> Result<Self, ReconcileError> {
        match s {
            "SQL-1_0" => Ok(RuntimeEnvironment::Sql1_0),
            "STREAMS-1_6" => Ok(RuntimeEnvironment::Streams1_6),
            "STREAMS-1_8" => Ok(RuntimeEnvironment::Streams1_8),
            other => Err(ReconcileError::InvalidSpec(format!(
                "unknown runtime environment: {other}"
            ))),
        }
    }

    /// True for the streaming-engine family.
    pub fn is_streams(&self) -> bool {
        matches!(
            self,
            RuntimeEnvironment::Streams1_6 | RuntimeEnvironment::Streams1_8
        )
    }
}

impl std::fmt::Display for RuntimeEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_wire())
    }
}

/// Encoding of the application code payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeContentType {
    PlainText,
    Zip,
}

impl CodeContentType {
    pub fn as_wire(&self) -> &'static str {
        match self {
            CodeContentType::PlainText => "PLAINTEXT",
            CodeContentType::Zip => "ZIPFILE",
        }
    }

    pub fn from_wire(s: &str) -> Result<Self, ReconcileError> {
        match s {
            "PLAINTEXT" => Ok(CodeContentType::PlainText),
            "ZIPFILE" => Ok(CodeContentType::Zip),
            other => Err(ReconcileError::InvalidSpec(format!(
                "unknown code content type: {other}"
            ))),
        }
    }
}

/// Where the application code comes from. Inline text and an object-store
/// reference are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeSource {
    Inline(String),
    Object {
        bucket_arn: String,
        file_key: String,
        object_version: Option<String>,
    },
}

/// The runtime-family sub-configuration. Exactly one variant is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RuntimeConfig {
    Sql(SqlRuntimeConfig),
    Streams(StreamsRuntimeConfig),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlRuntimeConfig {
    pub input: Option<Input>,
    pub outputs: Vec<Output>,
    pub reference_data_source: Option<ReferenceDataSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamsRuntimeConfig {
    pub checkpoint: Option<CheckpointConfig>,
    pub monitoring: Option<MonitoringConfig>,
    pub parallelism: Option<ParallelismConfig>,
}

/// Whether a block uses service defaults or caller-supplied values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigurationType {
    Default,
    Custom,
}

impl ConfigurationType {
    pub fn as_wire(&self) -> &'static str {
        match self {
            ConfigurationType::Default => "DEFAULT",
            ConfigurationType::Custom => "CUSTOM",
        }
    }

    pub fn from_wire(s: &str) -> Result<Self, ReconcileError> {
        match s {
            "DEFAULT" => Ok(ConfigurationType::Default),
            "CUSTOM" => Ok(ConfigurationType::Custom),
            other => Err(ReconcileError::InvalidSpec(format!(
                "unknown configuration type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    pub configuration_type: Option<ConfigurationType>,
    pub checkpointing_enabled: Option<bool>,
    pub checkpoint_interval_ms: Option<u64>,
    pub min_pause_between_checkpoints_ms: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub configuration_type: Option<ConfigurationType>,
    pub log_level: String,
    pub metrics_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelismConfig {
    pub configuration_type: Option<ConfigurationType>,
    pub autoscaling_enabled: Option<bool>,
    pub parallelism: u32,
    pub parallelism_per_unit: u32,
}

/// Source a SQL input reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamSource {
    Stream(String),
    DeliveryStream(String),
}

/// A streaming input. `id`, `starting_position` and `in_app_stream_names`
/// are assigned by the control plane and never declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub id: Option<String>,
    pub name_prefix: String,
    pub source: StreamSource,
    pub parallelism_count: Option<u32>,
    pub processing_function_arn: Option<String>,
    pub schema: SourceSchema,
    pub starting_position: Option<String>,
    pub in_app_stream_names: Vec<String>,
}

impl Input {
    /// Equality over declared fields only.
    pub fn same_config(&self, other: &Input) -> bool {
        self.name_prefix == other.name_prefix
            && self.source == other.source
            && self.parallelism_count == other.parallelism_count
            && self.processing_function_arn == other.processing_function_arn
            && self.schema == other.schema
    }
}

/// Destination an output writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputDestination {
    Stream(String),
    DeliveryStream(String),
    Function(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordFormatType {
    Csv,
    Json,
}

impl RecordFormatType {
    pub fn as_wire(&self) -> &'static str {
        match self {
            RecordFormatType::Csv => "CSV",
            RecordFormatType::Json => "JSON",
        }
    }

    pub fn from_wire(s: &str) -> Result<Self, ReconcileError> {
        match s {
            "CSV" => Ok(RecordFormatType::Csv),
            "JSON" => Ok(RecordFormatType::Json),
            other => Err(ReconcileError::InvalidSpec(format!(
                "unknown record format type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    pub id: Option<String>,
    pub name: String,
    pub destination: OutputDestination,
    pub record_format_type: Option<RecordFormatType>,
}

impl Output {
    /// Equality over declared fields only.
    pub fn same_config(&self, other: &Output) -> bool {
        self.name == other.name
            && self.destination == other.destination
            && self.record_format_type == other.record_format_type
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDataSource {
    pub id: Option<String>,
    pub table_name: String,
    pub bucket_arn: String,
    pub file_key: String,
    pub schema: SourceSchema,
}

impl ReferenceDataSource {
    /// Equality over declared fields only.
    pub fn same_config(&self, other: &ReferenceDataSource) -> bool {
        self.table_name == other.table_name
            && self.bucket_arn == other.bucket_arn
            && self.file_key == other.file_key
            && self.schema == other.schema
    }
}

/// Record schema of an input or reference data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSchema {
    pub columns: Vec<RecordColumn>,
    pub encoding: Option<String>,
    pub mapping: Option<RecordMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordColumn {
    pub name: String,
    pub sql_type: String,
    pub mapping: Option<String>,
}

/// How records are delimited. The record format type is derived from the
/// variant rather than declared separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordMapping {
    Csv {
        column_delimiter: String,
        row_delimiter: String,
    },
    Json {
        row_path: String,
    },
}

impl RecordMapping {
    pub fn format_type(&self) -> RecordFormatType {
        match self {
            RecordMapping::Csv { .. } => RecordFormatType::Csv,
            RecordMapping::Json { .. } => RecordFormatType::Json,
        }
    }
}

/// A log sink routing application events to a log stream. `id` is assigned
/// by the control plane on first attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSink {
    pub id: Option<String>,
    pub log_stream_arn: String,
}

/// Desired configuration for one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSpec {
    pub name: String,
    pub description: Option<String>,
    pub execution_role_arn: String,
    pub runtime: RuntimeEnvironment,
    pub code_content_type: CodeContentType,
    pub code: Option<CodeSource>,
    pub runtime_config: RuntimeConfig,
    pub log_sink: Option<LogSink>,
    pub property_groups: Vec<PropertyGroup>,
    pub snapshots_enabled: Option<bool>,
    pub tags: BTreeMap<String, String>,
}

impl AppSpec {
    /// Check structural invariants the type system cannot carry.
    pub fn validate(&self) -> Result<(), ReconcileError> {
        match (&self.runtime_config, self.runtime.is_streams()) {
            (RuntimeConfig::Sql(_), true) => {
                return Err(ReconcileError::InvalidSpec(format!(
                    "runtime {} requires a streams configuration, found sql",
                    self.runtime
                )));
            }
            (RuntimeConfig::Streams(_), false) => {
                return Err(ReconcileError::InvalidSpec(format!(
                    "runtime {} requires a sql configuration, found streams",
                    self.runtime
                )));
            }
            _ => {}
        }

        if let RuntimeConfig::Sql(sql) = &self.runtime_config {
            if sql.outputs.len() > MAX_OUTPUTS {
                return Err(ReconcileError::InvalidSpec(format!(
                    "at most {MAX_OUTPUTS} outputs are allowed, {} declared",
                    sql.outputs.len()
                )));
            }
        }

        Ok(())
    }
}

/// The declared record held by the external framework: the spec plus the
/// read-only fields last observed from the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    /// Opaque identity assigned on creation; `None` until created or after
    /// the application disappears remotely.
    pub arn: Option<String>,
    pub spec: AppSpec,
    pub status: Option<ApplicationStatus>,
    pub version: Option<u64>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ApplicationRecord {
    pub fn new(spec: AppSpec) -> Self {
        Self {
            arn: None,
            spec,
            status: None,
            version: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Forget the remote identity; used when a read finds nothing.
    pub fn clear_identity(&mut self) {
        self.arn = None;
        self.status = None;
        self.version = None;
        self.created_at = None;
        self.updated_at = None;
    }
}
