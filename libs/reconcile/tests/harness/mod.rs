//! In-memory control plane for exercising full reconciliation passes.
//!
//! Stores at most one application, enforces the version check on every
//! mutation, assigns sub-resource ids, and simulates asynchronous deletion.
//! Individual calls can be scripted to fail for retry and conflict
//! scenarios.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use streamplane_api::types::{
    ApplicationDetail, ApplicationStatus, CreateApplicationRequest, CreateApplicationResponse,
    InputDescription, InputSpec, LogSinkDescription, LogSinkSpec, OutputDescription, OutputSpec,
    ReferenceDataSourceSpec, SqlConfigurationDescription, UpdateApplicationRequest,
};
use streamplane_api::{ApiError, ControlPlane};

use streamplane_reconcile::model::{
    AppSpec, CodeContentType, CodeSource, Input, LogSink, RecordColumn, RecordMapping,
    RuntimeConfig, RuntimeEnvironment, SourceSchema, SqlRuntimeConfig, StreamSource,
};

pub fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 5, 10, 0, 0).unwrap()
}

/// An invalid-argument rejection shaped like a permission-propagation delay.
pub fn propagation_error() -> ApiError {
    ApiError::invalid_argument("the service doesn't have sufficient privileges to assume the role")
}

/// A minimal SQL application spec with one declared input.
pub fn spec_with_input(name: &str) -> AppSpec {
    AppSpec {
        name: name.into(),
        description: Some("order enrichment".into()),
        execution_role_arn: "arn:sp:iam::123:role/exec".into(),
        runtime: RuntimeEnvironment::Sql1_0,
        code_content_type: CodeContentType::PlainText,
        code: Some(CodeSource::Inline("SELECT STREAM * FROM source".into())),
        runtime_config: RuntimeConfig::Sql(SqlRuntimeConfig {
            input: Some(Input {
                id: None,
                name_prefix: "src".into(),
                source: StreamSource::Stream("arn:sp:stream:us:123:stream/orders".into()),
                parallelism_count: None,
                processing_function_arn: None,
                schema: SourceSchema {
                    columns: vec![RecordColumn {
                        name: "order_id".into(),
                        sql_type: "VARCHAR(16)".into(),
                        mapping: None,
                    }],
                    encoding: None,
                    mapping: Some(RecordMapping::Json {
                        row_path: "$".into(),
                    }),
                },
                starting_position: None,
                in_app_stream_names: vec![],
            }),
            outputs: vec![],
            reference_data_source: None,
        }),
        log_sink: None,
        property_groups: vec![],
        snapshots_enabled: None,
        tags: BTreeMap::from([("team".to_string(), "data".to_string())]),
    }
}

pub fn log_sink() -> LogSink {
    LogSink {
        id: None,
        log_stream_arn: "arn:sp:logs:us:123:stream/app".into(),
    }
}

struct StoredApp {
    detail: ApplicationDetail,
    tags: BTreeMap<String, String>,
    deleting: bool,
}

#[derive(Default)]
struct State {
    app: Option<StoredApp>,
    next_id: u32,
    calls: Vec<&'static str>,
    fail: HashMap<&'static str, VecDeque<ApiError>>,
    stuck_deleting: bool,
    pending_delete_polls: u32,
}

impl State {
    fn assign_id(&mut self) -> String {
        self.next_id += 1;
        format!("1.{}", self.next_id)
    }
}

/// Cloneable handle to one shared in-memory control plane.
#[derive(Clone, Default)]
pub struct FakeControlPlane {
    state: Arc<Mutex<State>>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next invocation of `op` to fail with `err`. Repeated
    /// scripts for the same operation are consumed in order.
    pub fn fail_next(&self, op: &'static str, err: ApiError) {
        self.state
            .lock()
            .unwrap()
            .fail
            .entry(op)
            .or_default()
            .push_back(err);
    }

    /// Make deletions hang in `DELETING` forever.
    pub fn stick_deletions(&self) {
        self.state.lock().unwrap().stuck_deleting = true;
    }

    /// Every call made so far, in order, including failed ones.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn stored_version(&self) -> Option<u64> {
        self.state
            .lock()
            .unwrap()
            .app
            .as_ref()
            .map(|a| a.detail.version_id)
    }

    fn begin(&self, op: &'static str) -> Result<(), ApiError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(op);
        if let Some(queue) = state.fail.get_mut(op) {
            if let Some(err) = queue.pop_front() {
                return Err(err);
            }
        }
        Ok(())
    }
}

fn check_version(detail: &ApplicationDetail, supplied: u64) -> Result<(), ApiError> {
    if supplied != detail.version_id {
        return Err(ApiError::conflict(format!(
            "version {supplied} is stale, current is {}",
            detail.version_id
        )));
    }
    Ok(())
}

#[async_trait]
impl ControlPlane for FakeControlPlane {
    async fn create_application(
        &self,
        request: &CreateApplicationRequest,
    ) -> Result<CreateApplicationResponse, ApiError> {
        self.begin("create")?;
        let mut state = self.state.lock().unwrap();
        if state.app.is_some() {
            return Err(ApiError::conflict(format!(
                "application {} already exists",
                request.name
            )));
        }

        let arn = format!("arn:sp:analytics:us:123:application/{}", request.name);
        let sql = request.configuration.sql.clone().map(|sql| {
            let mut desc = SqlConfigurationDescription::default();
            for spec in sql.inputs {
                let id = state.assign_id();
                desc.inputs.push(input_description(id, spec));
            }
            for spec in sql.outputs {
                let id = state.assign_id();
                desc.outputs.push(OutputDescription { id, spec });
            }
            for spec in sql.reference_data_sources {
                let id = state.assign_id();
                desc.reference_data_sources
                    .push(streamplane_api::types::ReferenceDataSourceDescription { id, spec });
            }
            desc
        });
        let log_sinks = request
            .log_sinks
            .iter()
            .map(|sink| {
                let id = state.assign_id();
                LogSinkDescription {
                    id,
                    log_stream_arn: sink.log_stream_arn.clone(),
                }
            })
            .collect();

        let detail = ApplicationDetail {
            arn: arn.clone(),
            name: request.name.clone(),
            description: request.description.clone(),
            runtime: request.runtime.clone(),
            execution_role_arn: request.execution_role_arn.clone(),
            status: ApplicationStatus::Running,
            version_id: 1,
            created_at: created_at(),
            updated_at: None,
            code: request.configuration.code.clone(),
            property_groups: request.configuration.property_groups.clone(),
            snapshots_enabled: request.configuration.snapshots_enabled,
            sql,
            streams: request.configuration.streams.clone(),
            log_sinks,
        };
        state.app = Some(StoredApp {
            detail,
            tags: request.tags.clone(),
            deleting: false,
        });
        Ok(CreateApplicationResponse { arn, version_id: 1 })
    }

    async fn describe_application(&self, name: &str) -> Result<ApplicationDetail, ApiError> {
        self.begin("describe")?;
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let Some(stored) = state.app.as_mut() else {
            return Err(ApiError::not_found(format!("no application named {name}")));
        };
        if stored.detail.name != name {
            return Err(ApiError::not_found(format!("no application named {name}")));
        }
        if !stored.deleting {
            return Ok(stored.detail.clone());
        }
        let mut detail = stored.detail.clone();
        detail.status = ApplicationStatus::Deleting;
        if state.stuck_deleting {
            return Ok(detail);
        }
        if state.pending_delete_polls > 0 {
            state.pending_delete_polls -= 1;
            return Ok(detail);
        }
        state.app = None;
        Err(ApiError::not_found(format!("no application named {name}")))
    }

    async fn update_application(
        &self,
        _name: &str,
        request: &UpdateApplicationRequest,
    ) -> Result<(), ApiError> {
        self.begin("update")?;
        let mut state = self.state.lock().unwrap();
        let Some(stored) = state.app.as_mut() else {
            return Err(ApiError::not_found("no application"));
        };
        check_version(&stored.detail, request.current_version)?;

        let delta = &request.delta;
        if let Some(code) = &delta.code {
            stored.detail.code = Some(code.clone());
        }
        if let Some(groups) = &delta.property_groups {
            stored.detail.property_groups = groups.clone();
        }
        if let Some(enabled) = delta.snapshots_enabled {
            stored.detail.snapshots_enabled = Some(enabled);
        }
        if let Some(streams) = &delta.streams {
            stored.detail.streams = Some(streams.clone());
        }
        stored.detail.version_id += 1;
        stored.detail.updated_at = Some(created_at());
        Ok(())
    }

    async fn add_log_sink(
        &self,
        _name: &str,
        current_version: u64,
        sink: &LogSinkSpec,
    ) -> Result<(), ApiError> {
        self.begin("add_log_sink")?;
        let mut state = self.state.lock().unwrap();
        let id = state.assign_id();
        let Some(stored) = state.app.as_mut() else {
            return Err(ApiError::not_found("no application"));
        };
        check_version(&stored.detail, current_version)?;
        if !stored.detail.log_sinks.is_empty() {
            return Err(ApiError::invalid_argument("a log sink is already attached"));
        }
        stored.detail.log_sinks.push(LogSinkDescription {
            id,
            log_stream_arn: sink.log_stream_arn.clone(),
        });
        stored.detail.version_id += 1;
        Ok(())
    }

    async fn add_input(
        &self,
        _name: &str,
        current_version: u64,
        input: &InputSpec,
    ) -> Result<(), ApiError> {
        self.begin("add_input")?;
        let mut state = self.state.lock().unwrap();
        let id = state.assign_id();
        let Some(stored) = state.app.as_mut() else {
            return Err(ApiError::not_found("no application"));
        };
        check_version(&stored.detail, current_version)?;
        let sql = stored.detail.sql.get_or_insert_with(Default::default);
        if !sql.inputs.is_empty() {
            return Err(ApiError::invalid_argument("an input is already attached"));
        }
        sql.inputs.push(input_description(id, input.clone()));
        stored.detail.version_id += 1;
        Ok(())
    }

    async fn add_output(
        &self,
        _name: &str,
        current_version: u64,
        output: &OutputSpec,
    ) -> Result<(), ApiError> {
        self.begin("add_output")?;
        let mut state = self.state.lock().unwrap();
        let id = state.assign_id();
        let Some(stored) = state.app.as_mut() else {
            return Err(ApiError::not_found("no application"));
        };
        check_version(&stored.detail, current_version)?;
        let sql = stored.detail.sql.get_or_insert_with(Default::default);
        sql.outputs.push(OutputDescription {
            id,
            spec: output.clone(),
        });
        stored.detail.version_id += 1;
        Ok(())
    }

    async fn add_reference_data_source(
        &self,
        _name: &str,
        current_version: u64,
        source: &ReferenceDataSourceSpec,
    ) -> Result<(), ApiError> {
        self.begin("add_reference")?;
        let mut state = self.state.lock().unwrap();
        let id = state.assign_id();
        let Some(stored) = state.app.as_mut() else {
            return Err(ApiError::not_found("no application"));
        };
        check_version(&stored.detail, current_version)?;
        let sql = stored.detail.sql.get_or_insert_with(Default::default);
        if !sql.reference_data_sources.is_empty() {
            return Err(ApiError::invalid_argument(
                "a reference data source is already attached",
            ));
        }
        sql.reference_data_sources
            .push(streamplane_api::types::ReferenceDataSourceDescription {
                id,
                spec: source.clone(),
            });
        stored.detail.version_id += 1;
        Ok(())
    }

    async fn delete_application(
        &self,
        name: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), ApiError> {
        self.begin("delete")?;
        let mut state = self.state.lock().unwrap();
        let Some(stored) = state.app.as_mut() else {
            return Err(ApiError::not_found(format!("no application named {name}")));
        };
        if stored.detail.created_at != created_at {
            return Err(ApiError::invalid_argument(
                "created_at does not match the application",
            ));
        }
        stored.deleting = true;
        state.pending_delete_polls = 2;
        Ok(())
    }

    async fn list_tags(&self, _arn: &str) -> Result<BTreeMap<String, String>, ApiError> {
        self.begin("list_tags")?;
        let state = self.state.lock().unwrap();
        let Some(stored) = state.app.as_ref() else {
            return Err(ApiError::not_found("no application"));
        };
        Ok(stored.tags.clone())
    }

    async fn update_tags(
        &self,
        _arn: &str,
        remove: &[String],
        upsert: &BTreeMap<String, String>,
    ) -> Result<(), ApiError> {
        self.begin("update_tags")?;
        let mut state = self.state.lock().unwrap();
        let Some(stored) = state.app.as_mut() else {
            return Err(ApiError::not_found("no application"));
        };
        for key in remove {
            stored.tags.remove(key);
        }
        stored
            .tags
            .extend(upsert.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }
}

fn input_description(id: String, spec: InputSpec) -> InputDescription {
    let stream_names = vec![format!("{}_001", spec.name_prefix)];
    InputDescription {
        id,
        spec,
        starting_position: Some("NOW".into()),
        in_app_stream_names: stream_names,
    }
}
