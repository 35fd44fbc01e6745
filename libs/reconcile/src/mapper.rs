//! Conversion between the domain model and the wire types.
//!
//! Domain-to-wire feeds create and mutation payloads; wire-to-domain maps an
//! observed [`ApplicationDetail`] back into a declared record. Both
//! directions are total and deterministic, and round-tripping an observed
//! application reproduces every field that is not assigned by the control
//! plane.

use streamplane_api::types::{
    ApplicationDetail, CodeContentSpec, ConfigurationSpec, CreateApplicationRequest,
    CsvMappingSpec, InputDescription, InputSpec, JsonMappingSpec, LogSinkSpec, ObjectLocation,
    OutputDescription, OutputSpec, RecordColumnSpec, RecordFormatSpec,
    ReferenceDataSourceDescription, ReferenceDataSourceSpec, SchemaSpec, SqlConfigurationSpec,
    StreamsConfigurationSpec,
};

use crate::error::ReconcileError;
use crate::model::{
    AppSpec, ApplicationRecord, CheckpointConfig, CodeContentType, CodeSource, ConfigurationType,
    Input, LogSink, MonitoringConfig, Output, OutputDestination, ParallelismConfig, RecordColumn,
    RecordMapping, ReferenceDataSource, RuntimeConfig, RuntimeEnvironment, SourceSchema,
    SqlRuntimeConfig, StreamSource, StreamsRuntimeConfig,
};

// =============================================================================
// Domain -> wire
// =============================================================================

/// Build the create payload for a desired application.
pub fn create_request(spec: &AppSpec) -> CreateApplicationRequest {
    CreateApplicationRequest {
        name: spec.name.clone(),
        description: spec.description.clone(),
        runtime: spec.runtime.as_wire().to_string(),
        execution_role_arn: spec.execution_role_arn.clone(),
        configuration: configuration_spec(spec),
        log_sinks: spec.log_sink.iter().map(log_sink_spec).collect(),
        tags: spec.tags.clone(),
    }
}

fn configuration_spec(spec: &AppSpec) -> ConfigurationSpec {
    let (sql, streams) = match &spec.runtime_config {
        RuntimeConfig::Sql(sql) => (Some(sql_spec(sql)), None),
        RuntimeConfig::Streams(streams) => (None, Some(streams_spec(streams))),
    };
    ConfigurationSpec {
        code: Some(code_spec(spec)),
        property_groups: spec.property_groups.clone(),
        snapshots_enabled: spec.snapshots_enabled,
        sql,
        streams,
    }
}

pub fn code_spec(spec: &AppSpec) -> CodeContentSpec {
    let (text_content, object_location) = match &spec.code {
        Some(CodeSource::Inline(text)) => (Some(text.clone()), None),
        Some(CodeSource::Object {
            bucket_arn,
            file_key,
            object_version,
        }) => (
            None,
            Some(ObjectLocation {
                bucket_arn: bucket_arn.clone(),
                file_key: file_key.clone(),
                object_version: object_version.clone(),
            }),
        ),
        None => (None, None),
    };
    CodeContentSpec {
        content_type: spec.code_content_type.as_wire().to_string(),
        text_content,
        object_location,
    }
}

fn sql_spec(sql: &SqlRuntimeConfig) -> SqlConfigurationSpec {
    SqlConfigurationSpec {
        inputs: sql.input.iter().map(input_spec).collect(),
        outputs: sql.outputs.iter().map(output_spec).collect(),
        reference_data_sources: sql
            .reference_data_source
            .iter()
            .map(reference_spec)
            .collect(),
    }
}

pub fn streams_spec(streams: &StreamsRuntimeConfig) -> StreamsConfigurationSpec {
    StreamsConfigurationSpec {
        checkpoint: streams.checkpoint.as_ref().map(|c| {
            streamplane_api::types::CheckpointSpec {
                configuration_type: c.configuration_type.map(|t| t.as_wire().to_string()),
                checkpointing_enabled: c.checkpointing_enabled,
                checkpoint_interval_ms: c.checkpoint_interval_ms,
                min_pause_between_checkpoints_ms: c.min_pause_between_checkpoints_ms,
            }
        }),
        monitoring: streams.monitoring.as_ref().map(|m| {
            streamplane_api::types::MonitoringSpec {
                configuration_type: m.configuration_type.map(|t| t.as_wire().to_string()),
                log_level: m.log_level.clone(),
                metrics_level: m.metrics_level.clone(),
            }
        }),
        parallelism: streams.parallelism.as_ref().map(|p| {
            streamplane_api::types::ParallelismSpec {
                configuration_type: p.configuration_type.map(|t| t.as_wire().to_string()),
                autoscaling_enabled: p.autoscaling_enabled,
                parallelism: p.parallelism,
                parallelism_per_unit: p.parallelism_per_unit,
            }
        }),
    }
}

pub fn input_spec(input: &Input) -> InputSpec {
    let (stream_arn, delivery_stream_arn) = match &input.source {
        StreamSource::Stream(arn) => (Some(arn.clone()), None),
        StreamSource::DeliveryStream(arn) => (None, Some(arn.clone())),
    };
    InputSpec {
        name_prefix: input.name_prefix.clone(),
        stream_arn,
        delivery_stream_arn,
        parallelism_count: input.parallelism_count,
        processing_function_arn: input.processing_function_arn.clone(),
        schema: schema_spec(&input.schema),
    }
}

pub fn output_spec(output: &Output) -> OutputSpec {
    let (stream_arn, delivery_stream_arn, function_arn) = match &output.destination {
        OutputDestination::Stream(arn) => (Some(arn.clone()), None, None),
        OutputDestination::DeliveryStream(arn) => (None, Some(arn.clone()), None),
        OutputDestination::Function(arn) => (None, None, Some(arn.clone())),
    };
    OutputSpec {
        name: output.name.clone(),
        stream_arn,
        delivery_stream_arn,
        function_arn,
        record_format_type: output.record_format_type.map(|t| t.as_wire().to_string()),
    }
}

pub fn reference_spec(source: &ReferenceDataSource) -> ReferenceDataSourceSpec {
    ReferenceDataSourceSpec {
        table_name: source.table_name.clone(),
        bucket_arn: source.bucket_arn.clone(),
        file_key: source.file_key.clone(),
        schema: schema_spec(&source.schema),
    }
}

pub fn log_sink_spec(sink: &LogSink) -> LogSinkSpec {
    LogSinkSpec {
        log_stream_arn: sink.log_stream_arn.clone(),
    }
}

fn schema_spec(schema: &SourceSchema) -> SchemaSpec {
    let (csv_mapping, json_mapping) = match &schema.mapping {
        Some(RecordMapping::Csv {
            column_delimiter,
            row_delimiter,
        }) => (
            Some(CsvMappingSpec {
                record_column_delimiter: column_delimiter.clone(),
                record_row_delimiter: row_delimiter.clone(),
            }),
            None,
        ),
        Some(RecordMapping::Json { row_path }) => (
            None,
            Some(JsonMappingSpec {
                record_row_path: row_path.clone(),
            }),
        ),
        None => (None, None),
    };
    SchemaSpec {
        columns: schema
            .columns
            .iter()
            .map(|c| RecordColumnSpec {
                name: c.name.clone(),
                sql_type: c.sql_type.clone(),
                mapping: c.mapping.clone(),
            })
            .collect(),
        encoding: schema.encoding.clone(),
        format: RecordFormatSpec {
            // The format type follows from the mapping variant.
            format_type: schema
                .mapping
                .as_ref()
                .map(|m| m.format_type().as_wire().to_string()),
            csv_mapping,
            json_mapping,
        },
    }
}

// =============================================================================
// Wire -> domain
// =============================================================================

/// Map an observed application into the declared record shape.
///
/// Tags are not part of the describe response; the caller lists them
/// separately.
pub fn record_from_detail(detail: &ApplicationDetail) -> Result<ApplicationRecord, ReconcileError> {
    let runtime = RuntimeEnvironment::from_wire(&detail.runtime)?;

    let runtime_config = if runtime.is_streams() {
        RuntimeConfig::Streams(
            detail
                .streams
                .as_ref()
                .map(streams_from_wire)
                .transpose()?
                .unwrap_or_default(),
        )
    } else {
        let sql = detail.sql.clone().unwrap_or_default();
        // Single-slot sub-resources; a second entry cannot be represented
        // and must not be silently truncated.
        if sql.inputs.len() > 1 {
            return Err(ReconcileError::InvalidSpec(format!(
                "observed application has {} inputs, at most one is supported",
                sql.inputs.len()
            )));
        }
        if sql.reference_data_sources.len() > 1 {
            return Err(ReconcileError::InvalidSpec(format!(
                "observed application has {} reference data sources, at most one is supported",
                sql.reference_data_sources.len()
            )));
        }
        RuntimeConfig::Sql(SqlRuntimeConfig {
            input: sql.inputs.first().map(input_from_description).transpose()?,
            outputs: sql
                .outputs
                .iter()
                .map(output_from_description)
                .collect::<Result<_, _>>()?,
            reference_data_source: sql
                .reference_data_sources
                .first()
                .map(reference_from_description)
                .transpose()?,
        })
    };

    if detail.log_sinks.len() > 1 {
        return Err(ReconcileError::InvalidSpec(format!(
            "observed application has {} log sinks, at most one is supported",
            detail.log_sinks.len()
        )));
    }

    let (code_content_type, code) = match &detail.code {
        Some(code) => code_from_wire(code)?,
        // Describe always reports the code block; tolerate its absence by
        // falling back to plain text with no content.
        None => (CodeContentType::PlainText, None),
    };

    let spec = AppSpec {
        name: detail.name.clone(),
        description: detail.description.clone(),
        execution_role_arn: detail.execution_role_arn.clone(),
        runtime,
        code_content_type,
        code,
        runtime_config,
        log_sink: detail.log_sinks.first().map(|s| LogSink {
            id: Some(s.id.clone()),
            log_stream_arn: s.log_stream_arn.clone(),
        }),
        property_groups: detail.property_groups.clone(),
        snapshots_enabled: detail.snapshots_enabled,
        tags: Default::default(),
    };

    Ok(ApplicationRecord {
        arn: Some(detail.arn.clone()),
        spec,
        status: Some(detail.status),
        version: Some(detail.version_id),
        created_at: Some(detail.created_at),
        updated_at: detail.updated_at,
    })
}

fn code_from_wire(
    code: &CodeContentSpec,
) -> Result<(CodeContentType, Option<CodeSource>), ReconcileError> {
    let content_type = CodeContentType::from_wire(&code.content_type)?;
    let source = match (&code.text_content, &code.object_location) {
        (Some(text), None) => Some(CodeSource::Inline(text.clone())),
        (None, Some(loc)) => Some(CodeSource::Object {
            bucket_arn: loc.bucket_arn.clone(),
            file_key: loc.file_key.clone(),
            object_version: loc.object_version.clone(),
        }),
        (None, None) => None,
        (Some(_), Some(_)) => {
            return Err(ReconcileError::InvalidSpec(
                "observed code carries both inline text and an object location".into(),
            ));
        }
    };
    Ok((content_type, source))
}

pub fn streams_from_wire(
    streams: &StreamsConfigurationSpec,
) -> Result<StreamsRuntimeConfig, ReconcileError> {
    Ok(StreamsRuntimeConfig {
        checkpoint: streams
            .checkpoint
            .as_ref()
            .map(|c| {
                Ok::<_, ReconcileError>(CheckpointConfig {
                    configuration_type: configuration_type(c.configuration_type.as_deref())?,
                    checkpointing_enabled: c.checkpointing_enabled,
                    checkpoint_interval_ms: c.checkpoint_interval_ms,
                    min_pause_between_checkpoints_ms: c.min_pause_between_checkpoints_ms,
                })
            })
            .transpose()?,
        monitoring: streams
            .monitoring
            .as_ref()
            .map(|m| {
                Ok::<_, ReconcileError>(MonitoringConfig {
                    configuration_type: configuration_type(m.configuration_type.as_deref())?,
                    log_level: m.log_level.clone(),
                    metrics_level: m.metrics_level.clone(),
                })
            })
            .transpose()?,
        parallelism: streams
            .parallelism
            .as_ref()
            .map(|p| {
                Ok::<_, ReconcileError>(ParallelismConfig {
                    configuration_type: configuration_type(p.configuration_type.as_deref())?,
                    autoscaling_enabled: p.autoscaling_enabled,
                    parallelism: p.parallelism,
                    parallelism_per_unit: p.parallelism_per_unit,
                })
            })
            .transpose()?,
    })
}

fn configuration_type(s: Option<&str>) -> Result<Option<ConfigurationType>, ReconcileError> {
    s.map(ConfigurationType::from_wire).transpose()
}

pub fn input_from_description(desc: &InputDescription) -> Result<Input, ReconcileError> {
    Ok(Input {
        id: Some(desc.id.clone()),
        name_prefix: desc.spec.name_prefix.clone(),
        source: stream_source(
            desc.spec.stream_arn.as_deref(),
            desc.spec.delivery_stream_arn.as_deref(),
        )?,
        parallelism_count: desc.spec.parallelism_count,
        processing_function_arn: desc.spec.processing_function_arn.clone(),
        schema: schema_from_wire(&desc.spec.schema),
        starting_position: desc.starting_position.clone(),
        in_app_stream_names: desc.in_app_stream_names.clone(),
    })
}

fn stream_source(
    stream_arn: Option<&str>,
    delivery_stream_arn: Option<&str>,
) -> Result<StreamSource, ReconcileError> {
    match (stream_arn, delivery_stream_arn) {
        (Some(arn), None) => Ok(StreamSource::Stream(arn.to_string())),
        (None, Some(arn)) => Ok(StreamSource::DeliveryStream(arn.to_string())),
        (None, None) => Err(ReconcileError::InvalidSpec(
            "observed input has no source".into(),
        )),
        (Some(_), Some(_)) => Err(ReconcileError::InvalidSpec(
            "observed input has both a stream and a delivery stream source".into(),
        )),
    }
}

pub fn output_from_description(desc: &OutputDescription) -> Result<Output, ReconcileError> {
    let destination = match (
        &desc.spec.stream_arn,
        &desc.spec.delivery_stream_arn,
        &desc.spec.function_arn,
    ) {
        (Some(arn), None, None) => OutputDestination::Stream(arn.clone()),
        (None, Some(arn), None) => OutputDestination::DeliveryStream(arn.clone()),
        (None, None, Some(arn)) => OutputDestination::Function(arn.clone()),
        _ => {
            return Err(ReconcileError::InvalidSpec(format!(
                "observed output {} does not have exactly one destination",
                desc.spec.name
            )));
        }
    };
    Ok(Output {
        id: Some(desc.id.clone()),
        name: desc.spec.name.clone(),
        destination,
        record_format_type: desc
            .spec
            .record_format_type
            .as_deref()
            .map(crate::model::RecordFormatType::from_wire)
            .transpose()?,
    })
}

pub fn reference_from_description(
    desc: &ReferenceDataSourceDescription,
) -> Result<ReferenceDataSource, ReconcileError> {
    Ok(ReferenceDataSource {
        id: Some(desc.id.clone()),
        table_name: desc.spec.table_name.clone(),
        bucket_arn: desc.spec.bucket_arn.clone(),
        file_key: desc.spec.file_key.clone(),
        schema: schema_from_wire(&desc.spec.schema),
    })
}

fn schema_from_wire(schema: &SchemaSpec) -> SourceSchema {
    let mapping = if let Some(csv) = &schema.format.csv_mapping {
        Some(RecordMapping::Csv {
            column_delimiter: csv.record_column_delimiter.clone(),
            row_delimiter: csv.record_row_delimiter.clone(),
        })
    } else {
        schema
            .format
            .json_mapping
            .as_ref()
            .map(|json| RecordMapping::Json {
                row_path: json.record_row_path.clone(),
            })
    };
    SourceSchema {
        columns: schema
            .columns
            .iter()
            .map(|c| RecordColumn {
                name: c.name.clone(),
                sql_type: c.sql_type.clone(),
                mapping: c.mapping.clone(),
            })
            .collect(),
        encoding: schema.encoding.clone(),
        mapping,
    }
}
