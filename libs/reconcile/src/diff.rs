//! Computes the ordered operation list that converges an observed
//! application to its desired configuration.
//!
//! Top-level field changes fold into a single configuration update.
//! Relational sub-resources are add-only: the remote API can attach a log
//! sink, input, output or reference data source to an empty slot, but offers
//! no way to rewrite or detach one through this path, so such changes are
//! reported as unsupported instead of being silently dropped.

use streamplane_api::types::{ApplicationDetail, ConfigurationDelta};

use crate::error::ReconcileError;
use crate::mapper;
use crate::model::{
    AppSpec, Input, LogSink, Output, ReferenceDataSource, RuntimeConfig, SqlRuntimeConfig,
    StreamsRuntimeConfig,
};

/// One mutation to execute against the control plane.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    UpdateConfiguration(ConfigurationDelta),
    AddLogSink(LogSink),
    AddInput(Input),
    AddOutput(Output),
    AddReferenceDataSource(ReferenceDataSource),
}

impl Operation {
    /// Short description used for logging and error context.
    pub fn describe(&self) -> &'static str {
        match self {
            Operation::UpdateConfiguration(_) => "updating configuration",
            Operation::AddLogSink(_) => "adding log sink",
            Operation::AddInput(_) => "adding input",
            Operation::AddOutput(_) => "adding output",
            Operation::AddReferenceDataSource(_) => "adding reference data source",
        }
    }
}

/// Compute the operations required to converge `observed` to `desired`.
///
/// The list is ordered: the configuration update first, then log sink,
/// input, output and reference-data-source adds, since later adds may
/// reference the version advanced by earlier calls. Diffing again right
/// after applying the returned list yields an empty list.
pub fn plan(
    desired: &AppSpec,
    observed: &ApplicationDetail,
) -> Result<Vec<Operation>, ReconcileError> {
    let observed = mapper::record_from_detail(observed)?.spec;

    if desired.runtime != observed.runtime {
        return Err(ReconcileError::Unsupported(format!(
            "runtime cannot be changed in place ({} -> {})",
            observed.runtime, desired.runtime
        )));
    }

    let mut ops = Vec::new();

    let delta = configuration_delta(desired, &observed);
    if !delta.is_empty() {
        ops.push(Operation::UpdateConfiguration(delta));
    }

    if let Some(op) = diff_log_sink(desired.log_sink.as_ref(), observed.log_sink.as_ref())? {
        ops.push(op);
    }

    if let (RuntimeConfig::Sql(desired_sql), RuntimeConfig::Sql(observed_sql)) =
        (&desired.runtime_config, &observed.runtime_config)
    {
        diff_sql_sub_resources(desired_sql, observed_sql, &mut ops)?;
    }

    Ok(ops)
}

fn configuration_delta(desired: &AppSpec, observed: &AppSpec) -> ConfigurationDelta {
    let mut delta = ConfigurationDelta::default();

    let desired_code = mapper::code_spec(desired);
    if desired_code != mapper::code_spec(observed) {
        delta.code = Some(desired_code);
    }

    if desired.property_groups != observed.property_groups {
        delta.property_groups = Some(desired.property_groups.clone());
    }

    // An undeclared snapshot flag keeps whatever the control plane reports.
    if let Some(enabled) = desired.snapshots_enabled {
        if observed.snapshots_enabled != Some(enabled) {
            delta.snapshots_enabled = Some(enabled);
        }
    }

    if let (RuntimeConfig::Streams(desired_streams), RuntimeConfig::Streams(observed_streams)) =
        (&desired.runtime_config, &observed.runtime_config)
    {
        if streams_changed(desired_streams, observed_streams) {
            delta.streams = Some(mapper::streams_spec(desired_streams));
        }
    }

    delta
}

/// Compare the streaming-engine blocks through their identity hashes.
/// Undeclared blocks keep the control plane's computed values.
fn streams_changed(desired: &StreamsRuntimeConfig, observed: &StreamsRuntimeConfig) -> bool {
    let checkpoint_changed = desired.checkpoint.as_ref().is_some_and(|d| {
        observed
            .checkpoint
            .as_ref()
            .is_none_or(|o| d.identity_hash() != o.identity_hash())
    });
    let monitoring_changed = desired.monitoring.as_ref().is_some_and(|d| {
        observed
            .monitoring
            .as_ref()
            .is_none_or(|o| d.identity_hash() != o.identity_hash())
    });
    let parallelism_changed = desired.parallelism.as_ref().is_some_and(|d| {
        observed
            .parallelism
            .as_ref()
            .is_none_or(|o| d.identity_hash() != o.identity_hash())
    });
    checkpoint_changed || monitoring_changed || parallelism_changed
}

fn diff_log_sink(
    desired: Option<&LogSink>,
    observed: Option<&LogSink>,
) -> Result<Option<Operation>, ReconcileError> {
    match (desired, observed) {
        (None, None) => Ok(None),
        (Some(d), None) => Ok(Some(Operation::AddLogSink(d.clone()))),
        (Some(d), Some(o)) if d.identity_hash() == o.identity_hash() => Ok(None),
        (Some(_), Some(_)) => Err(ReconcileError::Unsupported(
            "an attached log sink cannot be changed in place".into(),
        )),
        (None, Some(_)) => Err(ReconcileError::Unsupported(
            "an attached log sink cannot be removed".into(),
        )),
    }
}

fn diff_sql_sub_resources(
    desired: &SqlRuntimeConfig,
    observed: &SqlRuntimeConfig,
    ops: &mut Vec<Operation>,
) -> Result<(), ReconcileError> {
    match (&desired.input, &observed.input) {
        (None, None) => {}
        (Some(d), None) => ops.push(Operation::AddInput(d.clone())),
        (Some(d), Some(o)) if d.same_config(o) => {}
        (Some(_), Some(_)) => {
            return Err(ReconcileError::Unsupported(
                "an attached input cannot be changed in place".into(),
            ));
        }
        (None, Some(_)) => {
            return Err(ReconcileError::Unsupported(
                "an attached input cannot be removed".into(),
            ));
        }
    }

    if observed.outputs.is_empty() {
        for output in &desired.outputs {
            ops.push(Operation::AddOutput(output.clone()));
        }
    } else if !outputs_equal(&desired.outputs, &observed.outputs) {
        return Err(ReconcileError::Unsupported(
            "attached outputs cannot be changed or removed".into(),
        ));
    }

    match (&desired.reference_data_source, &observed.reference_data_source) {
        (None, None) => {}
        (Some(d), None) => ops.push(Operation::AddReferenceDataSource(d.clone())),
        (Some(d), Some(o)) if d.same_config(o) => {}
        (Some(_), Some(_)) => {
            return Err(ReconcileError::Unsupported(
                "an attached reference data source cannot be changed in place".into(),
            ));
        }
        (None, Some(_)) => {
            return Err(ReconcileError::Unsupported(
                "an attached reference data source cannot be removed".into(),
            ));
        }
    }

    Ok(())
}

/// Outputs are an unordered multiset from the control plane's point of
/// view: each desired output must pair with a distinct observed one, so
/// duplicates on one side cannot mask drift on the other.
fn outputs_equal(desired: &[Output], observed: &[Output]) -> bool {
    if desired.len() != observed.len() {
        return false;
    }
    let mut matched = vec![false; observed.len()];
    for d in desired {
        let pair = observed
            .iter()
            .enumerate()
            .find(|(i, o)| !matched[*i] && d.same_config(o));
        match pair {
            Some((i, _)) => matched[i] = true,
            None => return false,
        }
    }
    true
}
