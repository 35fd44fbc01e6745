//! Executes a planned operation list against the control plane.
//!
//! Operations run strictly in order. Each call carries the version from the
//! tracker, and each accepted call advances it, so a multi-operation pass
//! needs no intermediate describes. Any failure aborts the pass; the caller
//! re-reads and re-plans rather than resuming mid-list.

use streamplane_api::types::UpdateApplicationRequest;
use streamplane_api::ControlPlane;
use tracing::debug;

use crate::diff::Operation;
use crate::error::ReconcileError;
use crate::mapper;
use crate::retry::RetryPolicy;
use crate::version::VersionTracker;

/// Dispatches mutations sequentially under one version tracker.
pub struct MutationDispatcher<'a, C: ControlPlane + ?Sized> {
    client: &'a C,
    retry: RetryPolicy,
}

impl<'a, C: ControlPlane + ?Sized> MutationDispatcher<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(client: &'a C, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Apply every operation, advancing `tracker` once per accepted call.
    pub async fn apply(
        &self,
        name: &str,
        tracker: &mut VersionTracker,
        operations: &[Operation],
    ) -> Result<(), ReconcileError> {
        for op in operations {
            let context = op.describe();
            debug!(
                application = name,
                version = tracker.current(),
                operation = context,
                "dispatching mutation"
            );

            let result = match op {
                Operation::UpdateConfiguration(delta) => {
                    let request = UpdateApplicationRequest {
                        current_version: tracker.current(),
                        delta: delta.clone(),
                    };
                    self.retry
                        .run(|| self.client.update_application(name, &request))
                        .await
                }
                Operation::AddLogSink(sink) => {
                    let spec = mapper::log_sink_spec(sink);
                    self.retry
                        .run(|| self.client.add_log_sink(name, tracker.current(), &spec))
                        .await
                }
                Operation::AddInput(input) => {
                    let spec = mapper::input_spec(input);
                    self.retry
                        .run(|| self.client.add_input(name, tracker.current(), &spec))
                        .await
                }
                Operation::AddOutput(output) => {
                    let spec = mapper::output_spec(output);
                    self.retry
                        .run(|| self.client.add_output(name, tracker.current(), &spec))
                        .await
                }
                Operation::AddReferenceDataSource(source) => {
                    let spec = mapper::reference_spec(source);
                    self.retry
                        .run(|| {
                            self.client
                                .add_reference_data_source(name, tracker.current(), &spec)
                        })
                        .await
                }
            };

            result.map_err(|err| ReconcileError::api(context, err))?;
            tracker.advance();
        }
        Ok(())
    }
}
