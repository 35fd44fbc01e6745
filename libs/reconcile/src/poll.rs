//! Waits for an application deletion to complete.
//!
//! Deletion is asynchronous: the control plane accepts the request, moves the
//! application through `DELETING`, and eventually stops reporting it at all.
//! The poller keeps describing until the describe comes back not-found.

use std::time::Duration;

use streamplane_api::{ControlPlane, ErrorCode};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::ReconcileError;
use crate::model::ApplicationStatus;

/// Polls an application until it disappears after a delete request.
#[derive(Debug, Clone, Copy)]
pub struct DeletionPoller {
    deadline: Duration,
    interval: Duration,
}

impl Default for DeletionPoller {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(600),
            interval: Duration::from_secs(10),
        }
    }
}

impl DeletionPoller {
    pub fn new(deadline: Duration, interval: Duration) -> Self {
        Self { deadline, interval }
    }

    /// Block until `name` is gone. `RUNNING` and `DELETING` are the only
    /// statuses deletion may pass through; anything else means the delete
    /// went sideways and polling further would never terminate.
    pub async fn wait_until_deleted<C>(&self, client: &C, name: &str) -> Result<(), ReconcileError>
    where
        C: ControlPlane + ?Sized,
    {
        let started = Instant::now();
        loop {
            let detail = match client.describe_application(name).await {
                Ok(detail) => detail,
                Err(err) if err.code == ErrorCode::NotFound => return Ok(()),
                Err(err) => return Err(ReconcileError::api("describing application", err)),
            };

            match detail.status {
                ApplicationStatus::Running | ApplicationStatus::Deleting => {
                    if started.elapsed() >= self.deadline {
                        return Err(ReconcileError::Timeout {
                            what: format!("deletion of application {name}"),
                            elapsed: started.elapsed(),
                        });
                    }
                    debug!(application = name, status = %detail.status, "deletion still pending");
                    sleep(self.interval).await;
                }
                status => {
                    return Err(ReconcileError::UnexpectedStatus {
                        name: name.to_string(),
                        status,
                    });
                }
            }
        }
    }
}
