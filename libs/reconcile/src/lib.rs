//! Reconciliation engine for streamplane applications.
//!
//! Converges a declared application configuration with the state a remote
//! control plane reports: it diffs the two into an ordered operation list,
//! dispatches the mutations sequentially under an optimistic version
//! counter, rides out permission-propagation rejections, and polls
//! asynchronous deletions to completion.
//!
//! [`ApplicationReconciler`] is the front door; the modules underneath are
//! usable on their own when a caller wants to plan without applying.

pub mod diff;
pub mod dispatch;
pub mod error;
pub mod hash;
pub mod lifecycle;
pub mod mapper;
pub mod model;
pub mod poll;
pub mod retry;
pub mod version;

pub use diff::{plan, Operation};
pub use dispatch::MutationDispatcher;
pub use error::ReconcileError;
pub use hash::{BlockHash, IdentityHasher};
pub use lifecycle::{import_application_name, ApplicationReconciler};
pub use model::{AppSpec, ApplicationRecord};
pub use poll::DeletionPoller;
pub use retry::RetryPolicy;
pub use version::VersionTracker;
