//! Stable content hashes for configuration blocks the control plane stores
//! as single unordered descriptors.
//!
//! The hash is an internal equivalence key for the diff engine, not a
//! cross-process contract: each block is serialized into a canonical string
//! by pushing its fields in a fixed, documented order with `-` separators,
//! then hashed with SHA-256 (hex, truncated to 128 bits).

use std::fmt;

use sha2::{Digest, Sha256};

use crate::model::{CheckpointConfig, LogSink, MonitoringConfig, ParallelismConfig};

/// A content hash of one configuration block.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockHash(String);

impl BlockHash {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Accumulates fields into a canonical string and hashes it.
#[derive(Debug, Default)]
pub struct IdentityHasher {
    canonical: String,
}

impl IdentityHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, value: impl fmt::Display) -> Self {
        use fmt::Write;
        // The write cannot fail on a String.
        let _ = write!(self.canonical, "{value}-");
        self
    }

    /// Absent fields hash differently from any present value.
    pub fn opt_field(self, value: Option<impl fmt::Display>) -> Self {
        match value {
            Some(v) => self.field(v),
            None => self.field("~"),
        }
    }

    pub fn finish(self) -> BlockHash {
        let mut hasher = Sha256::new();
        hasher.update(self.canonical.as_bytes());
        let digest = hasher.finalize();
        BlockHash(format!("sha256:{}", hex::encode(&digest[..16])))
    }
}

impl CheckpointConfig {
    /// Field order: interval, enabled, configuration type, min pause.
    pub fn identity_hash(&self) -> BlockHash {
        IdentityHasher::new()
            .opt_field(self.checkpoint_interval_ms)
            .opt_field(self.checkpointing_enabled)
            .opt_field(self.configuration_type.map(|t| t.as_wire()))
            .opt_field(self.min_pause_between_checkpoints_ms)
            .finish()
    }
}

impl MonitoringConfig {
    /// Field order: log level, configuration type, metrics level.
    pub fn identity_hash(&self) -> BlockHash {
        IdentityHasher::new()
            .field(&self.log_level)
            .opt_field(self.configuration_type.map(|t| t.as_wire()))
            .field(&self.metrics_level)
            .finish()
    }
}

impl ParallelismConfig {
    /// Field order: autoscaling, parallelism, per-unit, configuration type.
    pub fn identity_hash(&self) -> BlockHash {
        IdentityHasher::new()
            .opt_field(self.autoscaling_enabled)
            .field(self.parallelism)
            .field(self.parallelism_per_unit)
            .opt_field(self.configuration_type.map(|t| t.as_wire()))
            .finish()
    }
}

impl LogSink {
    /// Field order: log stream arn. The assigned id is excluded.
    pub fn identity_hash(&self) -> BlockHash {
        IdentityHasher::new().field(&self.log_stream_arn).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ConfigurationType;
    use proptest::prelude::*;

    #[test]
    fn equal_blocks_hash_equal_regardless_of_assembly_order() {
        let mut a = ParallelismConfig {
            configuration_type: None,
            autoscaling_enabled: None,
            parallelism: 0,
            parallelism_per_unit: 0,
        };
        a.parallelism_per_unit = 1;
        a.parallelism = 4;
        a.autoscaling_enabled = Some(true);
        a.configuration_type = Some(ConfigurationType::Custom);

        let b = ParallelismConfig {
            configuration_type: Some(ConfigurationType::Custom),
            autoscaling_enabled: Some(true),
            parallelism: 4,
            parallelism_per_unit: 1,
        };

        assert_eq!(a.identity_hash(), b.identity_hash());
    }

    #[test]
    fn any_field_change_changes_the_hash() {
        let base = CheckpointConfig {
            configuration_type: Some(ConfigurationType::Custom),
            checkpointing_enabled: Some(true),
            checkpoint_interval_ms: Some(60_000),
            min_pause_between_checkpoints_ms: Some(5_000),
        };
        let changed = CheckpointConfig {
            checkpoint_interval_ms: Some(30_000),
            ..base.clone()
        };
        assert_ne!(base.identity_hash(), changed.identity_hash());
    }

    #[test]
    fn absent_field_differs_from_empty_value() {
        let absent = IdentityHasher::new().opt_field(None::<&str>).finish();
        let empty = IdentityHasher::new().field("").finish();
        assert_ne!(absent, empty);
    }

    #[test]
    fn log_sink_hash_ignores_assigned_id() {
        let declared = LogSink {
            id: None,
            log_stream_arn: "arn:sp:logs:us:123:stream/app".into(),
        };
        let observed = LogSink {
            id: Some("2.1".into()),
            ..declared.clone()
        };
        assert_eq!(declared.identity_hash(), observed.identity_hash());
    }

    fn monitoring_strategy() -> impl Strategy<Value = MonitoringConfig> {
        (
            prop_oneof![
                Just(None),
                Just(Some(ConfigurationType::Default)),
                Just(Some(ConfigurationType::Custom)),
            ],
            "(ERROR|WARN|INFO|DEBUG)",
            "(APPLICATION|TASK|OPERATOR)",
        )
            .prop_map(|(configuration_type, log_level, metrics_level)| MonitoringConfig {
                configuration_type,
                log_level,
                metrics_level,
            })
    }

    proptest! {
        #[test]
        fn hashes_agree_exactly_on_equal_content(
            a in monitoring_strategy(),
            b in monitoring_strategy(),
        ) {
            prop_assert_eq!(a == b, a.identity_hash() == b.identity_hash());
        }
    }
}
