//! Declarative join requests handed down by the dataflow planner.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::specs::{DimensionSpec, EntitySpec, TimeDimensionSpec, TimeGranularity};

/// A dimension both sides are partitioned by; rows only match within a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartitionDimensionJoin {
    pub left: DimensionSpec,
    pub right: DimensionSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartitionTimeDimensionJoin {
    pub left: TimeDimensionSpec,
    pub right: TimeDimensionSpec,
}

/// Start (inclusive) and end (exclusive, NULL while current) of an SCD row's
/// validity, both time dimensions of the right-hand data set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidityWindow {
    pub window_start_dimension: TimeDimensionSpec,
    pub window_end_dimension: TimeDimensionSpec,
}

impl fmt::Display for ValidityWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}, {})",
            self.window_start_dimension, self.window_end_dimension
        )
    }
}

/// Fixed trailing lookback of a cumulative metric, e.g. 7 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeWindow {
    pub count: u32,
    pub granularity: TimeGranularity,
}

impl TimeWindow {
    pub fn new(count: u32, granularity: TimeGranularity) -> Self {
        Self { count, granularity }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.count, self.granularity)
    }
}

/// How to join one data set onto another by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinRequest {
    pub join_on_entity: EntitySpec,
    #[serde(default)]
    pub partition_dimensions: Vec<PartitionDimensionJoin>,
    #[serde(default)]
    pub partition_time_dimensions: Vec<PartitionTimeDimensionJoin>,
    #[serde(default)]
    pub validity_window: Option<ValidityWindow>,
}

impl JoinRequest {
    pub fn new(join_on_entity: EntitySpec) -> Self {
        Self {
            join_on_entity,
            partition_dimensions: Vec::new(),
            partition_time_dimensions: Vec::new(),
            validity_window: None,
        }
    }

    pub fn with_partition_dimension(mut self, left: DimensionSpec, right: DimensionSpec) -> Self {
        self.partition_dimensions
            .push(PartitionDimensionJoin { left, right });
        self
    }

    pub fn with_partition_time_dimension(
        mut self,
        left: TimeDimensionSpec,
        right: TimeDimensionSpec,
    ) -> Self {
        self.partition_time_dimensions
            .push(PartitionTimeDimensionJoin { left, right });
        self
    }

    pub fn with_validity_window(mut self, window: ValidityWindow) -> Self {
        self.validity_window = Some(window);
        self
    }
}
