use std::fmt;

use crate::dataset::DataSet;
use crate::error::{MetricplanError, Result};

/// A data set bound to the alias it has in the query being built, plus the
/// metric-time column chosen for it at this point of the plan.
#[derive(Clone, Copy)]
pub struct AnnotatedDataSet<'a> {
    pub data_set: &'a dyn DataSet,
    pub alias: &'a str,
    metric_time_column_name: Option<&'a str>,
}

impl<'a> AnnotatedDataSet<'a> {
    pub fn new(data_set: &'a dyn DataSet, alias: &'a str) -> Self {
        Self {
            data_set,
            alias,
            metric_time_column_name: None,
        }
    }

    pub fn with_metric_time_column(mut self, column_name: &'a str) -> Self {
        self.metric_time_column_name = Some(column_name);
        self
    }

    pub fn metric_time_column_name(&self) -> Option<&'a str> {
        self.metric_time_column_name
    }

    /// The bound metric-time column; its absence means the planner built this
    /// join without resolving metric time first.
    pub fn require_metric_time_column_name(&self, requested: &str) -> Result<&'a str> {
        self.metric_time_column_name
            .ok_or_else(|| MetricplanError::MissingMetricTime {
                alias: self.alias.to_string(),
                requested: requested.to_string(),
            })
    }
}

impl fmt::Debug for AnnotatedDataSet<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotatedDataSet")
            .field("alias", &self.alias)
            .field("metric_time_column_name", &self.metric_time_column_name)
            .finish_non_exhaustive()
    }
}
