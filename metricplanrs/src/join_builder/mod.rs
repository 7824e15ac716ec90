//! Builds the join descriptions the SQL plan builder attaches to a select: identifier
//! joins between data sets (optionally bounded by an SCD validity window) and
//! range joins between a cumulative metric and the time spine.

mod annotated;
pub mod conditions;
mod request;

pub use annotated::AnnotatedDataSet;
pub use request::{
    JoinRequest, PartitionDimensionJoin, PartitionTimeDimensionJoin, TimeWindow, ValidityWindow,
};

use crate::column_assoc::ColumnAssociation;
use crate::error::{MetricplanError, Result};
use crate::specs::{TimeDimensionSpec, TimeGranularity};
use crate::sql_ast::{SelectQuery, SqlExpr, SqlJoinDescription, SqlJoinType};

/// Two columns, one per side, that must be equal for rows to join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnEqualityDescription {
    pub left_column_alias: String,
    pub right_column_alias: String,
    pub treat_nulls_as_equal: bool,
}

impl ColumnEqualityDescription {
    pub fn new(left_column_alias: impl Into<String>, right_column_alias: impl Into<String>) -> Self {
        Self {
            left_column_alias: left_column_alias.into(),
            right_column_alias: right_column_alias.into(),
            treat_nulls_as_equal: false,
        }
    }

    /// Equality that also matches when both sides are NULL.
    pub fn null_safe(
        left_column_alias: impl Into<String>,
        right_column_alias: impl Into<String>,
    ) -> Self {
        Self {
            treat_nulls_as_equal: true,
            ..Self::new(left_column_alias, right_column_alias)
        }
    }
}

/// Stateless assembler of [`SqlJoinDescription`]s. Safe to share across threads.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlJoinBuilder;

impl SqlJoinBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Join `right_source` (aliased `right_alias`) on column equalities plus any
    /// `extra_conditions`, all AND-ed together.
    ///
    /// A join with no equalities is only accepted as a cross join.
    pub fn build_equality_join(
        &self,
        right_source: &SelectQuery,
        left_alias: &str,
        right_alias: &str,
        equality_descriptions: &[ColumnEqualityDescription],
        join_type: SqlJoinType,
        extra_conditions: Vec<SqlExpr>,
    ) -> Result<SqlJoinDescription> {
        if equality_descriptions.is_empty() && join_type != SqlJoinType::Cross {
            return Err(MetricplanError::InvalidJoinShape { join_type });
        }

        let mut on_conditions: Vec<SqlExpr> = equality_descriptions
            .iter()
            .map(|d| {
                conditions::equality_condition(
                    left_alias,
                    &d.left_column_alias,
                    right_alias,
                    &d.right_column_alias,
                    d.treat_nulls_as_equal,
                )
            })
            .collect();
        on_conditions.extend(extra_conditions);

        tracing::debug!(
            right_alias,
            join_type = %join_type,
            conditions = on_conditions.len(),
            "built join description"
        );

        Ok(SqlJoinDescription {
            right_source: Box::new(right_source.clone()),
            right_source_alias: right_alias.to_string(),
            on_condition: combine_conditions(on_conditions),
            join_type,
        })
    }

    /// Left-outer join of `right` onto `left` by the requested identifier, its
    /// partition columns and, for SCD data sets, the validity window.
    pub fn build_identifier_join(
        &self,
        left: &AnnotatedDataSet<'_>,
        right: &AnnotatedDataSet<'_>,
        request: &JoinRequest,
    ) -> Result<SqlJoinDescription> {
        let entity = &request.join_on_entity;
        let left_columns = column_names(left.data_set.column_associations_for_entity(entity)?);
        let right_columns = column_names(right.data_set.column_associations_for_entity(entity)?);
        if left_columns.len() != right_columns.len() {
            return Err(MetricplanError::IdentifierArityMismatch {
                identifier: entity.to_string(),
                left: left_columns,
                right: right_columns,
            });
        }

        let mut equalities: Vec<ColumnEqualityDescription> = left_columns
            .into_iter()
            .zip(right_columns)
            .map(|(l, r)| ColumnEqualityDescription::new(l, r))
            .collect();

        for partition in &request.partition_dimensions {
            equalities.push(ColumnEqualityDescription::new(
                left.data_set
                    .column_association_for_dimension(&partition.left)?
                    .column_name,
                right
                    .data_set
                    .column_association_for_dimension(&partition.right)?
                    .column_name,
            ));
        }
        for partition in &request.partition_time_dimensions {
            equalities.push(ColumnEqualityDescription::new(
                left.data_set
                    .column_association_for_time_dimension(&partition.left)?
                    .column_name,
                right
                    .data_set
                    .column_association_for_time_dimension(&partition.right)?
                    .column_name,
            ));
        }

        let mut extra_conditions = Vec::new();
        if let Some(window) = &request.validity_window {
            let anchor = validity_window_anchor(left.data_set.metric_time_dimension_specs())
                .ok_or_else(|| MetricplanError::MissingValidityAnchor {
                    left_alias: left.alias.to_string(),
                    right_alias: right.alias.to_string(),
                    window: window.to_string(),
                })?;
            tracing::debug!(
                left_alias = left.alias,
                anchor = %anchor,
                window = %window,
                "anchoring validity window"
            );

            let left_time = left.data_set.column_association_for_time_dimension(anchor)?;
            let window_start = right
                .data_set
                .column_association_for_time_dimension(&window.window_start_dimension)?;
            let window_end = right
                .data_set
                .column_association_for_time_dimension(&window.window_end_dimension)?;
            extra_conditions.extend(conditions::validity_window_bounds(
                left.alias,
                &left_time.column_name,
                right.alias,
                &window_start.column_name,
                &window_end.column_name,
            ));
        }

        // Rows without a match, including rows with no current SCD version, survive
        // null-filled.
        self.build_equality_join(
            right.data_set.sql_select_node(),
            left.alias,
            right.alias,
            &equalities,
            SqlJoinType::LeftOuter,
            extra_conditions,
        )
    }

    /// Inner join of a cumulative metric's data set onto the time spine (the left
    /// side), bounded by the trailing `window` or reset at each `grain_to_date`
    /// period. Both data sets must carry a bound metric-time column.
    pub fn build_cumulative_time_range_join(
        &self,
        metric: &AnnotatedDataSet<'_>,
        time_spine: &AnnotatedDataSet<'_>,
        window: Option<TimeWindow>,
        grain_to_date: Option<TimeGranularity>,
    ) -> Result<SqlJoinDescription> {
        let requested = describe_cumulative_range(window, grain_to_date);
        let metric_time = metric.require_metric_time_column_name(&requested)?;
        let spine_time = time_spine.require_metric_time_column_name(&requested)?;

        let on_condition = conditions::cumulative_time_range_condition(
            metric.alias,
            metric_time,
            time_spine.alias,
            spine_time,
            window,
            grain_to_date,
        );
        tracing::debug!(
            metric_alias = metric.alias,
            spine_alias = time_spine.alias,
            range = %requested,
            "built cumulative time range join"
        );

        Ok(SqlJoinDescription {
            right_source: Box::new(metric.data_set.sql_select_node().clone()),
            right_source_alias: metric.alias.to_string(),
            on_condition: Some(on_condition),
            join_type: SqlJoinType::Inner,
        })
    }
}

/// The finest metric-time dimension, ties broken by the shortest entity-link path.
/// The first candidate wins among exact ties.
pub(crate) fn validity_window_anchor<'d>(
    candidates: Vec<&'d TimeDimensionSpec>,
) -> Option<&'d TimeDimensionSpec> {
    candidates
        .into_iter()
        .min_by_key(|spec| (spec.time_granularity, spec.entity_links.len()))
}

fn combine_conditions(mut conditions: Vec<SqlExpr>) -> Option<SqlExpr> {
    match conditions.len() {
        0 => None,
        1 => conditions.pop(),
        _ => Some(SqlExpr::and(conditions)),
    }
}

fn column_names(associations: Vec<ColumnAssociation>) -> Vec<String> {
    associations.into_iter().map(|a| a.column_name).collect()
}

fn describe_cumulative_range(
    window: Option<TimeWindow>,
    grain_to_date: Option<TimeGranularity>,
) -> String {
    match (window, grain_to_date) {
        (Some(window), _) => format!("cumulative window of {window}"),
        (None, Some(grain)) => format!("cumulative {grain}-to-date range"),
        (None, None) => "unbounded cumulative range".to_string(),
    }
}
