//! Semantic data sets: a SQL select node plus the specs its columns carry.

use crate::column_assoc::{ColumnAssociation, ColumnAssociationResolver};
use crate::error::{MetricplanError, Result};
use crate::specs::{DimensionSpec, EntitySpec, InstanceSpec, TimeDimensionSpec};
use crate::sql_ast::SelectQuery;

/// What the join builder needs from a data set taking part in a join.
pub trait DataSet {
    /// The select statement producing this data set.
    fn sql_select_node(&self) -> &SelectQuery;

    /// Columns backing an identifier. Composite identifiers map to several columns.
    fn column_associations_for_entity(&self, spec: &EntitySpec) -> Result<Vec<ColumnAssociation>>;

    fn column_association_for_dimension(&self, spec: &DimensionSpec) -> Result<ColumnAssociation>;

    fn column_association_for_time_dimension(
        &self,
        spec: &TimeDimensionSpec,
    ) -> Result<ColumnAssociation>;

    /// Every `metric_time` time dimension this data set carries.
    fn metric_time_dimension_specs(&self) -> Vec<&TimeDimensionSpec>;
}

/// A spec together with the column(s) that carry it in one data set.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub spec: InstanceSpec,
    pub associations: Vec<ColumnAssociation>,
}

impl Instance {
    pub fn new(spec: impl Into<InstanceSpec>, associations: Vec<ColumnAssociation>) -> Self {
        Self {
            spec: spec.into(),
            associations,
        }
    }

    pub fn resolved(spec: impl Into<InstanceSpec>, resolver: &dyn ColumnAssociationResolver) -> Self {
        let spec = spec.into();
        let association = resolver.resolve_spec(&spec);
        Self {
            spec,
            associations: vec![association],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlDataSet {
    select_node: SelectQuery,
    instances: Vec<Instance>,
}

impl SqlDataSet {
    pub fn new(select_node: SelectQuery, instances: Vec<Instance>) -> Self {
        Self {
            select_node,
            instances,
        }
    }

    pub fn from_specs<I>(
        select_node: SelectQuery,
        specs: I,
        resolver: &dyn ColumnAssociationResolver,
    ) -> Self
    where
        I: IntoIterator,
        I::Item: Into<InstanceSpec>,
    {
        let instances = specs
            .into_iter()
            .map(|spec| Instance::resolved(spec, resolver))
            .collect();
        Self::new(select_node, instances)
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    fn single_association(
        &self,
        kind: &'static str,
        name: String,
        matches: impl Fn(&InstanceSpec) -> bool,
    ) -> Result<ColumnAssociation> {
        self.instances
            .iter()
            .find(|i| matches(&i.spec))
            .and_then(|i| i.associations.first().cloned())
            .ok_or(MetricplanError::UnknownField { kind, name })
    }
}

impl DataSet for SqlDataSet {
    fn sql_select_node(&self) -> &SelectQuery {
        &self.select_node
    }

    fn column_associations_for_entity(&self, spec: &EntitySpec) -> Result<Vec<ColumnAssociation>> {
        self.instances
            .iter()
            .find(|i| matches!(&i.spec, InstanceSpec::Entity(s) if s == spec))
            .map(|i| i.associations.clone())
            .filter(|associations| !associations.is_empty())
            .ok_or_else(|| MetricplanError::UnknownField {
                kind: "entity",
                name: spec.to_string(),
            })
    }

    fn column_association_for_dimension(&self, spec: &DimensionSpec) -> Result<ColumnAssociation> {
        self.single_association("dimension", spec.to_string(), |s| {
            matches!(s, InstanceSpec::Dimension(d) if d == spec)
        })
    }

    fn column_association_for_time_dimension(
        &self,
        spec: &TimeDimensionSpec,
    ) -> Result<ColumnAssociation> {
        self.single_association("time dimension", spec.to_string(), |s| {
            matches!(s, InstanceSpec::TimeDimension(t) if t == spec)
        })
    }

    fn metric_time_dimension_specs(&self) -> Vec<&TimeDimensionSpec> {
        self.instances
            .iter()
            .filter_map(|i| match &i.spec {
                InstanceSpec::TimeDimension(spec) if spec.is_metric_time() => Some(spec),
                _ => None,
            })
            .collect()
    }
}
