//! Column associations: which SQL column backs a spec, and how that column is matched
//! against another data set's column during a join.

use crate::naming::{NamingScheme, DUNDER};
use crate::registry::SemanticModelLookup;
use crate::specs::{
    DimensionSpec, EntitySpec, GroupByMetricSpec, InstanceSpec, MeasureSpec, MetadataSpec,
    MetricSpec, TimeDimensionSpec,
};

/// How a column is matched against its counterpart in another data set.
///
/// Only single columns matched by name equality exist today. A composite key would
/// be a new variant carrying its column shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnCorrelationKey {
    SingleColumn,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnAssociation {
    pub column_name: String,
    pub correlation_key: ColumnCorrelationKey,
}

impl ColumnAssociation {
    pub fn single_column(column_name: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            correlation_key: ColumnCorrelationKey::SingleColumn,
        }
    }
}

/// Maps specs to the columns that carry them. Implementations must be total and
/// deterministic: the same spec always yields the same column name.
pub trait ColumnAssociationResolver {
    fn resolve_spec(&self, spec: &InstanceSpec) -> ColumnAssociation;
}

/// Resolves specs to dunder-joined names, e.g. `DimensionSpec("country", ["listing"])`
/// becomes `listing__country`.
#[derive(Debug, Clone, Copy)]
pub struct DunderColumnAssociationResolver<'a> {
    semantic_model_lookup: &'a SemanticModelLookup,
    naming: NamingScheme,
}

impl<'a> DunderColumnAssociationResolver<'a> {
    pub fn new(semantic_model_lookup: &'a SemanticModelLookup) -> Self {
        Self::with_naming(semantic_model_lookup, NamingScheme::default())
    }

    pub fn with_naming(semantic_model_lookup: &'a SemanticModelLookup, naming: NamingScheme) -> Self {
        Self {
            semantic_model_lookup,
            naming,
        }
    }

    pub fn semantic_model_lookup(&self) -> &'a SemanticModelLookup {
        self.semantic_model_lookup
    }

    pub fn naming(&self) -> NamingScheme {
        self.naming
    }

    fn resolve_measure(&self, spec: &MeasureSpec) -> String {
        spec.element_name.clone()
    }

    fn resolve_metric(&self, spec: &MetricSpec) -> String {
        spec.alias
            .clone()
            .unwrap_or_else(|| spec.element_name.clone())
    }

    fn resolve_dimension(&self, spec: &DimensionSpec) -> String {
        self.naming
            .qualify(&spec.entity_links, &spec.element_name, None, None)
    }

    fn resolve_time_dimension(&self, spec: &TimeDimensionSpec) -> String {
        let name = self.naming.qualify(
            &spec.entity_links,
            &spec.element_name,
            Some(spec.time_granularity),
            spec.date_part,
        );
        match spec.aggregation_state {
            Some(state) => format!("{name}{DUNDER}{}", state.name().to_lowercase()),
            None => name,
        }
    }

    fn resolve_entity(&self, spec: &EntitySpec) -> String {
        self.naming
            .qualify(&spec.entity_links, &spec.element_name, None, None)
    }

    fn resolve_group_by_metric(&self, spec: &GroupByMetricSpec) -> String {
        self.naming
            .qualify(&spec.entity_links, &spec.element_name, None, None)
    }

    fn resolve_metadata(&self, spec: &MetadataSpec) -> String {
        spec.qualified_name()
    }
}

impl ColumnAssociationResolver for DunderColumnAssociationResolver<'_> {
    fn resolve_spec(&self, spec: &InstanceSpec) -> ColumnAssociation {
        let column_name = match spec {
            InstanceSpec::Measure(s) => self.resolve_measure(s),
            InstanceSpec::Metric(s) => self.resolve_metric(s),
            InstanceSpec::Dimension(s) => self.resolve_dimension(s),
            InstanceSpec::TimeDimension(s) => self.resolve_time_dimension(s),
            InstanceSpec::Entity(s) => self.resolve_entity(s),
            InstanceSpec::GroupByMetric(s) => self.resolve_group_by_metric(s),
            InstanceSpec::Metadata(s) => self.resolve_metadata(s),
        };
        tracing::trace!(kind = spec.kind(), column = %column_name, "resolved spec");
        ColumnAssociation::single_column(column_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specs::{links, AggregationState, TimeGranularity};

    fn resolve(spec: impl Into<InstanceSpec>) -> String {
        let lookup = SemanticModelLookup::default();
        DunderColumnAssociationResolver::new(&lookup)
            .resolve_spec(&spec.into())
            .column_name
    }

    #[test]
    fn dimension_joins_links_and_element() {
        assert_eq!(
            resolve(DimensionSpec::new("country", links(["listing"]))),
            "listing__country"
        );
        assert_eq!(resolve(DimensionSpec::new("country", vec![])), "country");
    }

    #[test]
    fn entity_and_group_by_metric_follow_dimension_naming() {
        assert_eq!(
            resolve(EntitySpec::new("user", links(["listing"]))),
            "listing__user"
        );
        assert_eq!(
            resolve(GroupByMetricSpec::new("bookings", links(["listing"]))),
            "listing__bookings"
        );
    }

    #[test]
    fn time_dimension_with_aggregation_state() {
        let spec = TimeDimensionSpec::new("paid_at", links(["booking"]), TimeGranularity::Month);
        assert_eq!(resolve(spec.clone()), "booking__paid_at__month");
        assert_eq!(
            resolve(spec.with_aggregation_state(AggregationState::End)),
            "booking__paid_at__month__end"
        );
    }

    #[test]
    fn metric_alias_overrides_element_name() {
        assert_eq!(resolve(MetricSpec::new("bookings")), "bookings");
        assert_eq!(
            resolve(MetricSpec::new("bookings").with_alias("bookings_total")),
            "bookings_total"
        );
    }

    #[test]
    fn measure_and_metadata_names() {
        assert_eq!(resolve(MeasureSpec::new("booking_value")), "booking_value");
        assert_eq!(resolve(MetadataSpec::new("row_count")), "row_count");
    }

    #[test]
    fn every_association_is_single_column() {
        let lookup = SemanticModelLookup::default();
        let resolver = DunderColumnAssociationResolver::new(&lookup);
        let assoc = resolver.resolve_spec(&MeasureSpec::new("bookings").into());
        assert_eq!(assoc.correlation_key, ColumnCorrelationKey::SingleColumn);
    }
}
