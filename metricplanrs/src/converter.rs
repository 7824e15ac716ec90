//! Turns a semantic model into the `SqlDataSet` that reads it, with every column
//! named by the resolver.

use crate::column_assoc::{ColumnAssociationResolver, DunderColumnAssociationResolver};
use crate::dataset::{Instance, SqlDataSet};
use crate::error::Result;
use crate::models::{DimensionType, SemanticModel};
use crate::specs::{
    DimensionSpec, EntityReference, EntitySpec, InstanceSpec, MeasureSpec, TimeDimensionSpec,
};
use crate::sql_ast::{SelectItem, SelectQuery, SqlExpr, TableRef};

pub struct SemanticModelToDataSetConverter<'a> {
    resolver: DunderColumnAssociationResolver<'a>,
}

/// Accumulates select items and the instances they carry, in lockstep.
struct DataSetParts<'r> {
    resolver: &'r dyn ColumnAssociationResolver,
    table_alias: String,
    select: Vec<SelectItem>,
    instances: Vec<Instance>,
}

impl DataSetParts<'_> {
    fn push(&mut self, spec: impl Into<InstanceSpec>, expr: SqlExpr) {
        let instance = Instance::resolved(spec, self.resolver);
        let alias = instance
            .associations
            .first()
            .map(|a| a.column_name.clone());
        self.select.push(SelectItem { expr, alias });
        self.instances.push(instance);
    }

    fn column(&self, name: &str) -> SqlExpr {
        SqlExpr::column(&self.table_alias, name)
    }
}

impl<'a> SemanticModelToDataSetConverter<'a> {
    pub fn new(resolver: DunderColumnAssociationResolver<'a>) -> Self {
        Self { resolver }
    }

    /// Build the data set for the semantic model named `model_name`.
    pub fn create_sql_data_set(&self, model_name: &str) -> Result<SqlDataSet> {
        let model = self
            .resolver
            .semantic_model_lookup()
            .require_model(model_name)?;
        Ok(self.convert(model))
    }

    pub fn convert(&self, model: &SemanticModel) -> SqlDataSet {
        let mut parts = DataSetParts {
            resolver: &self.resolver,
            table_alias: model.name.clone(),
            select: Vec::new(),
            instances: Vec::new(),
        };

        // Local dimensions are reached through the model's own primary entity.
        let local_links: Vec<EntityReference> = model
            .primary_entity()
            .map(|e| EntityReference::new(e.name.as_str()))
            .into_iter()
            .collect();

        for measure in &model.measures {
            let expr = parts.column(measure.column());
            parts.push(MeasureSpec::new(measure.name.as_str()), expr);
        }

        for entity in &model.entities {
            let expr = parts.column(entity.column());
            parts.push(EntitySpec::new(entity.name.as_str(), Vec::new()), expr);
        }

        for dimension in &model.dimensions {
            let expr = parts.column(dimension.column());
            match (dimension.dimension_type, dimension.time_granularity()) {
                (DimensionType::Time, Some(granularity)) => parts.push(
                    TimeDimensionSpec::new(
                        dimension.name.as_str(),
                        local_links.clone(),
                        granularity,
                    ),
                    expr,
                ),
                _ => parts.push(
                    DimensionSpec::new(dimension.name.as_str(), local_links.clone()),
                    expr,
                ),
            }
        }

        if let Some(agg_time) = model.agg_time_dimension() {
            if let Some(defined) = agg_time.time_granularity() {
                for granularity in defined.and_coarser() {
                    let column = parts.column(agg_time.column());
                    let expr = if granularity == defined {
                        column
                    } else {
                        SqlExpr::DateTrunc {
                            grain: granularity,
                            expr: Box::new(column),
                        }
                    };
                    parts.push(TimeDimensionSpec::metric_time(granularity), expr);
                }
            }
        }

        tracing::debug!(
            model = %model.name,
            columns = parts.select.len(),
            "converted semantic model to data set"
        );

        let select_node = SelectQuery {
            select: parts.select,
            from: TableRef {
                name: model.node_relation.clone(),
                alias: Some(model.name.clone()),
                subquery: None,
            },
            joins: Vec::new(),
        };
        SqlDataSet::new(select_node, parts.instances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DataSet;
    use crate::registry::SemanticModelLookup;
    use crate::specs::{links, TimeGranularity};
    use crate::sql_ast::SqlRenderer;

    const BOOKINGS_YAML: &str = r#"
name: bookings
node_relation: fct_bookings
defaults:
  agg_time_dimension: ds
entities:
  - name: booking
    type: primary
    expr: booking_id
  - name: listing
    type: foreign
    expr: listing_id
dimensions:
  - name: is_instant
    type: categorical
  - name: ds
    type: time
    type_params:
      time_granularity: quarter
measures:
  - name: booking_value
    agg: sum
    expr: value_usd
"#;

    fn lookup() -> SemanticModelLookup {
        SemanticModelLookup::from_parts(vec![serde_yaml::from_str(BOOKINGS_YAML).unwrap()])
    }

    #[test]
    fn names_columns_through_resolver() {
        let lookup = lookup();
        let converter =
            SemanticModelToDataSetConverter::new(DunderColumnAssociationResolver::new(&lookup));
        let data_set = converter.create_sql_data_set("bookings").unwrap();

        let sql = SqlRenderer::new().render_select(data_set.sql_select_node());
        assert!(sql.starts_with(r#"SELECT "bookings"."value_usd" AS "booking_value", "bookings"."booking_id" AS "booking""#));
        assert!(sql.contains(r#""bookings"."is_instant" AS "booking__is_instant""#));
        assert!(sql.contains(r#""bookings"."ds" AS "booking__ds__quarter""#));
        assert!(sql.ends_with(r#"FROM "fct_bookings" "bookings""#));

        let instant = data_set
            .column_association_for_dimension(&DimensionSpec::new("is_instant", links(["booking"])))
            .unwrap();
        assert_eq!(instant.column_name, "booking__is_instant");
    }

    #[test]
    fn metric_time_covers_defined_and_coarser_grains() {
        let lookup = lookup();
        let converter =
            SemanticModelToDataSetConverter::new(DunderColumnAssociationResolver::new(&lookup));
        let data_set = converter.create_sql_data_set("bookings").unwrap();

        let grains: Vec<_> = data_set
            .metric_time_dimension_specs()
            .into_iter()
            .map(|s| s.time_granularity)
            .collect();
        assert_eq!(grains, vec![TimeGranularity::Quarter, TimeGranularity::Year]);

        let sql = SqlRenderer::new().render_select(data_set.sql_select_node());
        assert!(sql.contains(r#""bookings"."ds" AS "metric_time__quarter""#));
        assert!(sql.contains(r#"DATE_TRUNC('year', "bookings"."ds") AS "metric_time__year""#));
    }

    #[test]
    fn unknown_model_fails() {
        let lookup = lookup();
        let converter =
            SemanticModelToDataSetConverter::new(DunderColumnAssociationResolver::new(&lookup));
        assert!(converter.create_sql_data_set("listings").is_err());
    }
}
