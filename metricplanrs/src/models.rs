//! Semantic model definitions as authored in YAML.

use serde::{Deserialize, Serialize};

use crate::error::{MetricplanError, Result};
use crate::specs::TimeGranularity;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SemanticModel {
    pub name: String,
    /// Table or view the model reads from.
    pub node_relation: String,
    #[serde(default)]
    pub defaults: Option<ModelDefaults>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub dimensions: Vec<Dimension>,
    #[serde(default)]
    pub measures: Vec<Measure>,
    pub description: Option<String>,
}

impl SemanticModel {
    /// The entity that identifies one row of this model, if it has one.
    pub fn primary_entity(&self) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| matches!(e.entity_type, EntityType::Primary | EntityType::Natural))
    }

    pub fn get_dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    /// Time dimension behind the model's `metric_time`: the model default, or the
    /// measure-level setting when every measure that declares one agrees on it.
    pub fn agg_time_dimension(&self) -> Option<&Dimension> {
        let name = match self.default_agg_time_dimension() {
            Some(name) => name,
            None => {
                let mut names = self
                    .measures
                    .iter()
                    .filter_map(|m| m.agg_time_dimension.as_deref());
                let first = names.next()?;
                if !names.all(|name| name == first) {
                    return None;
                }
                first
            }
        };
        self.time_dimension(name)
    }

    /// Time dimension one measure aggregates against. Its own setting wins over the
    /// model default.
    pub fn agg_time_dimension_for(&self, measure: &Measure) -> Option<&Dimension> {
        measure
            .agg_time_dimension
            .as_deref()
            .or_else(|| self.default_agg_time_dimension())
            .and_then(|name| self.time_dimension(name))
    }

    /// Every `agg_time_dimension`, model default and per measure, must name a time
    /// dimension of this model.
    pub fn validate_agg_time_dimensions(&self) -> Result<()> {
        let declared = self
            .default_agg_time_dimension()
            .map(|name| ("model default".to_string(), name))
            .into_iter()
            .chain(self.measures.iter().filter_map(|m| {
                m.agg_time_dimension
                    .as_deref()
                    .map(|name| (format!("measure `{}`", m.name), name))
            }));

        for (owner, name) in declared {
            match self.get_dimension(name) {
                Some(d) if d.dimension_type == DimensionType::Time => {}
                Some(_) => {
                    return Err(MetricplanError::Validation(format!(
                        "semantic model {}: agg_time_dimension `{name}` of {owner} is not a time dimension",
                        self.name
                    )))
                }
                None => {
                    return Err(MetricplanError::Validation(format!(
                        "semantic model {}: agg_time_dimension `{name}` of {owner} does not exist",
                        self.name
                    )))
                }
            }
        }
        Ok(())
    }

    fn default_agg_time_dimension(&self) -> Option<&str> {
        self.defaults
            .as_ref()
            .and_then(|d| d.agg_time_dimension.as_deref())
    }

    fn time_dimension(&self, name: &str) -> Option<&Dimension> {
        self.get_dimension(name)
            .filter(|d| d.dimension_type == DimensionType::Time)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDefaults {
    pub agg_time_dimension: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Entity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub expr: Option<String>,
}

impl Entity {
    pub fn column(&self) -> &str {
        self.expr.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Primary,
    Unique,
    Foreign,
    /// Primary key of an SCD table: unique only within a validity window.
    Natural,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dimension {
    pub name: String,
    #[serde(rename = "type")]
    pub dimension_type: DimensionType,
    pub expr: Option<String>,
    #[serde(default)]
    pub type_params: Option<DimensionTypeParams>,
}

impl Dimension {
    pub fn column(&self) -> &str {
        self.expr.as_deref().unwrap_or(&self.name)
    }

    /// Defined granularity of a time dimension. Time dimensions without type params
    /// default to daily.
    pub fn time_granularity(&self) -> Option<TimeGranularity> {
        match self.dimension_type {
            DimensionType::Time => Some(
                self.type_params
                    .as_ref()
                    .map(|p| p.time_granularity)
                    .unwrap_or(TimeGranularity::Day),
            ),
            DimensionType::Categorical => None,
        }
    }

    pub fn validity_params(&self) -> Option<&ValidityParams> {
        self.type_params
            .as_ref()
            .and_then(|p| p.validity_params.as_ref())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DimensionType {
    Categorical,
    Time,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionTypeParams {
    pub time_granularity: TimeGranularity,
    #[serde(default)]
    pub validity_params: Option<ValidityParams>,
}

/// Marks a time dimension as the start or end of an SCD row's validity window.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidityParams {
    #[serde(default)]
    pub is_start: bool,
    #[serde(default)]
    pub is_end: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Measure {
    pub name: String,
    pub agg: AggregationType,
    pub expr: Option<String>,
    #[serde(default)]
    pub agg_time_dimension: Option<String>,
}

impl Measure {
    pub fn column(&self) -> &str {
        self.expr.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AggregationType {
    Sum,
    Count,
    CountDistinct,
    Min,
    Max,
    Average,
}
