//! Specs describe "a column, abstractly": which semantic element it carries and the
//! entity path it was reached through. They never say how the column is rendered.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::naming::{StructuredLinkableSpecName, DUNDER};

/// Element name of the time dimension that every metric is aggregated against.
pub const METRIC_TIME_ELEMENT_NAME: &str = "metric_time";

/// Time granularities, declared smallest to largest so the derived `Ord` is the
/// granularity order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeGranularity {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl TimeGranularity {
    pub const ALL: [TimeGranularity; 8] = [
        TimeGranularity::Second,
        TimeGranularity::Minute,
        TimeGranularity::Hour,
        TimeGranularity::Day,
        TimeGranularity::Week,
        TimeGranularity::Month,
        TimeGranularity::Quarter,
        TimeGranularity::Year,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TimeGranularity::Second => "second",
            TimeGranularity::Minute => "minute",
            TimeGranularity::Hour => "hour",
            TimeGranularity::Day => "day",
            TimeGranularity::Week => "week",
            TimeGranularity::Month => "month",
            TimeGranularity::Quarter => "quarter",
            TimeGranularity::Year => "year",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.name() == name)
    }

    /// This granularity and every coarser one.
    pub fn and_coarser(self) -> impl Iterator<Item = TimeGranularity> {
        Self::ALL.into_iter().filter(move |g| *g >= self)
    }
}

impl fmt::Display for TimeGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePart {
    Year,
    Quarter,
    Month,
    Day,
    Dow,
    Doy,
}

impl DatePart {
    pub const ALL: [DatePart; 6] = [
        DatePart::Year,
        DatePart::Quarter,
        DatePart::Month,
        DatePart::Day,
        DatePart::Dow,
        DatePart::Doy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DatePart::Year => "year",
            DatePart::Quarter => "quarter",
            DatePart::Month => "month",
            DatePart::Day => "day",
            DatePart::Dow => "dow",
            DatePart::Doy => "doy",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// How a time value was aggregated before it reached the current data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationState {
    /// First value of the period.
    Start,
    /// Last value of the period.
    End,
    Complete,
}

impl AggregationState {
    pub const ALL: [AggregationState; 3] = [
        AggregationState::Start,
        AggregationState::End,
        AggregationState::Complete,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AggregationState::Start => "START",
            AggregationState::End => "END",
            AggregationState::Complete => "COMPLETE",
        }
    }

    /// Reads the lower-cased form used as a column-name suffix (`end`).
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|state| state.name().to_lowercase() == suffix)
    }
}

/// One hop in an entity join path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityReference {
    pub element_name: String,
}

impl EntityReference {
    pub fn new(element_name: impl Into<String>) -> Self {
        Self {
            element_name: element_name.into(),
        }
    }
}

/// Build an entity path from plain names: `links(["listing", "user"])`.
pub fn links<I, S>(names: I) -> Vec<EntityReference>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    names.into_iter().map(EntityReference::new).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeasureSpec {
    pub element_name: String,
}

impl MeasureSpec {
    pub fn new(element_name: impl Into<String>) -> Self {
        Self {
            element_name: element_name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DimensionSpec {
    pub element_name: String,
    #[serde(default)]
    pub entity_links: Vec<EntityReference>,
}

impl DimensionSpec {
    pub fn new(element_name: impl Into<String>, entity_links: Vec<EntityReference>) -> Self {
        Self {
            element_name: element_name.into(),
            entity_links,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeDimensionSpec {
    pub element_name: String,
    #[serde(default)]
    pub entity_links: Vec<EntityReference>,
    pub time_granularity: TimeGranularity,
    #[serde(default)]
    pub date_part: Option<DatePart>,
    #[serde(default)]
    pub aggregation_state: Option<AggregationState>,
}

impl TimeDimensionSpec {
    pub fn new(
        element_name: impl Into<String>,
        entity_links: Vec<EntityReference>,
        time_granularity: TimeGranularity,
    ) -> Self {
        Self {
            element_name: element_name.into(),
            entity_links,
            time_granularity,
            date_part: None,
            aggregation_state: None,
        }
    }

    pub fn metric_time(time_granularity: TimeGranularity) -> Self {
        Self::new(METRIC_TIME_ELEMENT_NAME, Vec::new(), time_granularity)
    }

    pub fn with_date_part(mut self, date_part: DatePart) -> Self {
        self.date_part = Some(date_part);
        self
    }

    pub fn with_aggregation_state(mut self, state: AggregationState) -> Self {
        self.aggregation_state = Some(state);
        self
    }

    pub fn is_metric_time(&self) -> bool {
        self.element_name == METRIC_TIME_ELEMENT_NAME
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntitySpec {
    pub element_name: String,
    #[serde(default)]
    pub entity_links: Vec<EntityReference>,
}

impl EntitySpec {
    pub fn new(element_name: impl Into<String>, entity_links: Vec<EntityReference>) -> Self {
        Self {
            element_name: element_name.into(),
            entity_links,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricSpec {
    pub element_name: String,
    #[serde(default)]
    pub alias: Option<String>,
}

impl MetricSpec {
    pub fn new(element_name: impl Into<String>) -> Self {
        Self {
            element_name: element_name.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// Aggregations applied to bookkeeping columns (row counts, load timestamps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataAggregation {
    Count,
    Min,
    Max,
}

impl MetadataAggregation {
    pub fn name(&self) -> &'static str {
        match self {
            MetadataAggregation::Count => "count",
            MetadataAggregation::Min => "min",
            MetadataAggregation::Max => "max",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetadataSpec {
    pub element_name: String,
    #[serde(default)]
    pub agg_type: Option<MetadataAggregation>,
}

impl MetadataSpec {
    pub fn new(element_name: impl Into<String>) -> Self {
        Self {
            element_name: element_name.into(),
            agg_type: None,
        }
    }

    pub fn with_agg_type(mut self, agg_type: MetadataAggregation) -> Self {
        self.agg_type = Some(agg_type);
        self
    }

    pub fn qualified_name(&self) -> String {
        match self.agg_type {
            Some(agg) => format!("{}{DUNDER}{}", agg.name(), self.element_name),
            None => self.element_name.clone(),
        }
    }
}

/// A metric used as a group-by item, evaluated per entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupByMetricSpec {
    pub element_name: String,
    #[serde(default)]
    pub entity_links: Vec<EntityReference>,
}

impl GroupByMetricSpec {
    pub fn new(element_name: impl Into<String>, entity_links: Vec<EntityReference>) -> Self {
        Self {
            element_name: element_name.into(),
            entity_links,
        }
    }
}

/// The closed set of spec kinds. Consumers match on this exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InstanceSpec {
    Measure(MeasureSpec),
    Dimension(DimensionSpec),
    TimeDimension(TimeDimensionSpec),
    Entity(EntitySpec),
    Metric(MetricSpec),
    Metadata(MetadataSpec),
    GroupByMetric(GroupByMetricSpec),
}

impl InstanceSpec {
    pub fn element_name(&self) -> &str {
        match self {
            InstanceSpec::Measure(s) => &s.element_name,
            InstanceSpec::Dimension(s) => &s.element_name,
            InstanceSpec::TimeDimension(s) => &s.element_name,
            InstanceSpec::Entity(s) => &s.element_name,
            InstanceSpec::Metric(s) => &s.element_name,
            InstanceSpec::Metadata(s) => &s.element_name,
            InstanceSpec::GroupByMetric(s) => &s.element_name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InstanceSpec::Measure(_) => "measure",
            InstanceSpec::Dimension(_) => "dimension",
            InstanceSpec::TimeDimension(_) => "time dimension",
            InstanceSpec::Entity(_) => "entity",
            InstanceSpec::Metric(_) => "metric",
            InstanceSpec::Metadata(_) => "metadata",
            InstanceSpec::GroupByMetric(_) => "group-by metric",
        }
    }
}

impl From<MeasureSpec> for InstanceSpec {
    fn from(spec: MeasureSpec) -> Self {
        InstanceSpec::Measure(spec)
    }
}

impl From<DimensionSpec> for InstanceSpec {
    fn from(spec: DimensionSpec) -> Self {
        InstanceSpec::Dimension(spec)
    }
}

impl From<TimeDimensionSpec> for InstanceSpec {
    fn from(spec: TimeDimensionSpec) -> Self {
        InstanceSpec::TimeDimension(spec)
    }
}

impl From<EntitySpec> for InstanceSpec {
    fn from(spec: EntitySpec) -> Self {
        InstanceSpec::Entity(spec)
    }
}

impl From<MetricSpec> for InstanceSpec {
    fn from(spec: MetricSpec) -> Self {
        InstanceSpec::Metric(spec)
    }
}

impl From<MetadataSpec> for InstanceSpec {
    fn from(spec: MetadataSpec) -> Self {
        InstanceSpec::Metadata(spec)
    }
}

impl From<GroupByMetricSpec> for InstanceSpec {
    fn from(spec: GroupByMetricSpec) -> Self {
        InstanceSpec::GroupByMetric(spec)
    }
}

// Display always spells out the granularity so messages are unambiguous
// regardless of the naming scheme's default.

impl fmt::Display for DimensionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = StructuredLinkableSpecName::new(&self.entity_links, &self.element_name);
        f.write_str(&name.qualified_name())
    }
}

impl fmt::Display for EntitySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = StructuredLinkableSpecName::new(&self.entity_links, &self.element_name);
        f.write_str(&name.qualified_name())
    }
}

impl fmt::Display for TimeDimensionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut name = StructuredLinkableSpecName::new(&self.entity_links, &self.element_name)
            .with_time_granularity(self.time_granularity);
        if let Some(part) = self.date_part {
            name = name.with_date_part(part);
        }
        f.write_str(&name.qualified_name())
    }
}
