//! Dunder naming: the deterministic mapping from a spec's entity path, element name,
//! granularity and date part to one SQL column name.
//!
//! Names double as join keys between independently resolved data sets, so two data
//! sets agree on a column only if they produce byte-identical names for it.

use crate::specs::{AggregationState, DatePart, EntityReference, TimeGranularity};

/// Separator between entity links, element name and qualifiers.
pub const DUNDER: &str = "__";

/// Prefix that marks a qualifier as a date part rather than a granularity.
pub const DATE_PART_PREFIX: &str = "extract_";

/// The structured pieces of a qualified name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredLinkableSpecName {
    pub entity_link_names: Vec<String>,
    pub element_name: String,
    pub time_granularity: Option<TimeGranularity>,
    pub date_part: Option<DatePart>,
    pub aggregation_state: Option<AggregationState>,
}

impl StructuredLinkableSpecName {
    pub fn new(entity_links: &[EntityReference], element_name: &str) -> Self {
        Self {
            entity_link_names: entity_links
                .iter()
                .map(|link| link.element_name.clone())
                .collect(),
            element_name: element_name.to_string(),
            time_granularity: None,
            date_part: None,
            aggregation_state: None,
        }
    }

    pub fn with_time_granularity(mut self, granularity: TimeGranularity) -> Self {
        self.time_granularity = Some(granularity);
        self
    }

    pub fn with_date_part(mut self, date_part: DatePart) -> Self {
        self.date_part = Some(date_part);
        self
    }

    pub fn with_aggregation_state(mut self, state: AggregationState) -> Self {
        self.aggregation_state = Some(state);
        self
    }

    /// `link1__link2__element[__granularity][__extract_part][__state]`
    pub fn qualified_name(&self) -> String {
        let mut items: Vec<&str> = self
            .entity_link_names
            .iter()
            .map(String::as_str)
            .collect();
        items.push(&self.element_name);
        if let Some(granularity) = &self.time_granularity {
            items.push(granularity.name());
        }
        let suffix = self.date_part.map(date_part_suffix);
        if let Some(suffix) = &suffix {
            items.push(suffix);
        }
        let state = self.aggregation_state.map(|s| s.name().to_lowercase());
        if let Some(state) = &state {
            items.push(state);
        }
        items.join(DUNDER)
    }

    /// Split a qualified name back into its pieces.
    ///
    /// Qualifiers are read from the end: a lower-cased aggregation state (`end`),
    /// then `extract_<part>` as a date part, then a granularity word, each only while
    /// something is left over for the element name. Names whose element is itself
    /// one of those words (`listing__month`, `listing__end`) read as a qualifier;
    /// such names are ambiguous by construction.
    pub fn from_qualified_name(qualified_name: &str) -> Self {
        let mut parts: Vec<&str> = qualified_name.split(DUNDER).collect();

        let mut aggregation_state = None;
        if parts.len() > 1 {
            if let Some(state) = parts.last().and_then(|last| AggregationState::from_suffix(last)) {
                aggregation_state = Some(state);
                parts.pop();
            }
        }

        let mut date_part = None;
        if parts.len() > 1 {
            if let Some(part) = parts
                .last()
                .and_then(|last| last.strip_prefix(DATE_PART_PREFIX))
                .and_then(DatePart::from_name)
            {
                date_part = Some(part);
                parts.pop();
            }
        }

        let mut time_granularity = None;
        if parts.len() > 1 {
            if let Some(granularity) = parts.last().and_then(|last| TimeGranularity::from_name(last))
            {
                time_granularity = Some(granularity);
                parts.pop();
            }
        }

        let element_name = parts.pop().unwrap_or_default().to_string();
        Self {
            entity_link_names: parts.into_iter().map(str::to_string).collect(),
            element_name,
            time_granularity,
            date_part,
            aggregation_state,
        }
    }
}

pub fn date_part_suffix(date_part: DatePart) -> String {
    format!("{DATE_PART_PREFIX}{}", date_part.name())
}

/// Naming rules shared by every spec kind.
///
/// The default granularity is the one a time dimension carries when nobody asked for
/// anything coarser; columns at that granularity are not suffixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamingScheme {
    pub default_granularity: TimeGranularity,
}

impl Default for NamingScheme {
    fn default() -> Self {
        Self {
            default_granularity: TimeGranularity::Day,
        }
    }
}

impl NamingScheme {
    pub fn new(default_granularity: TimeGranularity) -> Self {
        Self {
            default_granularity,
        }
    }

    pub fn qualify(
        &self,
        entity_links: &[EntityReference],
        element_name: &str,
        granularity: Option<TimeGranularity>,
        date_part: Option<DatePart>,
    ) -> String {
        let mut name = StructuredLinkableSpecName::new(entity_links, element_name);
        if let Some(granularity) = granularity.filter(|g| *g != self.default_granularity) {
            name = name.with_time_granularity(granularity);
        }
        if let Some(date_part) = date_part {
            name = name.with_date_part(date_part);
        }
        name.qualified_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specs::links;

    #[test]
    fn joins_links_and_element_with_dunder() {
        let scheme = NamingScheme::default();
        assert_eq!(
            scheme.qualify(&links(["listing"]), "country", None, None),
            "listing__country"
        );
        assert_eq!(
            scheme.qualify(&links(["listing", "user"]), "country", None, None),
            "listing__user__country"
        );
        assert_eq!(scheme.qualify(&[], "country", None, None), "country");
    }

    #[test]
    fn default_granularity_is_not_suffixed() {
        let scheme = NamingScheme::default();
        assert_eq!(
            scheme.qualify(&links(["booking"]), "paid_at", Some(TimeGranularity::Day), None),
            "booking__paid_at"
        );
        assert_eq!(
            scheme.qualify(&links(["booking"]), "paid_at", Some(TimeGranularity::Month), None),
            "booking__paid_at__month"
        );

        let hourly = NamingScheme::new(TimeGranularity::Hour);
        assert_eq!(
            hourly.qualify(&links(["booking"]), "paid_at", Some(TimeGranularity::Day), None),
            "booking__paid_at__day"
        );
    }

    #[test]
    fn granularity_precedes_date_part() {
        let scheme = NamingScheme::default();
        assert_eq!(
            scheme.qualify(
                &links(["booking"]),
                "paid_at",
                Some(TimeGranularity::Month),
                Some(DatePart::Dow)
            ),
            "booking__paid_at__month__extract_dow"
        );
        assert_eq!(
            scheme.qualify(&[], "metric_time", Some(TimeGranularity::Day), Some(DatePart::Month)),
            "metric_time__extract_month"
        );
    }

    #[test]
    fn date_part_never_collides_with_granularity() {
        let scheme = NamingScheme::default();
        let by_grain = scheme.qualify(&[], "ds", Some(TimeGranularity::Month), None);
        let by_part = scheme.qualify(&[], "ds", None, Some(DatePart::Month));
        assert_ne!(by_grain, by_part);
    }

    #[test]
    fn parses_qualified_name_back_into_parts() {
        let parsed = StructuredLinkableSpecName::from_qualified_name(
            "listing__user__created_at__week__extract_doy",
        );
        assert_eq!(parsed.entity_link_names, vec!["listing", "user"]);
        assert_eq!(parsed.element_name, "created_at");
        assert_eq!(parsed.time_granularity, Some(TimeGranularity::Week));
        assert_eq!(parsed.date_part, Some(DatePart::Doy));
        assert_eq!(
            parsed.qualified_name(),
            "listing__user__created_at__week__extract_doy"
        );
    }

    #[test]
    fn parses_aggregation_state_suffix() {
        let parsed = StructuredLinkableSpecName::from_qualified_name("booking__paid_at__month__end");
        assert_eq!(parsed.entity_link_names, vec!["booking"]);
        assert_eq!(parsed.element_name, "paid_at");
        assert_eq!(parsed.time_granularity, Some(TimeGranularity::Month));
        assert_eq!(parsed.aggregation_state, Some(AggregationState::End));
        assert_eq!(parsed.qualified_name(), "booking__paid_at__month__end");
    }

    #[test]
    fn upper_case_state_is_not_a_suffix() {
        let parsed = StructuredLinkableSpecName::from_qualified_name("booking__END");
        assert_eq!(parsed.element_name, "END");
        assert_eq!(parsed.aggregation_state, None);
    }

    #[test]
    fn lone_granularity_word_is_an_element_name() {
        let parsed = StructuredLinkableSpecName::from_qualified_name("month");
        assert_eq!(parsed.element_name, "month");
        assert!(parsed.entity_link_names.is_empty());
        assert_eq!(parsed.time_granularity, None);
    }
}
