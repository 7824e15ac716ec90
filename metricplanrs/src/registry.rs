use std::collections::HashMap;
use std::fs;
use std::path::Path;

use glob::glob;

use crate::error::{MetricplanError, Result};
use crate::join_builder::ValidityWindow;
use crate::models::{Dimension, SemanticModel};
use crate::specs::{EntityReference, TimeDimensionSpec, TimeGranularity};

/// Read-only catalog of semantic models. Populated once, then shared by reference
/// across every plan-building thread.
#[derive(Debug, Default, Clone)]
pub struct SemanticModelLookup {
    pub models: HashMap<String, SemanticModel>,
}

impl SemanticModelLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(models: Vec<SemanticModel>) -> Self {
        let mut lookup = SemanticModelLookup::new();
        for model in models {
            lookup.insert(model);
        }
        lookup
    }

    /// Load every `*.yml` / `*.yaml` file directly under `dir`, one model per file.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Err(MetricplanError::Validation(format!(
                "semantic model directory not found: {}",
                dir.display()
            )));
        }
        let mut lookup = SemanticModelLookup::new();
        for pattern in ["yml", "yaml"] {
            for entry in glob(&format!("{}/*.{pattern}", dir.display()))
                .map_err(|e| MetricplanError::Other(e.into()))?
                .flatten()
            {
                lookup.load_model_file(&entry)?;
            }
        }
        tracing::debug!(dir = %dir.display(), models = lookup.models.len(), "loaded semantic models");
        Ok(lookup)
    }

    fn load_model_file(&mut self, path: &Path) -> Result<()> {
        let contents = fs::read_to_string(path)?;
        let model: SemanticModel = serde_yaml::from_str(&contents)?;
        self.insert(model);
        Ok(())
    }

    fn insert(&mut self, model: SemanticModel) {
        if let Some(previous) = self.models.insert(model.name.clone(), model) {
            tracing::warn!(model = %previous.name, "semantic model defined twice; keeping the last definition");
        }
    }

    pub fn get_model(&self, name: &str) -> Option<&SemanticModel> {
        self.models.get(name)
    }

    pub fn require_model(&self, name: &str) -> Result<&SemanticModel> {
        self.get_model(name)
            .ok_or_else(|| MetricplanError::Validation(format!("unknown semantic model {name}")))
    }

    pub fn primary_entity(&self, model_name: &str) -> Result<EntityReference> {
        let model = self.require_model(model_name)?;
        model
            .primary_entity()
            .map(|e| EntityReference::new(e.name.as_str()))
            .ok_or_else(|| {
                MetricplanError::Validation(format!(
                    "semantic model {model_name} has no primary entity"
                ))
            })
    }

    /// The validity window of an SCD model: its start and end time dimensions,
    /// linked through the primary entity the way they appear in joined data sets.
    /// `None` for models without validity params.
    pub fn validity_window(&self, model_name: &str) -> Result<Option<ValidityWindow>> {
        let model = self.require_model(model_name)?;
        let start = model
            .dimensions
            .iter()
            .find(|d| d.validity_params().is_some_and(|p| p.is_start));
        let end = model
            .dimensions
            .iter()
            .find(|d| d.validity_params().is_some_and(|p| p.is_end));

        let (start, end) = match (start, end) {
            (None, None) => return Ok(None),
            (Some(start), Some(end)) => (start, end),
            _ => {
                return Err(MetricplanError::Validation(format!(
                    "semantic model {model_name} must define both a validity window start and end"
                )))
            }
        };

        let primary = self.primary_entity(model_name)?;
        let spec_for = |dim: &Dimension| {
            TimeDimensionSpec::new(
                dim.name.as_str(),
                vec![primary.clone()],
                dim.time_granularity().unwrap_or(TimeGranularity::Day),
            )
        };
        Ok(Some(ValidityWindow {
            window_start_dimension: spec_for(start),
            window_end_dimension: spec_for(end),
        }))
    }
}
