pub mod column_assoc;
pub mod config;
pub mod converter;
pub mod dataset;
pub mod error;
pub mod join_builder;
pub mod logging;
pub mod models;
pub mod naming;
pub mod registry;
pub mod specs;
pub mod sql_ast;

use std::path::Path;

use crate::error::Result;
use crate::registry::SemanticModelLookup;

/// Load every semantic model under `model_dir` and check that each one names real
/// time dimensions as its aggregation time dimensions and, for SCD models, declares
/// a complete validity window.
pub fn load_semantic_models<P: AsRef<Path>>(model_dir: P) -> Result<SemanticModelLookup> {
    let lookup = SemanticModelLookup::load_from_dir(model_dir)?;
    for model in lookup.models.values() {
        model.validate_agg_time_dimensions()?;
        lookup.validity_window(&model.name)?;
    }
    Ok(lookup)
}

pub use column_assoc::{
    ColumnAssociation, ColumnAssociationResolver, ColumnCorrelationKey,
    DunderColumnAssociationResolver,
};
pub use config::MetricplanConfig;
pub use converter::SemanticModelToDataSetConverter;
pub use dataset::{DataSet, SqlDataSet};
pub use error::MetricplanError;
pub use join_builder::{AnnotatedDataSet, ColumnEqualityDescription, JoinRequest, SqlJoinBuilder};
pub use models::SemanticModel;
pub use naming::NamingScheme;
pub use specs::InstanceSpec;
pub use sql_ast::{SqlJoinDescription, SqlJoinType, SqlRenderer};
