use thiserror::Error;

use crate::sql_ast::SqlJoinType;

pub type Result<T> = std::result::Result<T, MetricplanError>;

/// Errors raised while loading a semantic model or compiling it into joins.
///
/// Everything below `Validation` is a model-consistency failure: deterministic for a
/// given model and request, so callers should surface it as a query-compilation error
/// instead of retrying.
#[derive(Debug, Error)]
pub enum MetricplanError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("data set does not contain {kind} `{name}`")]
    UnknownField { kind: &'static str, name: String },
    #[error("data set `{alias}` has no metric time column, required for {requested}")]
    MissingMetricTime { alias: String, requested: String },
    #[error(
        "cannot join to data set `{right_alias}` with validity window {window}: \
         data set `{left_alias}` has no metric time dimension to anchor the window"
    )]
    MissingValidityAnchor {
        left_alias: String,
        right_alias: String,
        window: String,
    },
    #[error(
        "cannot join on identifier `{identifier}`: left columns {left:?} do not match right columns {right:?}"
    )]
    IdentifierArityMismatch {
        identifier: String,
        left: Vec<String>,
        right: Vec<String>,
    },
    #[error("no column equality conditions specified for a {join_type}; this would render invalid SQL")]
    InvalidJoinShape { join_type: SqlJoinType },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
