//! Pure constructors for the ON-condition expressions of the supported join shapes.

use crate::specs::TimeGranularity;
use crate::sql_ast::{SqlBinaryOperator, SqlExpr};

use super::request::TimeWindow;

/// `left.left_col = right.right_col`, widened to also match two NULLs when
/// `treat_nulls_as_equal` is set.
pub fn equality_condition(
    left_alias: &str,
    left_column: &str,
    right_alias: &str,
    right_column: &str,
    treat_nulls_as_equal: bool,
) -> SqlExpr {
    let left = SqlExpr::column(left_alias, left_column);
    let right = SqlExpr::column(right_alias, right_column);
    let equal = SqlExpr::binary(SqlBinaryOperator::Eq, left.clone(), right.clone());
    if !treat_nulls_as_equal {
        return equal;
    }
    SqlExpr::or(vec![
        equal,
        SqlExpr::and(vec![SqlExpr::is_null(left), SqlExpr::is_null(right)]),
    ])
}

/// `left_time >= start AND (left_time < end OR end IS NULL)`.
pub fn validity_window_condition(
    left_alias: &str,
    left_time_column: &str,
    right_alias: &str,
    window_start_column: &str,
    window_end_column: &str,
) -> SqlExpr {
    SqlExpr::and(
        validity_window_bounds(
            left_alias,
            left_time_column,
            right_alias,
            window_start_column,
            window_end_column,
        )
        .into(),
    )
}

/// The two conjuncts of [`validity_window_condition`], so the assembler can add them
/// to a join's flat AND instead of nesting one.
pub(crate) fn validity_window_bounds(
    left_alias: &str,
    left_time_column: &str,
    right_alias: &str,
    window_start_column: &str,
    window_end_column: &str,
) -> [SqlExpr; 2] {
    let left_time = SqlExpr::column(left_alias, left_time_column);
    let window_start = SqlExpr::column(right_alias, window_start_column);
    let window_end = SqlExpr::column(right_alias, window_end_column);
    [
        SqlExpr::binary(SqlBinaryOperator::Gte, left_time.clone(), window_start),
        SqlExpr::or(vec![
            SqlExpr::binary(SqlBinaryOperator::Lt, left_time, window_end.clone()),
            SqlExpr::is_null(window_end),
        ]),
    ]
}

/// Range condition between a metric's time column and the time spine.
///
/// `window` and `grain_to_date` are expected to be mutually exclusive; when both are
/// given the window wins. With neither, the lookback is unbounded. The result is
/// always an AND node, even with a single bound.
pub fn cumulative_time_range_condition(
    metric_alias: &str,
    metric_time_column: &str,
    spine_alias: &str,
    spine_time_column: &str,
    window: Option<TimeWindow>,
    grain_to_date: Option<TimeGranularity>,
) -> SqlExpr {
    let metric_time = SqlExpr::column(metric_alias, metric_time_column);
    let spine_time = SqlExpr::column(spine_alias, spine_time_column);

    let mut bounds = vec![SqlExpr::binary(
        SqlBinaryOperator::Lte,
        metric_time.clone(),
        spine_time.clone(),
    )];

    if let Some(window) = window {
        bounds.push(SqlExpr::binary(
            SqlBinaryOperator::Gt,
            metric_time,
            SqlExpr::TimeDelta {
                expr: Box::new(spine_time),
                count: window.count,
                granularity: window.granularity,
            },
        ));
    } else if let Some(grain) = grain_to_date {
        bounds.push(SqlExpr::binary(
            SqlBinaryOperator::Gte,
            metric_time,
            SqlExpr::DateTrunc {
                grain,
                expr: Box::new(spine_time),
            },
        ));
    }

    SqlExpr::and(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql_ast::SqlRenderer;

    fn render(expr: &SqlExpr) -> String {
        SqlRenderer::new().render_expr(expr)
    }

    #[test]
    fn plain_equality() {
        let expr = equality_condition("l", "listing", "r", "listing", false);
        assert_eq!(render(&expr), r#"("l"."listing" = "r"."listing")"#);
    }

    #[test]
    fn validity_window_accepts_open_ended_rows() {
        let expr = validity_window_condition("l", "metric_time", "r", "window_start", "window_end");
        assert_eq!(
            render(&expr),
            r#"(("l"."metric_time" >= "r"."window_start") AND (("l"."metric_time" < "r"."window_end") OR "r"."window_end" IS NULL))"#
        );
    }

    #[test]
    fn unbounded_cumulative_condition_is_single_bound_and() {
        let expr = cumulative_time_range_condition("m", "metric_time", "s", "ds", None, None);
        match &expr {
            SqlExpr::Logical { args, .. } => assert_eq!(args.len(), 1),
            other => panic!("expected AND node, got {other:?}"),
        }
        assert_eq!(render(&expr), r#"(("m"."metric_time" <= "s"."ds"))"#);
    }

    #[test]
    fn window_takes_precedence_over_grain_to_date() {
        let expr = cumulative_time_range_condition(
            "m",
            "metric_time",
            "s",
            "ds",
            Some(TimeWindow::new(2, TimeGranularity::Week)),
            Some(TimeGranularity::Month),
        );
        let sql = render(&expr);
        assert!(sql.contains("INTERVAL 2 week"));
        assert!(!sql.contains("DATE_TRUNC"));
    }
}
