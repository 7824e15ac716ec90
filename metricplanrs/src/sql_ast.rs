use std::fmt;

use crate::specs::TimeGranularity;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlExpr {
    Column {
        table: Option<String>,
        name: String,
    },
    BinaryOp {
        op: SqlBinaryOperator,
        left: Box<SqlExpr>,
        right: Box<SqlExpr>,
    },
    /// N-ary AND / OR.
    Logical {
        op: SqlLogicalOperator,
        args: Vec<SqlExpr>,
    },
    IsNull(Box<SqlExpr>),
    DateTrunc {
        grain: TimeGranularity,
        expr: Box<SqlExpr>,
    },
    /// `expr` shifted back by `count` units of `granularity`.
    TimeDelta {
        expr: Box<SqlExpr>,
        count: u32,
        granularity: TimeGranularity,
    },
}

impl SqlExpr {
    pub fn column(table: &str, name: &str) -> Self {
        SqlExpr::Column {
            table: Some(table.to_string()),
            name: name.to_string(),
        }
    }

    pub fn binary(op: SqlBinaryOperator, left: SqlExpr, right: SqlExpr) -> Self {
        SqlExpr::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_null(expr: SqlExpr) -> Self {
        SqlExpr::IsNull(Box::new(expr))
    }

    pub fn and(args: Vec<SqlExpr>) -> Self {
        SqlExpr::Logical {
            op: SqlLogicalOperator::And,
            args,
        }
    }

    pub fn or(args: Vec<SqlExpr>) -> Self {
        SqlExpr::Logical {
            op: SqlLogicalOperator::Or,
            args,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlBinaryOperator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlLogicalOperator {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expr: SqlExpr,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableRef {
    pub name: String,
    pub alias: Option<String>,
    pub subquery: Option<Box<SelectQuery>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlJoinType {
    Inner,
    LeftOuter,
    Cross,
}

impl fmt::Display for SqlJoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            SqlJoinType::Inner => "INNER JOIN",
            SqlJoinType::LeftOuter => "LEFT OUTER JOIN",
            SqlJoinType::Cross => "CROSS JOIN",
        };
        f.write_str(keyword)
    }
}

/// One join site: the right-hand source, its alias, and how it attaches to the
/// sources already in the FROM clause.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlJoinDescription {
    pub right_source: Box<SelectQuery>,
    pub right_source_alias: String,
    pub on_condition: Option<SqlExpr>,
    pub join_type: SqlJoinType,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub select: Vec<SelectItem>,
    pub from: TableRef,
    pub joins: Vec<SqlJoinDescription>,
}

/// Plain ANSI rendering with double-quoted identifiers, for logs, tests and the
/// demo binary. Warehouses get their own renderers downstream.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlRenderer;

impl SqlRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render_select(&self, query: &SelectQuery) -> String {
        let select_items: Vec<String> = query
            .select
            .iter()
            .map(|item| {
                let expr_sql = self.render_expr(&item.expr);
                match &item.alias {
                    Some(alias) => format!("{expr_sql} AS {}", quote_ident(alias)),
                    None => expr_sql,
                }
            })
            .collect();

        let select_list = if select_items.is_empty() {
            "*".to_string()
        } else {
            select_items.join(", ")
        };
        let mut sql = format!(
            "SELECT {select_list} FROM {}",
            self.render_table_ref(&query.from)
        );

        for join in &query.joins {
            sql.push(' ');
            sql.push_str(&self.render_join(join));
        }

        sql
    }

    pub fn render_join(&self, join: &SqlJoinDescription) -> String {
        let mut sql = format!(
            "{} ({}) {}",
            join.join_type,
            self.render_select(&join.right_source),
            quote_ident(&join.right_source_alias)
        );
        if let Some(on) = &join.on_condition {
            sql.push_str(&format!(" ON {}", self.render_expr(on)));
        }
        sql
    }

    fn render_table_ref(&self, table: &TableRef) -> String {
        let source = match &table.subquery {
            Some(subquery) => format!("({})", self.render_select(subquery)),
            None => quote_ident(&table.name),
        };
        match &table.alias {
            Some(alias) => format!("{source} {}", quote_ident(alias)),
            None => source,
        }
    }

    pub fn render_expr(&self, expr: &SqlExpr) -> String {
        match expr {
            SqlExpr::Column { table, name } => match table {
                Some(t) => format!("{}.{}", quote_ident(t), quote_ident(name)),
                None => quote_ident(name),
            },
            SqlExpr::BinaryOp { op, left, right } => {
                let op_sql = match op {
                    SqlBinaryOperator::Eq => "=",
                    SqlBinaryOperator::Gt => ">",
                    SqlBinaryOperator::Gte => ">=",
                    SqlBinaryOperator::Lt => "<",
                    SqlBinaryOperator::Lte => "<=",
                };
                format!(
                    "({} {} {})",
                    self.render_expr(left),
                    op_sql,
                    self.render_expr(right)
                )
            }
            SqlExpr::Logical { op, args } => {
                let op_sql = match op {
                    SqlLogicalOperator::And => " AND ",
                    SqlLogicalOperator::Or => " OR ",
                };
                let rendered: Vec<String> = args.iter().map(|a| self.render_expr(a)).collect();
                format!("({})", rendered.join(op_sql))
            }
            SqlExpr::IsNull(expr) => format!("{} IS NULL", self.render_expr(expr)),
            SqlExpr::DateTrunc { grain, expr } => {
                format!("DATE_TRUNC('{}', {})", grain.name(), self.render_expr(expr))
            }
            SqlExpr::TimeDelta {
                expr,
                count,
                granularity,
            } => format!(
                "({} - INTERVAL {count} {})",
                self.render_expr(expr),
                granularity.name()
            ),
        }
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_null_safe_equality() {
        let left = SqlExpr::column("a", "listing");
        let right = SqlExpr::column("b", "listing");
        let expr = SqlExpr::or(vec![
            SqlExpr::binary(SqlBinaryOperator::Eq, left.clone(), right.clone()),
            SqlExpr::and(vec![SqlExpr::is_null(left), SqlExpr::is_null(right)]),
        ]);
        assert_eq!(
            SqlRenderer::new().render_expr(&expr),
            r#"(("a"."listing" = "b"."listing") OR ("a"."listing" IS NULL AND "b"."listing" IS NULL))"#
        );
    }

    #[test]
    fn renders_time_arithmetic() {
        let spine = SqlExpr::column("ts", "metric_time");
        let delta = SqlExpr::TimeDelta {
            expr: Box::new(spine.clone()),
            count: 7,
            granularity: TimeGranularity::Day,
        };
        let trunc = SqlExpr::DateTrunc {
            grain: TimeGranularity::Month,
            expr: Box::new(spine),
        };
        let renderer = SqlRenderer::new();
        assert_eq!(
            renderer.render_expr(&delta),
            r#"("ts"."metric_time" - INTERVAL 7 day)"#
        );
        assert_eq!(
            renderer.render_expr(&trunc),
            r#"DATE_TRUNC('month', "ts"."metric_time")"#
        );
    }

    #[test]
    fn renders_cross_join_without_on_clause() {
        let mut query = SelectQuery::default();
        query.from = TableRef {
            name: "bookings".to_string(),
            alias: Some("b".to_string()),
            subquery: None,
        };
        query.joins.push(SqlJoinDescription {
            right_source: Box::new(SelectQuery {
                from: TableRef {
                    name: "time_spine".to_string(),
                    alias: None,
                    subquery: None,
                },
                ..Default::default()
            }),
            right_source_alias: "ts".to_string(),
            on_condition: None,
            join_type: SqlJoinType::Cross,
        });
        assert_eq!(
            SqlRenderer::new().render_select(&query),
            r#"SELECT * FROM "bookings" "b" CROSS JOIN (SELECT * FROM "time_spine") "ts""#
        );
    }
}
