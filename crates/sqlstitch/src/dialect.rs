//! Dialect seam: case folding and ORDER BY rendering.
//!
//! The engine itself emits portable SQL. Case folding for case-insensitive
//! patterns and null precedence in ORDER BY are the two places databases
//! disagree; both go through [`Dialect`]. A criteria without
//! a dialect gets the trait defaults: `LOWER(..)` and plain `ASC`/`DESC`
//! with no null-precedence clause.

use std::fmt;

/// Sort direction for one ORDER BY element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        })
    }
}

/// Null placement for one ORDER BY element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// Database-specific rendering hooks.
pub trait Dialect: Send + Sync {
    /// Wrap an expression in the dialect's case-folding function.
    fn fold_case(&self, expr: &str) -> String {
        format!("LOWER({expr})")
    }

    /// Render one ORDER BY element with optional null precedence.
    fn order_item(
        &self,
        column: &str,
        direction: OrderDirection,
        nulls: Option<NullsOrder>,
    ) -> String {
        let _ = nulls;
        format!("{column} {direction}")
    }
}

/// Plain standard SQL: the trait defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnsiDialect;

impl Dialect for AnsiDialect {}

/// PostgreSQL: supports `NULLS FIRST` / `NULLS LAST`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgDialect;

impl Dialect for PgDialect {
    fn order_item(
        &self,
        column: &str,
        direction: OrderDirection,
        nulls: Option<NullsOrder>,
    ) -> String {
        match nulls {
            None => format!("{column} {direction}"),
            Some(NullsOrder::First) => format!("{column} {direction} NULLS FIRST"),
            Some(NullsOrder::Last) => format!("{column} {direction} NULLS LAST"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ansi_ignores_null_precedence() {
        let d = AnsiDialect;
        assert_eq!(
            d.order_item("age", OrderDirection::Desc, Some(NullsOrder::Last)),
            "age DESC"
        );
    }

    #[test]
    fn pg_renders_null_precedence() {
        let d = PgDialect;
        assert_eq!(
            d.order_item("age", OrderDirection::Asc, Some(NullsOrder::First)),
            "age ASC NULLS FIRST"
        );
        assert_eq!(d.order_item("age", OrderDirection::Asc, None), "age ASC");
    }

    #[test]
    fn default_case_folding_is_lower() {
        let d = PgDialect;
        assert_eq!(d.fold_case("name"), "LOWER(name)");
    }
}
