//! Convenient imports for typical `sqlstitch` usage.
//!
//! This module is intentionally small and focused on the most common APIs so
//! examples can start with:
//!
//! ```
//! use sqlstitch::prelude::*;
//! ```

pub use crate::{
    BindRequest, CompareOp, Criteria, OrderDirection, Param, Params, Predicate,
    RenderedFragment, StitchError, StitchResult, TableDef, Target, TemplateArgs, TypeHint, col,
    expr,
};

pub use crate::{AnsiDialect, Dialect, NullsOrder, PgDialect};
