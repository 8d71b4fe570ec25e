//! # sqlstitch
//!
//! Runtime assembly of parameterized SQL fragments.
//!
//! ## Features
//!
//! - **Fluent criteria**: build `WHERE`/`GROUP BY`/`HAVING`/`ORDER BY`
//!   fragments with a chainable, fallible builder
//! - **Safe by construction**: every value binds to a named placeholder;
//!   raw identifiers are validated before they reach SQL text
//! - **Property mapping**: logical property names resolve to columns
//!   through relation metadata, strictly or leniently
//! - **Deterministic parameters**: placeholder names follow rendered text
//!   order and bind exactly once, however often you re-render
//! - **Executor-agnostic output**: named `:seq_n` fragments plus an
//!   ordered parameter map, with `$n` positional conversion for
//!   `tokio-postgres`
//!
//! ## Example
//!
//! ```
//! use sqlstitch::{Criteria, TableDef};
//!
//! # fn main() -> sqlstitch::StitchResult<()> {
//! let users = TableDef::new("users")?
//!     .column("userName", "user_name")?
//!     .column("status", "status")?
//!     .column("age", "age")?;
//!
//! let mut criteria = Criteria::new(users);
//! criteria
//!     .eq("status", "ACTIVE")?
//!     .nested(|c| c.contains("userName", "li")?.or().ge("age", 65_i32))?
//!     .order_by_desc("age")?;
//!
//! let rendered = criteria.render_select();
//! assert_eq!(
//!     rendered.fragment(),
//!     "SELECT user_name, status, age FROM users \
//!      WHERE status = :seq_0 AND (user_name LIKE :seq_1 OR age >= :seq_2) \
//!      ORDER BY age DESC"
//! );
//!
//! // Positional form for executors that substitute by index.
//! let (sql, params) = rendered.positional();
//! assert!(sql.ends_with("WHERE status = $1 AND (user_name LIKE $2 OR age >= $3) ORDER BY age DESC"));
//! assert_eq!(params.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod criteria;
pub mod dialect;
pub mod error;
pub mod ident;
pub mod meta;
pub mod predicate;
pub mod prelude;
pub mod render;

mod clause;
mod fragments;

pub use binder::{BoundParam, Param, ParamBinder, Params, TypeHint};
pub use criteria::Criteria;
pub use dialect::{AnsiDialect, Dialect, NullsOrder, OrderDirection, PgDialect};
pub use error::{StitchError, StitchResult};
pub use ident::Ident;
pub use meta::{ColumnDef, TableDef};
pub use predicate::{
    CompareOp, Connector, MatchMode, Predicate, Target, TemplateArgs, col, expr,
};
pub use render::{BindRequest, RenderedFragment};
