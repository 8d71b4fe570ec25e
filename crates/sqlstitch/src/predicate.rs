//! The condition/expression model.
//!
//! A [`Predicate`] is one immutable condition node. Every variant renders
//! itself through a [`Renderer`], producing its SQL text (never its own
//! connector; the owning storage joins elements) or `None` when the node
//! has nothing to say, e.g. its target never resolved under a lenient
//! façade. The connector is the one late-bound field: absent at
//! construction, set exactly once at insertion (set-if-null).

use std::fmt;

use tokio_postgres::types::ToSql;

use crate::binder::{Param, TypeHint};
use crate::error::{StitchError, StitchResult};
use crate::ident::Ident;
use crate::render::{BindRequest, Renderer};

/// Logical connector joining a predicate to the predicates before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        })
    }
}

/// Binary comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

/// Wildcard decoration applied to a pattern value before it is bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Bind the value as given.
    Exact,
    /// Value is the prefix: `value%`.
    Prefix,
    /// Value is the suffix: `%value`.
    Suffix,
    /// Value appears anywhere: `%value%`.
    Contains,
}

impl MatchMode {
    fn decorate(&self, value: &str) -> String {
        match self {
            MatchMode::Exact => value.to_string(),
            MatchMode::Prefix => format!("{value}%"),
            MatchMode::Suffix => format!("%{value}"),
            MatchMode::Contains => format!("%{value}%"),
        }
    }
}

/// What a predicate applies to.
///
/// `&str` converts to `Property`; use [`col`] / [`expr`] for the raw forms.
/// Insertion into a criteria maps `Property`/`Column` to `Resolved` (or
/// `Unresolved` under a lenient façade); anything left unmapped renders
/// nothing.
#[derive(Debug, Clone)]
pub enum Target {
    /// Logical property, resolved through relation metadata at insertion.
    Property(String),
    /// Raw column path, identifier-validated at insertion.
    Column(String),
    /// Raw SQL expression (aggregates in HAVING), trusted verbatim.
    Expr(String),
    /// Validated column reference, alias-qualified at render. Resolution
    /// carries the column's declared bind hint, if any.
    Resolved {
        column: Ident,
        hint: Option<TypeHint>,
    },
    /// A property that had no column mapping under a lenient façade.
    Unresolved(String),
}

impl Target {
    pub(crate) fn render(&self, r: &Renderer<'_>) -> Option<String> {
        match self {
            Target::Resolved { column, .. } => Some(column.qualified(r.alias())),
            Target::Expr(text) => Some(text.clone()),
            Target::Property(_) | Target::Column(_) | Target::Unresolved(_) => None,
        }
    }

    /// The bind hint values compared against this target should carry.
    pub(crate) fn hint(&self) -> Option<TypeHint> {
        match self {
            Target::Resolved { hint, .. } => *hint,
            _ => None,
        }
    }
}

impl From<&str> for Target {
    fn from(property: &str) -> Self {
        Target::Property(property.to_string())
    }
}

impl From<String> for Target {
    fn from(property: String) -> Self {
        Target::Property(property)
    }
}

impl From<Ident> for Target {
    fn from(column: Ident) -> Self {
        Target::Resolved { column, hint: None }
    }
}

/// Mark a string as a raw column path rather than a property name.
pub fn col(name: impl Into<String>) -> Target {
    Target::Column(name.into())
}

/// Mark a string as a trusted SQL expression.
pub fn expr(text: impl Into<String>) -> Target {
    Target::Expr(text.into())
}

/// The single / positional / named value shapes a template accepts.
///
/// Exactly one shape exists per template by construction; shape/marker
/// mismatches are rejected when the template is built.
#[derive(Debug, Clone)]
pub enum TemplateArgs {
    Single(BindRequest),
    Positional(Vec<BindRequest>),
    Named(Vec<(String, BindRequest)>),
}

impl TemplateArgs {
    pub fn single(req: BindRequest) -> Self {
        TemplateArgs::Single(req)
    }

    pub fn positional(reqs: impl IntoIterator<Item = BindRequest>) -> Self {
        TemplateArgs::Positional(reqs.into_iter().collect())
    }

    pub fn named<N: Into<String>>(pairs: impl IntoIterator<Item = (N, BindRequest)>) -> Self {
        TemplateArgs::Named(pairs.into_iter().map(|(n, r)| (n.into(), r)).collect())
    }

    fn positional_slot(&self, idx: usize) -> Option<&BindRequest> {
        match self {
            TemplateArgs::Single(req) => (idx == 0).then_some(req),
            TemplateArgs::Positional(reqs) => reqs.get(idx),
            TemplateArgs::Named(_) => None,
        }
    }

    fn named_slot(&self, name: &str) -> Option<&BindRequest> {
        match self {
            TemplateArgs::Named(pairs) => pairs.iter().find(|(n, _)| n == name).map(|(_, r)| r),
            _ => None,
        }
    }
}

/// One condition node.
#[derive(Debug, Clone)]
pub enum Predicate {
    Compare {
        target: Target,
        op: CompareOp,
        value: Param,
        connector: Option<Connector>,
    },
    Range {
        target: Target,
        negated: bool,
        begin: Param,
        end: Param,
        connector: Option<Connector>,
    },
    Membership {
        target: Target,
        negated: bool,
        values: Vec<Param>,
        connector: Option<Connector>,
    },
    Pattern {
        target: Target,
        negated: bool,
        value: String,
        mode: MatchMode,
        escape: Option<char>,
        ignore_case: bool,
        connector: Option<Connector>,
    },
    Nullness {
        target: Target,
        negated: bool,
        connector: Option<Connector>,
    },
    Template {
        target: Option<Target>,
        text: String,
        args: TemplateArgs,
        connector: Option<Connector>,
    },
    Group {
        negate: bool,
        connector: Option<Connector>,
        children: Vec<Predicate>,
    },
}

impl Predicate {
    /// A binary comparison.
    pub fn compare<T: ToSql + Send + Sync + 'static>(
        target: impl Into<Target>,
        op: CompareOp,
        value: T,
    ) -> Self {
        Predicate::Compare {
            target: target.into(),
            op,
            value: Param::new(value),
            connector: None,
        }
    }

    pub fn eq<T: ToSql + Send + Sync + 'static>(target: impl Into<Target>, value: T) -> Self {
        Self::compare(target, CompareOp::Eq, value)
    }

    pub fn ne<T: ToSql + Send + Sync + 'static>(target: impl Into<Target>, value: T) -> Self {
        Self::compare(target, CompareOp::Ne, value)
    }

    pub fn gt<T: ToSql + Send + Sync + 'static>(target: impl Into<Target>, value: T) -> Self {
        Self::compare(target, CompareOp::Gt, value)
    }

    pub fn ge<T: ToSql + Send + Sync + 'static>(target: impl Into<Target>, value: T) -> Self {
        Self::compare(target, CompareOp::Ge, value)
    }

    pub fn lt<T: ToSql + Send + Sync + 'static>(target: impl Into<Target>, value: T) -> Self {
        Self::compare(target, CompareOp::Lt, value)
    }

    pub fn le<T: ToSql + Send + Sync + 'static>(target: impl Into<Target>, value: T) -> Self {
        Self::compare(target, CompareOp::Le, value)
    }

    /// `target BETWEEN begin AND end`.
    pub fn between<B, E>(target: impl Into<Target>, begin: B, end: E) -> Self
    where
        B: ToSql + Send + Sync + 'static,
        E: ToSql + Send + Sync + 'static,
    {
        Predicate::Range {
            target: target.into(),
            negated: false,
            begin: Param::new(begin),
            end: Param::new(end),
            connector: None,
        }
    }

    /// `target NOT BETWEEN begin AND end`.
    pub fn not_between<B, E>(target: impl Into<Target>, begin: B, end: E) -> Self
    where
        B: ToSql + Send + Sync + 'static,
        E: ToSql + Send + Sync + 'static,
    {
        Predicate::Range {
            target: target.into(),
            negated: true,
            begin: Param::new(begin),
            end: Param::new(end),
            connector: None,
        }
    }

    /// A range built from a runtime list; the list must hold exactly two bounds.
    pub fn range_from(
        target: impl Into<Target>,
        negated: bool,
        bounds: Vec<Param>,
    ) -> StitchResult<Self> {
        let [begin, end] = <[Param; 2]>::try_from(bounds).map_err(|bounds| {
            StitchError::range(format!("expected exactly 2 bounds, got {}", bounds.len()))
        })?;
        Ok(Predicate::Range {
            target: target.into(),
            negated,
            begin,
            end,
            connector: None,
        })
    }

    /// `target IN (..)`. An empty list renders `1=0`.
    pub fn in_list<T: ToSql + Send + Sync + 'static>(
        target: impl Into<Target>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        Self::membership(target, false, values.into_iter().map(Param::new).collect())
    }

    /// `target NOT IN (..)`. An empty list renders `1=1`.
    pub fn not_in_list<T: ToSql + Send + Sync + 'static>(
        target: impl Into<Target>,
        values: impl IntoIterator<Item = T>,
    ) -> Self {
        Self::membership(target, true, values.into_iter().map(Param::new).collect())
    }

    /// Membership over pre-wrapped values (heterogeneous lists).
    pub fn membership(target: impl Into<Target>, negated: bool, values: Vec<Param>) -> Self {
        Predicate::Membership {
            target: target.into(),
            negated,
            values,
            connector: None,
        }
    }

    /// `target LIKE value` with the value bound as given.
    pub fn like(target: impl Into<Target>, value: impl Into<String>) -> Self {
        Self::pattern(target, value, MatchMode::Exact, false, false, None)
    }

    pub fn not_like(target: impl Into<Target>, value: impl Into<String>) -> Self {
        Self::pattern(target, value, MatchMode::Exact, true, false, None)
    }

    /// Full pattern form: mode decoration, negation, case folding, escape.
    pub fn pattern(
        target: impl Into<Target>,
        value: impl Into<String>,
        mode: MatchMode,
        negated: bool,
        ignore_case: bool,
        escape: Option<char>,
    ) -> Self {
        Predicate::Pattern {
            target: target.into(),
            negated,
            value: value.into(),
            mode,
            escape,
            ignore_case,
            connector: None,
        }
    }

    pub fn is_null(target: impl Into<Target>) -> Self {
        Predicate::Nullness {
            target: target.into(),
            negated: false,
            connector: None,
        }
    }

    pub fn is_not_null(target: impl Into<Target>) -> Self {
        Predicate::Nullness {
            target: target.into(),
            negated: true,
            connector: None,
        }
    }

    /// A templated predicate. Markers are `{0}`, `{1}`.. or `{name}`; with a
    /// target, `{0}` is the target reference and values start at `{1}`.
    ///
    /// Marker/argument mismatches are rejected here, before any state is
    /// touched.
    pub fn template(
        target: Option<Target>,
        text: impl Into<String>,
        args: TemplateArgs,
    ) -> StitchResult<Self> {
        let text = text.into();
        validate_template(target.is_some(), &text, &args)?;
        Ok(Predicate::Template {
            target,
            text,
            args,
            connector: None,
        })
    }

    /// A parenthesized group of child predicates.
    pub fn group(negate: bool, children: Vec<Predicate>) -> Self {
        Predicate::Group {
            negate,
            connector: None,
            children,
        }
    }

    fn connector_slot(&mut self) -> &mut Option<Connector> {
        match self {
            Predicate::Compare { connector, .. }
            | Predicate::Range { connector, .. }
            | Predicate::Membership { connector, .. }
            | Predicate::Pattern { connector, .. }
            | Predicate::Nullness { connector, .. }
            | Predicate::Template { connector, .. }
            | Predicate::Group { connector, .. } => connector,
        }
    }

    /// The connector joining this predicate to the ones before it.
    pub fn connector(&self) -> Option<Connector> {
        match self {
            Predicate::Compare { connector, .. }
            | Predicate::Range { connector, .. }
            | Predicate::Membership { connector, .. }
            | Predicate::Pattern { connector, .. }
            | Predicate::Nullness { connector, .. }
            | Predicate::Template { connector, .. }
            | Predicate::Group { connector, .. } => *connector,
        }
    }

    pub(crate) fn connector_or_default(&self) -> Connector {
        self.connector().unwrap_or(Connector::And)
    }

    /// Late-bind the connector: a set-if-null write, applied at insertion.
    /// An already-set connector is kept.
    pub fn with_connector_if_unset(mut self, connector: Connector) -> Self {
        let slot = self.connector_slot();
        if slot.is_none() {
            *slot = Some(connector);
        }
        self
    }

    /// Rewrite every target in this node (recursing into groups and
    /// template targets) through `f`. Used by the façade to resolve
    /// properties against relation metadata.
    pub(crate) fn map_targets(
        self,
        f: &mut impl FnMut(Target) -> StitchResult<Target>,
    ) -> StitchResult<Self> {
        Ok(match self {
            Predicate::Compare {
                target,
                op,
                value,
                connector,
            } => Predicate::Compare {
                target: f(target)?,
                op,
                value,
                connector,
            },
            Predicate::Range {
                target,
                negated,
                begin,
                end,
                connector,
            } => Predicate::Range {
                target: f(target)?,
                negated,
                begin,
                end,
                connector,
            },
            Predicate::Membership {
                target,
                negated,
                values,
                connector,
            } => Predicate::Membership {
                target: f(target)?,
                negated,
                values,
                connector,
            },
            Predicate::Pattern {
                target,
                negated,
                value,
                mode,
                escape,
                ignore_case,
                connector,
            } => Predicate::Pattern {
                target: f(target)?,
                negated,
                value,
                mode,
                escape,
                ignore_case,
                connector,
            },
            Predicate::Nullness {
                target,
                negated,
                connector,
            } => Predicate::Nullness {
                target: f(target)?,
                negated,
                connector,
            },
            Predicate::Template {
                target,
                text,
                args,
                connector,
            } => Predicate::Template {
                target: target.map(|t| f(t)).transpose()?,
                text,
                args,
                connector,
            },
            Predicate::Group {
                negate,
                connector,
                children,
            } => Predicate::Group {
                negate,
                connector,
                children: children
                    .into_iter()
                    .map(|c| c.map_targets(f))
                    .collect::<StitchResult<Vec<_>>>()?,
            },
        })
    }

    /// Render this node's SQL text, or `None` when it contributes nothing.
    ///
    /// The text never includes this node's own connector; storages join
    /// elements and drop the first emitted connector.
    pub(crate) fn render(&self, r: &Renderer<'_>) -> Option<String> {
        match self {
            Predicate::Compare {
                target, op, value, ..
            } => {
                let t = target.render(r)?;
                let ph = r.placeholder(value.clone(), target.hint());
                Some(format!("{t} {op} {ph}"))
            }
            Predicate::Range {
                target,
                negated,
                begin,
                end,
                ..
            } => {
                let t = target.render(r)?;
                let keyword = if *negated { "NOT BETWEEN" } else { "BETWEEN" };
                let lo = r.placeholder(begin.clone(), target.hint());
                let hi = r.placeholder(end.clone(), target.hint());
                Some(format!("{t} {keyword} {lo} AND {hi}"))
            }
            Predicate::Membership {
                target,
                negated,
                values,
                ..
            } => {
                let t = target.render(r)?;
                if values.is_empty() {
                    return Some(if *negated { "1=1" } else { "1=0" }.to_string());
                }
                let keyword = if *negated { "NOT IN" } else { "IN" };
                let mut list = String::new();
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        list.push_str(", ");
                    }
                    list.push_str(&r.placeholder(value.clone(), target.hint()));
                }
                Some(format!("{t} {keyword} ({list})"))
            }
            Predicate::Pattern {
                target,
                negated,
                value,
                mode,
                escape,
                ignore_case,
                ..
            } => {
                let mut t = target.render(r)?;
                let keyword = if *negated { "NOT LIKE" } else { "LIKE" };
                let mut ph = r.placeholder(Param::new(mode.decorate(value)), None);
                if *ignore_case {
                    t = r.fold_case(&t);
                    ph = r.fold_case(&ph);
                }
                let mut out = format!("{t} {keyword} {ph}");
                if let Some(c) = escape {
                    out.push_str(" ESCAPE '");
                    if *c == '\'' {
                        out.push_str("''");
                    } else {
                        out.push(*c);
                    }
                    out.push('\'');
                }
                Some(out)
            }
            Predicate::Nullness {
                target, negated, ..
            } => {
                let t = target.render(r)?;
                Some(if *negated {
                    format!("{t} IS NOT NULL")
                } else {
                    format!("{t} IS NULL")
                })
            }
            Predicate::Template {
                target, text, args, ..
            } => {
                let target_text = match target {
                    Some(t) => Some(t.render(r)?),
                    None => None,
                };
                Some(render_template(text, target_text.as_deref(), args, r))
            }
            Predicate::Group {
                negate, children, ..
            } => {
                let mut body = String::new();
                let mut emitted = false;
                for child in children {
                    let Some(text) = child.render(r) else {
                        continue;
                    };
                    if emitted {
                        body.push(' ');
                        body.push_str(&child.connector_or_default().to_string());
                        body.push(' ');
                    }
                    body.push_str(&text);
                    emitted = true;
                }
                if !emitted {
                    return None;
                }
                Some(if *negate {
                    format!("NOT ({body})")
                } else {
                    format!("({body})")
                })
            }
        }
    }
}

fn render_template(
    text: &str,
    target: Option<&str>,
    args: &TemplateArgs,
    r: &Renderer<'_>,
) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            rest = "";
            break;
        };
        let marker = &after[..close];
        out.push_str(&render_marker(marker, target, args, r));
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

fn render_marker(marker: &str, target: Option<&str>, args: &TemplateArgs, r: &Renderer<'_>) -> String {
    if let Ok(idx) = marker.parse::<usize>() {
        if let Some(t) = target {
            if idx == 0 {
                return t.to_string();
            }
            if let Some(req) = args.positional_slot(idx - 1) {
                return r.request(req);
            }
        } else if let Some(req) = args.positional_slot(idx) {
            return r.request(req);
        }
    } else if let Some(req) = args.named_slot(marker) {
        return r.request(req);
    }
    // Validation guarantees every marker resolves; keep the raw text for
    // anything it let through.
    format!("{{{marker}}}")
}

fn validate_template(has_target: bool, text: &str, args: &TemplateArgs) -> StitchResult<()> {
    let slot_count = match args {
        TemplateArgs::Single(_) => 1,
        TemplateArgs::Positional(reqs) => {
            if reqs.is_empty() {
                return Err(StitchError::template("no values supplied"));
            }
            reqs.len()
        }
        TemplateArgs::Named(pairs) => {
            if pairs.is_empty() {
                return Err(StitchError::template("no values supplied"));
            }
            pairs.len()
        }
    };

    let mut target_referenced = false;
    let mut positional_seen = vec![false; slot_count];
    let mut named_seen = vec![false; slot_count];

    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            return Err(StitchError::template(format!("unterminated marker in '{text}'")));
        };
        let marker = &after[..close];
        if marker.is_empty() {
            return Err(StitchError::template(format!("empty marker in '{text}'")));
        }

        if let Ok(idx) = marker.parse::<usize>() {
            let value_idx = if has_target {
                if idx == 0 {
                    target_referenced = true;
                    rest = &after[close + 1..];
                    continue;
                }
                idx - 1
            } else {
                idx
            };
            match args {
                TemplateArgs::Named(_) => {
                    return Err(StitchError::template(format!(
                        "numeric marker {{{marker}}} with named values"
                    )));
                }
                _ => {
                    if value_idx >= slot_count {
                        return Err(StitchError::template(format!(
                            "marker {{{marker}}} exceeds the {slot_count} supplied value(s)"
                        )));
                    }
                    positional_seen[value_idx] = true;
                }
            }
        } else {
            match args {
                TemplateArgs::Named(pairs) => {
                    let Some(pos) = pairs.iter().position(|(n, _)| n == marker) else {
                        return Err(StitchError::template(format!(
                            "marker {{{marker}}} has no matching value"
                        )));
                    };
                    named_seen[pos] = true;
                }
                _ => {
                    return Err(StitchError::template(format!(
                        "named marker {{{marker}}} with positional values"
                    )));
                }
            }
        }
        rest = &after[close + 1..];
    }

    if has_target && !target_referenced {
        return Err(StitchError::template("target marker {0} never referenced"));
    }

    let seen = match args {
        TemplateArgs::Named(_) => &named_seen,
        _ => &positional_seen,
    };
    if let Some(idx) = seen.iter().position(|used| !used) {
        let what = match args {
            TemplateArgs::Named(pairs) => format!("'{}'", pairs[idx].0),
            _ => format!("#{idx}"),
        };
        return Err(StitchError::template(format!("value {what} never referenced")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::ParamBinder;

    fn resolved(name: &str) -> Target {
        Target::from(Ident::parse(name).unwrap())
    }

    fn render_one(p: &Predicate) -> (Option<String>, crate::binder::Params) {
        let binder = ParamBinder::new();
        let r = Renderer::new(&binder, None, None);
        let text = p.render(&r);
        (text, binder.snapshot())
    }

    #[test]
    fn compare_binds_one_placeholder() {
        let p = Predicate::eq(resolved("status"), "ACTIVE");
        let (text, params) = render_one(&p);
        assert_eq!(text.unwrap(), "status = :seq_0");
        assert_eq!(format!("{params:?}"), r#"{seq_0: "ACTIVE"}"#);
    }

    #[test]
    fn hinted_target_casts_its_placeholders() {
        let target = Target::Resolved {
            column: Ident::parse("payload").unwrap(),
            hint: Some(TypeHint::JSONB),
        };
        let (text, _) = render_one(&Predicate::eq(target.clone(), "{}"));
        assert_eq!(text.unwrap(), "payload = :seq_0::jsonb");

        let (text, _) = render_one(&Predicate::in_list(target, ["{}", "[]"]));
        assert_eq!(text.unwrap(), "payload IN (:seq_0::jsonb, :seq_1::jsonb)");
    }

    #[test]
    fn comparison_operators_render_symbols() {
        for (op, sym) in [
            (CompareOp::Eq, "="),
            (CompareOp::Ne, "<>"),
            (CompareOp::Gt, ">"),
            (CompareOp::Ge, ">="),
            (CompareOp::Lt, "<"),
            (CompareOp::Le, "<="),
        ] {
            let p = Predicate::compare(resolved("age"), op, 18_i32);
            let (text, _) = render_one(&p);
            assert_eq!(text.unwrap(), format!("age {sym} :seq_0"));
        }
    }

    #[test]
    fn between_binds_bounds_in_order() {
        let p = Predicate::between(resolved("age"), 18_i32, 30_i32);
        let (text, params) = render_one(&p);
        assert_eq!(text.unwrap(), "age BETWEEN :seq_0 AND :seq_1");
        assert_eq!(format!("{params:?}"), "{seq_0: 18, seq_1: 30}");

        let p = Predicate::not_between(resolved("age"), 18_i32, 30_i32);
        let (text, _) = render_one(&p);
        assert_eq!(text.unwrap(), "age NOT BETWEEN :seq_0 AND :seq_1");
    }

    #[test]
    fn range_from_requires_a_pair() {
        let err =
            Predicate::range_from(resolved("age"), false, vec![Param::new(1_i32)]).unwrap_err();
        assert!(err.is_range());

        let ok = Predicate::range_from(
            resolved("age"),
            false,
            vec![Param::new(1_i32), Param::new(9_i32)],
        )
        .unwrap();
        let (text, _) = render_one(&ok);
        assert_eq!(text.unwrap(), "age BETWEEN :seq_0 AND :seq_1");
    }

    #[test]
    fn membership_lists_placeholders() {
        let p = Predicate::in_list(resolved("id"), [1_i64, 2, 3]);
        let (text, _) = render_one(&p);
        assert_eq!(text.unwrap(), "id IN (:seq_0, :seq_1, :seq_2)");
    }

    #[test]
    fn empty_membership_renders_constant() {
        let p = Predicate::in_list(resolved("id"), Vec::<i64>::new());
        let (text, params) = render_one(&p);
        assert_eq!(text.unwrap(), "1=0");
        assert!(params.is_empty());

        let p = Predicate::not_in_list(resolved("id"), Vec::<i64>::new());
        let (text, _) = render_one(&p);
        assert_eq!(text.unwrap(), "1=1");
    }

    #[test]
    fn pattern_modes_decorate_before_binding() {
        let p = Predicate::pattern(resolved("name"), "li", MatchMode::Contains, false, false, None);
        let (text, params) = render_one(&p);
        assert_eq!(text.unwrap(), "name LIKE :seq_0");
        assert_eq!(format!("{params:?}"), r#"{seq_0: "%li%"}"#);

        let p = Predicate::pattern(resolved("name"), "li", MatchMode::Prefix, false, false, None);
        let (_, params) = render_one(&p);
        assert_eq!(format!("{params:?}"), r#"{seq_0: "li%"}"#);

        let p = Predicate::pattern(resolved("name"), "li", MatchMode::Suffix, true, false, None);
        let (text, params) = render_one(&p);
        assert_eq!(text.unwrap(), "name NOT LIKE :seq_0");
        assert_eq!(format!("{params:?}"), r#"{seq_0: "%li"}"#);
    }

    #[test]
    fn case_insensitive_pattern_folds_both_sides() {
        let p = Predicate::pattern(resolved("name"), "LI", MatchMode::Contains, false, true, None);
        let (text, params) = render_one(&p);
        assert_eq!(text.unwrap(), "LOWER(name) LIKE LOWER(:seq_0)");
        // The stored value is decorated but never case-mutated.
        assert_eq!(format!("{params:?}"), r#"{seq_0: "%LI%"}"#);
    }

    #[test]
    fn pattern_escape_renders_suffix() {
        let p = Predicate::pattern(
            resolved("path"),
            r"50\%",
            MatchMode::Exact,
            false,
            false,
            Some('\\'),
        );
        let (text, _) = render_one(&p);
        assert_eq!(text.unwrap(), r"path LIKE :seq_0 ESCAPE '\'");
    }

    #[test]
    fn nullness_has_no_placeholder() {
        let (text, params) = render_one(&Predicate::is_null(resolved("deleted_at")));
        assert_eq!(text.unwrap(), "deleted_at IS NULL");
        assert!(params.is_empty());

        let (text, _) = render_one(&Predicate::is_not_null(resolved("email")));
        assert_eq!(text.unwrap(), "email IS NOT NULL");
    }

    #[test]
    fn unresolved_target_renders_nothing() {
        let p = Predicate::eq(Target::Unresolved("ghost".into()), 1_i32);
        let (text, params) = render_one(&p);
        assert!(text.is_none());
        assert!(params.is_empty(), "skipped predicate must not bind");
    }

    #[test]
    fn group_joins_with_child_connectors() {
        let group = Predicate::group(
            false,
            vec![
                Predicate::eq(resolved("a"), 1_i32),
                Predicate::eq(resolved("b"), 2_i32).with_connector_if_unset(Connector::Or),
            ],
        );
        let (text, _) = render_one(&group);
        assert_eq!(text.unwrap(), "(a = :seq_0 OR b = :seq_1)");
    }

    #[test]
    fn negated_group_prefixes_not() {
        let group = Predicate::group(true, vec![Predicate::eq(resolved("a"), 1_i32)]);
        let (text, _) = render_one(&group);
        assert_eq!(text.unwrap(), "NOT (a = :seq_0)");
    }

    #[test]
    fn group_skips_silent_children() {
        let group = Predicate::group(
            false,
            vec![
                Predicate::eq(Target::Unresolved("ghost".into()), 0_i32),
                Predicate::eq(resolved("b"), 2_i32).with_connector_if_unset(Connector::Or),
            ],
        );
        let (text, _) = render_one(&group);
        // The first rendered child drops its connector.
        assert_eq!(text.unwrap(), "(b = :seq_0)");
    }

    #[test]
    fn empty_group_renders_nothing() {
        let (text, params) = render_one(&Predicate::group(false, Vec::new()));
        assert!(text.is_none());
        assert!(params.is_empty());
    }

    #[test]
    fn connector_late_binds_exactly_once() {
        let p = Predicate::eq(resolved("a"), 1_i32)
            .with_connector_if_unset(Connector::Or)
            .with_connector_if_unset(Connector::And);
        assert_eq!(p.connector(), Some(Connector::Or));
    }

    #[test]
    fn template_substitutes_target_then_binds() {
        let p = Predicate::template(
            Some(resolved("name")),
            "LENGTH({0}) > {1}",
            TemplateArgs::single(BindRequest::bind(0_i32)),
        )
        .unwrap();
        let (text, params) = render_one(&p);
        assert_eq!(text.unwrap(), "LENGTH(name) > :seq_0");
        assert_eq!(format!("{params:?}"), "{seq_0: 0}");
    }

    #[test]
    fn template_positional_without_target() {
        let p = Predicate::template(
            None,
            "date_trunc('day', created_at) = {0}",
            TemplateArgs::positional([BindRequest::bind("2024-01-01")]),
        )
        .unwrap();
        let (text, _) = render_one(&p);
        assert_eq!(text.unwrap(), "date_trunc('day', created_at) = :seq_0");
    }

    #[test]
    fn template_named_markers() {
        let p = Predicate::template(
            None,
            "balance BETWEEN {low} AND {high}",
            TemplateArgs::named([
                ("low", BindRequest::bind(10_i32)),
                ("high", BindRequest::bind(99_i32)),
            ]),
        )
        .unwrap();
        let (text, params) = render_one(&p);
        assert_eq!(text.unwrap(), "balance BETWEEN :seq_0 AND :seq_1");
        assert_eq!(format!("{params:?}"), "{seq_0: 10, seq_1: 99}");
    }

    #[test]
    fn template_mixes_literals_and_binds() {
        let p = Predicate::template(
            Some(resolved("score")),
            "{0} % {1} = {2}",
            TemplateArgs::positional([BindRequest::literal(10), BindRequest::bind(3_i32)]),
        )
        .unwrap();
        let (text, params) = render_one(&p);
        assert_eq!(text.unwrap(), "score % 10 = :seq_0");
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn template_repeated_marker_rebinds() {
        let p = Predicate::template(
            None,
            "{0} = ANY(tags) OR {0} = owner",
            TemplateArgs::single(BindRequest::bind("x")),
        )
        .unwrap();
        let (text, params) = render_one(&p);
        assert_eq!(text.unwrap(), ":seq_0 = ANY(tags) OR :seq_1 = owner");
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn template_rejects_marker_argument_mismatches() {
        let err = Predicate::template(
            None,
            "a = {0}",
            TemplateArgs::positional(Vec::<BindRequest>::new()),
        )
        .unwrap_err();
        assert!(err.is_template());

        let err = Predicate::template(
            None,
            "a = {1}",
            TemplateArgs::single(BindRequest::bind(1_i32)),
        )
        .unwrap_err();
        assert!(err.is_template());

        let err = Predicate::template(
            None,
            "a = {name}",
            TemplateArgs::positional([BindRequest::bind(1_i32)]),
        )
        .unwrap_err();
        assert!(err.is_template());

        let err = Predicate::template(
            None,
            "a = {0}",
            TemplateArgs::named([("n", BindRequest::bind(1_i32))]),
        )
        .unwrap_err();
        assert!(err.is_template());

        let err = Predicate::template(
            None,
            "a = {0",
            TemplateArgs::single(BindRequest::bind(1_i32)),
        )
        .unwrap_err();
        assert!(err.is_template());

        let err = Predicate::template(
            None,
            "a = b",
            TemplateArgs::single(BindRequest::bind(1_i32)),
        )
        .unwrap_err();
        assert!(err.is_template(), "unused value must be rejected");

        let err = Predicate::template(
            Some(resolved("name")),
            "x = {1}",
            TemplateArgs::single(BindRequest::bind(1_i32)),
        )
        .unwrap_err();
        assert!(err.is_template(), "target marker {{0}} must be referenced");
    }
}
