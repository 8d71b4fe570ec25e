//! End-to-end assembly tests over the public API.
//!
//! Every scenario builds a criteria, renders it, and checks the exact
//! fragment text together with the parameter map. Nothing here touches a
//! database; the engine's output is plain strings plus bound values.

use chrono::{TimeZone, Utc};
use serde_json::json;
use uuid::Uuid;

use sqlstitch::prelude::*;

// ── Metadata fixtures ────────────────────────────────────────────────────────

fn users() -> TableDef {
    TableDef::new("users")
        .unwrap()
        .column("id", "id")
        .unwrap()
        .column("userName", "user_name")
        .unwrap()
        .column("status", "status")
        .unwrap()
        .column("age", "age")
        .unwrap()
        .column("role", "role")
        .unwrap()
}

fn events() -> TableDef {
    TableDef::new("events")
        .unwrap()
        .column_hinted("id", "id", TypeHint::UUID)
        .unwrap()
        .column_hinted("createdAt", "created_at", TypeHint::TIMESTAMPTZ)
        .unwrap()
        .column_hinted("payload", "payload", TypeHint::JSONB)
        .unwrap()
}

// ── Documented scenarios ─────────────────────────────────────────────────────

#[test]
fn equality_and_range_bind_in_text_order() {
    let mut criteria = Criteria::new(users());
    criteria
        .eq("status", "ACTIVE")
        .unwrap()
        .and()
        .between("age", 18_i32, 30_i32)
        .unwrap();

    let rendered = criteria.render();
    assert_eq!(
        rendered.fragment(),
        "status = :seq_0 AND age BETWEEN :seq_1 AND :seq_2"
    );
    assert_eq!(
        format!("{:?}", rendered.params()),
        r#"{seq_0: "ACTIVE", seq_1: 18, seq_2: 30}"#
    );
}

#[test]
fn nested_group_combines_with_top_level() {
    let mut criteria = Criteria::new(users());
    criteria
        .nested(|c| c.eq(col("a"), 1_i32)?.or().eq(col("b"), 2_i32))
        .unwrap()
        .eq(col("c"), 3_i32)
        .unwrap();

    assert_eq!(
        criteria.render().fragment(),
        "(a = :seq_0 OR b = :seq_1) AND c = :seq_2"
    );
}

#[test]
fn template_substitutes_the_target_before_binding() {
    let mut criteria = Criteria::new(users());
    criteria
        .template_on(
            col("name"),
            "LENGTH({0}) > {1}",
            TemplateArgs::single(BindRequest::bind(0_i32)),
        )
        .unwrap();

    assert_eq!(criteria.render().fragment(), "LENGTH(name) > :seq_0");
}

// ── Ordering and caching ─────────────────────────────────────────────────────

#[test]
fn placeholders_follow_rendered_text_order() {
    let mut criteria = Criteria::new(users());
    for i in 0..8_i32 {
        if i % 3 == 0 {
            criteria.or();
        }
        criteria.eq(col(format!("c{i}")), i).unwrap();
    }

    let rendered = criteria.render();
    let text = rendered.fragment();
    let mut previous = None;
    for (at, _) in text.match_indices(":seq_") {
        let tail = &text[at + 5..];
        let digits: String = tail.chars().take_while(|c| c.is_ascii_digit()).collect();
        let n: usize = digits.parse().unwrap();
        if let Some(p) = previous {
            assert!(n > p, "sequence numbers must increase left to right");
        }
        previous = Some(n);
    }
    assert_eq!(previous, Some(7));

    let names: Vec<&str> = rendered.params().names().collect();
    assert_eq!(names[0], "seq_0");
    assert_eq!(names[7], "seq_7");
}

#[test]
fn extending_a_rendered_criteria_keeps_old_placeholders() {
    let mut criteria = Criteria::new(users());
    criteria.eq("status", "ACTIVE").unwrap();
    let first = criteria.render();
    assert_eq!(first.fragment(), "status = :seq_0");

    criteria.gt("age", 18_i32).unwrap();
    let second = criteria.render();
    assert_ne!(first.fragment(), second.fragment());
    assert_eq!(second.fragment(), "status = :seq_0 AND age > :seq_1");
    // The ACTIVE value bound once; only the new predicate bound again.
    assert_eq!(second.params().len(), 2);
}

// ── Connector policy and suppression ─────────────────────────────────────────

#[test]
fn cursor_resets_after_every_append() {
    let mut criteria = Criteria::new(users());
    criteria
        .eq("status", "A")
        .unwrap()
        .or()
        .eq("status", "B")
        .unwrap()
        .eq("age", 1_i32)
        .unwrap();

    assert_eq!(
        criteria.render().fragment(),
        "status = :seq_0 OR status = :seq_1 AND age = :seq_2"
    );
}

#[test]
fn suppressed_calls_leave_no_trace() {
    let role: Option<String> = None;
    let name = String::new();

    let mut criteria = Criteria::new(users());
    criteria
        .eq_opt("role", role)
        .unwrap()
        .contains_if("userName", name.as_str(), |v| !v.is_empty())
        .unwrap()
        .when(false, |c| c.eq("status", "A"))
        .unwrap();

    assert!(!criteria.has_fragment());
    assert_eq!(criteria.render().fragment(), "");
    assert!(criteria.params().is_empty());
}

#[test]
fn optional_filters_build_a_search() {
    let status = Some("ACTIVE");
    let min_age: Option<i32> = Some(21);
    let max_age: Option<i32> = None;
    let name: Option<&str> = None;

    let mut criteria = Criteria::new(users());
    criteria
        .eq_opt("status", status)
        .unwrap()
        .ge_opt("age", min_age)
        .unwrap()
        .le_opt("age", max_age)
        .unwrap()
        .contains_opt("userName", name)
        .unwrap();

    assert_eq!(
        criteria.render().fragment(),
        "status = :seq_0 AND age >= :seq_1"
    );
}

// ── Strictness ───────────────────────────────────────────────────────────────

#[test]
fn strict_and_lenient_disagree_on_unknown_properties() {
    let mut strict = Criteria::new(users());
    assert!(strict.eq("nickname", "x").unwrap_err().is_unresolved());

    let mut lenient = Criteria::new(users()).lenient();
    lenient
        .eq("nickname", "x")
        .unwrap()
        .eq("status", "ACTIVE")
        .unwrap();
    assert_eq!(lenient.render().fragment(), "status = :seq_0");
    assert_eq!(lenient.params().len(), 1);
}

// ── Typed values and positional conversion ───────────────────────────────────

#[test]
fn hinted_columns_cast_and_convert_positionally() {
    let id = Uuid::new_v4();
    let cutoff = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

    let mut criteria = Criteria::new(events());
    criteria
        .eq("id", id)
        .unwrap()
        .le("createdAt", cutoff)
        .unwrap()
        .eq("payload", json!({ "kind": "login" }))
        .unwrap();

    let rendered = criteria.render();
    assert_eq!(
        rendered.fragment(),
        "id = :seq_0::uuid AND created_at <= :seq_1::timestamptz AND payload = :seq_2::jsonb"
    );

    let (sql, values) = rendered.positional();
    assert_eq!(
        sql,
        "id = $1::uuid AND created_at <= $2::timestamptz AND payload = $3::jsonb"
    );
    assert_eq!(values.len(), 3);
    assert_eq!(rendered.params().hint("seq_0"), Some(TypeHint::UUID));
}

// ── Full statements ──────────────────────────────────────────────────────────

#[test]
fn aggregated_report_renders_select_and_count() {
    use std::sync::Arc;

    let mut criteria = Criteria::new(users())
        .alias("u")
        .unwrap()
        .dialect(Arc::new(PgDialect));
    criteria
        .eq("status", "ACTIVE")
        .unwrap()
        .select(["role"])
        .unwrap()
        .select_aggregate("COUNT", "*", Some("cnt"))
        .unwrap()
        .group_by("role")
        .unwrap()
        .having_cmp(expr("COUNT(*)"), CompareOp::Gt, 10_i64)
        .unwrap()
        .order_by_nulls(expr("cnt"), OrderDirection::Desc, NullsOrder::Last)
        .unwrap()
        .tail("LIMIT 20");

    assert_eq!(
        criteria.render_select().fragment(),
        "SELECT u.role, COUNT(*) AS cnt FROM users u \
         WHERE u.status = :seq_0 GROUP BY u.role HAVING COUNT(*) > :seq_1 \
         ORDER BY cnt DESC NULLS LAST LIMIT 20"
    );
    assert_eq!(
        criteria.render_count().fragment(),
        "SELECT COUNT(*) FROM (SELECT 1 FROM users u WHERE u.status = :seq_0 \
         GROUP BY u.role HAVING COUNT(*) > :seq_1) AS t"
    );
    assert_eq!(criteria.params().len(), 2);
}

#[test]
fn default_select_expands_metadata_minus_exclusions() {
    let mut criteria = Criteria::new(users()).alias("u").unwrap();
    criteria.exclude("role").exclude_column("age").unwrap();
    criteria.is_not_null("userName").unwrap();

    assert_eq!(
        criteria.render_select().fragment(),
        "SELECT u.id, u.user_name, u.status FROM users u WHERE u.user_name IS NOT NULL"
    );
}

#[test]
fn having_template_drops_a_leading_connector() {
    let mut criteria = Criteria::new(users());
    criteria
        .group_by("role")
        .unwrap()
        .having_template(
            "AND SUM(age) BETWEEN {low} AND {high}",
            TemplateArgs::named([
                ("low", BindRequest::bind(100_i64)),
                ("high", BindRequest::bind(500_i64)),
            ]),
        )
        .unwrap();

    assert_eq!(
        criteria.complete_fragment(None),
        "GROUP BY role HAVING SUM(age) BETWEEN :seq_0 AND :seq_1"
    );
}

#[test]
fn group_override_feeds_outer_queries() {
    let mut criteria = Criteria::new(users());
    criteria.eq("status", "ACTIVE").unwrap();

    assert_eq!(
        criteria.complete_fragment(Some("date_trunc('day', created_at)")),
        "status = :seq_0 GROUP BY date_trunc('day', created_at)"
    );
}

#[test]
fn negated_and_folded_patterns_compose() {
    let mut criteria = Criteria::new(users());
    criteria
        .not(|n| n.in_list("role", ["bot", "banned"]))
        .unwrap()
        .contains_ci("userName", "LI")
        .unwrap();

    let rendered = criteria.render();
    assert_eq!(
        rendered.fragment(),
        "NOT (role IN (:seq_0, :seq_1)) AND LOWER(user_name) LIKE LOWER(:seq_2)"
    );
    // Case folding wraps the placeholder; the bound value keeps its case.
    assert_eq!(
        format!("{:?}", rendered.params().get("seq_2").unwrap()),
        r#""%LI%""#
    );
}

#[test]
fn empty_membership_renders_constants_not_parameters() {
    let mut criteria = Criteria::new(users());
    criteria
        .in_list("role", Vec::<String>::new())
        .unwrap()
        .or()
        .not_in_list("status", Vec::<String>::new())
        .unwrap();

    assert_eq!(criteria.render().fragment(), "1=0 OR 1=1");
    assert!(criteria.params().is_empty());
}

#[test]
fn where_keyword_is_omitted_without_conditions() {
    let mut criteria = Criteria::new(users());
    criteria.order_by_asc("id").unwrap().tail("LIMIT 1");

    assert_eq!(
        criteria.render_select().fragment(),
        "SELECT id, user_name, status, age, role FROM users ORDER BY id ASC LIMIT 1"
    );
}
