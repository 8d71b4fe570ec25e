//! Aggregated report rendering example
//!
//! Run with: cargo run --example report_query -p sqlstitch
//!
//! Renders a full SELECT, its paging COUNT and the positional form for
//! one order-report criteria: aliased columns, declared bind types,
//! aggregates, grouping and HAVING.

use std::sync::Arc;

use sqlstitch::{
    BindRequest, CompareOp, Criteria, NullsOrder, OrderDirection, PgDialect, StitchResult,
    TableDef, TemplateArgs, TypeHint, col, expr,
};

fn orders_table() -> StitchResult<TableDef> {
    Ok(TableDef::new("orders")?
        .column_hinted("id", "id", TypeHint::UUID)?
        .column("customerId", "customer_id")?
        .column("status", "status")?
        .column("amountCents", "amount_cents")?
        .column_hinted("createdAt", "created_at", TypeHint::TIMESTAMPTZ)?)
}

fn main() -> StitchResult<()> {
    // ============================================
    // Full SELECT from metadata
    // ============================================
    println!("=== Default column expansion ===");

    let mut criteria = Criteria::new(orders_table()?);
    criteria.exclude("createdAt");
    println!("  {}\n", criteria.render_select().fragment());

    // ============================================
    // Aggregated report per customer
    // ============================================
    println!("=== Aggregated report ===");

    let mut report = Criteria::new(orders_table()?)
        .alias("o")?
        .dialect(Arc::new(PgDialect));
    report
        .select(["customerId"])?
        .select_aggregate("COUNT", "*", Some("order_count"))?
        .select_aggregate("SUM", "o.amount_cents", Some("total_cents"))?
        .eq("status", "PAID")?
        .ge("amountCents", 1_000_i64)?
        .group_by("customerId")?
        .having_cmp(expr("COUNT(*)"), CompareOp::Ge, 3_i64)?
        .order_by_nulls(
            expr("total_cents"),
            OrderDirection::Desc,
            NullsOrder::Last,
        )?
        .tail("LIMIT 20");

    let select = report.render_select();
    println!("  SQL:    {}", select.fragment());
    println!("  params: {:?}\n", select.params());

    // The page count wraps the grouped fragment in a subquery and drops
    // ORDER BY and the tail.
    println!("=== Page count ===");
    println!("  {}\n", report.render_count().fragment());

    // ============================================
    // Declared bind types
    // ============================================
    println!("=== Positional form with casts ===");

    let mut by_id = Criteria::new(orders_table()?);
    by_id
        .eq("id", "b2f7a0c4-3d58-4f6e-9a31-5a0c8f2d77e1")?
        .template_on(
            col("created_at"),
            "{0} >= now() - {1}::interval",
            TemplateArgs::single(BindRequest::bind("7 days")),
        )?;

    let rendered = by_id.render();
    println!("  named:      {}", rendered.fragment());
    let (positional, values) = rendered.positional();
    println!("  positional: {positional} [{} value(s)]", values.len());

    Ok(())
}
