//! Dynamic criteria composition example
//!
//! Run with: cargo run --example dynamic_search -p sqlstitch
//!
//! Builds WHERE fragments from a filter struct whose fields are all
//! optional. Absent filters append nothing, so the same builder code
//! serves every combination.

use sqlstitch::{Criteria, StitchResult, TableDef};

/// Search parameters - all optional
struct TaskFilter {
    status: Option<String>,
    min_priority: Option<i32>,
    assignees: Option<Vec<String>>,
    title_contains: Option<String>,
}

fn tasks_table() -> StitchResult<TableDef> {
    Ok(TableDef::new("tasks")?
        .column("id", "id")?
        .column("title", "title")?
        .column("status", "status")?
        .column("priority", "priority")?
        .column("assignee", "assignee")?)
}

/// Build a criteria from whichever filter values are present.
fn search_criteria(filter: &TaskFilter) -> StitchResult<Criteria> {
    let mut criteria = Criteria::new(tasks_table()?);
    criteria
        .eq_opt("status", filter.status.clone())?
        .ge_opt("priority", filter.min_priority)?
        .in_opt("assignee", filter.assignees.clone())?
        .contains_opt("title", filter.title_contains.as_deref())?
        .order_by_desc("priority")?
        .order_by_asc("id")?;
    Ok(criteria)
}

fn show(label: &str, criteria: &mut Criteria) {
    let rendered = criteria.render_select();
    println!("{label}");
    println!("  SQL:    {}", rendered.fragment());
    println!("  params: {:?}", rendered.params());
    let (positional, values) = rendered.positional();
    println!("  exec:   {positional} [{} value(s)]\n", values.len());
}

fn main() -> StitchResult<()> {
    println!("=== Dynamic search examples ===\n");

    // ============================================
    // Example 1: No filters
    // ============================================
    let filter = TaskFilter {
        status: None,
        min_priority: None,
        assignees: None,
        title_contains: None,
    };
    show("All tasks:", &mut search_criteria(&filter)?);

    // ============================================
    // Example 2: Filter by status
    // ============================================
    let filter = TaskFilter {
        status: Some("pending".to_string()),
        min_priority: None,
        assignees: None,
        title_contains: None,
    };
    show("Pending tasks:", &mut search_criteria(&filter)?);

    // ============================================
    // Example 3: Assignees and priority
    // ============================================
    let filter = TaskFilter {
        status: None,
        min_priority: Some(2),
        assignees: Some(vec!["alice".to_string(), "bob".to_string()]),
        title_contains: None,
    };
    show(
        "Alice's and Bob's high priority tasks (>= 2):",
        &mut search_criteria(&filter)?,
    );

    // ============================================
    // Example 4: Title search
    // ============================================
    let filter = TaskFilter {
        status: None,
        min_priority: None,
        assignees: None,
        title_contains: Some("fix".to_string()),
    };
    show("Tasks containing 'fix':", &mut search_criteria(&filter)?);

    // ============================================
    // Example 5: OR branches and nesting
    // ============================================
    // "pending tasks, or in-progress ones that are urgent"
    let mut criteria = Criteria::new(tasks_table()?);
    criteria
        .eq("status", "pending")?
        .or()
        .nested(|n| n.eq("status", "in_progress")?.ge("priority", 3_i32))?;
    show("Pending, or urgent in-progress:", &mut criteria);

    // ============================================
    // Example 6: Re-render after extending
    // ============================================
    // Earlier placeholders keep their numbers; the new predicate only
    // appends.
    let mut criteria = Criteria::new(tasks_table()?);
    criteria.eq("status", "pending")?;
    let first = criteria.render();
    println!("Before extending:");
    println!("  SQL:    {}\n", first.fragment());

    criteria.eq("assignee", "alice")?;
    show("After extending:", &mut criteria);

    Ok(())
}
