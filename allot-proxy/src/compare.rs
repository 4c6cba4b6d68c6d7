//! Run-over-run comparison of allocation results.
//!
//! Two result sets for the same request are matched on `AllocNo`. Records
//! only in the newer run are *added*, records only in the older run are
//! *removed*, and matched records whose tracked fields differ are
//! *modified*. Employee and activity headcounts are diffed alongside.

use allot_core::{AllocationEnvelope, ForwardPayload, is_blank};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

pub const ALLOC_NO_FIELD: &str = "AllocNo";
pub const EMP_NO_FIELD: &str = "EmpNo";
pub const EMP_NAME_FIELD: &str = "EmpName";
pub const ACTIVITY_FIELD: &str = "ActivityDesc";

/// Fields compared on records present in both runs, in reporting order.
pub const TRACKED_FIELDS: [&str; 8] = [
    "AllocStartDate",
    "AllocEndDate",
    "Percent",
    "ActivityDesc",
    "ActivityNo",
    "Country",
    "StateCity",
    "ReportingManagerEmpNo",
];

const UNKNOWN_ACTIVITY: &str = "Unknown";

// ── Types ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: &'static str,
    pub from: Value,
    pub to: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModifiedAllocation {
    pub alloc_no: Value,
    pub employee: Value,
    pub current: Value,
    pub previous: Value,
    pub changes: Vec<FieldChange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonSummary {
    pub total_current: usize,
    pub total_previous: usize,
    pub net_change: i64,
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
    /// `added + removed + modified`.
    pub total_changes: usize,
    /// `net_change` relative to the previous total, two decimals; 0 when
    /// the previous run was empty.
    pub change_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeAllocations {
    pub emp_no: Value,
    pub emp_name: Value,
    pub allocations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeDelta {
    pub emp_no: Value,
    pub emp_name: Value,
    pub allocations_before: usize,
    pub allocations_after: usize,
    pub change: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmployeeChanges {
    pub added: Vec<EmployeeAllocations>,
    pub removed: Vec<EmployeeAllocations>,
    /// Employees in both runs whose allocation count moved.
    pub modified: Vec<EmployeeDelta>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityChange {
    pub activity: String,
    pub before: usize,
    pub after: usize,
    pub change: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub summary: ComparisonSummary,
    pub added: Vec<Value>,
    pub removed: Vec<Value>,
    pub modified: Vec<ModifiedAllocation>,
    pub employee_changes: EmployeeChanges,
    pub activity_changes: Vec<ActivityChange>,
}

/// Response of the gateway's comparison endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub success: bool,
    pub request_payload: ForwardPayload,
    /// Successful runs on record for this payload.
    pub runs: usize,
    pub current_run: Option<DateTime<Utc>>,
    pub previous_run: Option<DateTime<Utc>>,
    /// `None` until at least two successful runs exist.
    pub comparison: Option<Comparison>,
}

// ── Diff ─────────────────────────────────────────────────────────────────────

/// Diff `current` against `previous`.
///
/// Records sharing an `AllocNo` are paired; when a run repeats an `AllocNo`
/// the last occurrence is the one paired. A record without `AllocNo` keys
/// as `null`.
pub fn compare(current: &[Value], previous: &[Value]) -> Comparison {
    let current_by_no = index_by_alloc_no(current);
    let previous_by_no = index_by_alloc_no(previous);

    let added: Vec<Value> = current
        .iter()
        .filter(|item| !previous_by_no.contains_key(&alloc_key(item)))
        .cloned()
        .collect();
    let removed: Vec<Value> = previous
        .iter()
        .filter(|item| !current_by_no.contains_key(&alloc_key(item)))
        .cloned()
        .collect();

    let mut modified = Vec::new();
    let mut unchanged = 0;
    for item in current {
        let Some(prev) = previous_by_no.get(&alloc_key(item)) else {
            continue;
        };
        let changes = field_changes(item, prev);
        if changes.is_empty() {
            unchanged += 1;
        } else {
            modified.push(ModifiedAllocation {
                alloc_no: field(item, ALLOC_NO_FIELD),
                employee: field(item, EMP_NAME_FIELD),
                current: item.clone(),
                previous: (*prev).clone(),
                changes,
            });
        }
    }

    let net_change = current.len() as i64 - previous.len() as i64;
    let summary = ComparisonSummary {
        total_current: current.len(),
        total_previous: previous.len(),
        net_change,
        added: added.len(),
        removed: removed.len(),
        modified: modified.len(),
        unchanged,
        total_changes: added.len() + removed.len() + modified.len(),
        change_percentage: change_percentage(net_change, previous.len()),
    };

    Comparison {
        summary,
        added,
        removed,
        modified,
        employee_changes: employee_changes(current, previous),
        activity_changes: activity_changes(current, previous),
    }
}

/// Compare the two most recent successful runs recorded for `payload`.
pub fn compare_latest_runs(
    history: Vec<AllocationEnvelope>,
    payload: ForwardPayload,
) -> ComparisonReport {
    let mut runs: Vec<AllocationEnvelope> = history
        .into_iter()
        .filter(|run| run.success && run.request_payload == payload)
        .collect();
    runs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let comparison = match (runs.first(), runs.get(1)) {
        (Some(current), Some(previous)) => Some(compare(records_of(current), records_of(previous))),
        _ => None,
    };

    ComparisonReport {
        success: true,
        request_payload: payload,
        runs: runs.len(),
        current_run: runs.first().map(|run| run.timestamp),
        previous_run: runs.get(1).map(|run| run.timestamp),
        comparison,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Non-array payloads count as an empty run.
fn records_of(run: &AllocationEnvelope) -> &[Value] {
    run.data
        .as_ref()
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn field(item: &Value, name: &str) -> Value {
    item.get(name).cloned().unwrap_or(Value::Null)
}

/// `Value` is not `Hash`; its JSON text is.
fn alloc_key(item: &Value) -> String {
    field(item, ALLOC_NO_FIELD).to_string()
}

fn index_by_alloc_no(items: &[Value]) -> HashMap<String, &Value> {
    items.iter().map(|item| (alloc_key(item), item)).collect()
}

fn field_changes(current: &Value, previous: &Value) -> Vec<FieldChange> {
    TRACKED_FIELDS
        .iter()
        .filter(|name| current.get(**name) != previous.get(**name))
        .map(|name| FieldChange {
            field: *name,
            from: field(previous, name),
            to: field(current, name),
        })
        .collect()
}

fn change_percentage(net_change: i64, total_previous: usize) -> f64 {
    if total_previous == 0 {
        return 0.0;
    }
    (net_change as f64 / total_previous as f64 * 10_000.0).round() / 100.0
}

/// Distinct `EmpNo` values in first-seen order.
fn employees(items: &[Value]) -> Vec<Value> {
    let mut seen: Vec<Value> = Vec::new();
    for item in items {
        let emp_no = field(item, EMP_NO_FIELD);
        if !seen.contains(&emp_no) {
            seen.push(emp_no);
        }
    }
    seen
}

fn allocations_of<'a>(items: &'a [Value], emp_no: &'a Value) -> impl Iterator<Item = &'a Value> {
    items.iter().filter(move |item| field(item, EMP_NO_FIELD) == *emp_no)
}

fn name_of(items: &[Value], emp_no: &Value) -> Value {
    allocations_of(items, emp_no)
        .next()
        .map(|item| field(item, EMP_NAME_FIELD))
        .unwrap_or(Value::Null)
}

fn employee_changes(current: &[Value], previous: &[Value]) -> EmployeeChanges {
    let now = employees(current);
    let before = employees(previous);
    let mut changes = EmployeeChanges::default();

    for emp_no in &now {
        let after = allocations_of(current, emp_no).count();
        if !before.contains(emp_no) {
            changes.added.push(EmployeeAllocations {
                emp_no: emp_no.clone(),
                emp_name: name_of(current, emp_no),
                allocations: after,
            });
            continue;
        }
        let prior = allocations_of(previous, emp_no).count();
        if prior != after {
            changes.modified.push(EmployeeDelta {
                emp_no: emp_no.clone(),
                emp_name: name_of(current, emp_no),
                allocations_before: prior,
                allocations_after: after,
                change: after as i64 - prior as i64,
            });
        }
    }

    for emp_no in before.iter().filter(|emp_no| !now.contains(emp_no)) {
        changes.removed.push(EmployeeAllocations {
            emp_no: emp_no.clone(),
            emp_name: name_of(previous, emp_no),
            allocations: allocations_of(previous, emp_no).count(),
        });
    }

    changes
}

/// Blank activities group under `Unknown`.
fn activity_key(item: &Value) -> String {
    match item.get(ACTIVITY_FIELD) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(other) if !is_blank(other) => other.to_string(),
        _ => UNKNOWN_ACTIVITY.to_string(),
    }
}

/// Headcount per activity, in first-seen order.
fn count_by_activity(items: &[Value]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for item in items {
        let key = activity_key(item);
        match counts.iter_mut().find(|(activity, _)| *activity == key) {
            Some((_, count)) => *count += 1,
            None => counts.push((key, 1)),
        }
    }
    counts
}

fn count_of(counts: &[(String, usize)], key: &str) -> usize {
    counts
        .iter()
        .find(|(activity, _)| activity == key)
        .map_or(0, |(_, count)| *count)
}

fn activity_changes(current: &[Value], previous: &[Value]) -> Vec<ActivityChange> {
    let after = count_by_activity(current);
    let before = count_by_activity(previous);

    let activities = after.iter().map(|(activity, _)| activity).chain(
        before
            .iter()
            .map(|(activity, _)| activity)
            .filter(|activity| count_of(&after, activity.as_str()) == 0),
    );

    activities
        .filter_map(|activity| {
            let (was, now) = (count_of(&before, activity), count_of(&after, activity));
            (was != now).then(|| ActivityChange {
                activity: activity.clone(),
                before: was,
                after: now,
                change: now as i64 - was as i64,
            })
        })
        .collect()
}
