use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

use crate::unify::Policies;
use crate::unify::aggregate::aggregate;
use crate::unify::types::{SourceCategory, SourceTable, UnifiedSummaryRecord};

/// Runs every aggregator and concatenates the results in table order.
///
/// No rows are deduplicated across tables: a location counted by several
/// programs appears once per table.
#[tracing::instrument(skip_all, fields(tables = tables.len()))]
pub fn unify(tables: &[SourceTable], policies: &Policies) -> Vec<UnifiedSummaryRecord> {
    let records: Vec<UnifiedSummaryRecord> = tables
        .iter()
        .flat_map(|table| aggregate(table, policies))
        .collect();

    info!(rows = records.len(), "Unified summary built");
    records
}

/// Same result as [`unify`], with each aggregator on the blocking pool.
///
/// Results are joined back in table order.
#[tracing::instrument(skip_all, fields(tables = tables.len()))]
pub async fn unify_concurrent(
    tables: Vec<SourceTable>,
    policies: Arc<Policies>,
) -> Result<Vec<UnifiedSummaryRecord>> {
    let mut tasks = Vec::with_capacity(tables.len());

    for table in tables {
        let policies = policies.clone();
        let category = table.category();
        debug!(category = %category, rows = table.len(), "Spawning aggregator");
        tasks.push(tokio::task::spawn_blocking(move || {
            aggregate(&table, &policies)
        }));
    }

    let mut records = Vec::new();
    for task in tasks {
        records.extend(task.await?);
    }

    info!(rows = records.len(), "Unified summary built");
    Ok(records)
}

/// Sum of `total_counts` per source label and mode, for run summaries.
pub fn totals_by_source(records: &[UnifiedSummaryRecord]) -> HashMap<(String, String), u64> {
    let mut totals = HashMap::new();
    for r in records {
        *totals
            .entry((r.source_label.clone(), r.mode.as_str().to_string()))
            .or_insert(0) += r.total_counts;
    }
    totals
}

/// Orders tables into merge order, dropping nothing.
pub fn in_merge_order(mut tables: Vec<SourceTable>) -> Vec<SourceTable> {
    tables.sort_by_key(|t| {
        SourceCategory::ALL
            .iter()
            .position(|c| *c == t.category())
            .unwrap_or(usize::MAX)
    });
    tables
}
