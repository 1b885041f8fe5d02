//! Load pipeline orchestration.
//!
//! Coordinates one run: worksheet → column selection → planning → writes.
//! Planning is pure and happens entirely before the first store call, so a
//! schema error or an empty plan never touches the store.
//!
//! # Upsert planning
//!
//! 1. Drop rows with no name.
//! 2. Drop rows whose raw name equals an earlier row's.
//! 3. Drop rows whose name is blank once trimmed.
//! 4. Derive the document id; drop rows whose id Firestore reserves (`.`,
//!    `..`, `__*__`) or an earlier row already took.
//!
//! Every dropped row keeps the first occurrence, so the first row in sheet
//! order supplies the values for each document.
//!
//! # Append planning
//!
//! Every row with a name becomes one document with a store-assigned id.

use anyhow::{Context, Result};
use std::collections::HashSet;

use crate::config::Config;
use crate::doc_id::{doc_id, is_reserved};
use crate::models::{FoodRecord, LoadMode, SourceRow};
use crate::progress::{should_report, LoadProgressEvent, LoadProgressReporter};
use crate::source;
use crate::store::DocumentStore;

/// One write the loader will perform.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedWrite {
    /// Target document id; `None` in append mode.
    pub doc_id: Option<String>,
    pub record: FoodRecord,
}

/// Row accounting for a plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanStats {
    pub rows_read: usize,
    pub missing_name: usize,
    pub duplicate_name: usize,
    pub blank_name: usize,
    pub duplicate_key: usize,
    pub reserved_key: usize,
}

impl PlanStats {
    pub fn skipped(&self) -> usize {
        self.missing_name
            + self.duplicate_name
            + self.blank_name
            + self.duplicate_key
            + self.reserved_key
    }
}

/// Everything the write phase needs, computed up front.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub mode: LoadMode,
    pub writes: Vec<PlannedWrite>,
    pub stats: PlanStats,
}

/// Outcome of a completed load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub mode: LoadMode,
    pub stats: PlanStats,
    pub written: u64,
    pub dry_run: bool,
}

pub fn plan(rows: &[SourceRow], mode: LoadMode) -> Plan {
    match mode {
        LoadMode::Upsert => plan_upserts(rows),
        LoadMode::Append => plan_appends(rows),
    }
}

/// Plan keyed create-or-replace writes, one per distinct document id.
pub fn plan_upserts(rows: &[SourceRow]) -> Plan {
    let mut stats = PlanStats {
        rows_read: rows.len(),
        ..PlanStats::default()
    };

    let named: Vec<(&str, &SourceRow)> = rows
        .iter()
        .filter_map(|row| row.name.as_deref().map(|name| (name, row)))
        .collect();
    stats.missing_name = rows.len() - named.len();

    let mut seen_names: HashSet<&str> = HashSet::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut writes = Vec::new();

    for (name, row) in named {
        if !seen_names.insert(name) {
            stats.duplicate_name += 1;
            continue;
        }

        if name.trim().is_empty() {
            stats.blank_name += 1;
            continue;
        }

        let Some(id) = doc_id(name) else {
            stats.blank_name += 1;
            continue;
        };

        if is_reserved(&id) {
            log::warn!("'{}' maps to reserved document id '{}', skipped", name, id);
            stats.reserved_key += 1;
            continue;
        }

        if seen_ids.contains(&id) {
            log::debug!("'{}' maps to already planned id '{}', skipped", name, id);
            stats.duplicate_key += 1;
            continue;
        }
        seen_ids.insert(id.clone());

        writes.push(PlannedWrite {
            doc_id: Some(id),
            record: FoodRecord::keyed(name, row),
        });
    }

    Plan {
        mode: LoadMode::Upsert,
        writes,
        stats,
    }
}

/// Plan store-assigned appends: every named row, no de-duplication.
pub fn plan_appends(rows: &[SourceRow]) -> Plan {
    let writes: Vec<PlannedWrite> = rows
        .iter()
        .filter_map(|row| {
            row.name.as_deref().map(|name| PlannedWrite {
                doc_id: None,
                record: FoodRecord::plain(name, row),
            })
        })
        .collect();

    Plan {
        mode: LoadMode::Append,
        stats: PlanStats {
            rows_read: rows.len(),
            missing_name: rows.len() - writes.len(),
            ..PlanStats::default()
        },
        writes,
    }
}

/// Read the configured worksheet and plan the load. No store access.
pub fn prepare(config: &Config, mode: LoadMode) -> Result<Plan> {
    let src = &config.source;
    let table = source::read_sheet(&src.path, &src.sheet, src.header_row)?;
    let rows = table
        .select(&src.columns)
        .with_context(|| format!("Sheet '{}' does not match the configured columns", src.sheet))?;
    Ok(plan(&rows, mode))
}

/// Perform the planned writes in order, stopping at the first failure.
///
/// Returns the number of documents written.
pub async fn execute(
    store: &dyn DocumentStore,
    collection: &str,
    plan: &Plan,
    progress: &dyn LoadProgressReporter,
) -> Result<u64> {
    let total = plan.writes.len() as u64;
    let mut written = 0u64;

    for write in &plan.writes {
        let document = write.record.to_document();
        match &write.doc_id {
            Some(id) => store
                .upsert(collection, id, &document)
                .await
                .with_context(|| format!("Failed to upsert document '{}'", id))?,
            None => {
                let id = store.append(collection, &document).await.with_context(|| {
                    format!("Failed to append document for '{}'", write.record.name)
                })?;
                log::trace!("appended '{}' as {}", write.record.name, id);
            }
        }

        written += 1;
        if should_report(written, total) {
            progress.report(LoadProgressEvent::Writing { n: written, total });
        }
    }

    Ok(written)
}

/// Run a full load of the configured worksheet into `store`.
///
/// # Errors
///
/// - Workbook, sheet, or required column missing: fails before any write.
/// - A store write fails: the run stops there; earlier writes remain.
pub async fn run_load(
    config: &Config,
    store: &dyn DocumentStore,
    mode: LoadMode,
    progress: &dyn LoadProgressReporter,
) -> Result<LoadReport> {
    progress.report(LoadProgressEvent::Reading {
        sheet: config.source.sheet.clone(),
    });
    let plan = prepare(config, mode)?;

    log::info!(
        "{} {} records into {}/{} ({} rows skipped)",
        mode,
        plan.writes.len(),
        store.describe(),
        config.store.collection,
        plan.stats.skipped()
    );

    let written = execute(store, &config.store.collection, &plan, progress).await?;

    Ok(LoadReport {
        mode,
        stats: plan.stats,
        written,
        dry_run: false,
    })
}

/// Plan only and report what a load would write.
pub fn dry_run(config: &Config, mode: LoadMode) -> Result<LoadReport> {
    let plan = prepare(config, mode)?;
    Ok(LoadReport {
        mode,
        written: plan.writes.len() as u64,
        stats: plan.stats,
        dry_run: true,
    })
}

/// Print the end-of-run summary on stdout.
pub fn print_summary(report: &LoadReport, collection: &str) {
    if report.dry_run {
        println!("load {} -> {} (dry-run)", report.mode, collection);
    } else {
        println!("load {} -> {}", report.mode, collection);
    }
    println!("  rows read: {}", report.stats.rows_read);
    println!("  skipped (no name): {}", report.stats.missing_name);
    if report.mode == LoadMode::Upsert {
        println!("  skipped (duplicate name): {}", report.stats.duplicate_name);
        println!("  skipped (blank name): {}", report.stats.blank_name);
        println!("  skipped (duplicate id): {}", report.stats.duplicate_key);
        println!("  skipped (reserved id): {}", report.stats.reserved_key);
    }
    if report.dry_run {
        println!("  documents to write: {}", report.written);
    } else {
        println!("  documents written: {}", report.written);
        println!("Upload complete.");
    }
}
