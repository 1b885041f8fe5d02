//! `cofid check`: verify the workbook without touching the store.
//!
//! Lists the workbook's sheets, reports each required header as found or
//! missing, and prints how many documents a load would write.

use anyhow::Result;

use crate::config::Config;
use crate::loader;
use crate::source;

/// Verify the configured workbook without touching the store.
///
/// Prints the sheets found, the status of each required header, and the
/// planned document count. Fails if the sheet or any header is missing.
pub fn run_check(config: &Config) -> Result<()> {
    let src = &config.source;

    let sheets = source::sheet_names(&src.path)?;
    println!("workbook: {}", src.path.display());
    for name in &sheets {
        let marker = if *name == src.sheet { "*" } else { " " };
        println!("  {} {}", marker, name);
    }

    let table = source::read_sheet(&src.path, &src.sheet, src.header_row)?;
    let missing = table.missing_columns(&src.columns);

    println!();
    println!("{:<28} STATUS", "COLUMN");
    for header in src.columns.required() {
        let status = if missing.contains(&header) {
            "MISSING"
        } else {
            "OK"
        };
        println!("{:<28} {}", header, status);
    }

    if !missing.is_empty() {
        anyhow::bail!("{} required column(s) missing", missing.len());
    }

    let plan = loader::plan(&table.select(&src.columns)?, config.load.mode);
    println!();
    println!("data rows: {}", plan.stats.rows_read);
    println!("documents ({}): {}", plan.mode, plan.writes.len());
    println!("ok");

    Ok(())
}
