// src/import.rs
//
// Administrator-only import of a local workbook that may hold rosters for
// several units at once. The workbook carries a single header (F1-F3), so
// only the first unit imported from it receives those values; every later
// unit starts from a zero budget and the current month.

use std::path::Path;

use tracing::{info, warn};

use crate::allocate;
use crate::error::Result;
use crate::excel;
use crate::jalali;
use crate::model::{is_manageable_unit, UnitSnapshot, UnitStore};

/// Outcome of one import run: which units were populated and why the others
/// were skipped. Skips are never fatal.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub imported: Vec<String>,
    pub skipped: Vec<String>,
}

pub fn import_workbook(store: &mut UnitStore, path: &Path) -> Result<ImportSummary> {
    let header = excel::read_header(path)?;
    let header_month = if header.month_name.is_empty() {
        let current = jalali::current_month_name().to_string();
        info!(
            "Workbook {} carries no valid month name, substituting the current month '{}'",
            path.display(),
            current
        );
        current
    } else {
        header.month_name.clone()
    };

    let units = excel::distinct_units(path)?;
    if units.is_empty() {
        warn!("No unit names found in column A of {}", path.display());
    }

    let mut summary = ImportSummary::default();
    let mut header_applied = false;

    for unit in units {
        if !is_manageable_unit(&unit) {
            summary.skipped.push(format!("{} (undefined unit)", unit));
            continue;
        }
        let mut employees = match excel::read_employees(path, &unit) {
            Ok(rows) => rows,
            Err(e) => {
                summary
                    .skipped
                    .push(format!("{} (roster read failed: {})", unit, e));
                continue;
            }
        };
        if employees.is_empty() {
            summary.skipped.push(format!("{} (no rows)", unit));
            continue;
        }

        // The single workbook header belongs to the first imported unit only.
        let (total_hours, production_days, month_label) = if !header_applied {
            header_applied = true;
            (
                header.total_hours,
                header.production_days,
                header_month.clone(),
            )
        } else {
            (0, 0, jalali::current_month_name().to_string())
        };

        for employee in &mut employees {
            employee.month_label = month_label.clone();
        }

        let record = store.replace(
            &unit,
            UnitSnapshot {
                total_hours,
                production_days,
                month_label,
                employees,
            },
        );
        allocate::reallocate(record);
        summary.imported.push(unit);
    }

    info!(
        "Imported {} unit(s) from {}, skipped {}",
        summary.imported.len(),
        path.display(),
        summary.skipped.len()
    );
    Ok(summary)
}
