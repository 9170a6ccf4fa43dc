// src/allocate.rs
//
// The allocation engine. Whenever the unit total, the locked set, an edited
// hours field, or the roster changes, one full reallocation pass restores
// the sum law: unlocked rows share whatever the locked rows leave of the
// unit total, with the remainder spread one hour at a time in row order.

use tracing::warn;

use crate::error::{AppError, Result};
use crate::model::{UnitRecord, MAX_ROW_HOURS};

/// Redistributes the unit total across unlocked rows. Locked rows are never
/// touched. When every row is locked and hours remain undistributed, the
/// record is left as-is; the mismatch is caught at export time.
pub fn reallocate(record: &mut UnitRecord) {
    let locked_sum: u32 = record
        .employees
        .iter()
        .filter(|e| e.locked)
        .map(|e| e.hours)
        .sum();
    let remaining = record.total_hours.saturating_sub(locked_sum);

    let unlocked: Vec<usize> = record
        .employees
        .iter()
        .enumerate()
        .filter(|(_, e)| !e.locked)
        .map(|(i, _)| i)
        .collect();

    if unlocked.is_empty() {
        if remaining > 0 {
            warn!(
                "All rows of unit '{}' are locked but {} hours remain undistributed",
                record.unit, remaining
            );
        }
        return;
    }

    let base = remaining / unlocked.len() as u32;
    let extra = remaining % unlocked.len() as u32;
    for (position, &index) in unlocked.iter().enumerate() {
        let mut hours = base;
        if (position as u32) < extra {
            hours += 1;
        }
        record.employees[index].hours = hours;
    }
}

/// Sum of all allocated hours, locked and unlocked alike.
pub fn allocated_sum(record: &UnitRecord) -> u32 {
    record.employees.iter().map(|e| e.hours).sum()
}

/// Admin edit of the unit total, followed by a reallocation pass. Negative
/// totals cannot be expressed; the type already enforces the lower bound.
pub fn set_total_hours(record: &mut UnitRecord, total: u32) {
    if record.total_hours != total {
        record.total_hours = total;
        reallocate(record);
    }
}

/// Manual edit of one row's hours. Editing a row pins it: the row is locked
/// so the pass that follows distributes around it.
pub fn set_employee_hours(record: &mut UnitRecord, index: usize, hours: u32) -> Result<()> {
    if hours > MAX_ROW_HOURS {
        return Err(AppError::HoursOutOfRange { hours });
    }
    let Some(employee) = record.employees.get_mut(index) else {
        return Ok(());
    };
    if employee.hours != hours || !employee.locked {
        employee.hours = hours;
        employee.locked = true;
        reallocate(record);
    }
    Ok(())
}

/// Toggles a row's locked flag and reallocates.
pub fn set_locked(record: &mut UnitRecord, index: usize, locked: bool) {
    let Some(employee) = record.employees.get_mut(index) else {
        return;
    };
    if employee.locked != locked {
        employee.locked = locked;
        reallocate(record);
    }
}

/// Export precondition: the sum law must hold exactly. Over-locked records
/// (locked rows alone exceeding the total) fail here rather than inside the
/// engine.
pub fn check_export(record: &UnitRecord) -> Result<()> {
    let allocated = allocated_sum(record);
    if allocated != record.total_hours {
        return Err(AppError::AllocationMismatch {
            allocated,
            total: record.total_hours,
        });
    }
    Ok(())
}
