// src/excel.rs

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::Workbook;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::model::{
    is_persian_month, EmployeeRow, COL_CODE, COL_NAME, COL_UNIT, MONTH_CELL, PLACEHOLDER_CODE,
    PRODUCTION_DAYS_CELL, TOTAL_HOURS_CELL, UNKNOWN_NAME_SENTINEL,
};

/// Export header row: unit name, employee name, personnel code, overtime
/// hours, month.
pub const EXPORT_HEADER: [&str; 5] = [
    "نام واحد",
    "نام پرسنل",
    "کد پرسنلی",
    "ساعت اضافه کاری",
    "ماه",
];

/// Fixed header cells read from the first worksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkbookHeader {
    pub total_hours: u32,
    pub production_days: u32,
    /// Empty when the cell is missing or not one of the twelve month names.
    pub month_name: String,
}

fn first_sheet(path: &Path) -> Result<Range<Data>> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e: calamine::XlsxError| AppError::Workbook {
        path: path.to_path_buf(),
        source: e.into(),
    })?;
    match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => Ok(range),
        Some(Err(e)) => Err(AppError::Workbook {
            path: path.to_path_buf(),
            source: e.into(),
        }),
        None => Err(AppError::NoWorksheet {
            path: path.to_path_buf(),
        }),
    }
}

/// Cell content as a trimmed string; numbers are rendered without a trailing
/// fraction when they are whole (personnel codes often arrive as numerics).
fn cell_text(range: &Range<Data>, row: u32, col: u32) -> String {
    match range.get_value((row, col)) {
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Float(f)) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Some(Data::Int(i)) => i.to_string(),
        Some(Data::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Non-negative count cell: parsed as a float and truncated. Any parse
/// failure or negative value collapses to zero — header cells are lenient.
fn cell_count(range: &Range<Data>, (row, col): (u32, u32)) -> u32 {
    let parsed = match range.get_value((row, col)) {
        Some(Data::Float(f)) => Some(*f),
        Some(Data::Int(i)) => Some(*i as f64),
        Some(Data::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v >= 0.0 => v as u32,
        Some(v) => {
            warn!("Ignoring negative header cell value {} at row {}", v, row + 1);
            0
        }
        None => 0,
    }
}

/// Reads the unit total (F1), production days (F2) and month name (F3) from
/// the first worksheet.
pub fn read_header(path: &Path) -> Result<WorkbookHeader> {
    let range = first_sheet(path)?;

    let total_hours = cell_count(&range, TOTAL_HOURS_CELL);
    let production_days = cell_count(&range, PRODUCTION_DAYS_CELL);

    let mut month_name = cell_text(&range, MONTH_CELL.0, MONTH_CELL.1);
    if !month_name.is_empty() && !is_persian_month(&month_name) {
        warn!(
            "Month cell value '{}' in {} is not a known month name",
            month_name,
            path.display()
        );
        month_name.clear();
    }

    Ok(WorkbookHeader {
        total_hours,
        production_days,
        month_name,
    })
}

/// Reads the roster rows belonging to `unit` from the first worksheet.
/// Row 1 is the header. Rows with missing columns, a different unit,
/// an empty or sentinel name, or a placeholder personnel code are skipped
/// silently. Accepted rows start unallocated and unlocked.
pub fn read_employees(path: &Path, unit: &str) -> Result<Vec<EmployeeRow>> {
    let range = first_sheet(path)?;
    let mut employees = Vec::new();

    let Some((last_row, _)) = range.end() else {
        return Ok(employees);
    };
    let wanted = unit.trim().to_lowercase();

    for row in 1..=last_row {
        let row_unit = cell_text(&range, row, COL_UNIT);
        if row_unit.to_lowercase() != wanted {
            continue;
        }
        let name = cell_text(&range, row, COL_NAME);
        let code = cell_text(&range, row, COL_CODE);
        if name.is_empty()
            || code.is_empty()
            || name == UNKNOWN_NAME_SENTINEL
            || code == PLACEHOLDER_CODE
        {
            continue;
        }
        employees.push(EmployeeRow::new(name, code));
    }
    Ok(employees)
}

/// Distinct non-empty unit identifiers from column A (header excluded), in
/// first-seen order.
pub fn distinct_units(path: &Path) -> Result<Vec<String>> {
    let range = first_sheet(path)?;
    let mut seen = HashSet::new();
    let mut units = Vec::new();

    let Some((last_row, _)) = range.end() else {
        return Ok(units);
    };
    for row in 1..=last_row {
        let unit = cell_text(&range, row, COL_UNIT);
        if !unit.is_empty() && seen.insert(unit.clone()) {
            units.push(unit);
        }
    }
    Ok(units)
}

// --- Writer ---

/// A cell of the output workbook. Numbers are written as native numeric
/// cells, not stringified.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<u32> for CellValue {
    fn from(n: u32) -> Self {
        CellValue::Number(n as f64)
    }
}

/// Shapes a unit record into the export layout: the fixed header row plus
/// one row per employee. Empty row month labels inherit the unit's month,
/// falling back to the current Jalali month.
pub fn allocation_rows(record: &crate::model::UnitRecord) -> Vec<Vec<CellValue>> {
    let mut rows = Vec::with_capacity(record.employees.len() + 1);
    rows.push(EXPORT_HEADER.iter().map(|h| CellValue::from(*h)).collect());
    for employee in &record.employees {
        rows.push(vec![
            CellValue::from(record.unit.as_str()),
            CellValue::from(employee.name.as_str()),
            CellValue::from(employee.personnel_code.as_str()),
            CellValue::from(employee.hours),
            CellValue::Text(employee.display_month(&record.month_label)),
        ]);
    }
    rows
}

/// Writes one worksheet of cell rows to any byte sink.
pub fn write_rows<W: Write>(sink: &mut W, rows: &[Vec<CellValue>]) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            match cell {
                CellValue::Text(s) => worksheet.write_string(r as u32, c as u16, s)?,
                CellValue::Number(n) => worksheet.write_number(r as u32, c as u16, *n)?,
            };
        }
    }

    let buffer = workbook.save_to_buffer()?;
    sink.write_all(&buffer)
        .map_err(|e| AppError::io("<workbook sink>", e))?;
    Ok(())
}
