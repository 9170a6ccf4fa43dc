// src/model.rs

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use tracing::info;

use crate::jalali;

// --- Workbook format contract ---

// Fixed header cells on the first worksheet (0-based row/col).
pub const TOTAL_HOURS_CELL: (u32, u32) = (0, 5); // F1
pub const PRODUCTION_DAYS_CELL: (u32, u32) = (1, 5); // F2
pub const MONTH_CELL: (u32, u32) = (2, 5); // F3

// Employee row columns.
pub const COL_UNIT: u32 = 0; // A
pub const COL_NAME: u32 = 1; // B
pub const COL_CODE: u32 = 2; // C

// Row filter sentinels.
pub const UNKNOWN_NAME_SENTINEL: &str = "نامشخص";
pub const PLACEHOLDER_CODE: &str = "0000";

/// Upper bound for a single employee's monthly overtime hours.
pub const MAX_ROW_HOURS: u32 = 999;

pub const PERSIAN_MONTHS: [&str; 12] = [
    "فروردین",
    "اردیبهشت",
    "خرداد",
    "تیر",
    "مرداد",
    "شهریور",
    "مهر",
    "آبان",
    "آذر",
    "دی",
    "بهمن",
    "اسفند",
];

pub fn is_persian_month(name: &str) -> bool {
    PERSIAN_MONTHS.contains(&name)
}

// --- Organizational units ---

/// Department names paired with the shift patterns they run. The security
/// department ("حراست") uses its two domain-specific patterns instead of the
/// usual fixed/rotating pair.
pub const DEPARTMENT_SHIFTS: [(&str, &[&str]); 21] = [
    ("انبار", &["شیفتی", "ثابت"]),
    ("حراست", &["نگهبانی", "باسکول"]),
    ("برق", &["شیفتی", "ثابت"]),
    ("تولید", &["شیفتی", "ثابت"]),
    ("تأسیسات", &["شیفتی", "ثابت"]),
    ("مکانیک", &["شیفتی", "ثابت"]),
    ("سرمایه های انسانی", &["شیفتی", "ثابت"]),
    ("کنترل کیفیت", &["شیفتی", "ثابت"]),
    ("تراشکاری", &["شیفتی"]),
    ("نت", &["ثابت"]),
    ("مهندسی سیستم", &["ثابت"]),
    ("فناوری اطلاعات", &["ثابت"]),
    ("برنامه ریزی", &["ثابت"]),
    ("مدیریت", &["ثابت"]),
    ("فروش", &["ثابت"]),
    ("دفتر فنی", &["ثابت"]),
    ("تدارکات", &["ثابت"]),
    ("مالی", &["ثابت"]),
    ("HSE", &["شیفتی", "ثابت"]),
    ("رؤسا و سرپرستان فنی مهندسی", &["ثابت"]),
    ("مدیران و رؤسا", &["ثابت"]),
];

/// Every `"<department> - <shift>"` combination, lexicographically sorted.
/// This is the closed set of unit identifiers the application manages.
pub static MANAGEABLE_UNITS: Lazy<Vec<String>> = Lazy::new(|| {
    let mut units: Vec<String> = DEPARTMENT_SHIFTS
        .iter()
        .flat_map(|(dept, shifts)| {
            shifts
                .iter()
                .map(move |shift| format!("{} - {}", dept, shift))
        })
        .collect();
    units.sort();
    units
});

pub fn is_manageable_unit(unit: &str) -> bool {
    MANAGEABLE_UNITS.iter().any(|u| u == unit)
}

pub fn shifts_for_department(department: &str) -> Option<&'static [&'static str]> {
    DEPARTMENT_SHIFTS
        .iter()
        .find(|(dept, _)| *dept == department)
        .map(|(_, shifts)| *shifts)
}

// --- Records ---

/// One roster line. `hours` is always a whole number of overtime hours;
/// `locked` rows are never touched by the allocation engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmployeeRow {
    pub name: String,
    pub personnel_code: String,
    pub hours: u32,
    pub locked: bool,
    pub month_label: String,
}

impl EmployeeRow {
    pub fn new(name: impl Into<String>, personnel_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            personnel_code: personnel_code.into(),
            hours: 0,
            locked: false,
            month_label: String::new(),
        }
    }

    /// Month shown for this row: its own label, else the unit's, else the
    /// current Jalali month.
    pub fn display_month(&self, unit_month: &str) -> String {
        if !self.month_label.is_empty() {
            self.month_label.clone()
        } else if !unit_month.is_empty() {
            unit_month.to_string()
        } else {
            jalali::current_month_name().to_string()
        }
    }
}

/// Per-unit working state: the monthly budget and the roster it is being
/// distributed over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitRecord {
    pub unit: String,
    pub total_hours: u32,
    pub production_days: u32,
    pub month_label: String,
    pub employees: Vec<EmployeeRow>,
}

impl UnitRecord {
    pub fn empty(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            total_hours: 0,
            production_days: 0,
            month_label: String::new(),
            employees: Vec::new(),
        }
    }

    /// Month used for export rows when a row carries no label of its own.
    pub fn display_month(&self) -> String {
        if !self.month_label.is_empty() {
            self.month_label.clone()
        } else {
            jalali::current_month_name().to_string()
        }
    }
}

/// Field-wise payload produced by ingestion or admin import; applied to the
/// store as one whole-record update.
#[derive(Debug, Clone)]
pub struct UnitSnapshot {
    pub total_hours: u32,
    pub production_days: u32,
    pub month_label: String,
    pub employees: Vec<EmployeeRow>,
}

// --- Unit state store ---

/// Process-wide mapping from unit identifier to its current record. Owned by
/// the application context and only ever touched from the dispatching task,
/// so no interior locking is needed.
#[derive(Debug, Default)]
pub struct UnitStore {
    records: BTreeMap<String, UnitRecord>,
}

impl UnitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lazily creates a zero record on first selection.
    pub fn get_or_create(&mut self, unit: &str) -> &mut UnitRecord {
        if !self.records.contains_key(unit) {
            info!("No record for unit '{}' yet, creating an empty one", unit);
        }
        self.records
            .entry(unit.to_string())
            .or_insert_with(|| UnitRecord::empty(unit))
    }

    pub fn get(&self, unit: &str) -> Option<&UnitRecord> {
        self.records.get(unit)
    }

    pub fn get_mut(&mut self, unit: &str) -> Option<&mut UnitRecord> {
        self.records.get_mut(unit)
    }

    /// Whole-record overwrite of everything but the key itself.
    pub fn replace(&mut self, unit: &str, snapshot: UnitSnapshot) -> &mut UnitRecord {
        let record = self.get_or_create(unit);
        record.total_hours = snapshot.total_hours;
        record.production_days = snapshot.production_days;
        record.month_label = snapshot.month_label;
        record.employees = snapshot.employees;
        record
    }

    /// Zeroes all mutable fields of the unit's record and clears its roster.
    pub fn reset(&mut self, unit: &str) {
        let record = self.get_or_create(unit);
        record.total_hours = 0;
        record.production_days = 0;
        record.month_label.clear();
        record.employees.clear();
    }

    pub fn units(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}
