// src/excel_tests.rs

#[cfg(test)]
mod tests {
    use calamine::{open_workbook, Data, Reader, Xlsx};
    use rust_xlsxwriter::{Workbook, Worksheet};
    use tempfile::NamedTempFile;

    use super::super::excel::{
        allocation_rows, distinct_units, read_employees, read_header, write_rows, CellValue,
        EXPORT_HEADER,
    };
    use super::super::import::import_workbook;
    use super::super::jalali;
    use super::super::model::{EmployeeRow, UnitRecord, UnitStore};

    fn build_workbook<F>(fill: F) -> NamedTempFile
    where
        F: FnOnce(&mut Worksheet),
    {
        let mut workbook = Workbook::new();
        fill(workbook.add_worksheet());
        let temp = NamedTempFile::new().unwrap();
        workbook.save(temp.path()).unwrap();
        temp
    }

    fn roster_row(sheet: &mut Worksheet, row: u32, unit: &str, name: &str, code: f64) {
        sheet.write_string(row, 0, unit).unwrap();
        sheet.write_string(row, 1, name).unwrap();
        sheet.write_number(row, 2, code).unwrap();
    }

    #[test]
    fn header_reads_the_fixed_cells() {
        let temp = build_workbook(|sheet| {
            sheet.write_number(0, 5, 120.0).unwrap();
            // F2 left empty on purpose.
            sheet.write_string(2, 5, "دی").unwrap();
        });
        let header = read_header(temp.path()).unwrap();
        assert_eq!(header.total_hours, 120);
        assert_eq!(header.production_days, 0);
        assert_eq!(header.month_name, "دی");
    }

    #[test]
    fn header_month_outside_the_calendar_is_cleared() {
        let temp = build_workbook(|sheet| {
            sheet.write_number(0, 5, 80.0).unwrap();
            sheet.write_string(2, 5, "December").unwrap();
        });
        let header = read_header(temp.path()).unwrap();
        assert_eq!(header.month_name, "");
    }

    #[test]
    fn header_counts_accept_text_and_reject_negatives() {
        let temp = build_workbook(|sheet| {
            sheet.write_string(0, 5, " 120 ").unwrap();
            sheet.write_string(1, 5, "-5").unwrap();
        });
        let header = read_header(temp.path()).unwrap();
        assert_eq!(header.total_hours, 120);
        assert_eq!(header.production_days, 0);
    }

    #[test]
    fn roster_rows_are_filtered_by_unit_and_sentinels() {
        let temp = build_workbook(|sheet| {
            sheet.write_string(0, 0, "نام واحد").unwrap();
            roster_row(sheet, 1, "تولید - شیفتی", "علی رضایی", 1001.0);
            roster_row(sheet, 2, "تولید - شیفتی", "نامشخص", 1002.0);
            sheet.write_string(3, 0, "تولید - شیفتی").unwrap();
            sheet.write_string(3, 1, "حسن موسوی").unwrap();
            sheet.write_string(3, 2, "0000").unwrap();
            roster_row(sheet, 4, "تولید - شیفتی", "", 1004.0);
            roster_row(sheet, 5, "انبار - ثابت", "رضا کریمی", 2001.0);
            roster_row(sheet, 6, " تولید - شیفتی ", "مریم احمدی", 1006.0);
        });

        let employees = read_employees(temp.path(), "تولید - شیفتی").unwrap();
        let names: Vec<&str> = employees.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["علی رضایی", "مریم احمدی"]);
        assert!(employees.iter().all(|e| e.hours == 0 && !e.locked));
        assert_eq!(employees[0].personnel_code, "1001");
    }

    #[test]
    fn distinct_units_keeps_first_seen_order() {
        let temp = build_workbook(|sheet| {
            sheet.write_string(0, 0, "نام واحد").unwrap();
            roster_row(sheet, 1, "انبار - ثابت", "الف", 1.0);
            roster_row(sheet, 2, "تولید - شیفتی", "ب", 2.0);
            roster_row(sheet, 3, "انبار - ثابت", "ج", 3.0);
        });
        let units = distinct_units(temp.path()).unwrap();
        assert_eq!(units, vec!["انبار - ثابت", "تولید - شیفتی"]);
    }

    #[test]
    fn allocation_rows_carry_the_header_and_month_fallback() {
        let mut record = UnitRecord::empty("تولید - شیفتی");
        record.total_hours = 60;
        record.month_label = "آذر".to_string();
        record.employees = vec![
            EmployeeRow::new("علی رضایی", "1001"),
            EmployeeRow::new("مریم احمدی", "1002"),
        ];
        record.employees[0].hours = 30;
        record.employees[1].hours = 30;
        record.employees[1].month_label = "دی".to_string();

        let rows = allocation_rows(&record);
        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            EXPORT_HEADER
                .iter()
                .map(|h| CellValue::from(*h))
                .collect::<Vec<_>>()
        );
        assert_eq!(rows[1][3], CellValue::Number(30.0));
        // Row without its own label inherits the unit's month.
        assert_eq!(rows[1][4], CellValue::Text("آذر".to_string()));
        // Row with its own label keeps it.
        assert_eq!(rows[2][4], CellValue::Text("دی".to_string()));
    }

    #[test]
    fn written_workbook_reads_back_with_native_cell_types() {
        let mut record = UnitRecord::empty("انبار - ثابت");
        record.total_hours = 45;
        record.month_label = "مهر".to_string();
        record.employees = vec![EmployeeRow::new("رضا کریمی", "2001")];
        record.employees[0].hours = 45;

        let rows = allocation_rows(&record);
        let temp = NamedTempFile::new().unwrap();
        let mut file = std::fs::File::create(temp.path()).unwrap();
        write_rows(&mut file, &rows).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(temp.path()).unwrap();
        let range = workbook.worksheet_range_at(0).unwrap().unwrap();
        assert_eq!(
            range.get_value((0, 0)),
            Some(&Data::String("نام واحد".to_string()))
        );
        assert_eq!(range.get_value((1, 3)), Some(&Data::Float(45.0)));
        assert_eq!(
            range.get_value((1, 4)),
            Some(&Data::String("مهر".to_string()))
        );
    }

    // --- Admin import ---

    fn multi_unit_workbook() -> NamedTempFile {
        build_workbook(|sheet| {
            sheet.write_number(0, 5, 120.0).unwrap();
            sheet.write_number(1, 5, 25.0).unwrap();
            sheet.write_string(2, 5, "دی").unwrap();

            sheet.write_string(0, 0, "نام واحد").unwrap();
            roster_row(sheet, 1, "تولید - شیفتی", "علی رضایی", 1001.0);
            roster_row(sheet, 2, "تولید - شیفتی", "مریم احمدی", 1002.0);
            roster_row(sheet, 3, "انبار - ثابت", "رضا کریمی", 2001.0);
            roster_row(sheet, 4, "واحد ناشناخته", "حسن موسوی", 3001.0);
            roster_row(sheet, 5, "دفتر فنی - ثابت", "نامشخص", 4001.0);
        })
    }

    #[test]
    fn import_gives_the_workbook_header_to_the_first_unit_only() {
        let temp = multi_unit_workbook();
        let mut store = UnitStore::new();
        let summary = import_workbook(&mut store, temp.path()).unwrap();

        assert_eq!(summary.imported, vec!["تولید - شیفتی", "انبار - ثابت"]);

        let first = store.get("تولید - شیفتی").unwrap();
        assert_eq!(first.total_hours, 120);
        assert_eq!(first.production_days, 25);
        assert_eq!(first.month_label, "دی");
        assert_eq!(
            first.employees.iter().map(|e| e.hours).collect::<Vec<_>>(),
            vec![60, 60]
        );
        assert!(first.employees.iter().all(|e| e.month_label == "دی"));

        let second = store.get("انبار - ثابت").unwrap();
        assert_eq!(second.total_hours, 0);
        assert_eq!(second.production_days, 0);
        assert_eq!(second.month_label, jalali::current_month_name());
    }

    #[test]
    fn import_skips_undefined_units_and_empty_rosters() {
        let temp = multi_unit_workbook();
        let mut store = UnitStore::new();
        let summary = import_workbook(&mut store, temp.path()).unwrap();

        assert!(summary
            .skipped
            .iter()
            .any(|note| note.contains("واحد ناشناخته") && note.contains("undefined unit")));
        assert!(summary
            .skipped
            .iter()
            .any(|note| note.contains("دفتر فنی - ثابت") && note.contains("no rows")));
        assert!(store.get("واحد ناشناخته").is_none());
        assert!(store.get("دفتر فنی - ثابت").is_none());
    }
}
