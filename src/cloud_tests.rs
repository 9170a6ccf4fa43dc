// src/cloud_tests.rs

#[cfg(test)]
mod tests {
    use std::fs;

    use rust_xlsxwriter::Workbook;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::cloud::{
        apply_fetch, build_client, fetch_unit, refresh_unit, FetchedUnit, DEFAULT_DOWNLOAD_TIMEOUT,
    };
    use super::super::error::AppError;
    use super::super::links::LinkCatalog;
    use super::super::model::{EmployeeRow, UnitSnapshot, UnitStore};

    const UNIT: &str = "تولید - شیفتی";

    /// A roster workbook for `UNIT` with a 90-hour budget and three rows,
    /// serialized as .xlsx bytes.
    fn roster_workbook_bytes() -> Vec<u8> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_number(0, 5, 90.0).unwrap();
        sheet.write_number(1, 5, 22.0).unwrap();
        sheet.write_string(2, 5, "آبان").unwrap();
        sheet.write_string(0, 0, "نام واحد").unwrap();
        for (i, name) in ["علی رضایی", "مریم احمدی", "رضا کریمی"].iter().enumerate() {
            let row = (i + 1) as u32;
            sheet.write_string(row, 0, UNIT).unwrap();
            sheet.write_string(row, 1, *name).unwrap();
            sheet.write_number(row, 2, 1001.0 + i as f64).unwrap();
        }
        workbook.save_to_buffer().unwrap()
    }

    /// A catalog whose only configured link points `UNIT` at the mock server.
    fn catalog_for(url: &str) -> LinkCatalog {
        let dir = tempfile::tempdir().unwrap();
        let links_path = dir.path().join("cloud_links.json");
        let json = serde_json::json!({ UNIT: url });
        fs::write(&links_path, json.to_string()).unwrap();
        // The tempdir may be removed once the catalog is loaded.
        LinkCatalog::load(links_path)
    }

    #[tokio::test]
    async fn fetch_parses_and_apply_allocates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/roster.xlsx"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(roster_workbook_bytes()))
            .mount(&server)
            .await;

        let catalog = catalog_for(&format!("{}/roster.xlsx", server.uri()));
        let client = build_client(DEFAULT_DOWNLOAD_TIMEOUT).unwrap();

        let fetched = fetch_unit(&client, &catalog, UNIT).await.unwrap();
        assert_eq!(fetched.unit, UNIT);
        assert_eq!(fetched.snapshot.total_hours, 90);
        assert_eq!(fetched.snapshot.production_days, 22);
        assert_eq!(fetched.snapshot.month_label, "آبان");
        assert_eq!(fetched.snapshot.employees.len(), 3);

        let mut store = UnitStore::new();
        let record = apply_fetch(&mut store, fetched).unwrap();
        assert_eq!(
            record.employees.iter().map(|e| e.hours).collect::<Vec<_>>(),
            vec![30, 30, 30]
        );
    }

    #[tokio::test]
    async fn non_ok_status_is_a_transport_error_and_leaves_the_store_alone() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/roster.xlsx"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let catalog = catalog_for(&format!("{}/roster.xlsx", server.uri()));
        let client = build_client(DEFAULT_DOWNLOAD_TIMEOUT).unwrap();

        let mut store = UnitStore::new();
        let err = refresh_unit(&mut store, &catalog, &client, UNIT)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Transport { status: 404, .. }));
        assert!(store.get(UNIT).is_none());
    }

    #[tokio::test]
    async fn unit_without_a_link_fails_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = LinkCatalog::load(dir.path().join("cloud_links.json"));
        let client = build_client(DEFAULT_DOWNLOAD_TIMEOUT).unwrap();

        // No embedded default exists for this unit either.
        let err = fetch_unit(&client, &catalog, "مالی - ثابت").await.unwrap_err();
        assert!(matches!(err, AppError::MissingLink { .. }));
    }

    #[test]
    fn apply_rejects_units_outside_the_manageable_set() {
        let mut store = UnitStore::new();
        let err = apply_fetch(
            &mut store,
            FetchedUnit {
                unit: "واحد ناشناخته".to_string(),
                snapshot: UnitSnapshot {
                    total_hours: 10,
                    production_days: 1,
                    month_label: "دی".to_string(),
                    employees: vec![EmployeeRow::new("الف", "1001")],
                },
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::UnknownUnit { .. }));
        assert!(store.units().next().is_none());
    }

    /// A fetch that finishes after the user has switched units still lands on
    /// the unit it was started for.
    #[test]
    fn late_fetch_applies_to_its_own_unit_only() {
        let mut store = UnitStore::new();
        store.get_or_create("انبار - ثابت");

        let fetched = FetchedUnit {
            unit: UNIT.to_string(),
            snapshot: UnitSnapshot {
                total_hours: 40,
                production_days: 20,
                month_label: "دی".to_string(),
                employees: vec![
                    EmployeeRow::new("علی رضایی", "1001"),
                    EmployeeRow::new("مریم احمدی", "1002"),
                ],
            },
        };
        apply_fetch(&mut store, fetched).unwrap();

        let target = store.get(UNIT).unwrap();
        assert_eq!(target.total_hours, 40);
        let other = store.get("انبار - ثابت").unwrap();
        assert_eq!(other.total_hours, 0);
        assert!(other.employees.is_empty());
    }
}
