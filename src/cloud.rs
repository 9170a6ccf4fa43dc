// src/cloud.rs
//
// The ingestion pipeline: resolve a unit's download link, normalize it,
// download the workbook to a temporary file, parse it, and apply the result
// to the unit store as one whole-record update. A failed fetch never
// touches the store.

use std::io::Write;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tempfile::NamedTempFile;
use tracing::info;

use crate::allocate;
use crate::error::{AppError, Result};
use crate::excel;
use crate::jalali;
use crate::links::{normalize_share_url, LinkCatalog};
use crate::model::{is_manageable_unit, UnitRecord, UnitSnapshot, UnitStore};

pub const USER_AGENT: &str = "OvertimeAllocator/1.0";
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(AppError::from)
}

/// A completed fetch, still detached from the store. Carries the unit it was
/// started for so the dispatcher can apply it to the right record no matter
/// what the user has selected since.
#[derive(Debug, Clone)]
pub struct FetchedUnit {
    pub unit: String,
    pub snapshot: UnitSnapshot,
}

/// Downloads `url` into a uniquely named temporary file. The response body
/// is streamed to disk chunk by chunk, unmodified; any status other than 200
/// is a transport failure. The temporary file removes itself when dropped,
/// on every exit path.
pub async fn download_to_temp(client: &Client, url: &str) -> Result<NamedTempFile> {
    let mut response = client.get(url).send().await?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(AppError::Transport {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let mut temp = NamedTempFile::new().map_err(|e| AppError::io("<temp file>", e))?;
    while let Some(chunk) = response.chunk().await? {
        temp.write_all(&chunk)
            .map_err(|e| AppError::io(temp.path().to_path_buf(), e))?;
    }
    temp.flush()
        .map_err(|e| AppError::io(temp.path().to_path_buf(), e))?;
    Ok(temp)
}

/// Steps 1-7 of the pipeline: link lookup, normalization, download, parse,
/// month substitution. Pure with respect to the store.
pub async fn fetch_unit(client: &Client, catalog: &LinkCatalog, unit: &str) -> Result<FetchedUnit> {
    let link = catalog.url_for(unit).ok_or_else(|| AppError::MissingLink {
        unit: unit.to_string(),
    })?;
    let url = normalize_share_url(link);
    info!("Fetching workbook for unit '{}' from {}", unit, url);

    let temp = download_to_temp(client, &url).await?;
    let header = excel::read_header(temp.path())?;
    let employees = excel::read_employees(temp.path(), unit)?;

    let month_label = if header.month_name.is_empty() {
        let current = jalali::current_month_name().to_string();
        info!(
            "Workbook for unit '{}' carries no valid month name, substituting the current month '{}'",
            unit, current
        );
        current
    } else {
        header.month_name
    };

    Ok(FetchedUnit {
        unit: unit.to_string(),
        snapshot: UnitSnapshot {
            total_hours: header.total_hours,
            production_days: header.production_days,
            month_label,
            employees,
        },
    })
}

/// Step 8: one whole-record store update, keyed by the fetch's own target
/// unit, followed by an allocation pass. A fetch that finishes after the
/// user has moved on still lands on the unit it was started for and never
/// touches any other record.
pub fn apply_fetch(store: &mut UnitStore, fetched: FetchedUnit) -> Result<&UnitRecord> {
    if !is_manageable_unit(&fetched.unit) {
        return Err(AppError::UnknownUnit { unit: fetched.unit });
    }
    let record = store.replace(&fetched.unit, fetched.snapshot);
    allocate::reallocate(record);
    Ok(record)
}

/// The full pipeline for one unit.
pub async fn refresh_unit<'a>(
    store: &'a mut UnitStore,
    catalog: &LinkCatalog,
    client: &Client,
    unit: &str,
) -> Result<&'a UnitRecord> {
    let fetched = fetch_unit(client, catalog, unit).await?;
    apply_fetch(store, fetched)
}
