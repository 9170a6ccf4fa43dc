// src/links.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use url::Url;

use crate::error::{AppError, Result};
use crate::model::MANAGEABLE_UNITS;

pub const LINKS_FILENAME: &str = "cloud_links.json";

/// Default per-unit download links bundled with the executable. Entries in
/// the on-disk file override these key by key.
const EMBEDDED_DEFAULTS_JSON: &str = include_str!("../resources/default_cloud_links.json");

/// `cloud_links.json` lives next to the executable; if that path cannot be
/// resolved, the working directory is used instead.
pub fn default_links_path() -> PathBuf {
    match std::env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join(LINKS_FILENAME))
            .unwrap_or_else(|| PathBuf::from(LINKS_FILENAME)),
        Err(e) => {
            warn!(
                "Could not resolve the executable directory ({}), using the working directory",
                e
            );
            PathBuf::from(LINKS_FILENAME)
        }
    }
}

fn embedded_defaults() -> BTreeMap<String, String> {
    match serde_json::from_str(EMBEDDED_DEFAULTS_JSON) {
        Ok(map) => map,
        Err(e) => {
            warn!("Embedded default cloud links are malformed: {}", e);
            BTreeMap::new()
        }
    }
}

/// The unit → URL mapping, merged from the user-editable file and the
/// embedded defaults. Owned by the application context; `save` replaces the
/// whole mapping.
#[derive(Debug, Clone)]
pub struct LinkCatalog {
    path: PathBuf,
    links: BTreeMap<String, String>,
}

impl LinkCatalog {
    /// Reads the on-disk file (if present and parseable) and resolves one
    /// entry per manageable unit: the file's non-empty value wins, then the
    /// non-empty embedded default, then the empty string.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let from_file: BTreeMap<String, String> = match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(map) => map,
                Err(e) => {
                    warn!(
                        "Could not parse {} ({}), falling back to embedded defaults",
                        path.display(),
                        e
                    );
                    BTreeMap::new()
                }
            },
            Err(e) => {
                info!(
                    "No readable {} ({}), using embedded default links",
                    path.display(),
                    e
                );
                BTreeMap::new()
            }
        };

        let defaults = embedded_defaults();
        let links = MANAGEABLE_UNITS
            .iter()
            .map(|unit| {
                let resolved = from_file
                    .get(unit)
                    .map(|s| s.trim())
                    .filter(|s| !s.is_empty())
                    .or_else(|| {
                        defaults
                            .get(unit)
                            .map(|s| s.trim())
                            .filter(|s| !s.is_empty())
                    })
                    .unwrap_or("");
                (unit.clone(), resolved.to_string())
            })
            .collect();

        Self { path, links }
    }

    /// Non-empty download URL for a unit, if one is configured.
    pub fn url_for(&self, unit: &str) -> Option<&str> {
        self.links
            .get(unit)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.links.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Writes the complete mapping (indented JSON) and replaces the in-memory
    /// state with it. The caller supplies the whole desired mapping; nothing
    /// is merged silently.
    pub fn save(&mut self, links: BTreeMap<String, String>) -> Result<()> {
        let data = serde_json::to_string_pretty(&links)?;
        fs::write(&self.path, data).map_err(|e| AppError::io(&self.path, e))?;
        info!("Saved cloud links to {}", self.path.display());
        self.links = links;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// --- Share-link normalization ---

/// Rewrites known file-host share links into their direct-download form.
/// Legacy `dropbox.com/s/` links move to the raw-content host with `dl=1`;
/// modern `dropbox.com/scl/` links get `dl=1`; anything else passes through
/// untouched. Applying this twice gives the same result as applying it once.
pub fn normalize_share_url(link: &str) -> String {
    let trimmed = link.trim();

    if trimmed.contains("dropbox.com/s/") {
        let direct = trimmed.replacen("www.dropbox.com", "dl.dropboxusercontent.com", 1);
        match Url::parse(&direct) {
            Ok(parsed) => force_dl_param(parsed),
            // Not a parseable URL; patch the query string directly.
            Err(_) => {
                if direct.contains("dl=0") {
                    direct.replacen("dl=0", "dl=1", 1)
                } else if !direct.contains('?') {
                    format!("{}?dl=1", direct)
                } else if !direct.contains("dl=") {
                    format!("{}&dl=1", direct)
                } else {
                    direct
                }
            }
        }
    } else if trimmed.contains("dropbox.com/scl/") {
        match Url::parse(trimmed) {
            Ok(parsed) => force_dl_param(parsed),
            Err(_) => trimmed.to_string(),
        }
    } else {
        trimmed.to_string()
    }
}

fn force_dl_param(mut url: Url) -> String {
    let already_direct = url.query_pairs().any(|(k, v)| k == "dl" && v == "1");
    if !already_direct {
        let others: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| k != "dl")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &others {
            pairs.append_pair(k, v);
        }
        pairs.append_pair("dl", "1");
        drop(pairs);
    }
    url.to_string()
}
