//! Dataset refresh
//!
//! Keeps the local GeoParquet file current: when it is missing or older than
//! the configured age, the remote copy is fetched with `If-Modified-Since`.
//! New content is written next to the target and renamed over it, so a
//! running service never reads a half-written file.

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use reqwest::header::IF_MODIFIED_SINCE;
use reqwest::StatusCode;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use crate::config::DatasetConfig;
use crate::error::RefreshError;

const SECONDS_PER_DAY: u64 = 60 * 60 * 24;

/// State of the local file before any network access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    Missing,
    Stale { age_days: u64 },
    Fresh { age_days: u64 },
}

/// What a refresh run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Skipped { age_days: u64 },
    NotModified,
    Downloaded { bytes: u64 },
}

/// Classify the file at `path` by modification time.
///
/// A file exactly `max_age` old is still fresh.
pub fn check_freshness(
    path: &Path,
    max_age: Duration,
    now: SystemTime,
) -> Result<Freshness, RefreshError> {
    let modified = match fs::metadata(path) {
        Ok(meta) => meta.modified().map_err(|e| RefreshError::io(path, e))?,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Freshness::Missing),
        Err(e) => return Err(RefreshError::io(path, e)),
    };

    // A modification time in the future counts as brand new
    let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
    let age_days = age.as_secs() / SECONDS_PER_DAY;

    if age > max_age {
        Ok(Freshness::Stale { age_days })
    } else {
        Ok(Freshness::Fresh { age_days })
    }
}

/// Format a time as an HTTP-date (RFC 7231 IMF-fixdate)
pub fn http_date(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

/// Conditional downloader for the boundary dataset
pub struct DatasetRefresher {
    path: PathBuf,
    url: String,
    max_age: Duration,
    client: Client,
}

impl DatasetRefresher {
    pub fn new(config: &DatasetConfig) -> Result<Self, RefreshError> {
        // The dataset is large; no overall deadline on the transfer
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self {
            path: PathBuf::from(&config.path),
            url: config.source_url.clone(),
            max_age: Duration::from_secs(config.max_age_days.saturating_mul(SECONDS_PER_DAY)),
            client,
        })
    }

    pub fn run(&self) -> Result<RefreshOutcome, RefreshError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| RefreshError::io(parent, e))?;
            }
        }

        let freshness = check_freshness(&self.path, self.max_age, SystemTime::now())?;
        let if_modified_since = match freshness {
            Freshness::Fresh { age_days } => {
                tracing::info!("File is recent ({age_days} days old), skipping download");
                return Ok(RefreshOutcome::Skipped { age_days });
            }
            Freshness::Missing => {
                tracing::info!("File does not exist, downloading...");
                None
            }
            Freshness::Stale { age_days } => {
                tracing::info!(
                    "File is {age_days} days old (>{} days), checking for updates...",
                    self.max_age.as_secs() / SECONDS_PER_DAY
                );
                Some(
                    fs::metadata(&self.path)
                        .and_then(|m| m.modified())
                        .map_err(|e| RefreshError::io(&self.path, e))?,
                )
            }
        };

        let outcome = self.fetch(if_modified_since)?;
        touch(&self.path)?;
        Ok(outcome)
    }

    fn fetch(&self, if_modified_since: Option<SystemTime>) -> Result<RefreshOutcome, RefreshError> {
        let mut request = self.client.get(&self.url);
        if let Some(time) = if_modified_since {
            request = request.header(IF_MODIFIED_SINCE, http_date(time));
        }

        tracing::info!("Fetching {}", self.url);
        let mut response = request.send()?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            tracing::info!("Remote file not modified, keeping {}", self.path.display());
            return Ok(RefreshOutcome::NotModified);
        }
        if !status.is_success() {
            return Err(RefreshError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let partial = partial_path(&self.path);
        let bytes = write_atomically(&partial, &self.path, &mut response)?;
        tracing::info!("Downloaded {bytes} bytes to {}", self.path.display());
        Ok(RefreshOutcome::Downloaded { bytes })
    }
}

/// Sibling path the download is written to before the rename
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".download");
    path.with_file_name(name)
}

fn write_atomically(
    partial: &Path,
    target: &Path,
    source: &mut impl io::Read,
) -> Result<u64, RefreshError> {
    let mut file = File::create(partial).map_err(|e| RefreshError::io(partial, e))?;
    let bytes = io::copy(source, &mut file).map_err(|e| RefreshError::io(partial, e))?;
    file.flush()
        .and_then(|()| file.sync_all())
        .map_err(|e| RefreshError::io(partial, e))?;
    drop(file);

    if let Err(e) = fs::rename(partial, target) {
        let _ = fs::remove_file(partial);
        return Err(RefreshError::io(target, e));
    }
    Ok(bytes)
}

/// Set the modification time to now, marking the check as done
fn touch(path: &Path) -> Result<(), RefreshError> {
    if !path.exists() {
        return Ok(());
    }
    File::options()
        .write(true)
        .open(path)
        .and_then(|f| f.set_modified(SystemTime::now()))
        .map_err(|e| RefreshError::io(path, e))
}
