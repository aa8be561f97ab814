//! Fetch presented download links to a local directory.
//!
//! Each file is written to a temp file in the target directory and renamed
//! into place, so an interrupted run never leaves a half-written track under
//! its final name. A failed file does not stop the others; failures are
//! collected in the [`DownloadReport`].

use crate::config::ClientConfig;
use crate::error::TrackfetchError;
use crate::present::Entry;
use futures::stream::{self, StreamExt};
use percent_encoding::percent_decode_str;
use reqwest::Url;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Which entries to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadSelection {
    /// Every track link (the archive is skipped, it duplicates them). (default)
    #[default]
    Tracks,
    /// Only the archive; falls back to tracks if no archive was offered.
    Archive,
}

/// Result of [`download_entries`].
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub saved: Vec<PathBuf>,
    pub failed: Vec<(String, TrackfetchError)>,
}

impl DownloadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Download the selected `entries` into `dir` with up to `concurrency`
/// transfers in flight.
pub async fn download_entries(
    entries: &[Entry],
    dir: &Path,
    selection: DownloadSelection,
    concurrency: usize,
    config: &ClientConfig,
) -> Result<DownloadReport, TrackfetchError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| TrackfetchError::OutputWriteFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.download_timeout_secs))
        .build()
        .map_err(|e| TrackfetchError::Internal(format!("HTTP client: {e}")))?;

    let targets = select(entries, selection);
    info!("Downloading {} file(s) to {}", targets.len(), dir.display());
    let names = unique_file_names(&targets);

    let results: Vec<(String, Result<PathBuf, TrackfetchError>)> =
        stream::iter(targets.into_iter().zip(names).map(|(href, name)| {
            let client = client.clone();
            async move {
                let r = download_one(&client, &href, &dir.join(name), config.download_timeout_secs)
                    .await;
                (href, r)
            }
        }))
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = DownloadReport::default();
    for (href, r) in results {
        match r {
            Ok(path) => report.saved.push(path),
            Err(e) => {
                warn!("Download failed: {}", e);
                report.failed.push((href, e));
            }
        }
    }
    report.saved.sort();
    Ok(report)
}

fn select(entries: &[Entry], selection: DownloadSelection) -> Vec<String> {
    let tracks = || {
        entries
            .iter()
            .filter_map(|e| match e {
                Entry::Track { href, .. } => Some(href.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
    };
    match selection {
        DownloadSelection::Tracks => tracks(),
        DownloadSelection::Archive => entries
            .iter()
            .find_map(|e| match e {
                Entry::Archive { href } => Some(vec![href.clone()]),
                _ => None,
            })
            .unwrap_or_else(tracks),
    }
}

async fn download_one(
    client: &reqwest::Client,
    href: &str,
    path: &Path,
    timeout_secs: u64,
) -> Result<PathBuf, TrackfetchError> {
    let failed = |reason: String| TrackfetchError::DownloadFailed {
        url: href.to_string(),
        reason,
    };

    let response = client.get(href).send().await.map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {timeout_secs}s"))
        } else {
            failed(e.to_string())
        }
    })?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }
    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    debug!("Writing {} bytes to {}", bytes.len(), path.display());

    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".trackfetch-")
            .tempfile_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(|e| TrackfetchError::Internal(format!("write task: {e}")))?
    .map_err(|e| TrackfetchError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(path.to_path_buf())
}

/// One file name per link, distinct within the run. A name already taken
/// gets `-<n>` inserted before its extension, `n` being the link's ordinal.
fn unique_file_names(hrefs: &[String]) -> Vec<String> {
    let mut taken = HashSet::new();
    hrefs
        .iter()
        .enumerate()
        .map(|(i, href)| {
            let ordinal = i + 1;
            let base = file_name_for(href, ordinal);
            let mut name = base.clone();
            let mut n = ordinal;
            while !taken.insert(name.to_lowercase()) {
                name = with_suffix(&base, n);
                n += 1;
            }
            name
        })
        .collect()
}

fn with_suffix(name: &str, n: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{n}.{ext}"),
        _ => format!("{name}-{n}"),
    }
}

/// File name for a download link: the last URL path segment, or
/// `track-<n>` when the link has none.
pub fn file_name_for(href: &str, ordinal: usize) -> String {
    let from_url = Url::parse(href).ok().and_then(|u| {
        u.path_segments()
            .and_then(|mut s| s.next_back().map(str::to_string))
    });
    let name = from_url
        .map(|s| percent_decode_str(&s).decode_utf8_lossy().into_owned())
        .map(|s| sanitize(&s))
        .filter(|s| !s.is_empty() && s != "." && s != "..");
    name.unwrap_or_else(|| format!("track-{ordinal}"))
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}
