//! Result presenter: project a [`ConversionResult`] into display entries.
//!
//! The presenter is a pure function. It holds nothing between renders, so
//! every render fully replaces whatever the view showed before.
//!
//! Order of the produced list:
//!
//! ```text
//! [Archive]            only when the backend built a zip
//! Track 1 … Track n    in backend order
//! [SkippedHeader]      only when something was skipped
//! Skipped 1 … m
//! ```

use crate::config::ClientConfig;
use crate::protocol::ConversionResult;
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// One rendered line of the result list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entry {
    /// Download link for every track bundled as one archive.
    Archive { href: String },
    /// Download link for one track.
    Track { name: String, href: String },
    /// Informational header introducing the skipped items.
    SkippedHeader,
    /// An item the backend could not convert.
    Skipped { name: String },
}

impl Entry {
    /// Whether the entry carries a download link.
    pub fn is_actionable(&self) -> bool {
        self.href().is_some()
    }

    pub fn href(&self) -> Option<&str> {
        match self {
            Entry::Archive { href } | Entry::Track { href, .. } => Some(href),
            Entry::SkippedHeader | Entry::Skipped { .. } => None,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Archive { .. } => write!(f, "DOWNLOAD ALL (ZIP)"),
            Entry::Track { name, .. } => write!(f, "{name}"),
            Entry::SkippedHeader => write!(f, "Unavailable:"),
            Entry::Skipped { name } => write!(f, "  {name}"),
        }
    }
}

/// Render `result` into entries. Non-success results render nothing.
pub fn render(result: &ConversionResult, config: &ClientConfig) -> Vec<Entry> {
    let ConversionResult::Success {
        tracks,
        zip_link,
        skipped,
    } = result
    else {
        return Vec::new();
    };

    let mut entries = Vec::with_capacity(tracks.len() + skipped.len() + 2);

    if let Some(href) = zip_link.as_deref().and_then(|zip| resolve(config, zip)) {
        entries.push(Entry::Archive { href });
    }

    // A track whose link cannot be resolved is listed with the skipped items.
    let mut unavailable: Vec<&str> = skipped.iter().map(String::as_str).collect();
    for t in tracks {
        match resolve(config, &t.download_link) {
            Some(href) => entries.push(Entry::Track {
                name: t.name.clone(),
                href,
            }),
            None => unavailable.push(&t.name),
        }
    }

    if !unavailable.is_empty() {
        entries.push(Entry::SkippedHeader);
        entries.extend(unavailable.into_iter().map(|name| Entry::Skipped {
            name: name.to_string(),
        }));
    }

    entries
}

fn resolve(config: &ClientConfig, link: &str) -> Option<String> {
    match config.resolve_link(link) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            warn!("Dropping download link: {}", e);
            None
        }
    }
}
