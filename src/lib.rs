//! # trackfetch
//!
//! Client for an audio conversion backend: submit a media URL, wait for the
//! backend to turn it into audio tracks, present the download links, and
//! cancel the conversion if the user changes their mind.
//!
//! ## Lifecycle
//!
//! ```text
//! submit(url)
//!  │
//!  ├─ 1. Session   fresh UUID + cancellation token
//!  ├─ 2. Convert   POST /convert { url, session_id }   (raced against the token)
//!  ├─ 3. Present   archive → tracks → skipped items
//!  └─ 4. Cleanup   session cleared, submit re-enabled  (every exit path)
//!
//! cancel()
//!  ├─ trip the token       the client stops waiting at once
//!  └─ POST /cancel         fire-and-forget, failures only logged
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trackfetch::{ClientConfig, Controller, SubmitOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let controller = Controller::http(ClientConfig::default())?;
//!     if let SubmitOutcome::Settled { entries, .. } =
//!         controller.submit("https://www.youtube.com/playlist?list=…").await
//!     {
//!         for entry in entries {
//!             println!("{entry}  {}", entry.href().unwrap_or(""));
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `trackfetch` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod controller;
pub mod download;
pub mod error;
pub mod modal;
pub mod present;
pub mod protocol;
pub mod session;
pub mod view;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{ConversionBackend, HttpBackend};
pub use config::{ClientConfig, ClientConfigBuilder, ConcurrentSubmitPolicy, DEFAULT_BACKEND_URL};
pub use controller::{CancelNotice, Controller, ControllerState, SubmitOutcome};
pub use download::{download_entries, DownloadReport, DownloadSelection};
pub use error::TrackfetchError;
pub use modal::{ClickTarget, ModalToggle};
pub use present::Entry;
pub use protocol::{CancelRequest, ConversionResult, ConvertRequest, Track};
pub use session::SessionId;
pub use view::{ControllerView, NoopView, ViewHandle};
