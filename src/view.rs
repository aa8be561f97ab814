//! Presentation surface driven by the controller.
//!
//! The controller never touches a terminal, a window or a DOM. It calls an
//! injected [`Arc<dyn ControllerView>`] instead, and the host decides what a
//! "disabled submit button" or a "busy indicator" looks like.
//!
//! The trait is `Send + Sync` because `cancel()` may run on a different task
//! than the `submit()` it interrupts. All methods default to no-ops.
//!
//! # Example
//!
//! ```rust
//! use trackfetch::ControllerView;
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct StatusLine(Mutex<String>);
//!
//! impl ControllerView for StatusLine {
//!     fn set_status(&self, text: &str) {
//!         *self.0.lock().unwrap() = text.to_string();
//!     }
//! }
//! ```

use crate::present::Entry;
use std::sync::Arc;

pub trait ControllerView: Send + Sync {
    /// Enable or disable the submit affordance.
    fn set_submit_enabled(&self, enabled: bool) {
        let _ = enabled;
    }

    /// Show or hide the cancel affordance.
    fn set_cancel_visible(&self, visible: bool) {
        let _ = visible;
    }

    /// Show the busy indicator with a short message.
    fn set_busy(&self, message: &str) {
        let _ = message;
    }

    /// Replace the status text. Also ends any busy indicator.
    fn set_status(&self, text: &str) {
        let _ = text;
    }

    /// Hide the result area without discarding its contents.
    fn hide_results(&self) {}

    /// Replace the result list with `entries` and reveal it.
    fn show_results(&self, entries: &[Entry]) {
        let _ = entries;
    }

    /// Empty and hide the result list and reset the input.
    fn clear_results(&self) {}
}

/// A view that ignores everything. Default when none is configured.
pub struct NoopView;

impl ControllerView for NoopView {}

/// Convenience alias for the type the controller stores.
pub type ViewHandle = Arc<dyn ControllerView>;
