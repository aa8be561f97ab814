//! Named overlays (help, about, …) with background-scroll locking.
//!
//! Only visibility is tracked. Opening or closing twice is the same as once,
//! and ids that were never registered are ignored.

use std::collections::BTreeMap;
use tracing::debug;

/// Where a click landed relative to an open overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    /// The dimmed backdrop around the overlay's content.
    Backdrop,
    /// Inside the overlay's content area.
    Content,
}

#[derive(Debug, Default)]
pub struct ModalToggle {
    overlays: BTreeMap<String, bool>,
}

impl ModalToggle {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            overlays: ids.into_iter().map(|id| (id.into(), false)).collect(),
        }
    }

    pub fn open(&mut self, id: &str) {
        self.set(id, true);
    }

    pub fn close(&mut self, id: &str) {
        self.set(id, false);
    }

    /// A click on the backdrop of an open overlay closes it.
    pub fn click(&mut self, id: &str, target: ClickTarget) {
        if target == ClickTarget::Backdrop && self.is_open(id) {
            self.close(id);
        }
    }

    pub fn is_open(&self, id: &str) -> bool {
        self.overlays.get(id).copied().unwrap_or(false)
    }

    /// Background scrolling is locked while any overlay is open.
    pub fn scroll_locked(&self) -> bool {
        self.overlays.values().any(|&open| open)
    }

    fn set(&mut self, id: &str, open: bool) {
        match self.overlays.get_mut(id) {
            Some(v) => *v = open,
            None => debug!("Ignoring unknown overlay '{}'", id),
        }
    }
}
