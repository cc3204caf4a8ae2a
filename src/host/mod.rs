//! Visual host abstraction
//!
//! The renderers never touch the terminal directly; they go through a
//! [`VisualHost`] so that DOM-ish side effects (paint scheduling, the
//! body-level "modal open" marker, scroll capture/restore) degrade to
//! no-ops or immediate synchronous execution in non-visual contexts such as
//! test harnesses.

use std::collections::BTreeSet;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use crossterm::tty::IsTty;
use parking_lot::Mutex;
use tracing::debug;

/// One-shot callback scheduled for the next paint frame
pub type FrameCallback = Box<dyn FnOnce() + Send>;

/// Host environment consumed by the renderers
///
/// Implementations must never fail: when a primitive is unavailable the
/// operation is a no-op (markers, scroll) or runs immediately
/// (`request_frame`).
pub trait VisualHost: Send + Sync {
    /// Whether a visual surface is actually attached
    fn is_available(&self) -> bool;

    /// Schedule a callback for the next paint frame
    ///
    /// Falls back to invoking the callback immediately when no frame source
    /// exists, preserving relative ordering of scheduled callbacks.
    fn request_frame(&self, callback: FrameCallback);

    /// Toggle a document-level marker (the "modal open" body class analogue)
    fn set_marker(&self, name: &str, on: bool);

    /// Current scroll offset of the host viewport, if one exists
    fn scroll_offset(&self) -> Option<(u16, u16)>;

    /// Restore a previously captured scroll offset
    fn set_scroll_offset(&self, offset: (u16, u16));
}

/// Terminal-backed host
///
/// Markers and the scroll offset are plain shared state the embedding
/// application reads back when composing its frame; paint callbacks ride on
/// the tokio timer at a configurable frame interval.
pub struct TerminalHost {
    frame_interval: Duration,
    markers: Mutex<BTreeSet<String>>,
    scroll: Mutex<(u16, u16)>,
}

impl TerminalHost {
    /// Roughly 60 frames per second
    pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

    pub fn new() -> Self {
        Self::with_frame_interval(Self::DEFAULT_FRAME_INTERVAL)
    }

    pub fn with_frame_interval(frame_interval: Duration) -> Self {
        Self {
            frame_interval,
            markers: Mutex::new(BTreeSet::new()),
            scroll: Mutex::new((0, 0)),
        }
    }

    /// Whether a document-level marker is currently set
    pub fn has_marker(&self, name: &str) -> bool {
        self.markers.lock().contains(name)
    }
}

impl Default for TerminalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualHost for TerminalHost {
    fn is_available(&self) -> bool {
        stdout().is_tty()
    }

    fn request_frame(&self, callback: FrameCallback) {
        let frame_interval = self.frame_interval;
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    tokio::time::sleep(frame_interval).await;
                    callback();
                });
            }
            Err(_) => {
                debug!("no async runtime; running frame callback immediately");
                callback();
            }
        }
    }

    fn set_marker(&self, name: &str, on: bool) {
        let mut markers = self.markers.lock();
        if on {
            markers.insert(name.to_string());
        } else {
            markers.remove(name);
        }
    }

    fn scroll_offset(&self) -> Option<(u16, u16)> {
        Some(*self.scroll.lock())
    }

    fn set_scroll_offset(&self, offset: (u16, u16)) {
        *self.scroll.lock() = offset;
    }
}

/// Headless host for tests and non-visual execution
///
/// Reports no visual surface, runs frame callbacks immediately (keeping the
/// two-frame entry transition deterministic), and ignores markers and
/// scroll offsets.
#[derive(Default)]
pub struct NullHost;

impl NullHost {
    pub fn new() -> Self {
        Self
    }

    /// Convenience constructor for collaborator signatures
    pub fn arc() -> Arc<dyn VisualHost> {
        Arc::new(Self)
    }
}

impl VisualHost for NullHost {
    fn is_available(&self) -> bool {
        false
    }

    fn request_frame(&self, callback: FrameCallback) {
        callback();
    }

    fn set_marker(&self, _name: &str, _on: bool) {}

    fn scroll_offset(&self) -> Option<(u16, u16)> {
        None
    }

    fn set_scroll_offset(&self, _offset: (u16, u16)) {}
}
