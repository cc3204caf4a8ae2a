//! Transition and portal coordination for a single modal
//!
//! Tracks the modal's visual lifecycle: `pre-enter -> entered` via a
//! two-frame deferred transition (the entered state is applied on the
//! second of two chained paint callbacks, guaranteeing the base class has
//! painted once so CSS-style transitions cannot be skipped on fast paths),
//! and independently `visible -> exiting`, driven by the registry's `out`
//! flag rather than a local timer.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::host::VisualHost;
use crate::registry::types::{FrozenContent, ModalDisplayInfo, ModalId, RenderAnchor};
use crate::registry::ModalRegistry;

/// Entry phase of a modal's transition state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryPhase {
    /// Mounted, base class painted, entry class not yet applied
    PreEnter,
    /// Entry transition has landed
    Entered,
}

/// The class triple driving one element's transition styling
#[derive(Debug, Clone, Default)]
pub struct TransitionClasses {
    pub base: Option<String>,
    pub enter: Option<String>,
    pub exit: Option<String>,
}

impl TransitionClasses {
    pub fn new(base: Option<String>, enter: Option<String>, exit: Option<String>) -> Self {
        Self { base, enter, exit }
    }

    /// Modal-side classes from a mount request, with a configured fallback base
    pub fn for_modal(info: &ModalDisplayInfo, fallback_base: &str) -> Self {
        Self {
            base: Some(
                info.class_name
                    .clone()
                    .unwrap_or_else(|| fallback_base.to_string()),
            ),
            enter: info.in_class_name.clone(),
            exit: info.out_class_name.clone(),
        }
    }

    /// Backdrop-side classes from a mount request, with a configured fallback base
    pub fn for_backdrop(info: &ModalDisplayInfo, fallback_base: &str) -> Self {
        Self {
            base: Some(
                info.backdrop_class_name
                    .clone()
                    .unwrap_or_else(|| fallback_base.to_string()),
            ),
            enter: info.backdrop_in_class_name.clone(),
            exit: info.backdrop_out_class_name.clone(),
        }
    }

    /// The currently-active classes for a given transition state
    ///
    /// Base always applies; the enter class only once entered and not
    /// exiting; the exit class whenever exiting, regardless of entry state.
    pub fn active(&self, entered: bool, exiting: bool) -> Vec<String> {
        let mut classes = Vec::with_capacity(2);
        if let Some(base) = &self.base {
            classes.push(base.clone());
        }
        if entered && !exiting {
            if let Some(enter) = &self.enter {
                classes.push(enter.clone());
            }
        }
        if exiting {
            if let Some(exit) = &self.exit {
                classes.push(exit.clone());
            }
        }
        classes
    }
}

/// Render anchor recording the last painted content of one modal
///
/// The set renderer records a plain-text dump of the modal's area after
/// every paint; the registry asks for the latest recording when removal is
/// requested, to keep something visible during the exit delay.
#[derive(Default)]
pub struct PortalAnchor {
    last_painted: Mutex<Option<String>>,
}

impl PortalAnchor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the most recent paint of the anchored area
    pub fn record<S: Into<String>>(&self, content: S) {
        *self.last_painted.lock() = Some(content.into());
    }
}

impl RenderAnchor for PortalAnchor {
    fn capture(&self) -> Option<FrozenContent> {
        self.last_painted.lock().clone().map(FrozenContent::new)
    }
}

struct CoordinatorState {
    phase: EntryPhase,
    exiting: bool,
    done: bool,
}

/// Per-modal transition state machine and portal anchor owner
pub struct TransitionCoordinator {
    host: Arc<dyn VisualHost>,
    state: Arc<Mutex<CoordinatorState>>,
    modal_classes: TransitionClasses,
    backdrop_classes: TransitionClasses,
    anchor: Arc<PortalAnchor>,
}

impl TransitionCoordinator {
    /// Create a coordinator and register its render anchor with the registry
    pub fn new(
        host: Arc<dyn VisualHost>,
        registry: &ModalRegistry,
        id: ModalId,
        modal_classes: TransitionClasses,
        backdrop_classes: TransitionClasses,
    ) -> Self {
        let anchor = Arc::new(PortalAnchor::new());
        registry.container_created(id, anchor.clone());

        Self {
            host,
            state: Arc::new(Mutex::new(CoordinatorState {
                phase: EntryPhase::PreEnter,
                exiting: false,
                done: false,
            })),
            modal_classes,
            backdrop_classes,
            anchor,
        }
    }

    /// Start the two-frame deferred entry transition
    ///
    /// `on_change` fires once the entered state lands, unless the
    /// coordinator was finished in the meantime.
    pub fn begin_entry<F>(&self, on_change: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let host = self.host.clone();
        let state = self.state.clone();
        self.host.request_frame(Box::new(move || {
            host.request_frame(Box::new(move || {
                {
                    let mut state = state.lock();
                    if state.done {
                        debug!("entry transition landed after teardown, ignoring");
                        return;
                    }
                    state.phase = EntryPhase::Entered;
                }
                on_change();
            }));
        }));
    }

    /// Switch to the exiting state; one-way, driven by the registry's `out` flag
    pub fn mark_exiting(&self) {
        self.state.lock().exiting = true;
    }

    /// Mark the coordinator as torn down so a pending entry callback
    /// becomes a no-op
    pub fn finish(&self) {
        self.state.lock().done = true;
    }

    pub fn entry_phase(&self) -> EntryPhase {
        self.state.lock().phase
    }

    pub fn is_entered(&self) -> bool {
        self.entry_phase() == EntryPhase::Entered
    }

    pub fn is_exiting(&self) -> bool {
        self.state.lock().exiting
    }

    /// Currently-active classes for the modal element
    pub fn modal_classes(&self) -> Vec<String> {
        let state = self.state.lock();
        self.modal_classes
            .active(state.phase == EntryPhase::Entered, state.exiting)
    }

    /// Currently-active classes for the backdrop element
    pub fn backdrop_classes(&self) -> Vec<String> {
        let state = self.state.lock();
        self.backdrop_classes
            .active(state.phase == EntryPhase::Entered, state.exiting)
    }

    /// The anchor the set renderer records painted content into
    pub fn anchor(&self) -> Arc<PortalAnchor> {
        self.anchor.clone()
    }
}
