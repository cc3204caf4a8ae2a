//! Transition state machine tests
//!
//! Uses a manually-stepped host so the two-frame deferred entry is
//! observable one frame at a time.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use modal_registry::ui::{EntryPhase, PortalAnchor, TransitionClasses, TransitionCoordinator};
use modal_registry::{
    FrameCallback, ModalDisplayInfo, ModalRegistry, RenderAnchor, VisualHost,
};

/// Host whose paint frames only advance when the test says so
#[derive(Default)]
struct StepHost {
    queue: Mutex<Vec<FrameCallback>>,
}

impl StepHost {
    fn arc() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Run the oldest queued frame callback, if any
    ///
    /// The callback is taken out of the lock before it runs so it may
    /// schedule further frames.
    fn step(&self) -> bool {
        let callback = {
            let mut queue = self.queue.lock().unwrap();
            if queue.is_empty() {
                return false;
            }
            queue.remove(0)
        };
        callback();
        true
    }

    fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }
}

impl VisualHost for StepHost {
    fn is_available(&self) -> bool {
        true
    }

    fn request_frame(&self, callback: FrameCallback) {
        self.queue.lock().unwrap().push(callback);
    }

    fn set_marker(&self, _name: &str, _on: bool) {}

    fn scroll_offset(&self) -> Option<(u16, u16)> {
        None
    }

    fn set_scroll_offset(&self, _offset: (u16, u16)) {}
}

fn classes(base: &str, enter: &str, exit: &str) -> TransitionClasses {
    TransitionClasses::new(
        Some(base.to_string()),
        Some(enter.to_string()),
        Some(exit.to_string()),
    )
}

#[test]
fn active_classes_follow_transition_state() {
    let triple = classes("modal", "modal-in", "modal-out");

    assert_eq!(triple.active(false, false), vec!["modal"]);
    assert_eq!(triple.active(true, false), vec!["modal", "modal-in"]);
    assert_eq!(triple.active(true, true), vec!["modal", "modal-out"]);
    // Exit applies even if entry never landed.
    assert_eq!(triple.active(false, true), vec!["modal", "modal-out"]);

    let bare = TransitionClasses::new(Some("modal".to_string()), None, None);
    assert_eq!(bare.active(true, false), vec!["modal"]);
    assert_eq!(bare.active(true, true), vec!["modal"]);
}

#[test]
fn entry_lands_on_the_second_frame() {
    let host = StepHost::arc();
    let registry = ModalRegistry::new();
    let id = registry.mount_modal(ModalDisplayInfo::new());

    let coordinator = TransitionCoordinator::new(
        host.clone(),
        &registry,
        id,
        classes("modal", "modal-in", "modal-out"),
        classes("backdrop", "backdrop-in", "backdrop-out"),
    );

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    coordinator.begin_entry(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(coordinator.entry_phase(), EntryPhase::PreEnter);
    assert_eq!(coordinator.modal_classes(), vec!["modal"]);

    // First frame only chains the second; still pre-enter.
    assert!(host.step());
    assert_eq!(coordinator.entry_phase(), EntryPhase::PreEnter);
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    assert!(host.step());
    assert_eq!(coordinator.entry_phase(), EntryPhase::Entered);
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(coordinator.modal_classes(), vec!["modal", "modal-in"]);
    assert_eq!(
        coordinator.backdrop_classes(),
        vec!["backdrop", "backdrop-in"]
    );
    assert_eq!(host.pending(), 0);
}

#[test]
fn finish_neutralizes_a_pending_entry() {
    let host = StepHost::arc();
    let registry = ModalRegistry::new();
    let id = registry.mount_modal(ModalDisplayInfo::new());

    let coordinator = TransitionCoordinator::new(
        host.clone(),
        &registry,
        id,
        classes("modal", "modal-in", "modal-out"),
        TransitionClasses::default(),
    );

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    coordinator.begin_entry(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    coordinator.finish();
    while host.step() {}

    assert_eq!(coordinator.entry_phase(), EntryPhase::PreEnter);
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[test]
fn exiting_suppresses_the_enter_class() {
    let host = StepHost::arc();
    let registry = ModalRegistry::new();
    let id = registry.mount_modal(ModalDisplayInfo::new());

    let coordinator = TransitionCoordinator::new(
        host.clone(),
        &registry,
        id,
        classes("modal", "modal-in", "modal-out"),
        TransitionClasses::default(),
    );

    coordinator.begin_entry(|| {});
    while host.step() {}
    assert!(coordinator.is_entered());

    coordinator.mark_exiting();
    assert!(coordinator.is_exiting());
    assert_eq!(coordinator.modal_classes(), vec!["modal", "modal-out"]);
}

#[test]
fn classes_derive_from_mount_info_with_fallback_base() {
    let info = ModalDisplayInfo::new()
        .with_class_name("custom")
        .with_in_class_name("custom-in");
    let triple = TransitionClasses::for_modal(&info, "fallback");
    assert_eq!(triple.base.as_deref(), Some("custom"));
    assert_eq!(triple.enter.as_deref(), Some("custom-in"));
    assert_eq!(triple.exit, None);

    let plain = TransitionClasses::for_modal(&ModalDisplayInfo::new(), "fallback");
    assert_eq!(plain.base.as_deref(), Some("fallback"));

    let backdrop = TransitionClasses::for_backdrop(
        &ModalDisplayInfo::new().with_backdrop_out_class_name("fade-out"),
        "backdrop",
    );
    assert_eq!(backdrop.base.as_deref(), Some("backdrop"));
    assert_eq!(backdrop.exit.as_deref(), Some("fade-out"));
}

#[test]
fn anchor_captures_the_latest_recording() {
    let anchor = PortalAnchor::new();
    assert!(anchor.capture().is_none());

    anchor.record("first paint");
    anchor.record("second paint");
    assert_eq!(
        anchor.capture().map(|c| c.as_str().to_string()),
        Some("second paint".to_string())
    );
}
