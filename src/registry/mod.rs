//! Modal registry controller
//!
//! The process-wide coordination layer that tracks which modals are
//! currently mounted, groups them into independently-rendered sets (to
//! support modals-within-modals), orders them for stacking, manages exit
//! transition timing, and notifies subscribed renderers of changes.
//!
//! Mutations are synchronous within the call stack that triggered them; the
//! only asynchronous points are the exit-delay timer and the grace-window
//! diagnostic. Subscriber callbacks are invoked after the internal lock is
//! released, so a handler may call back into the registry (each operation
//! re-reads current state rather than closing over a stale snapshot).

pub mod handle;
pub mod types;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use types::{
    ModalDisplayInfo, ModalId, ModalSetHandler, ModalSetIdsHandler, MountedModal, RenderAnchor,
    SetId, ROOT_SET,
};

/// How long after the first mount to wait for a top-level renderer before
/// warning that modals will never become visible.
const SUBSCRIBER_GRACE_WINDOW: Duration = Duration::from_secs(1);

/// Completion signal for a delayed removal
///
/// Resolves when the exit-delay timer has fired and the modal is fully
/// removed. Dropping the signal does not cancel the removal.
pub struct RemovalSignal {
    rx: oneshot::Receiver<()>,
}

impl Future for RemovalSignal {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|_| ())
    }
}

struct RegistryInner {
    next_id: ModalId,
    sets: IndexMap<SetId, Vec<MountedModal>>,
    set_ids_handler: Option<ModalSetIdsHandler>,
    set_handlers: HashMap<SetId, ModalSetHandler>,
    anchors: HashMap<ModalId, Arc<dyn RenderAnchor>>,
    default_out_delay: Duration,
    ever_had_subscriber: bool,
}

/// Process-wide modal registry
///
/// An explicit, cloneable handle; there is no module-level global state.
/// Construct one per application (or per test) and pass it by reference to
/// every collaborator. Clones share the same underlying registry.
#[derive(Clone)]
pub struct ModalRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl Default for ModalRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModalRegistry {
    /// Create an empty registry with a zero default out-delay
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                next_id: 1,
                sets: IndexMap::new(),
                set_ids_handler: None,
                set_handlers: HashMap::new(),
                anchors: HashMap::new(),
                default_out_delay: Duration::ZERO,
                ever_had_subscriber: false,
            })),
        }
    }

    /// Mount a modal and return its identifier
    ///
    /// Fills the `set_id` (root set) and `out_delay` (registry default)
    /// defaults, inserts the modal into its set in stacking order, and
    /// notifies the set-ids subscriber (if the set is new) followed by the
    /// set-level subscriber.
    pub fn mount_modal(&self, mut info: ModalDisplayInfo) -> ModalId {
        let (id, set_id, set_created, first_mount) = {
            let mut inner = self.inner.lock();
            let first_mount = inner.next_id == 1 && !inner.ever_had_subscriber;

            let id = inner.next_id;
            inner.next_id += 1;

            if info.set_id.is_none() {
                info.set_id = Some(ROOT_SET);
            }
            if info.out_delay.is_none() {
                info.out_delay = Some(inner.default_out_delay);
            }
            let set_id = info.resolved_set_id();

            let set_created = !inner.sets.contains_key(&set_id);
            let set = inner.sets.entry(set_id).or_insert_with(Vec::new);
            set.push(MountedModal { id, info });
            set.sort_by(compare_modals);

            (id, set_id, set_created, first_mount)
        };

        if first_mount {
            self.schedule_grace_warning();
        }
        if set_created {
            self.notify_set_ids();
        }
        self.notify_set(set_id);

        id
    }

    /// Replace a mounted modal's display info
    ///
    /// The set containing `id` is re-sorted, so a changed `stack_order`
    /// repositions the modal. Mount-time defaulting is not re-applied;
    /// callers must pass complete info. The removal-path fields (`out`,
    /// frozen content) are preserved from the current entry, so an update
    /// during the exit window cannot revert an exit in progress. An unknown
    /// id is a non-fatal diagnostic and a no-op.
    pub fn update_modal(&self, id: ModalId, info: ModalDisplayInfo) {
        match self.replace_info(id, info) {
            Some(set_id) => self.notify_set(set_id),
            None => warn!(id, "update_modal called with unknown modal id"),
        }
    }

    /// Request removal of a mounted modal
    ///
    /// With a nonzero out-delay the modal is first marked as exiting (its
    /// frozen content captured from the registered render anchor, then an
    /// update notification fires) and actual removal is scheduled after the
    /// delay; the returned signal resolves once it completes. With a zero
    /// delay the modal is removed immediately and `None` is returned.
    /// Unknown or already-exiting ids are no-ops.
    pub fn unmount_modal(&self, id: ModalId) -> Option<RemovalSignal> {
        let looked_up = {
            let inner = self.inner.lock();
            let info = inner
                .sets
                .values()
                .flatten()
                .find(|m| m.id == id)
                .map(|m| m.info.clone());
            info.map(|info| (info, inner.anchors.get(&id).cloned()))
        };

        let (mut info, anchor) = match looked_up {
            Some(found) => found,
            None => {
                debug!(id, "unmount_modal: id not mounted, nothing to do");
                return None;
            }
        };

        if info.out {
            debug!(id, "unmount_modal: removal already in progress");
            return None;
        }

        let delay = info.out_delay.unwrap_or(Duration::ZERO);
        if delay.is_zero() {
            self.remove_modal(id);
            return None;
        }

        info.frozen_content = anchor.and_then(|a| a.capture());
        info.out = true;
        self.update_modal(id, info);

        let (tx, rx) = oneshot::channel();
        let registry = self.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    registry.remove_modal(id);
                    let _ = tx.send(());
                });
                Some(RemovalSignal { rx })
            }
            Err(_) => {
                debug!(id, "no async runtime; removing modal without exit delay");
                self.remove_modal(id);
                None
            }
        }
    }

    /// Install the single top-level subscriber
    ///
    /// The handler is immediately invoked with the current set-id list, so
    /// mount ordering and subscriber-installation ordering need not
    /// coincide.
    pub fn set_modal_set_ids_handler(&self, handler: ModalSetIdsHandler) {
        let ids = {
            let mut inner = self.inner.lock();
            inner.ever_had_subscriber = true;
            inner.set_ids_handler = Some(handler.clone());
            inner.sets.keys().copied().collect::<Vec<_>>()
        };
        handler(&ids);
    }

    /// Clear the top-level subscriber
    pub fn clear_modal_set_ids_handler(&self) {
        self.inner.lock().set_ids_handler = None;
    }

    /// Install the subscriber for one set
    ///
    /// Immediately replays the set's current contents (an empty list if the
    /// set does not exist yet).
    pub fn set_modal_set_handler(&self, set_id: SetId, handler: ModalSetHandler) {
        let modals = {
            let mut inner = self.inner.lock();
            inner.ever_had_subscriber = true;
            inner.set_handlers.insert(set_id, handler.clone());
            inner.sets.get(&set_id).cloned().unwrap_or_default()
        };
        handler(&modals);
    }

    /// Clear the subscriber for one set
    pub fn clear_modal_set_handler(&self, set_id: SetId) {
        self.inner.lock().set_handlers.remove(&set_id);
    }

    /// Change the fallback out-delay used by future mounts
    ///
    /// Does not retroactively affect already-mounted modals.
    pub fn set_default_out_delay(&self, out_delay: Duration) {
        self.inner.lock().default_out_delay = out_delay;
    }

    /// The current fallback out-delay
    pub fn default_out_delay(&self) -> Duration {
        self.inner.lock().default_out_delay
    }

    /// Register the render anchor for a mounted modal
    ///
    /// Called by the portal coordinator once the modal has a live render
    /// target; the anchor is asked for a content snapshot when removal is
    /// later requested.
    pub fn container_created(&self, id: ModalId, anchor: Arc<dyn RenderAnchor>) {
        self.inner.lock().anchors.insert(id, anchor);
    }

    /// Ids of all sets with at least one currently-mounted modal
    pub fn set_ids(&self) -> Vec<SetId> {
        self.inner.lock().sets.keys().copied().collect()
    }

    /// Snapshot of one set's ordered modal list
    pub fn modals_in_set(&self, set_id: SetId) -> Vec<MountedModal> {
        self.inner
            .lock()
            .sets
            .get(&set_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Snapshot of a mounted modal's current display info
    pub fn modal_info(&self, id: ModalId) -> Option<ModalDisplayInfo> {
        self.inner
            .lock()
            .sets
            .values()
            .flatten()
            .find(|m| m.id == id)
            .map(|m| m.info.clone())
    }

    fn replace_info(&self, id: ModalId, mut info: ModalDisplayInfo) -> Option<SetId> {
        let mut inner = self.inner.lock();
        for (set_id, modals) in inner.sets.iter_mut() {
            if let Some(modal) = modals.iter_mut().find(|m| m.id == id) {
                // The removal path owns these fields; `out` is one-way and a
                // routine update during the exit window must not revert it.
                info.out = info.out || modal.info.out;
                if info.frozen_content.is_none() {
                    info.frozen_content = modal.info.frozen_content.take();
                }
                modal.info = info;
                modals.sort_by(compare_modals);
                return Some(*set_id);
            }
        }
        None
    }

    fn remove_modal(&self, id: ModalId) {
        let removed = {
            let mut inner = self.inner.lock();
            inner.anchors.remove(&id);

            let mut found = None;
            for (set_id, modals) in inner.sets.iter_mut() {
                if let Some(pos) = modals.iter().position(|m| m.id == id) {
                    modals.remove(pos);
                    found = Some((*set_id, modals.is_empty()));
                    break;
                }
            }
            if let Some((set_id, true)) = found {
                inner.sets.shift_remove(&set_id);
            }
            found
        };

        match removed {
            Some((set_id, set_emptied)) => {
                if set_emptied {
                    self.notify_set_ids();
                }
                self.notify_set(set_id);
            }
            None => debug!(id, "remove_modal: id already removed"),
        }
    }

    fn notify_set_ids(&self) {
        let notification = {
            let inner = self.inner.lock();
            inner
                .set_ids_handler
                .clone()
                .map(|handler| (handler, inner.sets.keys().copied().collect::<Vec<_>>()))
        };
        if let Some((handler, ids)) = notification {
            handler(&ids);
        }
    }

    fn notify_set(&self, set_id: SetId) {
        let notification = {
            let inner = self.inner.lock();
            inner.set_handlers.get(&set_id).cloned().map(|handler| {
                let modals = inner.sets.get(&set_id).cloned().unwrap_or_default();
                (handler, modals)
            })
        };
        if let Some((handler, modals)) = notification {
            handler(&modals);
        }
    }

    fn schedule_grace_warning(&self) {
        let registry = self.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    tokio::time::sleep(SUBSCRIBER_GRACE_WINDOW).await;
                    if !registry.inner.lock().ever_had_subscriber {
                        warn!(
                            "modal was mounted but no top-level renderer ever subscribed; \
                             modals will not become visible"
                        );
                    }
                });
            }
            Err(_) => debug!("no async runtime; skipping missing-renderer grace warning"),
        }
    }
}

/// Stacking comparator: explicit stack order wins, earlier-mounted (lower
/// id) renders first among equals.
fn compare_modals(a: &MountedModal, b: &MountedModal) -> Ordering {
    a.info
        .stack_order
        .cmp(&b.info.stack_order)
        .then(a.id.cmp(&b.id))
}
