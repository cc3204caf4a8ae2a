//! RAII mount guard for modal-requesting components
//!
//! A component that wants to show a modal mounts it through a
//! [`ModalHandle`] at creation, pushes prop changes through
//! [`ModalHandle::update`], and lets `Drop` request the unmount when the
//! component itself is torn down. Nested modals target the handle's
//! [`child_set_id`](ModalHandle::child_set_id).

use tracing::debug;

use super::types::{ModalDisplayInfo, ModalId, SetId};
use super::{ModalRegistry, RemovalSignal};

/// Keeps a modal mounted for as long as the handle lives
pub struct ModalHandle {
    registry: ModalRegistry,
    id: ModalId,
}

impl ModalHandle {
    /// Mount a modal and tie its lifetime to the returned handle
    pub fn mount(registry: &ModalRegistry, info: ModalDisplayInfo) -> Self {
        let registry = registry.clone();
        let id = registry.mount_modal(info);
        debug!(id, "modal mounted through handle");
        Self { registry, id }
    }

    /// The mounted modal's identifier
    pub fn id(&self) -> ModalId {
        self.id
    }

    /// The set id that child modals nested under this one should target
    pub fn child_set_id(&self) -> SetId {
        self.id
    }

    /// Replace the modal's display info
    ///
    /// The registry does not re-apply mount-time defaulting on update, so
    /// the handle backfills the `set_id` and `out_delay` this modal was
    /// mounted with when the caller leaves them unset.
    pub fn update(&self, mut info: ModalDisplayInfo) {
        if info.set_id.is_none() || info.out_delay.is_none() {
            if let Some(current) = self.registry.modal_info(self.id) {
                if info.set_id.is_none() {
                    info.set_id = current.set_id;
                }
                if info.out_delay.is_none() {
                    info.out_delay = current.out_delay;
                }
            }
        }
        self.registry.update_modal(self.id, info);
    }

    /// Explicitly request the unmount, returning the completion signal of a
    /// delayed removal
    ///
    /// The handle's `Drop` still runs afterwards; the second unmount request
    /// is a no-op.
    pub fn unmount(self) -> Option<RemovalSignal> {
        self.registry.unmount_modal(self.id)
    }
}

impl Drop for ModalHandle {
    fn drop(&mut self) {
        self.registry.unmount_modal(self.id);
    }
}
