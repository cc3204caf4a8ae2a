//! Registry behavior tests
//!
//! Covers the controller's observable contract: id allocation, set
//! membership, subscriber replay, nesting, stacking order, and the
//! exit-delay removal sequence.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use modal_registry::ui::PortalAnchor;
use modal_registry::{ModalDisplayInfo, ModalRegistry, MountedModal, SetId, ROOT_SET};

type SetSnapshots = Arc<Mutex<Vec<Vec<MountedModal>>>>;
type IdSnapshots = Arc<Mutex<Vec<Vec<SetId>>>>;

fn record_set(registry: &ModalRegistry, set_id: SetId) -> SetSnapshots {
    let snapshots: SetSnapshots = Arc::new(Mutex::new(Vec::new()));
    let sink = snapshots.clone();
    registry.set_modal_set_handler(
        set_id,
        Arc::new(move |modals| sink.lock().unwrap().push(modals.to_vec())),
    );
    snapshots
}

fn record_set_ids(registry: &ModalRegistry) -> IdSnapshots {
    let snapshots: IdSnapshots = Arc::new(Mutex::new(Vec::new()));
    let sink = snapshots.clone();
    registry.set_modal_set_ids_handler(Arc::new(move |ids| {
        sink.lock().unwrap().push(ids.to_vec())
    }));
    snapshots
}

#[test]
fn mount_returns_strictly_increasing_ids() {
    let registry = ModalRegistry::new();

    let mut previous = 0;
    for _ in 0..10 {
        let id = registry.mount_modal(ModalDisplayInfo::new());
        assert!(id > previous, "id {id} not greater than {previous}");
        previous = id;
    }
}

#[test]
fn set_ids_handler_replays_then_tracks_membership() {
    let registry = ModalRegistry::new();
    let snapshots = record_set_ids(&registry);

    // Installing replays the current (empty) list.
    assert_eq!(snapshots.lock().unwrap().as_slice(), &[Vec::<SetId>::new()]);

    let root_modal = registry.mount_modal(ModalDisplayInfo::new());
    let nested = registry.mount_modal(ModalDisplayInfo::new().in_set(5));
    {
        let last = snapshots.lock().unwrap().last().unwrap().clone();
        assert_eq!(last.len(), 2);
        assert!(last.contains(&ROOT_SET));
        assert!(last.contains(&5));
    }

    registry.unmount_modal(nested);
    assert_eq!(
        snapshots.lock().unwrap().last().unwrap().as_slice(),
        &[ROOT_SET]
    );

    registry.unmount_modal(root_modal);
    assert!(snapshots.lock().unwrap().last().unwrap().is_empty());
}

#[test]
fn set_handler_receives_root_mount_on_install() {
    let registry = ModalRegistry::new();
    let id = registry.mount_modal(ModalDisplayInfo::new());

    let snapshots = record_set(&registry, ROOT_SET);

    let replay = snapshots.lock().unwrap().first().unwrap().clone();
    assert_eq!(replay.len(), 1);
    assert_eq!(replay[0].id, id);
    assert_eq!(replay[0].info.resolved_set_id(), ROOT_SET);
}

#[test]
fn nested_set_observed_regardless_of_registration_order() {
    // Handler registered after the child mounts.
    let registry = ModalRegistry::new();
    let parent = registry.mount_modal(ModalDisplayInfo::new());
    let child = registry.mount_modal(ModalDisplayInfo::new().in_set(parent));
    let after = record_set(&registry, parent);
    let last_after = after.lock().unwrap().last().unwrap().clone();
    assert_eq!(last_after.len(), 1);
    assert_eq!(last_after[0].id, child);

    // Handler registered before the child mounts.
    let registry = ModalRegistry::new();
    let parent = registry.mount_modal(ModalDisplayInfo::new());
    let before = record_set(&registry, parent);
    assert!(before.lock().unwrap().first().unwrap().is_empty());
    let child = registry.mount_modal(ModalDisplayInfo::new().in_set(parent));
    let last_before = before.lock().unwrap().last().unwrap().clone();
    assert_eq!(last_before.len(), 1);
    assert_eq!(last_before[0].id, child);
}

#[test]
fn mount_notifies_only_the_target_set() {
    let registry = ModalRegistry::new();
    let parent = registry.mount_modal(ModalDisplayInfo::new());

    let root_snapshots = record_set(&registry, ROOT_SET);
    let nested_snapshots = record_set(&registry, parent);
    let root_before = root_snapshots.lock().unwrap().len();

    registry.mount_modal(ModalDisplayInfo::new().in_set(parent));

    assert_eq!(root_snapshots.lock().unwrap().len(), root_before);
    assert_eq!(nested_snapshots.lock().unwrap().len(), 2);
}

#[test]
fn stack_order_wins_with_mount_order_tiebreak() {
    let registry = ModalRegistry::new();
    let first_five = registry.mount_modal(ModalDisplayInfo::new().with_stack_order(5));
    let one = registry.mount_modal(ModalDisplayInfo::new().with_stack_order(1));
    let second_five = registry.mount_modal(ModalDisplayInfo::new().with_stack_order(5));

    let ids: Vec<_> = registry
        .modals_in_set(ROOT_SET)
        .iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids, vec![one, first_five, second_five]);
}

#[test]
fn update_with_unknown_id_is_a_noop() {
    let registry = ModalRegistry::new();
    let id = registry.mount_modal(ModalDisplayInfo::new());
    let snapshots = record_set(&registry, ROOT_SET);
    let before = snapshots.lock().unwrap().len();

    registry.update_modal(id + 100, ModalDisplayInfo::new());

    assert_eq!(snapshots.lock().unwrap().len(), before);
    assert_eq!(registry.modals_in_set(ROOT_SET).len(), 1);
}

#[test]
fn immediate_unmount_removes_in_one_notification_cycle() {
    let registry = ModalRegistry::new();
    let snapshots = record_set(&registry, ROOT_SET);

    let id = registry.mount_modal(ModalDisplayInfo::new());
    let signal = registry.unmount_modal(id);
    assert!(signal.is_none());

    let observed = snapshots.lock().unwrap().clone();
    // Replay, mount, removal; no intermediate exiting state.
    assert_eq!(observed.len(), 3);
    assert!(observed[2].is_empty());
    assert!(observed.iter().flatten().all(|m| !m.info.is_out()));
}

#[test]
fn unmount_of_removed_id_is_idempotent() {
    let registry = ModalRegistry::new();
    let snapshots = record_set(&registry, ROOT_SET);

    let id = registry.mount_modal(ModalDisplayInfo::new());
    registry.unmount_modal(id);
    let after_first = snapshots.lock().unwrap().len();

    assert!(registry.unmount_modal(id).is_none());
    assert_eq!(snapshots.lock().unwrap().len(), after_first);
}

#[tokio::test]
async fn delayed_unmount_goes_through_exiting_state() {
    let registry = ModalRegistry::new();
    let snapshots = record_set(&registry, ROOT_SET);

    let id = registry.mount_modal(ModalDisplayInfo::new().with_out_delay(Duration::from_millis(30)));

    let anchor = Arc::new(PortalAnchor::new());
    anchor.record("last painted content");
    registry.container_created(id, anchor);

    let started = Instant::now();
    let signal = registry.unmount_modal(id).expect("delayed removal signal");

    {
        let observed = snapshots.lock().unwrap();
        let exiting = observed.last().unwrap();
        assert_eq!(exiting.len(), 1);
        assert!(exiting[0].info.is_out());
        assert_eq!(
            exiting[0].info.frozen_content().map(|c| c.as_str()),
            Some("last painted content")
        );
    }

    signal.await;
    assert!(started.elapsed() >= Duration::from_millis(30));
    assert!(snapshots.lock().unwrap().last().unwrap().is_empty());
    assert!(registry.set_ids().is_empty());
}

#[tokio::test]
async fn update_during_exit_window_cannot_revert_the_exit() {
    let registry = ModalRegistry::new();
    let snapshots = record_set(&registry, ROOT_SET);

    let id = registry.mount_modal(ModalDisplayInfo::new().with_out_delay(Duration::from_millis(50)));
    let anchor = Arc::new(PortalAnchor::new());
    anchor.record("exiting content");
    registry.container_created(id, anchor);

    let signal = registry.unmount_modal(id).expect("delayed removal signal");
    assert!(registry.modal_info(id).unwrap().is_out());

    // A routine update lands while the exit timer is pending; the exiting
    // state must survive it.
    registry.update_modal(
        id,
        ModalDisplayInfo::new()
            .in_set(ROOT_SET)
            .with_out_delay(Duration::from_millis(50)),
    );
    let info = registry.modal_info(id).unwrap();
    assert!(info.is_out());
    assert_eq!(
        info.frozen_content().map(|c| c.as_str()),
        Some("exiting content")
    );

    // And a second removal request stays a no-op instead of starting a
    // duplicate exit cycle.
    assert!(registry.unmount_modal(id).is_none());

    signal.await;
    assert!(snapshots.lock().unwrap().last().unwrap().is_empty());
    assert!(registry.modal_info(id).is_none());
}

#[tokio::test]
async fn default_out_delay_applies_unless_overridden() {
    let registry = ModalRegistry::new();
    registry.set_default_out_delay(Duration::from_millis(50));

    let id = registry.mount_modal(ModalDisplayInfo::new());
    let started = Instant::now();
    let signal = registry.unmount_modal(id).expect("default delay in effect");
    signal.await;
    assert!(started.elapsed() >= Duration::from_millis(50));

    // An explicit zero delay on the mount overrides the registry default.
    let id = registry.mount_modal(ModalDisplayInfo::new().with_out_delay(Duration::ZERO));
    assert!(registry.unmount_modal(id).is_none());
    assert!(registry.modals_in_set(ROOT_SET).is_empty());
}

#[test]
fn delayed_unmount_degrades_without_a_runtime() {
    let registry = ModalRegistry::new();
    let id = registry.mount_modal(ModalDisplayInfo::new().with_out_delay(Duration::from_millis(30)));

    // No tokio runtime here: removal happens synchronously instead.
    assert!(registry.unmount_modal(id).is_none());
    assert!(registry.set_ids().is_empty());
}

#[test]
fn handler_may_reenter_the_registry_during_notification() {
    let registry = ModalRegistry::new();
    let reentered: Arc<Mutex<Option<u64>>> = Arc::new(Mutex::new(None));

    let inner_registry = registry.clone();
    let sink = reentered.clone();
    registry.set_modal_set_ids_handler(Arc::new(move |ids| {
        // Mount a nested modal the first time the root set appears.
        if ids.contains(&ROOT_SET) && sink.lock().unwrap().is_none() {
            let parent = ids[0];
            let child = inner_registry.mount_modal(ModalDisplayInfo::new().in_set(parent + 1000));
            *sink.lock().unwrap() = Some(child);
        }
    }));

    registry.mount_modal(ModalDisplayInfo::new());
    assert!(reentered.lock().unwrap().is_some());
    assert_eq!(registry.set_ids().len(), 2);
}
