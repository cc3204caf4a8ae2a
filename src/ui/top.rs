//! Top-level modal renderer
//!
//! The singleton subscriber to the registry's set-id list. It instantiates
//! and destroys [`SetRenderer`]s as sets appear and vanish, toggles the
//! document-level "modal open" marker, and owns the cross-cutting lifecycle
//! effects: first-mounted/last-unmounted callbacks and scroll restore, both
//! deferred to the next paint frame so the triggering render has settled.

use std::sync::Arc;
use std::time::Duration;

use crossterm::event::KeyEvent;
use indexmap::IndexMap;
use parking_lot::Mutex;
use ratatui::layout::Rect;
use ratatui::Frame;
use tracing::debug;

use crate::config::{ClassConfig, Config};
use crate::host::VisualHost;
use crate::registry::types::{ModalCallback, MountedModal, SetId};
use crate::registry::ModalRegistry;
use crate::ui::set_renderer::SetRenderer;
use crate::ui::theme::Theme;

/// Configuration and callbacks for the top-level renderer
#[derive(Clone, Default)]
pub struct TopLevelOptions {
    /// Class names applied when mounts do not override them
    pub classes: ClassConfig,
    /// Capture/restore the host scroll offset across the modal session
    pub restore_scroll: bool,
    /// Registry-wide fallback exit delay, pushed into the registry
    pub default_out_delay: Duration,
    /// Invoked (next frame) when the first modal appears
    pub on_first_modal_mounted: Option<ModalCallback>,
    /// Invoked (next frame) when the last modal is gone
    pub on_last_modal_unmounted: Option<ModalCallback>,
}

impl TopLevelOptions {
    /// Derive options from loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            classes: config.classes.clone(),
            restore_scroll: config.behavior.restore_scroll,
            default_out_delay: config.default_out_delay(),
            on_first_modal_mounted: None,
            on_last_modal_unmounted: None,
        }
    }
}

struct TopShared {
    set_ids: Mutex<Vec<SetId>>,
    renderers: Mutex<IndexMap<SetId, SetRenderer>>,
    /// Single-slot deferred effect: idle -> pending -> idle; newer
    /// notifications overwrite a pending effect.
    pending_effect: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    saved_scroll: Mutex<Option<(u16, u16)>>,
}

/// Singleton renderer that fans the registry's sets out to set renderers
pub struct TopLevelRenderer {
    registry: ModalRegistry,
    shared: Arc<TopShared>,
}

impl TopLevelRenderer {
    /// Create the renderer and subscribe it to the registry's set-id list
    ///
    /// Installing the subscription replays the current list synchronously,
    /// so renderers for already-mounted modals exist as soon as this
    /// returns.
    pub fn new(
        registry: ModalRegistry,
        host: Arc<dyn VisualHost>,
        options: TopLevelOptions,
    ) -> Self {
        registry.set_default_out_delay(options.default_out_delay);

        let shared = Arc::new(TopShared {
            set_ids: Mutex::new(Vec::new()),
            renderers: Mutex::new(IndexMap::new()),
            pending_effect: Mutex::new(None),
            saved_scroll: Mutex::new(None),
        });

        let handler_shared = shared.clone();
        let handler_registry = registry.clone();
        registry.set_modal_set_ids_handler(Arc::new(move |ids| {
            on_set_ids(&handler_shared, &handler_registry, &host, &options, ids);
        }));

        Self { registry, shared }
    }

    /// The currently-active set ids, in set-creation order
    pub fn set_ids(&self) -> Vec<SetId> {
        self.shared.set_ids.lock().clone()
    }

    pub fn has_modals(&self) -> bool {
        !self.shared.set_ids.lock().is_empty()
    }

    /// Snapshot of the modals currently shown for one set
    pub fn modals_in(&self, set_id: SetId) -> Vec<MountedModal> {
        self.shared
            .renderers
            .lock()
            .get(&set_id)
            .map(|renderer| renderer.modals())
            .unwrap_or_default()
    }

    /// Render all active sets, outermost first
    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let renderers = self.shared.renderers.lock();
        for renderer in renderers.values() {
            renderer.render(frame, area, theme);
        }
    }

    /// Route a key event to the innermost active set
    pub fn handle_key(&self, key: KeyEvent) -> bool {
        let renderers = self.shared.renderers.lock();
        renderers
            .values()
            .last()
            .map(|renderer| renderer.handle_key(key))
            .unwrap_or(false)
    }

    /// Route a click to the innermost active set
    pub fn handle_click(&self, column: u16, row: u16) -> bool {
        let renderers = self.shared.renderers.lock();
        renderers
            .values()
            .last()
            .map(|renderer| renderer.handle_click(column, row))
            .unwrap_or(false)
    }
}

impl Drop for TopLevelRenderer {
    fn drop(&mut self) {
        self.registry.clear_modal_set_ids_handler();
        self.shared.renderers.lock().clear();
    }
}

fn on_set_ids(
    shared: &Arc<TopShared>,
    registry: &ModalRegistry,
    host: &Arc<dyn VisualHost>,
    options: &TopLevelOptions,
    ids: &[SetId],
) {
    let was_empty = {
        let mut set_ids = shared.set_ids.lock();
        let was_empty = set_ids.is_empty();
        *set_ids = ids.to_vec();
        was_empty
    };

    {
        let mut renderers = shared.renderers.lock();
        for id in ids {
            if !renderers.contains_key(id) {
                debug!(set_id = *id, "creating set renderer");
                renderers.insert(
                    *id,
                    SetRenderer::new(
                        registry.clone(),
                        host.clone(),
                        *id,
                        options.classes.clone(),
                    ),
                );
            }
        }
        renderers.retain(|id, _| ids.contains(id));
    }

    // Idempotent: just track the list's emptiness.
    host.set_marker(&options.classes.body_open, !ids.is_empty());

    let now_empty = ids.is_empty();
    if was_empty && !now_empty {
        if options.restore_scroll {
            *shared.saved_scroll.lock() = host.scroll_offset();
        }
        if let Some(on_first) = options.on_first_modal_mounted.clone() {
            queue_effect(shared, host, Box::new(move || on_first()));
        }
    } else if !was_empty && now_empty {
        let saved = if options.restore_scroll {
            shared.saved_scroll.lock().take()
        } else {
            None
        };
        let on_last = options.on_last_modal_unmounted.clone();
        if saved.is_some() || on_last.is_some() {
            let effect_host = host.clone();
            queue_effect(
                shared,
                host,
                Box::new(move || {
                    if let Some(offset) = saved {
                        effect_host.set_scroll_offset(offset);
                    }
                    if let Some(on_last) = on_last {
                        on_last();
                    }
                }),
            );
        }
    }
}

fn queue_effect(
    shared: &Arc<TopShared>,
    host: &Arc<dyn VisualHost>,
    effect: Box<dyn FnOnce() + Send>,
) {
    *shared.pending_effect.lock() = Some(effect);
    let flush_shared = shared.clone();
    host.request_frame(Box::new(move || {
        if let Some(effect) = flush_shared.pending_effect.lock().take() {
            effect();
        }
    }));
}
