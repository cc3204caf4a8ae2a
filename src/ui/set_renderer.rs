//! Per-set modal renderer
//!
//! One `SetRenderer` exists per currently-nonempty set. It subscribes to
//! the registry on construction (receiving a synchronous replay of the
//! set's current contents), keeps a transition coordinator per modal, and
//! renders the set bottom-to-top: backdrop, then content, so later entries
//! paint on top.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use parking_lot::Mutex;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap};
use ratatui::Frame;
use serde_json::Value;
use tracing::debug;

use crate::config::ClassConfig;
use crate::host::VisualHost;
use crate::registry::types::{ModalComponent, ModalId, MountedModal, Renderable, SetId};
use crate::registry::ModalRegistry;
use crate::ui::theme::Theme;
use crate::ui::transition::{TransitionClasses, TransitionCoordinator};

struct SetShared {
    modals: Mutex<Vec<MountedModal>>,
    coordinators: Mutex<HashMap<ModalId, TransitionCoordinator>>,
    areas: Mutex<HashMap<ModalId, Rect>>,
}

/// Subscriber and renderer for one modal set
pub struct SetRenderer {
    set_id: SetId,
    registry: ModalRegistry,
    classes: ClassConfig,
    shared: Arc<SetShared>,
}

impl SetRenderer {
    /// Create a renderer for `set_id` and subscribe it to the registry
    pub fn new(
        registry: ModalRegistry,
        host: Arc<dyn VisualHost>,
        set_id: SetId,
        classes: ClassConfig,
    ) -> Self {
        let shared = Arc::new(SetShared {
            modals: Mutex::new(Vec::new()),
            coordinators: Mutex::new(HashMap::new()),
            areas: Mutex::new(HashMap::new()),
        });

        let handler_shared = shared.clone();
        let handler_registry = registry.clone();
        let handler_classes = classes.clone();
        registry.set_modal_set_handler(
            set_id,
            Arc::new(move |modals| {
                apply_snapshot(
                    &handler_shared,
                    &handler_registry,
                    &host,
                    &handler_classes,
                    modals,
                );
            }),
        );

        Self {
            set_id,
            registry,
            classes,
            shared,
        }
    }

    pub fn set_id(&self) -> SetId {
        self.set_id
    }

    /// Snapshot of the modals this renderer currently shows
    pub fn modals(&self) -> Vec<MountedModal> {
        self.shared.modals.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.modals.lock().is_empty()
    }

    /// Whether the given modal's entry transition has landed
    pub fn is_entered(&self, id: ModalId) -> bool {
        self.shared
            .coordinators
            .lock()
            .get(&id)
            .map(|c| c.is_entered())
            .unwrap_or(false)
    }

    /// Render the set's modals bottom-to-top into the given area
    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let modals = self.shared.modals.lock().clone();
        if modals.is_empty() {
            return;
        }

        let container_style = theme.style_for_class(&self.classes.container);
        frame.render_widget(Block::default().style(container_style), area);

        let coordinators = self.shared.coordinators.lock();
        for modal in &modals {
            let Some(coordinator) = coordinators.get(&modal.id) else {
                continue;
            };

            // The wrapper class spans backdrop and modal alike; both patch
            // their own styling over it.
            let wrapper_style = modal
                .info
                .wrapper_class_name
                .as_deref()
                .map(|class| theme.style_for_class(class))
                .unwrap_or_default();

            let backdrop_style =
                wrapper_style.patch(theme.style_for_classes(&coordinator.backdrop_classes()));
            frame.render_widget(Block::default().style(backdrop_style), area);

            let modal_area = centered_rect(60, 50, area);
            self.shared.areas.lock().insert(modal.id, modal_area);
            frame.render_widget(Clear, modal_area);

            let modal_style =
                wrapper_style.patch(theme.style_for_classes(&coordinator.modal_classes()));
            let mut block = Block::default()
                .borders(Borders::ALL)
                .border_style(theme.border_style())
                .style(modal_style);
            if let Some(label) = modal.info.aria.get("aria-label") {
                block = block.title(label.as_str());
            }
            let content_area = block.inner(modal_area);
            frame.render_widget(block, modal_area);

            if let (true, Some(frozen)) = (modal.info.is_out(), modal.info.frozen_content()) {
                // The live component is already gone; show its last paint.
                let paragraph = Paragraph::new(frozen.as_str().to_string())
                    .style(theme.frozen_style())
                    .wrap(Wrap { trim: false });
                frame.render_widget(paragraph, content_area);
            } else if let Some(renderable) = &modal.info.renderable {
                match renderable {
                    Renderable::Static(text) => {
                        let paragraph = Paragraph::new(text.clone()).wrap(Wrap { trim: false });
                        frame.render_widget(paragraph, content_area);
                    }
                    Renderable::Component { component, props } => {
                        frame.render_widget(
                            ComponentWidget {
                                component: component.clone(),
                                props,
                                theme,
                            },
                            content_area,
                        );
                    }
                }
                coordinator
                    .anchor()
                    .record(snapshot_content(renderable, content_area, theme));
            }
        }
    }

    /// Route a key event to the topmost live modal
    ///
    /// Returns true when the event was consumed.
    pub fn handle_key(&self, key: KeyEvent) -> bool {
        if key.code != KeyCode::Esc {
            return false;
        }
        let modals = self.shared.modals.lock();
        if let Some(top) = modals.iter().rev().find(|m| !m.info.is_out()) {
            if let Some(on_escape) = &top.info.on_escape {
                debug!(id = top.id, "escape routed to topmost modal");
                on_escape();
                return true;
            }
        }
        false
    }

    /// Route a click to the topmost live modal's backdrop
    ///
    /// Returns true when the click landed outside the modal's content area
    /// and a backdrop handler consumed it.
    pub fn handle_click(&self, column: u16, row: u16) -> bool {
        let modals = self.shared.modals.lock();
        let Some(top) = modals.iter().rev().find(|m| !m.info.is_out()) else {
            return false;
        };
        let Some(on_backdrop_click) = &top.info.on_backdrop_click else {
            return false;
        };
        let areas = self.shared.areas.lock();
        let Some(area) = areas.get(&top.id) else {
            return false;
        };
        let inside = column >= area.x
            && column < area.x.saturating_add(area.width)
            && row >= area.y
            && row < area.y.saturating_add(area.height);
        if !inside {
            debug!(id = top.id, "backdrop click routed to topmost modal");
            on_backdrop_click();
            return true;
        }
        false
    }
}

impl Drop for SetRenderer {
    fn drop(&mut self) {
        self.registry.clear_modal_set_handler(self.set_id);
    }
}

/// Reconcile the renderer's state with a registry notification
fn apply_snapshot(
    shared: &Arc<SetShared>,
    registry: &ModalRegistry,
    host: &Arc<dyn VisualHost>,
    classes: &ClassConfig,
    modals: &[MountedModal],
) {
    *shared.modals.lock() = modals.to_vec();

    let mut coordinators = shared.coordinators.lock();
    for modal in modals {
        let coordinator = coordinators.entry(modal.id).or_insert_with(|| {
            let coordinator = TransitionCoordinator::new(
                host.clone(),
                registry,
                modal.id,
                TransitionClasses::for_modal(&modal.info, &classes.modal),
                TransitionClasses::for_backdrop(&modal.info, &classes.backdrop),
            );
            coordinator.begin_entry(|| {});
            coordinator
        });
        if modal.info.is_out() {
            coordinator.mark_exiting();
        }
    }

    let live: HashSet<ModalId> = modals.iter().map(|m| m.id).collect();
    coordinators.retain(|id, coordinator| {
        if live.contains(id) {
            true
        } else {
            coordinator.finish();
            false
        }
    });
    shared.areas.lock().retain(|id, _| live.contains(id));
}

struct ComponentWidget<'a> {
    component: Arc<dyn ModalComponent>,
    props: &'a Value,
    theme: &'a Theme,
}

impl Widget for ComponentWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        self.component.render(self.props, area, buf, self.theme);
    }
}

/// Render content into a scratch buffer and dump it as plain text
///
/// This is what the portal anchor records and what becomes the frozen
/// content shown during the exit delay.
fn snapshot_content(renderable: &Renderable, area: Rect, theme: &Theme) -> String {
    let mut scratch = Buffer::empty(area);
    match renderable {
        Renderable::Static(text) => {
            Paragraph::new(text.clone())
                .wrap(Wrap { trim: false })
                .render(area, &mut scratch);
        }
        Renderable::Component { component, props } => {
            component.render(props, area, &mut scratch, theme);
        }
    }
    buffer_to_text(&scratch, area)
}

fn buffer_to_text(buf: &Buffer, area: Rect) -> String {
    let mut lines = Vec::with_capacity(area.height as usize);
    for y in area.y..area.y.saturating_add(area.height) {
        let mut line = String::with_capacity(area.width as usize);
        for x in area.x..area.x.saturating_add(area.width) {
            line.push_str(&buf.get(x, y).symbol);
        }
        lines.push(line.trim_end().to_string());
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

/// Centered sub-rectangle, sized as a percentage of the parent area
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
