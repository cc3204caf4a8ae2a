//! Core data model for the modal registry
//!
//! All registry state is expressed in terms of these types. Renderers only
//! ever receive cloned snapshots of [`MountedModal`] values; the registry
//! keeps exclusive ownership of the live entries.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::text::Text;
use serde_json::Value;

use crate::ui::theme::Theme;

/// Process-unique modal identifier, monotonically increasing, never reused
pub type ModalId = u64;

/// Identifier of a modal set
///
/// A nested set is keyed by its parent modal's id, so set ids and modal ids
/// share one number space. [`ROOT_SET`] holds all top-level modals.
pub type SetId = u64;

/// The implicit root set shared by all top-level modals
pub const ROOT_SET: SetId = 0;

/// A component that renders modal content
///
/// Implementations draw into the provided buffer area using the prop bag
/// carried by the mount request. The same component instance may be asked
/// to render both into the live frame and into a scratch buffer used for
/// content snapshots, so rendering must be a pure function of its inputs.
pub trait ModalComponent: Send + Sync {
    /// Render the component's content for the given prop bag
    fn render(&self, props: &Value, area: Rect, buf: &mut Buffer, theme: &Theme);
}

/// What a modal displays, resolved once at mount time
///
/// The original duck-typed "component or children" field is modeled as a
/// tagged variant so renderers never have to presence-check at draw time.
#[derive(Clone)]
pub enum Renderable {
    /// A component reference plus its prop bag
    Component {
        component: Arc<dyn ModalComponent>,
        props: Value,
    },
    /// Pre-rendered static content
    Static(Text<'static>),
}

impl fmt::Debug for Renderable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component { props, .. } => f
                .debug_struct("Component")
                .field("props", props)
                .finish_non_exhaustive(),
            Self::Static(text) => f.debug_tuple("Static").field(&text.width()).finish(),
        }
    }
}

/// Opaque snapshot of a render anchor's last painted content
///
/// Captured at the moment removal is requested and shown during the exit
/// delay after the live component has already unmounted. The registry only
/// stores and forwards the token; it never interprets it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrozenContent(String);

impl FrozenContent {
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self(content.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A live render anchor that can snapshot its current visual content
///
/// Registered through `ModalRegistry::container_created` by the portal
/// coordinator once a modal has a concrete render target.
pub trait RenderAnchor: Send + Sync {
    /// Capture the anchor's current content, if any has been painted yet
    fn capture(&self) -> Option<FrozenContent>;
}

/// Callback invoked on backdrop clicks or escape presses
pub type ModalCallback = Arc<dyn Fn() + Send + Sync>;

/// Subscriber for one set's ordered modal list
pub type ModalSetHandler = Arc<dyn Fn(&[MountedModal]) + Send + Sync>;

/// Subscriber for the list of currently-active set ids
pub type ModalSetIdsHandler = Arc<dyn Fn(&[SetId]) + Send + Sync>;

/// Declarative description of a requested modal
///
/// Built by the mounting component, defaulted (`set_id`, `out_delay`) by the
/// registry at mount time. `out` and `frozen_content` are owned by the
/// removal path and can never be set by callers.
#[derive(Clone, Default)]
pub struct ModalDisplayInfo {
    /// Parent set; filled with [`ROOT_SET`] at mount when unset
    pub set_id: Option<SetId>,
    /// What this modal displays
    pub renderable: Option<Renderable>,
    /// Ordering key; higher renders later and therefore on top
    pub stack_order: i32,
    /// Class applied to the modal container
    pub class_name: Option<String>,
    /// Class applied once the entry transition lands
    pub in_class_name: Option<String>,
    /// Class applied while the modal is exiting
    pub out_class_name: Option<String>,
    /// Class applied to the backdrop
    pub backdrop_class_name: Option<String>,
    /// Backdrop variant of the entry class
    pub backdrop_in_class_name: Option<String>,
    /// Backdrop variant of the exit class
    pub backdrop_out_class_name: Option<String>,
    /// Class applied to the wrapper around backdrop and modal
    pub wrapper_class_name: Option<String>,
    /// ARIA attribute bag (`role` and `aria-*`), stored and forwarded only
    pub aria: BTreeMap<String, String>,
    /// Invoked when the backdrop is clicked
    pub on_backdrop_click: Option<ModalCallback>,
    /// Invoked when escape is pressed while this modal is topmost
    pub on_escape: Option<ModalCallback>,
    /// Exit delay; filled with the registry default at mount when unset
    pub out_delay: Option<Duration>,
    /// True once removal has been requested, until actual teardown
    pub(crate) out: bool,
    /// Snapshot shown during the exit delay
    pub(crate) frozen_content: Option<FrozenContent>,
}

impl ModalDisplayInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display a component with a prop bag
    ///
    /// Takes precedence over previously supplied static children.
    pub fn with_component(mut self, component: Arc<dyn ModalComponent>, props: Value) -> Self {
        self.renderable = Some(Renderable::Component { component, props });
        self
    }

    /// Display pre-rendered static content
    ///
    /// Ignored when a component reference was already supplied.
    pub fn with_children(mut self, children: Text<'static>) -> Self {
        if !matches!(self.renderable, Some(Renderable::Component { .. })) {
            self.renderable = Some(Renderable::Static(children));
        }
        self
    }

    /// Target a nested set instead of the root set
    pub fn in_set(mut self, set_id: SetId) -> Self {
        self.set_id = Some(set_id);
        self
    }

    pub fn with_stack_order(mut self, stack_order: i32) -> Self {
        self.stack_order = stack_order;
        self
    }

    pub fn with_out_delay(mut self, out_delay: Duration) -> Self {
        self.out_delay = Some(out_delay);
        self
    }

    pub fn with_class_name<S: Into<String>>(mut self, class_name: S) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_in_class_name<S: Into<String>>(mut self, class_name: S) -> Self {
        self.in_class_name = Some(class_name.into());
        self
    }

    pub fn with_out_class_name<S: Into<String>>(mut self, class_name: S) -> Self {
        self.out_class_name = Some(class_name.into());
        self
    }

    pub fn with_backdrop_class_name<S: Into<String>>(mut self, class_name: S) -> Self {
        self.backdrop_class_name = Some(class_name.into());
        self
    }

    pub fn with_backdrop_in_class_name<S: Into<String>>(mut self, class_name: S) -> Self {
        self.backdrop_in_class_name = Some(class_name.into());
        self
    }

    pub fn with_backdrop_out_class_name<S: Into<String>>(mut self, class_name: S) -> Self {
        self.backdrop_out_class_name = Some(class_name.into());
        self
    }

    pub fn with_wrapper_class_name<S: Into<String>>(mut self, class_name: S) -> Self {
        self.wrapper_class_name = Some(class_name.into());
        self
    }

    /// Attach an ARIA attribute (`role` or `aria-*`)
    pub fn with_aria<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.aria.insert(key.into(), value.into());
        self
    }

    pub fn on_backdrop_click(mut self, callback: ModalCallback) -> Self {
        self.on_backdrop_click = Some(callback);
        self
    }

    pub fn on_escape(mut self, callback: ModalCallback) -> Self {
        self.on_escape = Some(callback);
        self
    }

    /// The set this modal belongs to, after mount-time defaulting
    pub fn resolved_set_id(&self) -> SetId {
        self.set_id.unwrap_or(ROOT_SET)
    }

    /// True once removal has been requested but the exit delay has not elapsed
    pub fn is_out(&self) -> bool {
        self.out
    }

    /// The snapshot captured at removal time, if any anchor was registered
    pub fn frozen_content(&self) -> Option<&FrozenContent> {
        self.frozen_content.as_ref()
    }
}

impl fmt::Debug for ModalDisplayInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalDisplayInfo")
            .field("set_id", &self.set_id)
            .field("renderable", &self.renderable)
            .field("stack_order", &self.stack_order)
            .field("class_name", &self.class_name)
            .field("out_delay", &self.out_delay)
            .field("out", &self.out)
            .field("frozen_content", &self.frozen_content)
            .finish_non_exhaustive()
    }
}

/// A modal currently tracked by the registry
#[derive(Clone, Debug)]
pub struct MountedModal {
    pub id: ModalId,
    pub info: ModalDisplayInfo,
}
