//! Rendering layer
//!
//! Renderers are the only consumers of registry state and are unaware of
//! who mounted what: the [`TopLevelRenderer`] subscribes to the set-id
//! list and manages one [`SetRenderer`] per active set; each set renderer
//! drives a [`transition::TransitionCoordinator`] per modal.

pub mod set_renderer;
pub mod theme;
pub mod top;
pub mod transition;

pub use set_renderer::SetRenderer;
pub use theme::Theme;
pub use top::{TopLevelOptions, TopLevelRenderer};
pub use transition::{EntryPhase, PortalAnchor, TransitionClasses, TransitionCoordinator};
