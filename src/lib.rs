//! Modal dialog registry and renderers for component-based terminal UIs
//!
//! Arbitrarily deep, arbitrarily nested components can request a modal
//! without knowing where in the interface it will actually be drawn: they
//! mount a [`ModalDisplayInfo`] into the process-wide [`ModalRegistry`],
//! and dedicated renderers, subscribed to the registry without knowing who
//! produced its state, turn the ordered modal sets into ratatui output.
//!
//! # Architecture
//!
//! The subsystem is layered, leaves first:
//! - **Registry**: tracks mounted modals, groups them into sets (for
//!   modals-within-modals), orders them for stacking, manages exit-delay
//!   timing, and notifies subscribers.
//! - **Set renderer**: one per nonempty set; renders that set's ordered
//!   modals and drives per-modal transitions.
//! - **Top-level renderer**: singleton; fans set ids out to set renderers
//!   and owns cross-cutting effects (scroll restore, the document-level
//!   "modal open" marker, first/last callbacks).
//! - **Visual host**: terminal abstraction so all host-touching effects
//!   degrade gracefully in non-visual contexts.
//!
//! # Example
//!
//! ```no_run
//! use modal_registry::{ModalDisplayInfo, ModalHandle, ModalRegistry};
//! use modal_registry::{NullHost, TopLevelOptions, TopLevelRenderer};
//!
//! let registry = ModalRegistry::new();
//! let renderer = TopLevelRenderer::new(
//!     registry.clone(),
//!     NullHost::arc(),
//!     TopLevelOptions::default(),
//! );
//!
//! let modal = ModalHandle::mount(
//!     &registry,
//!     ModalDisplayInfo::new().with_children("Hello!".into()),
//! );
//! assert!(renderer.has_modals());
//! drop(modal);
//! assert!(!renderer.has_modals());
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod registry;
pub mod ui;

pub use config::Config;
pub use error::{ErrorSeverity, ModalError, ModalResult};
pub use host::{FrameCallback, NullHost, TerminalHost, VisualHost};
pub use registry::handle::ModalHandle;
pub use registry::types::{
    FrozenContent, ModalCallback, ModalComponent, ModalDisplayInfo, ModalId, ModalSetHandler,
    ModalSetIdsHandler, MountedModal, RenderAnchor, Renderable, SetId, ROOT_SET,
};
pub use registry::{ModalRegistry, RemovalSignal};
pub use ui::{SetRenderer, Theme, TopLevelOptions, TopLevelRenderer};

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the logging system with structured logging
///
/// The registry's diagnostic channel is `tracing`: misuse (unknown ids) and
/// configuration absence (no renderer ever subscribed) surface as warnings
/// here and never interrupt control flow. Embedding applications that
/// already install their own subscriber should skip this.
pub fn initialize_logging() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modal_registry=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}
