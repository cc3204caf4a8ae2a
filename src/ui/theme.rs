//! Theme system for modal styling
//!
//! The data model carries class names, not styles; this module resolves a
//! modal's active class list into a concrete ratatui [`Style`] so renderers
//! stay independent of any particular color scheme.

use ratatui::style::{Color, Modifier, Style};
use tracing::debug;

use crate::error::ModalResult;

/// UI theme containing all style definitions
#[derive(Debug, Clone)]
pub struct Theme {
    /// Theme name
    pub name: String,
    /// Color scheme
    pub colors: ColorScheme,
}

/// Color scheme shared by all modal styles
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub background: Color,
    pub foreground: Color,
    pub primary: Color,
    pub muted: Color,
    pub backdrop: Color,
}

impl Theme {
    /// Load a theme by name, falling back to the default theme
    pub fn load(theme_name: &str) -> ModalResult<Self> {
        match theme_name {
            "default" => Ok(Self::default_theme()),
            "dark" => Ok(Self::dark_theme()),
            other => {
                debug!(theme = other, "unknown theme name, using default");
                Ok(Self::default_theme())
            }
        }
    }

    /// Default theme (terminal colors with a blue accent)
    pub fn default_theme() -> Self {
        Self {
            name: "default".to_string(),
            colors: ColorScheme {
                background: Color::Reset,
                foreground: Color::White,
                primary: Color::Blue,
                muted: Color::DarkGray,
                backdrop: Color::DarkGray,
            },
        }
    }

    /// Dark theme with softer colors
    pub fn dark_theme() -> Self {
        Self {
            name: "dark".to_string(),
            colors: ColorScheme {
                background: Color::Black,
                foreground: Color::Rgb(220, 220, 220),
                primary: Color::Rgb(100, 149, 237),
                muted: Color::Rgb(105, 105, 105),
                backdrop: Color::Rgb(40, 40, 40),
            },
        }
    }

    /// Base style for modal content
    pub fn modal_style(&self) -> Style {
        Style::default()
            .fg(self.colors.foreground)
            .bg(self.colors.background)
    }

    /// Base style for backdrops
    pub fn backdrop_style(&self) -> Style {
        Style::default().bg(self.colors.backdrop)
    }

    /// Style for modal borders and titles
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.colors.primary)
    }

    /// Style for frozen content shown during the exit delay
    pub fn frozen_style(&self) -> Style {
        Style::default().fg(self.colors.muted)
    }

    /// Resolve a single class name to a style
    ///
    /// Classes ending in the entry suffix brighten, classes ending in the
    /// exit suffix dim; backdrop classes resolve against the backdrop base.
    pub fn style_for_class(&self, class: &str) -> Style {
        let base = if class.contains("backdrop") {
            self.backdrop_style()
        } else {
            self.modal_style()
        };

        if class.ends_with("-in") || class.contains("enter") {
            base.add_modifier(Modifier::BOLD)
        } else if class.ends_with("-out") || class.contains("exit") {
            base.add_modifier(Modifier::DIM)
        } else {
            base
        }
    }

    /// Resolve an active class list, later classes patching earlier ones
    pub fn style_for_classes(&self, classes: &[String]) -> Style {
        classes
            .iter()
            .fold(Style::default(), |style, class| {
                style.patch(self.style_for_class(class))
            })
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_theme_falls_back_to_default() {
        let theme = Theme::load("no-such-theme").unwrap();
        assert_eq!(theme.name, "default");
    }

    #[test]
    fn exit_classes_dim() {
        let theme = Theme::default_theme();
        let style = theme.style_for_class("modal-registry__modal-out");
        assert!(style.add_modifier.contains(Modifier::DIM));
    }

    #[test]
    fn class_list_resolution_patches_in_order() {
        let theme = Theme::default_theme();
        let classes = vec![
            "modal-registry__modal".to_string(),
            "modal-registry__modal-in".to_string(),
        ];
        let style = theme.style_for_classes(&classes);
        assert!(style.add_modifier.contains(Modifier::BOLD));
    }
}
