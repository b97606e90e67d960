//! UI component library for Aurora Compass
//!
//! Components are defined as Rust structs with serializable properties that can
//! be rendered by the frontend. Each component provides:
//!
//! - Type-safe props with builder patterns
//! - Accessibility attributes
//! - Event handling hooks (string action identifiers)
//!
//! # Available Components
//!
//! - [`Button`] - Interactive button with variants and a loading state
//! - [`Loader`] - Loading spinner
//! - [`Dialog`] - Modal or bottom sheet with action buttons and an inline notice

use serde::{Deserialize, Serialize};

// =============================================================================
// Common Types
// =============================================================================

/// Event handler callback type (represented as a string identifier)
pub type EventHandler = String;

fn default_true() -> bool {
    true
}

/// Accessibility properties
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessibilityProps {
    /// Whether the element is busy (e.g. loading)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busy: Option<bool>,
    /// Whether the element is disabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
}

impl AccessibilityProps {
    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

// =============================================================================
// Button Component
// =============================================================================

/// Button style variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonVariant {
    /// Solid background button
    #[default]
    Solid,
    /// Outlined button with border
    Outline,
    /// Ghost button with no background
    Ghost,
}

/// Button color schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonColor {
    /// Primary brand color
    #[default]
    Primary,
    /// Secondary/neutral color
    Secondary,
    /// Negative/destructive action
    Negative,
}

/// Button sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonSize {
    /// Small button (33-40px)
    Small,
    /// Large button (44px+)
    #[default]
    Large,
}

/// Button component properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    /// Visible and accessible label
    pub label: String,
    /// Button style variant
    #[serde(default)]
    pub variant: ButtonVariant,
    /// Button color scheme
    #[serde(default)]
    pub color: ButtonColor,
    /// Button size
    #[serde(default)]
    pub size: ButtonSize,
    /// Whether the button is disabled
    #[serde(default)]
    pub disabled: bool,
    /// Whether the button shows a spinner
    #[serde(default)]
    pub loading: bool,
    /// On press event handler
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_press: Option<EventHandler>,
    /// Accessibility attributes
    #[serde(default, skip_serializing_if = "AccessibilityProps::is_empty")]
    pub accessibility: AccessibilityProps,
    /// Test ID for testing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_id: Option<String>,
}

impl Button {
    /// Create a new button with the given label
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            variant: ButtonVariant::default(),
            color: ButtonColor::default(),
            size: ButtonSize::default(),
            disabled: false,
            loading: false,
            on_press: None,
            accessibility: AccessibilityProps::default(),
            test_id: None,
        }
    }

    /// Set the button variant
    pub fn with_variant(mut self, variant: ButtonVariant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the button color
    pub fn with_color(mut self, color: ButtonColor) -> Self {
        self.color = color;
        self
    }

    /// Set the button size
    pub fn with_size(mut self, size: ButtonSize) -> Self {
        self.size = size;
        self
    }

    /// Set disabled state
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self.accessibility.disabled = disabled.then_some(true);
        self
    }

    /// Set loading state
    ///
    /// A loading button is also reported busy to assistive technology.
    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self.accessibility.busy = loading.then_some(true);
        self
    }

    /// Set on press handler
    pub fn on_press(mut self, handler: impl Into<String>) -> Self {
        self.on_press = Some(handler.into());
        self
    }

    /// Set test ID
    pub fn with_test_id(mut self, test_id: impl Into<String>) -> Self {
        self.test_id = Some(test_id.into());
        self
    }

    /// Whether pressing the button should do anything
    pub fn is_interactive(&self) -> bool {
        !self.disabled && !self.loading
    }
}

// =============================================================================
// Loader Component
// =============================================================================

/// Loading spinner size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoaderSize {
    /// Small (16px)
    Sm,
    /// Medium (24px) - default
    #[default]
    Md,
    /// Large (32px)
    Lg,
}

impl LoaderSize {
    /// Get pixel size
    pub fn pixels(&self) -> f32 {
        match self {
            LoaderSize::Sm => 16.0,
            LoaderSize::Md => 24.0,
            LoaderSize::Lg => 32.0,
        }
    }
}

/// Loading spinner component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loader {
    /// Size of the loader
    pub size: LoaderSize,
    /// Text announced to screen readers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Animation duration in milliseconds
    #[serde(default = "default_loader_duration")]
    pub duration_ms: u32,
}

fn default_loader_duration() -> u32 {
    500
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            size: LoaderSize::Md,
            label: None,
            duration_ms: default_loader_duration(),
        }
    }
}

impl Loader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set size
    pub fn with_size(mut self, size: LoaderSize) -> Self {
        self.size = size;
        self
    }

    /// Set accessible label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

// =============================================================================
// Dialog/Modal Components
// =============================================================================

/// Dialog presentation style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DialogPresentation {
    /// Centered dialog overlay
    #[default]
    Modal,
    /// Bottom sheet (slides up from bottom)
    BottomSheet,
}

/// Dialog button action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogButton {
    /// Button label
    pub label: String,
    /// Button action identifier
    pub action_id: String,
    /// Button variant
    pub variant: ButtonVariant,
    /// Button color
    pub color: ButtonColor,
    /// Is this the primary/confirm action
    #[serde(default)]
    pub is_primary: bool,
    /// Whether the button ignores presses
    #[serde(default)]
    pub disabled: bool,
    /// Whether the button shows a spinner
    #[serde(default)]
    pub loading: bool,
    /// Should close dialog when pressed
    #[serde(default = "default_true")]
    pub close_on_press: bool,
}

impl DialogButton {
    /// Create a dialog button from a [`Button`]
    ///
    /// Buttons without an `on_press` handler fall back to their label as action id.
    pub fn from_button(button: &Button, is_primary: bool) -> Self {
        Self {
            label: button.label.clone(),
            action_id: button.on_press.clone().unwrap_or_else(|| button.label.clone()),
            variant: button.variant,
            color: button.color,
            is_primary,
            disabled: button.disabled,
            loading: button.loading,
            close_on_press: false,
        }
    }

    /// Create a cancel button
    pub fn cancel(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            action_id: "cancel".to_string(),
            variant: ButtonVariant::Ghost,
            color: ButtonColor::Secondary,
            is_primary: false,
            disabled: false,
            loading: false,
            close_on_press: true,
        }
    }

    /// Set whether to close on press
    pub fn with_close(mut self, close: bool) -> Self {
        self.close_on_press = close;
        self
    }
}

/// Tone of an inline dialog notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoticeTone {
    /// Neutral information
    #[default]
    Info,
    /// Something went wrong
    Error,
}

/// Inline message shown above a dialog's buttons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogNotice {
    /// Message text
    pub text: String,
    /// Visual tone
    pub tone: NoticeTone,
}

impl DialogNotice {
    /// Create an error notice
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: NoticeTone::Error,
        }
    }
}

/// Dialog/modal component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dialog {
    /// Unique identifier
    pub id: String,
    /// Dialog title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Dialog description/content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Presentation style
    pub presentation: DialogPresentation,
    /// Whether dialog is open
    pub is_open: bool,
    /// Action buttons
    pub buttons: Vec<DialogButton>,
    /// Inline notice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<DialogNotice>,
    /// Spinner shown in the body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader: Option<Loader>,
    /// On close callback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_close: Option<EventHandler>,
}

impl Default for Dialog {
    fn default() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: None,
            description: None,
            presentation: DialogPresentation::Modal,
            is_open: false,
            buttons: Vec::new(),
            notice: None,
            loader: None,
            on_close: None,
        }
    }
}

impl Dialog {
    /// Create a new dialog
    pub fn new() -> Self {
        Self::default()
    }

    /// Set ID
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set presentation style
    pub fn with_presentation(mut self, presentation: DialogPresentation) -> Self {
        self.presentation = presentation;
        self
    }

    /// Add a button
    pub fn with_button(mut self, button: DialogButton) -> Self {
        self.buttons.push(button);
        self
    }

    /// Set the inline notice
    pub fn with_notice(mut self, notice: DialogNotice) -> Self {
        self.notice = Some(notice);
        self
    }

    /// Show a spinner
    pub fn with_loader(mut self, loader: Loader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Set the close handler
    pub fn on_close(mut self, handler: impl Into<String>) -> Self {
        self.on_close = Some(handler.into());
        self
    }

    /// Open the dialog
    pub fn open(&mut self) {
        self.is_open = true;
    }

    /// Close the dialog
    pub fn close(&mut self) {
        self.is_open = false;
    }

    /// Find a button by action id
    pub fn button(&self, action_id: &str) -> Option<&DialogButton> {
        self.buttons.iter().find(|b| b.action_id == action_id)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_new() {
        let button = Button::new("Click me");
        assert_eq!(button.label, "Click me");
        assert_eq!(button.variant, ButtonVariant::Solid);
        assert_eq!(button.color, ButtonColor::Primary);
        assert!(!button.disabled);
        assert!(button.is_interactive());
    }

    #[test]
    fn test_button_builder() {
        let button = Button::new("Submit")
            .with_variant(ButtonVariant::Outline)
            .with_color(ButtonColor::Negative)
            .with_size(ButtonSize::Small)
            .on_press("submit")
            .disabled(true);

        assert_eq!(button.variant, ButtonVariant::Outline);
        assert_eq!(button.color, ButtonColor::Negative);
        assert_eq!(button.size, ButtonSize::Small);
        assert_eq!(button.on_press.as_deref(), Some("submit"));
        assert!(button.disabled);
        assert_eq!(button.accessibility.disabled, Some(true));
        assert!(!button.is_interactive());
    }

    #[test]
    fn test_button_loading_is_busy() {
        let button = Button::new("Sign in").loading(true);
        assert_eq!(button.accessibility.busy, Some(true));
        assert!(!button.is_interactive());

        let button = button.loading(false);
        assert_eq!(button.accessibility.busy, None);
    }

    #[test]
    fn test_button_serialization_skips_empty() {
        let json = serde_json::to_value(Button::new("Like")).unwrap();
        assert_eq!(json["label"], "Like");
        assert!(json.get("accessibility").is_none());
        assert!(json.get("on_press").is_none());
    }

    #[test]
    fn test_loader_sizes() {
        assert_eq!(LoaderSize::Sm.pixels(), 16.0);
        assert_eq!(Loader::new().size.pixels(), 24.0);
        assert_eq!(Loader::new().with_size(LoaderSize::Lg).size.pixels(), 32.0);
        assert_eq!(Loader::default().duration_ms, 500);
    }

    #[test]
    fn test_dialog_button_from_button() {
        let button = Button::new("Sign in").on_press("sign_in").disabled(true).loading(true);
        let dialog_button = DialogButton::from_button(&button, true);

        assert_eq!(dialog_button.action_id, "sign_in");
        assert!(dialog_button.is_primary);
        assert!(dialog_button.disabled);
        assert!(dialog_button.loading);
        assert!(!dialog_button.close_on_press);
    }

    #[test]
    fn test_dialog_builder() {
        let mut dialog = Dialog::new()
            .with_title("Sign in required")
            .with_description("Sign in to continue.")
            .with_presentation(DialogPresentation::BottomSheet)
            .with_button(DialogButton::cancel("Cancel"))
            .with_notice(DialogNotice::error("Network error"));

        assert!(!dialog.is_open);
        dialog.open();
        assert!(dialog.is_open);

        assert_eq!(dialog.button("cancel").map(|b| b.label.as_str()), Some("Cancel"));
        assert!(dialog.button("missing").is_none());
        assert_eq!(dialog.notice.as_ref().map(|n| n.tone), Some(NoticeTone::Error));

        dialog.close();
        assert!(!dialog.is_open);
    }

    #[test]
    fn test_dialog_ids_are_unique() {
        assert_ne!(Dialog::new().id, Dialog::new().id);
        assert_eq!(Dialog::new().with_id("auth").id, "auth");
    }

    #[test]
    fn test_dialog_serialization() {
        let dialog = Dialog::new()
            .with_id("auth")
            .with_presentation(DialogPresentation::BottomSheet)
            .with_loader(Loader::new());
        let json = serde_json::to_value(&dialog).unwrap();

        assert_eq!(json["id"], "auth");
        assert_eq!(json["presentation"], "bottom-sheet");
        assert_eq!(json["loader"]["size"], "md");
        assert!(json.get("notice").is_none());
    }
}
