//! Decoder and encoder configuration.

use std::collections::BTreeSet;

/// Default tab width used for column accounting.
pub const DEFAULT_TAB_WIDTH: usize = 8;
/// Default encoder line width.
pub const DEFAULT_WRAP_WIDTH: usize = 80;
/// Default indentation of continuation lines.
pub const DEFAULT_INDENT_WIDTH: usize = 2;

/// Options of one decode call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecodeConfig {
    /// Columns a tab advances to, between 1 and 20.
    pub tab_width: usize,
    /// The name reported in positions of the top-level source.
    pub source_name: String,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            tab_width: DEFAULT_TAB_WIDTH,
            source_name: "<input>".to_string(),
        }
    }
}

impl DecodeConfig {
    /// Sets the tab width, clamped into `1..=20`.
    #[must_use]
    pub fn tab_width(mut self, width: usize) -> Self {
        self.tab_width = width.clamp(1, 20);
        self
    }

    /// Sets the source name.
    #[must_use]
    pub fn source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }
}

/// Which settings the encoder writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SettingsScope {
    /// No settings section.
    None,
    /// Only settings the score itself changed.
    #[default]
    ScoreChanged,
    /// Settings changed by the score or by configuration.
    ScoreAndConfig,
    /// Every setting that has a value, defaults included.
    All,
}

/// How events are ordered in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventOrder {
    /// One part's whole event list before the next part's.
    #[default]
    ByPart,
    /// All parts merged by time.
    Interleaved,
}

/// Attribute categories subject to non-repeat suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    /// `part`
    Part,
    /// `time`
    Time,
    /// `grace`
    Grace,
    /// `duration`
    Duration,
    /// `pitch`
    Pitch,
    /// `dynamic`
    Dynamic,
    /// `voice`
    Voice,
    /// Per-note settings.
    Settings,
}

/// Options of one encode call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncodeConfig {
    /// Which settings are written.
    pub settings_scope: SettingsScope,
    /// How events are ordered.
    pub event_order: EventOrder,
    /// Lines longer than this are wrapped.
    pub wrap_width: usize,
    /// Spaces before continuation lines.
    pub indent_width: usize,
    /// Categories written on every event even when unchanged.
    pub always_repeat: BTreeSet<Category>,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            settings_scope: SettingsScope::default(),
            event_order: EventOrder::default(),
            wrap_width: DEFAULT_WRAP_WIDTH,
            indent_width: DEFAULT_INDENT_WIDTH,
            always_repeat: BTreeSet::new(),
        }
    }
}

impl EncodeConfig {
    /// Sets the settings scope.
    #[must_use]
    pub const fn settings_scope(mut self, scope: SettingsScope) -> Self {
        self.settings_scope = scope;
        self
    }

    /// Sets the event order.
    #[must_use]
    pub const fn event_order(mut self, order: EventOrder) -> Self {
        self.event_order = order;
        self
    }

    /// Sets the wrap width. Zero disables wrapping.
    #[must_use]
    pub const fn wrap_width(mut self, width: usize) -> Self {
        self.wrap_width = width;
        self
    }

    /// Sets the continuation indent.
    #[must_use]
    pub const fn indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    /// Writes `category` on every event.
    #[must_use]
    pub fn always_repeat(mut self, category: Category) -> Self {
        self.always_repeat.insert(category);
        self
    }

    /// Whether `category` skips non-repeat suppression.
    #[must_use]
    pub fn repeats(&self, category: Category) -> bool {
        self.always_repeat.contains(&category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_width_is_clamped() {
        assert_eq!(DecodeConfig::default().tab_width(0).tab_width, 1);
        assert_eq!(DecodeConfig::default().tab_width(99).tab_width, 20);
        assert_eq!(DecodeConfig::default().tab_width(4).tab_width, 4);
    }

    #[test]
    fn always_repeat() {
        let config = EncodeConfig::default().always_repeat(Category::Time);
        assert!(config.repeats(Category::Time));
        assert!(!config.repeats(Category::Pitch));
    }
}
