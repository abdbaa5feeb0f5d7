//! Settings and marks metadata.
//!
//! The decoder does not know any setting or mark by itself. It asks a [`Registry`] once per
//! document for the names, shapes and ids it should accept. [`Metadata`] is a plain registry, and
//! [`Metadata::standard`] fills one with a catalogue of commonly used settings and marks.

use super::value::{MarkShape, Number, SettingValue, ValueShape};

/// The numeric id of a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SettingId(pub u32);

/// The numeric id of a mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkId(pub u32);

/// A predicate deciding whether a decoded value is acceptable for a setting.
pub type Validator = fn(&SettingValue) -> bool;

/// The description of one setting.
#[derive(Debug, Clone)]
pub struct SettingDef {
    /// The name used in source text.
    pub name: String,
    /// The shape the value must be written in.
    pub shape: ValueShape,
    /// The numeric id.
    pub id: SettingId,
    /// The value the setting has when nothing set it.
    pub default: Option<SettingValue>,
    /// The validity predicate, if any.
    pub validator: Option<Validator>,
}

impl SettingDef {
    /// Creates a setting without default or validator.
    #[must_use]
    pub fn new(name: impl Into<String>, shape: ValueShape, id: u32) -> Self {
        Self {
            name: name.into(),
            shape,
            id: SettingId(id),
            default: None,
            validator: None,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, default: SettingValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the validity predicate.
    #[must_use]
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Checks `value` against the validity predicate.
    #[must_use]
    pub fn accepts(&self, value: &SettingValue) -> bool {
        self.validator.is_none_or(|valid| valid(value))
    }
}

/// The description of one mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkDef {
    /// The name used in source text.
    pub name: String,
    /// The argument signature.
    pub shape: MarkShape,
    /// The numeric id.
    pub id: MarkId,
}

impl MarkDef {
    /// Creates a mark description.
    #[must_use]
    pub fn new(name: impl Into<String>, shape: MarkShape, id: u32) -> Self {
        Self {
            name: name.into(),
            shape,
            id: MarkId(id),
        }
    }
}

/// A source of settings and marks metadata.
///
/// The decoder queries it once before parsing a document.
pub trait Registry {
    /// Returns every known setting.
    fn settings(&self) -> Vec<SettingDef>;
    /// Returns every known mark.
    fn marks(&self) -> Vec<MarkDef>;
}

impl<T: Registry + ?Sized> Registry for &T {
    fn settings(&self) -> Vec<SettingDef> {
        T::settings(self)
    }

    fn marks(&self) -> Vec<MarkDef> {
        T::marks(self)
    }
}

/// A registry holding its lists directly.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    settings: Vec<SettingDef>,
    marks: Vec<MarkDef>,
}

impl Metadata {
    /// Creates metadata from explicit lists.
    #[must_use]
    pub const fn new(settings: Vec<SettingDef>, marks: Vec<MarkDef>) -> Self {
        Self { settings, marks }
    }

    /// Adds a setting.
    #[must_use]
    pub fn setting(mut self, def: SettingDef) -> Self {
        self.settings.push(def);
        self
    }

    /// Adds a mark.
    #[must_use]
    pub fn mark(mut self, def: MarkDef) -> Self {
        self.marks.push(def);
        self
    }

    /// All settings, in registration order.
    #[must_use]
    pub fn setting_list(&self) -> &[SettingDef] {
        &self.settings
    }

    /// All marks, in registration order.
    #[must_use]
    pub fn mark_list(&self) -> &[MarkDef] {
        &self.marks
    }

    /// Finds a setting by id.
    #[must_use]
    pub fn setting_by_id(&self, id: SettingId) -> Option<&SettingDef> {
        self.settings.iter().find(|def| def.id == id)
    }

    /// Finds a setting by name, case-insensitively.
    #[must_use]
    pub fn setting_by_name(&self, name: &str) -> Option<&SettingDef> {
        self.settings
            .iter()
            .find(|def| def.name.eq_ignore_ascii_case(name))
    }

    /// Finds a mark by id.
    #[must_use]
    pub fn mark_by_id(&self, id: MarkId) -> Option<&MarkDef> {
        self.marks.iter().find(|def| def.id == id)
    }

    /// Finds a mark by name, case-insensitively.
    #[must_use]
    pub fn mark_by_name(&self, name: &str) -> Option<&MarkDef> {
        self.marks
            .iter()
            .find(|def| def.name.eq_ignore_ascii_case(name))
    }

    /// A catalogue of common score settings and marks.
    #[must_use]
    pub fn standard() -> Self {
        use MarkShape as M;
        use ValueShape as V;

        fn positive(value: &SettingValue) -> bool {
            value.as_number().is_some_and(|n| n > Number::ZERO)
        }
        fn time_signature(value: &SettingValue) -> bool {
            matches!(value, SettingValue::Numbers(nums) if nums.len() == 2 && nums.iter().all(|n| *n > Number::ZERO))
        }

        let settings = vec![
            SettingDef::new("title", V::Str, 1),
            SettingDef::new("subtitle", V::Str, 2),
            SettingDef::new("author", V::Str, 3),
            SettingDef::new("name", V::Str, 4),
            SettingDef::new("abbr", V::Str, 5),
            SettingDef::new("beat", V::Rational, 6)
                .with_default(SettingValue::Rational(num::rational::Ratio::new(1, 4)))
                .with_validator(positive),
            SettingDef::new("timesig", V::Numbers, 7).with_validator(time_signature),
            SettingDef::new("keysig", V::Str, 8),
            SettingDef::new("tempo", V::Float, 9).with_validator(positive),
            SettingDef::new("transpose", V::Int, 10).with_default(SettingValue::Int(0)),
            SettingDef::new("quartertones", V::Bool, 11).with_default(SettingValue::Bool(false)),
            SettingDef::new("clef", V::Str, 12),
            SettingDef::new("instrument", V::Str, 13),
            SettingDef::new("min-pitch", V::Note, 14),
            SettingDef::new("max-pitch", V::Note, 15),
            SettingDef::new("tuplets", V::Numbers, 16),
            SettingDef::new("beat-divisions", V::NumberLists, 17),
            SettingDef::new("staff-names", V::Strings, 18),
            SettingDef::new("layout-groups", V::StringLists, 19),
            SettingDef::new("dyn-levels", V::NumberMap, 20),
            SettingDef::new("text-styles", V::StringMap, 21),
            SettingDef::new("measure-divs", V::NumberListMap, 22),
            SettingDef::new("voice-names", V::StringListMap, 23),
            SettingDef::new("import-channel", V::Int, 24),
            SettingDef::new("export-channel", V::Int, 25),
            SettingDef::new("percussion-note", V::Note, 26),
            SettingDef::new("wrap-width", V::Int, 27).with_default(SettingValue::Int(80)),
        ];
        let marks = vec![
            MarkDef::new("accent", M::None, 1),
            MarkDef::new("staccato", M::None, 2),
            MarkDef::new("tenuto", M::None, 3),
            MarkDef::new("fermata", M::None, 4),
            MarkDef::new("marcato", M::None, 5),
            MarkDef::new("trill", M::None, 6),
            MarkDef::new("pizz", M::None, 7),
            MarkDef::new("arco", M::None, 8),
            MarkDef::new("slur", M::None, 9),
            MarkDef::new("tremolo", M::Number, 10),
            MarkDef::new("text", M::Str, 11),
            MarkDef::new("dyn", M::Str, 12),
            MarkDef::new("tempo", M::StrNumber, 13),
            MarkDef::new("harm", M::Number, 14),
        ];
        Self::new(settings, marks)
    }
}

impl Registry for Metadata {
    fn settings(&self) -> Vec<SettingDef> {
        self.settings.clone()
    }

    fn marks(&self) -> Vec<MarkDef> {
        self.marks.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_lookups_are_case_insensitive() {
        let meta = Metadata::standard();
        assert_eq!(meta.setting_by_name("TITLE").map(|d| d.id), Some(SettingId(1)));
        assert_eq!(meta.mark_by_name("Accent").map(|d| d.shape), Some(MarkShape::None));
        assert!(meta.setting_by_name("nonexistent").is_none());
    }

    #[test]
    fn validators() {
        let meta = Metadata::standard();
        let tempo = meta.setting_by_name("tempo").unwrap();
        assert!(tempo.accepts(&SettingValue::Int(120)));
        assert!(!tempo.accepts(&SettingValue::Int(0)));
        let timesig = meta.setting_by_name("timesig").unwrap();
        assert!(timesig.accepts(&SettingValue::Numbers(vec![Number::Int(3), Number::Int(4)])));
        assert!(!timesig.accepts(&SettingValue::Numbers(vec![Number::Int(3)])));
        assert!(meta.setting_by_name("title").unwrap().accepts(&SettingValue::Str(String::new())));
    }
}
