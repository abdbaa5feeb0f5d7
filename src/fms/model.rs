//! An in-memory score.
//!
//! [`Score`] is the reference collaborator on both sides of the codec: it implements
//! [`ScoreBuilder`](super::builder::ScoreBuilder) so the decoder can fill it, and
//! [`ScoreSource`] so the encoder can write it back.

mod build;

use std::collections::BTreeMap;

use super::{
    builder::{EventKind, ObjectField, ObjectKind},
    config::SettingsScope,
    encode::ScoreSource,
    registry::{MarkDef, Metadata, Registry, SettingDef, SettingId},
    value::{Number, Pitch, Scalar, SettingValue},
};

use self::build::BuildState;

/// Where the current value of a setting came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SettingOrigin {
    /// The registry default.
    Default,
    /// Set through [`Score::configure`].
    Config,
    /// Set by the score text.
    Score,
}

/// A mark attached to an event.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MarkInstance {
    /// The registry name of the mark.
    pub name: String,
    /// The arguments, in the order the mark takes them.
    pub args: Vec<Scalar>,
}

/// A committed note, rest or mark event.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// What the event is.
    pub kind: EventKind,
    /// The part id.
    pub part: Option<String>,
    /// Onset time.
    pub time: Option<Number>,
    /// Grace-note offset.
    pub grace: Option<Number>,
    /// Duration.
    pub duration: Option<Number>,
    /// Pitch. Always `None` for rests and mark events.
    pub pitch: Option<Pitch>,
    /// Dynamic level.
    pub dynamic: Option<Number>,
    /// Voices, empty when unset.
    pub voices: Vec<Number>,
    /// Marks, persistent ones first.
    pub marks: Vec<MarkInstance>,
    /// Per-note settings, sorted by name.
    pub settings: Vec<(String, SettingValue)>,
}

impl Event {
    /// The onset time, zero when unset.
    #[must_use]
    pub fn onset(&self) -> Number {
        self.time.unwrap_or(Number::ZERO)
    }
}

/// The value of an object field.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FieldValue {
    /// An id or a reference to a declared object.
    Ref(String),
    /// One inline object.
    Object(ObjectDef),
    /// A list of inline objects.
    Objects(Vec<ObjectDef>),
}

/// A structural object: instrument, part, staff and so on.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectDef {
    /// The object kind.
    pub kind: ObjectKind,
    /// Fields in the order they were first given.
    pub fields: Vec<(ObjectField, FieldValue)>,
    /// Settings local to the object, in the order they were first given.
    pub settings: Vec<(String, SettingValue)>,
}

impl ObjectDef {
    /// Creates an empty object.
    #[must_use]
    pub const fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            fields: Vec::new(),
            settings: Vec::new(),
        }
    }

    /// Returns the value of `field`.
    #[must_use]
    pub fn field(&self, field: ObjectField) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find_map(|(f, value)| (*f == field).then_some(value))
    }

    /// Returns the `id` field.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self.field(ObjectField::Id) {
            Some(FieldValue::Ref(id)) => Some(id),
            _ => None,
        }
    }

    /// Sets `field`, replacing the value in place if it was already given.
    pub fn set_field(&mut self, field: ObjectField, value: FieldValue) {
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Sets a setting, replacing the value in place if it was already given.
    pub fn set_setting(&mut self, name: &str, value: SettingValue) {
        match self.settings.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.settings.push((name.to_string(), value)),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, field: ObjectField, value: FieldValue) -> Self {
        self.set_field(field, value);
        self
    }

    /// Adds a setting.
    #[must_use]
    pub fn with_setting(mut self, name: &str, value: SettingValue) -> Self {
        self.set_setting(name, value);
        self
    }
}

/// A measure placed in the score.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Measure {
    /// The time the measure starts at.
    pub time: Option<Number>,
    /// The duration of the measure.
    pub duration: Option<Number>,
    /// The measure object itself.
    pub def: ObjectDef,
}

impl Measure {
    /// The onset time, zero when unset.
    #[must_use]
    pub fn onset(&self) -> Number {
        self.time.unwrap_or(Number::ZERO)
    }
}

/// The current value of a global setting.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SettingEntry {
    /// The value.
    pub value: SettingValue,
    /// Who set it.
    pub origin: SettingOrigin,
}

/// An in-memory score.
#[derive(Debug, Clone)]
pub struct Score {
    meta: Metadata,
    settings: BTreeMap<SettingId, SettingEntry>,
    objects: BTreeMap<ObjectKind, Vec<ObjectDef>>,
    events: Vec<Event>,
    measures: Vec<Measure>,
    state: BuildState,
}

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.settings == other.settings
            && self.objects == other.objects
            && self.events == other.events
            && self.measures == other.measures
    }
}

impl Score {
    /// Creates an empty score knowing the settings and marks of `registry`. Settings with a
    /// default start with it.
    pub fn new(registry: &impl Registry) -> Self {
        let meta = Metadata::new(registry.settings(), registry.marks());
        let settings = registry
            .settings()
            .into_iter()
            .filter_map(|def| {
                def.default.map(|value| {
                    (
                        def.id,
                        SettingEntry {
                            value,
                            origin: SettingOrigin::Default,
                        },
                    )
                })
            })
            .collect();
        Self {
            meta,
            settings,
            objects: BTreeMap::new(),
            events: Vec::new(),
            measures: Vec::new(),
            state: BuildState::default(),
        }
    }

    /// Sets a setting from configuration rather than from the score text.
    ///
    /// # Errors
    ///
    /// [`BuildError::UnknownTarget`] if `id` is not registered,
    /// [`BuildError::UnexpectedValue`] if the validity predicate refuses `value`.
    ///
    /// [`BuildError::UnknownTarget`]: super::builder::BuildError::UnknownTarget
    /// [`BuildError::UnexpectedValue`]: super::builder::BuildError::UnexpectedValue
    pub fn configure(
        &mut self,
        id: SettingId,
        value: SettingValue,
    ) -> Result<(), super::builder::BuildError> {
        use super::builder::{BuildError, Target};
        let def = self
            .meta
            .setting_by_id(id)
            .ok_or(BuildError::UnknownTarget(Target::Setting(id)))?;
        if !def.accepts(&value) {
            return Err(BuildError::UnexpectedValue {
                target: Target::Setting(id),
                found: value.to_string(),
            });
        }
        self.settings.insert(
            id,
            SettingEntry {
                value,
                origin: SettingOrigin::Config,
            },
        );
        Ok(())
    }

    /// Returns the current value of the named setting.
    #[must_use]
    pub fn setting(&self, name: &str) -> Option<&SettingValue> {
        self.setting_entry(name).map(|entry| &entry.value)
    }

    /// Returns the origin of the named setting's current value.
    #[must_use]
    pub fn setting_origin(&self, name: &str) -> Option<SettingOrigin> {
        self.setting_entry(name).map(|entry| entry.origin)
    }

    fn setting_entry(&self, name: &str) -> Option<&SettingEntry> {
        let def = self.meta.setting_by_name(name)?;
        self.settings.get(&def.id)
    }

    /// Finds a declared object by kind and id.
    #[must_use]
    pub fn object(&self, kind: ObjectKind, id: &str) -> Option<&ObjectDef> {
        self.objects
            .get(&kind)?
            .iter()
            .find(|object| object.id() == Some(id))
    }

    pub(crate) fn setting_def(&self, id: SettingId) -> Option<&SettingDef> {
        self.meta.setting_by_id(id)
    }

    pub(crate) fn mark_def(&self, id: super::registry::MarkId) -> Option<&MarkDef> {
        self.meta.mark_by_id(id)
    }

    fn is_declared_part(&self, id: &str) -> bool {
        self.object(ObjectKind::Part, id).is_some()
            || self.object(ObjectKind::MetaPart, id).is_some()
    }

    fn insert_event(&mut self, event: Event) {
        let onset = event.onset();
        let at = self
            .events
            .partition_point(|e| e.onset().partial_cmp(&onset).is_some_and(|o| o.is_le()));
        self.events.insert(at, event);
    }

    fn insert_measure(&mut self, measure: Measure) {
        let onset = measure.onset();
        let at = self
            .measures
            .partition_point(|m| m.onset().partial_cmp(&onset).is_some_and(|o| o.is_le()));
        self.measures.insert(at, measure);
    }

    fn declare(&mut self, object: ObjectDef) {
        let declared = self.objects.entry(object.kind).or_default();
        match declared.iter_mut().find(|o| o.id() == object.id()) {
            Some(slot) => *slot = object,
            None => declared.push(object),
        }
    }
}

impl ScoreSource for Score {
    fn settings(&self, scope: SettingsScope) -> Vec<(&str, &SettingValue)> {
        let wanted = |origin: SettingOrigin| match scope {
            SettingsScope::None => false,
            SettingsScope::ScoreChanged => origin == SettingOrigin::Score,
            SettingsScope::ScoreAndConfig => origin != SettingOrigin::Default,
            SettingsScope::All => true,
        };
        self.meta
            .setting_list()
            .iter()
            .filter_map(|def| {
                let entry = self.settings.get(&def.id)?;
                wanted(entry.origin).then_some((def.name.as_str(), &entry.value))
            })
            .collect()
    }

    fn objects(&self, kind: ObjectKind) -> &[ObjectDef] {
        self.objects.get(&kind).map_or(&[], Vec::as_slice)
    }

    fn events(&self) -> &[Event] {
        &self.events
    }

    fn measures(&self) -> &[Measure] {
        &self.measures
    }
}
