//! The score-construction interface driven by the decoder.
//!
//! The decoder never builds a score by itself. Every decoded value is handed to a
//! [`ScoreBuilder`] as an ordered sequence of calls:
//!
//! 1. [`ScoreBuilder::set_current`] selects the [`Target`] the value is for,
//! 2. the payload follows: one [`ScoreBuilder::set_value`], or a `begin_list`/`add_list_item`/
//!    `end_list` triplet (nested for lists of lists, alternating key and value for maps), or an
//!    inline object between `start_object` and `commit_object`,
//! 3. [`ScoreBuilder::apply`] applies it with an [`Action`].
//!
//! Every call returns a [`Result`]; the decoder reports an `Err` with the position of the entry
//! and carries on with the next call.

use std::fmt;

use thiserror::Error;

use super::{
    region::RegionId,
    registry::{MarkId, SettingId},
    value::Scalar,
};

/// The attributes every event carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventField {
    /// Onset time.
    Time,
    /// Grace-note time offset.
    Grace,
    /// Duration.
    Duration,
    /// Pitch.
    Pitch,
    /// Dynamic level.
    Dynamic,
    /// Voice list.
    Voice,
    /// The part the event belongs to.
    Part,
}

impl EventField {
    /// The full keyword.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Grace => "grace",
            Self::Duration => "duration",
            Self::Pitch => "pitch",
            Self::Dynamic => "dynamic",
            Self::Voice => "voice",
            Self::Part => "part",
        }
    }

    /// Whether the field holds a number that `+`, `-`, `*` and `/` can act on.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Time | Self::Grace | Self::Duration | Self::Dynamic
        )
    }
}

/// What kind of event a commit produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EventKind {
    /// A pitched note.
    #[default]
    Note,
    /// A rest.
    Rest,
    /// An event carrying only marks.
    Mark,
}

/// Kinds of structural objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectKind {
    /// Instrument.
    Inst,
    /// Percussion instrument.
    PercInst,
    /// Part.
    Part,
    /// Metapart, a part built from other parts.
    MetaPart,
    /// One entry of a metapart's part list.
    PartMap,
    /// Staff of an instrument.
    Staff,
    /// Clef of a staff.
    Clef,
    /// Import description.
    Import,
    /// Export description.
    Export,
    /// Measure definition.
    MeasDef,
    /// A measure placed at the current time.
    Measure,
}

impl ObjectKind {
    /// The keyword for top-level declarations, also used in messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Inst => "inst",
            Self::PercInst => "percinst",
            Self::Part => "part",
            Self::MetaPart => "metapart",
            Self::PartMap => "partmap",
            Self::Staff => "staff",
            Self::Clef => "clef",
            Self::Import => "import",
            Self::Export => "export",
            Self::MeasDef => "measdef",
            Self::Measure => "measure",
        }
    }

    /// Whether objects of this kind accept `field`.
    #[must_use]
    pub const fn accepts(self, field: ObjectField) -> bool {
        use ObjectField as F;
        match self {
            Self::Inst => matches!(
                field,
                F::Id | F::Template | F::Staves | F::Imports | F::Export | F::PercInsts
            ),
            Self::PercInst => matches!(field, F::Id | F::Template | F::Imports | F::Export),
            Self::Part => matches!(field, F::Id | F::Inst),
            Self::MetaPart => matches!(field, F::Id | F::Parts),
            Self::PartMap => matches!(field, F::Part),
            Self::Staff => matches!(field, F::Clefs),
            Self::Clef | Self::Import | Self::Export => false,
            Self::MeasDef => matches!(field, F::Id),
            Self::Measure => matches!(field, F::MeasDef),
        }
    }
}

/// Fields of structural objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ObjectField {
    /// `id`
    Id,
    /// `template`
    Template,
    /// `inst`: an instrument reference or inline instrument.
    Inst,
    /// `part`: a part reference or inline part.
    Part,
    /// `parts`: a list of part maps.
    Parts,
    /// `staves`: a list of staves.
    Staves,
    /// `clefs`: a list of clefs.
    Clefs,
    /// `imports`: a list of imports.
    Imports,
    /// `export`: one export.
    Export,
    /// `percinsts`: a list of percussion instruments.
    PercInsts,
    /// `measdef`: a measure definition reference.
    MeasDef,
}

impl ObjectField {
    /// Every field, in the order they are written.
    pub const ALL: [Self; 11] = [
        Self::Id,
        Self::Template,
        Self::Inst,
        Self::Part,
        Self::MeasDef,
        Self::Parts,
        Self::Staves,
        Self::Clefs,
        Self::Imports,
        Self::Export,
        Self::PercInsts,
    ];

    /// The keyword.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Template => "template",
            Self::Inst => "inst",
            Self::Part => "part",
            Self::Parts => "parts",
            Self::Staves => "staves",
            Self::Clefs => "clefs",
            Self::Imports => "imports",
            Self::Export => "export",
            Self::PercInsts => "percinsts",
            Self::MeasDef => "measdef",
        }
    }

    /// Looks up a field by keyword, ignoring case.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(word))
    }

    /// The kind of inline objects this field holds, `None` for plain string fields.
    #[must_use]
    pub const fn element_kind(self) -> Option<ObjectKind> {
        match self {
            Self::Id | Self::Template | Self::MeasDef => None,
            Self::Inst => Some(ObjectKind::Inst),
            Self::Part => Some(ObjectKind::Part),
            Self::Parts => Some(ObjectKind::PartMap),
            Self::Staves => Some(ObjectKind::Staff),
            Self::Clefs => Some(ObjectKind::Clef),
            Self::Imports => Some(ObjectKind::Import),
            Self::Export => Some(ObjectKind::Export),
            Self::PercInsts => Some(ObjectKind::PercInst),
        }
    }

    /// Whether the field holds a list of objects.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(
            self,
            Self::Parts | Self::Staves | Self::Clefs | Self::Imports | Self::PercInsts
        )
    }
}

/// How a value is applied to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Action {
    /// Replace the value.
    Set,
    /// Add to the numeric value.
    Increment,
    /// Subtract from the numeric value.
    Decrement,
    /// Multiply the numeric value.
    Multiply,
    /// Divide the numeric value.
    Divide,
    /// Add a mark to the enclosing region.
    Add,
    /// Remove a mark from the enclosing region.
    Remove,
    /// Unset the value.
    Clear,
    /// Begin something spanning several entries.
    Start,
    /// End something started with [`Action::Start`].
    End,
    /// Commit the accumulated event.
    Queue,
    /// Drop the accumulated event.
    Cancel,
    /// Commit the accumulated event and keep its one-shot state for the next one.
    Resume,
}

/// What a value or action refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    /// An event field.
    Field(EventField),
    /// A global setting, or a setting of the innermost open object.
    Setting(SettingId),
    /// A per-note setting.
    LocalSetting(SettingId),
    /// A mark.
    Mark(MarkId),
    /// A field of the innermost open object.
    ObjectField(ObjectField),
    /// The kind of the next committed event.
    Kind(EventKind),
    /// The accumulated event itself.
    Event,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(field) => write!(f, "field `{}`", field.name()),
            Self::Setting(id) => write!(f, "setting #{}", id.0),
            Self::LocalSetting(id) => write!(f, "note setting #{}", id.0),
            Self::Mark(id) => write!(f, "mark #{}", id.0),
            Self::ObjectField(field) => write!(f, "object field `{}`", field.name()),
            Self::Kind(kind) => write!(f, "event kind {kind:?}"),
            Self::Event => f.write_str("event"),
        }
    }
}

/// A builder refused a call.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BuildError {
    /// The part id is not declared.
    #[error("unknown part `{0}`")]
    UnknownPart(String),
    /// The value has the wrong form for the target.
    #[error("{target} does not accept {found}")]
    UnexpectedValue {
        /// The target applied.
        target: Target,
        /// A description of the rejected value.
        found: String,
    },
    /// The action makes no sense for the target.
    #[error("{action:?} cannot be applied to {target}")]
    UnsupportedAction {
        /// The target applied.
        target: Target,
        /// The refused action.
        action: Action,
    },
    /// A division by zero or an arithmetic overflow.
    #[error("arithmetic on {0} failed")]
    Arithmetic(Target),
    /// A call arrived in an order the builder cannot follow.
    #[error("unbalanced builder call: {0}")]
    Unbalanced(String),
    /// An object was committed without a required field.
    #[error("{kind} is missing `{field}`")]
    MissingField {
        /// The object kind name.
        kind: String,
        /// The missing field name.
        field: String,
    },
    /// The referenced setting or mark is unknown to the builder.
    #[error("unknown {0}")]
    UnknownTarget(Target),
}

/// Result of one builder call.
pub type BuildResult = Result<(), BuildError>;

/// The abstract score-construction API.
pub trait ScoreBuilder {
    /// Selects the target the following payload belongs to.
    fn set_current(&mut self, target: Target) -> BuildResult;
    /// Supplies a scalar payload.
    fn set_value(&mut self, value: Scalar) -> BuildResult;
    /// Starts a list payload, or a nested list inside one.
    fn begin_list(&mut self) -> BuildResult;
    /// Appends an item to the innermost open list.
    fn add_list_item(&mut self, value: Scalar) -> BuildResult;
    /// Ends the innermost open list.
    fn end_list(&mut self) -> BuildResult;
    /// Applies the pending payload, if any, to `target`.
    fn apply(&mut self, target: Target, action: Action) -> BuildResult;
    /// Starts a structural object.
    fn start_object(&mut self, kind: ObjectKind) -> BuildResult;
    /// Finishes the innermost structural object.
    fn commit_object(&mut self) -> BuildResult;
    /// Opens a region: following field changes apply to its span.
    fn start_region(&mut self, id: RegionId) -> BuildResult;
    /// Closes a region.
    fn end_region(&mut self, id: RegionId) -> BuildResult;
}

impl<T: ScoreBuilder + ?Sized> ScoreBuilder for &mut T {
    fn set_current(&mut self, target: Target) -> BuildResult {
        T::set_current(self, target)
    }
    fn set_value(&mut self, value: Scalar) -> BuildResult {
        T::set_value(self, value)
    }
    fn begin_list(&mut self) -> BuildResult {
        T::begin_list(self)
    }
    fn add_list_item(&mut self, value: Scalar) -> BuildResult {
        T::add_list_item(self, value)
    }
    fn end_list(&mut self) -> BuildResult {
        T::end_list(self)
    }
    fn apply(&mut self, target: Target, action: Action) -> BuildResult {
        T::apply(self, target, action)
    }
    fn start_object(&mut self, kind: ObjectKind) -> BuildResult {
        T::start_object(self, kind)
    }
    fn commit_object(&mut self) -> BuildResult {
        T::commit_object(self)
    }
    fn start_region(&mut self, id: RegionId) -> BuildResult {
        T::start_region(self, id)
    }
    fn end_region(&mut self, id: RegionId) -> BuildResult {
        T::end_region(self, id)
    }
}

/// One recorded builder call.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BuilderCall {
    /// [`ScoreBuilder::set_current`]
    SetCurrent(Target),
    /// [`ScoreBuilder::set_value`]
    SetValue(Scalar),
    /// [`ScoreBuilder::begin_list`]
    BeginList,
    /// [`ScoreBuilder::add_list_item`]
    AddListItem(Scalar),
    /// [`ScoreBuilder::end_list`]
    EndList,
    /// [`ScoreBuilder::apply`]
    Apply(Target, Action),
    /// [`ScoreBuilder::start_object`]
    StartObject(ObjectKind),
    /// [`ScoreBuilder::commit_object`]
    CommitObject,
    /// [`ScoreBuilder::start_region`]
    StartRegion(RegionId),
    /// [`ScoreBuilder::end_region`]
    EndRegion(RegionId),
}

/// A builder that accepts everything and records the calls.
///
/// It can also be told to reject every `apply` on one target, to observe how the decoder reports
/// builder errors.
#[derive(Debug, Clone, Default)]
pub struct RecordingBuilder {
    /// Calls in the order received.
    pub calls: Vec<BuilderCall>,
    reject: Option<Target>,
}

impl RecordingBuilder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every `apply` on `target` fail.
    #[must_use]
    pub const fn rejecting(mut self, target: Target) -> Self {
        self.reject = Some(target);
        self
    }

    /// Number of committed events (`Queue` or `Resume` applied to [`Target::Event`]).
    #[must_use]
    pub fn committed_events(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| {
                matches!(
                    call,
                    BuilderCall::Apply(Target::Event, Action::Queue | Action::Resume)
                )
            })
            .count()
    }
}

impl ScoreBuilder for RecordingBuilder {
    fn set_current(&mut self, target: Target) -> BuildResult {
        self.calls.push(BuilderCall::SetCurrent(target));
        Ok(())
    }
    fn set_value(&mut self, value: Scalar) -> BuildResult {
        self.calls.push(BuilderCall::SetValue(value));
        Ok(())
    }
    fn begin_list(&mut self) -> BuildResult {
        self.calls.push(BuilderCall::BeginList);
        Ok(())
    }
    fn add_list_item(&mut self, value: Scalar) -> BuildResult {
        self.calls.push(BuilderCall::AddListItem(value));
        Ok(())
    }
    fn end_list(&mut self) -> BuildResult {
        self.calls.push(BuilderCall::EndList);
        Ok(())
    }
    fn apply(&mut self, target: Target, action: Action) -> BuildResult {
        self.calls.push(BuilderCall::Apply(target, action));
        if self.reject == Some(target) {
            return Err(BuildError::UnsupportedAction { target, action });
        }
        Ok(())
    }
    fn start_object(&mut self, kind: ObjectKind) -> BuildResult {
        self.calls.push(BuilderCall::StartObject(kind));
        Ok(())
    }
    fn commit_object(&mut self) -> BuildResult {
        self.calls.push(BuilderCall::CommitObject);
        Ok(())
    }
    fn start_region(&mut self, id: RegionId) -> BuildResult {
        self.calls.push(BuilderCall::StartRegion(id));
        Ok(())
    }
    fn end_region(&mut self, id: RegionId) -> BuildResult {
        self.calls.push(BuilderCall::EndRegion(id));
        Ok(())
    }
}
