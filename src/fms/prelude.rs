//! Prelude module for the FMS crate.
//!
//! You can use `use fms_rs::fms::prelude::*;` to import the commonly used types at once.

#[cfg(feature = "diagnostics")]
pub use crate::diagnostics::{SimpleSource, ToAriadne, emit_fms_warnings};

pub use super::{
    FmsOutput,
    builder::{
        Action, BuildError, BuildResult, BuilderCall, EventField, EventKind, ObjectField,
        ObjectKind, RecordingBuilder, ScoreBuilder, Target,
    },
    config::{Category, DecodeConfig, EncodeConfig, EventOrder, SettingsScope},
    decode::{
        DecodeWarning, Decoder, FatalError, FsLoader, LoadOutput, LoadStatus, MAX_NESTING_DEPTH,
        MemoryLoader, SourceLoader, decode_file, decode_str,
    },
    encode::{EncodeError, ScoreSource, encode, write_score},
    lex::{Cursor, CursorCheckpoint, LexError},
    macros::{MacroEngine, MacroError},
    model::{
        Event, FieldValue, MarkInstance, Measure, ObjectDef, Score, SettingEntry, SettingOrigin,
    },
    parse_fms, parse_fms_with_registry,
    position::{FilePosition, Positioned, PositionedExt},
    region::{RegionError, RegionId, RegionTracker},
    registry::{MarkDef, MarkId, Metadata, Registry, SettingDef, SettingId, Validator},
    symbols::{EntryKeyword, SymbolTable, Symbols},
    value::{MarkShape, Number, Pitch, Scalar, SettingValue, ValueShape},
};
