//! Decoding FMS text into builder calls.
//!
//! Decoding never stops at the first problem. A malformed entry is reported as a
//! [`DecodeWarning`] with its [`FilePosition`], the decoder skips past the next `;` or to the end of
//! the line, and carries on. Only two conditions abort the whole load, see [`FatalError`].

mod emit;
mod grammar;
pub mod loader;
mod values;

use std::path::Path;

use thiserror::Error;

pub use self::loader::{FsLoader, MemoryLoader, SourceLoader};
use self::grammar::{DocumentParseState, UnitState};
use super::{
    builder::{BuildError, ScoreBuilder},
    config::DecodeConfig,
    lex::{Cursor, LexError},
    macros::MacroError,
    position::{FilePosition, Positioned},
    region::RegionError,
    registry::Registry,
    value::ValueShape,
};

/// How deep macro expansions and includes may nest.
pub const MAX_NESTING_DEPTH: usize = 100;

/// A recoverable problem found while decoding.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DecodeWarning {
    /// A malformed lexeme.
    #[error(transparent)]
    Lex(#[from] LexError),
    /// Something else was found where a token was expected.
    #[error("expected {expected}, found {found}")]
    ExpectedToken {
        /// What the grammar wanted.
        expected: String,
        /// What was there instead.
        found: String,
    },
    /// The value does not fit the event field.
    #[error("invalid value for `{field}`: {found}")]
    InvalidFieldValue {
        /// The field name.
        field: String,
        /// What was there instead.
        found: String,
    },
    /// `+`, `-`, `*` or `/` on a field that is not numeric, or with `none`.
    #[error("operators cannot be applied to `{field}` here")]
    OperatorNotAllowed {
        /// The field name.
        field: String,
    },
    /// `name = value` where `name` is not a known setting.
    #[error("unknown setting `{0}`")]
    UnknownSetting(String),
    /// `[name]` where `name` is not a known mark.
    #[error("unknown mark `{0}`")]
    UnknownMark(String),
    /// The field does not exist on this kind of object.
    #[error("{kind} has no field `{field}`")]
    UnknownObjectField {
        /// The object kind.
        kind: String,
        /// The field name found.
        field: String,
    },
    /// A `<` block reached the end of the text.
    #[error("unterminated {0} block")]
    UnterminatedObject(String),
    /// The value is not written in the shape the setting expects.
    #[error("`{name}` expects a {expected}")]
    ShapeMismatch {
        /// The setting name.
        name: String,
        /// The expected shape.
        expected: ValueShape,
    },
    /// The registry refused the value.
    #[error("invalid value `{value}` for `{name}`")]
    InvalidSettingValue {
        /// The setting name.
        name: String,
        /// The refused value, as written back.
        value: String,
    },
    /// A macro could not be expanded.
    #[error(transparent)]
    Macro(#[from] MacroError),
    /// A region could not be closed.
    #[error(transparent)]
    Region(#[from] RegionError),
    /// A region was still open at the end of its document. The anonymous region has an empty
    /// label.
    #[error("region `{0}` never closed")]
    UnclosedRegion(String),
    /// An included file could not be read.
    #[error("cannot include `{path}`: {message}")]
    IncludeFailed {
        /// The path as written.
        path: String,
        /// The I/O error message.
        message: String,
    },
    /// The builder refused a call.
    #[error("builder rejected the entry: {0}")]
    BuilderRejected(#[from] BuildError),
}

/// A problem that aborts the whole load.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FatalError {
    /// Macro expansions or includes nested deeper than [`MAX_NESTING_DEPTH`].
    #[error("nesting deeper than {limit} levels at `{name}`")]
    MacroRecursionLimit {
        /// The macro or included path that went too deep.
        name: String,
        /// The limit.
        limit: usize,
    },
    /// The top-level file could not be read.
    #[error("cannot read `{path}`: {message}")]
    Unreadable {
        /// The path.
        path: String,
        /// The I/O error message.
        message: String,
    },
}

/// How a load ended.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LoadStatus {
    /// No warning was recorded.
    Clean,
    /// The whole text was read, but some entries were skipped.
    HadErrors,
    /// The load stopped early. No builder call was made after the failure.
    Fatal(Positioned<FatalError>),
}

impl LoadStatus {
    /// Whether the load was complete and without warnings.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        matches!(self, Self::Clean)
    }

    /// Whether the load was aborted.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Output of one decode call.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[must_use]
pub struct LoadOutput {
    /// How the load ended.
    pub status: LoadStatus,
    /// Every recoverable problem, in the order found.
    pub warnings: Vec<Positioned<DecodeWarning>>,
}

/// A configured decoder.
///
/// The free functions [`decode_str`] and [`decode_file`] use the default configuration and read
/// includes from the file system.
#[derive(Clone, Copy)]
pub struct Decoder<'a> {
    config: &'a DecodeConfig,
    loader: &'a dyn SourceLoader,
}

impl std::fmt::Debug for Decoder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decoder")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> Decoder<'a> {
    /// Creates a decoder with `config`, loading includes through `loader`.
    #[must_use]
    pub const fn new(config: &'a DecodeConfig, loader: &'a dyn SourceLoader) -> Self {
        Self { config, loader }
    }

    /// Decodes `text`. Includes are resolved against the working directory.
    pub fn decode_str(
        &self,
        text: &str,
        registry: &impl Registry,
        builder: impl ScoreBuilder,
    ) -> LoadOutput {
        self.run(text, &self.config.source_name, None, registry, builder)
    }

    /// Reads and decodes the file at `path`. Includes are resolved against its directory.
    pub fn decode_file(
        &self,
        path: &Path,
        registry: &impl Registry,
        builder: impl ScoreBuilder,
    ) -> LoadOutput {
        let name = path.display().to_string();
        match self.loader.load(path) {
            Ok(text) => self.run(&text, &name, path.parent(), registry, builder),
            Err(error) => LoadOutput {
                status: LoadStatus::Fatal(Positioned::new(
                    FatalError::Unreadable {
                        path: name.clone(),
                        message: error.to_string(),
                    },
                    FilePosition::start_of(name),
                )),
                warnings: Vec::new(),
            },
        }
    }

    fn run(
        &self,
        text: &str,
        name: &str,
        dir: Option<&Path>,
        registry: &impl Registry,
        builder: impl ScoreBuilder,
    ) -> LoadOutput {
        let mut state = DocumentParseState::new(registry, builder, self.loader, self.config);
        let mut unit = UnitState::new(dir);
        let mut cursor = Cursor::new(text, name, 0, self.config.tab_width.clamp(1, 20));
        let fatal = state.parse_document(&mut unit, &mut cursor).err();
        let warnings = state.into_warnings();
        let status = match fatal {
            Some(fatal) => LoadStatus::Fatal(fatal),
            None if warnings.is_empty() => LoadStatus::Clean,
            None => LoadStatus::HadErrors,
        };
        LoadOutput { status, warnings }
    }
}

/// Decodes `text` into `builder` with the default configuration.
///
/// ```
/// use fms_rs::fms::{builder::RecordingBuilder, decode::decode_str, registry::Metadata};
///
/// let mut recorder = RecordingBuilder::new();
/// let output = decode_str("pitch 60; pitch 62;", &Metadata::standard(), &mut recorder);
/// assert!(output.status.is_clean());
/// assert_eq!(recorder.committed_events(), 2);
/// ```
pub fn decode_str(text: &str, registry: &impl Registry, builder: impl ScoreBuilder) -> LoadOutput {
    let config = DecodeConfig::default();
    Decoder::new(&config, &FsLoader).decode_str(text, registry, builder)
}

/// Reads and decodes the file at `path` with the default configuration.
pub fn decode_file(
    path: impl AsRef<Path>,
    registry: &impl Registry,
    builder: impl ScoreBuilder,
) -> LoadOutput {
    let config = DecodeConfig::default();
    Decoder::new(&config, &FsLoader).decode_file(path.as_ref(), registry, builder)
}
