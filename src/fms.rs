//! The FMS score text format.
//!
//! Decoding runs in one pass over the text:
//!
//! - `lex` provides the character [`lex::Cursor`] and the lexeme scanners (words, numbers,
//!   strings, comments).
//! - `decode` dispatches every entry to a grammar rule and turns the result into calls on a
//!   [`builder::ScoreBuilder`]. Macros ([`macros`]), includes and regions ([`region`]) are handled
//!   on the way. Problems are collected as positioned warnings; only runaway nesting and an
//!   unreadable input file stop the load.
//! - `encode` walks a [`encode::ScoreSource`] and writes text in the same grammar.
//!
//! [`model::Score`] connects the two directions. The settings and marks a document may use come
//! from a [`registry::Registry`]; [`registry::Metadata::standard`] is a ready-made catalogue.
//!
//! Our policies are:
//!
//! - Support only UTF-8 (as required `String` to input).
//! - Never stop at the first error: skip to the next `;` or line end and keep going.
//! - Keep numbers exact. Integers and rationals stay what they are under arithmetic.

pub mod builder;
pub mod config;
pub mod decode;
pub mod encode;
pub mod lex;
pub mod macros;
pub mod model;
pub mod position;
pub mod prelude;
pub mod region;
pub mod registry;
pub mod symbols;
pub mod value;

use self::{
    decode::LoadOutput,
    model::Score,
    registry::{Metadata, Registry},
};

/// Output of parsing an FMS document into a [`Score`].
#[derive(Debug, Clone, PartialEq)]
pub struct FmsOutput {
    /// The decoded score.
    pub score: Score,
    /// How the load went.
    pub load: LoadOutput,
}

/// Parses an FMS document with the [standard](Metadata::standard) settings and marks.
///
/// Includes are read from the file system, relative to the working directory.
///
/// # Example
///
/// ```
/// use fms_rs::fms::{FmsOutput, parse_fms};
///
/// let FmsOutput { score, load } = parse_fms("title = \"Etude\" pitch 60; pitch 64;");
/// assert!(load.status.is_clean());
/// println!("Title: {:?}", score.setting("title"));
/// println!("Warnings: {:?}", load.warnings);
/// ```
pub fn parse_fms(source: &str) -> FmsOutput {
    parse_fms_with_registry(source, &Metadata::standard())
}

/// Parses an FMS document knowing the settings and marks of `registry`.
///
/// A step of [`parse_fms`]
pub fn parse_fms_with_registry(source: &str, registry: &impl Registry) -> FmsOutput {
    let mut score = Score::new(registry);
    let load = decode::decode_str(source, registry, &mut score);
    FmsOutput { score, load }
}
