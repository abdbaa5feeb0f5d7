//! The FMS score text format codec.
//!
//! FMS is a small scripting language describing a music score: notes, rests and marks entered as
//! field changes followed by `;`, structural objects (instruments, parts, metaparts, measures) in
//! `<...>` blocks, global and per-note settings, bracketed regions, text macros and includes.
//!
//! This crate provides both directions of the format:
//!
//! - [`fms::decode`] parses source text into calls on a [`fms::builder::ScoreBuilder`]. It expands
//!   macros, follows includes and recovers from errors, reporting every problem with a position.
//! - [`fms::encode`] writes a score (anything implementing [`fms::encode::ScoreSource`]) back into
//!   the same grammar.
//!
//! [`fms::model::Score`] is an in-memory score implementing both sides, so text can be decoded,
//! inspected and re-encoded without any other collaborator:
//!
//! ```
//! use fms_rs::fms::prelude::*;
//!
//! let meta = Metadata::standard();
//! let mut score = Score::new(&meta);
//! let output = decode_str("time 0 dur 1 pitch 60; time 1 pitch 62;", &meta, &mut score);
//! assert!(output.status.is_clean());
//! assert_eq!(score.events().len(), 2);
//!
//! let text = encode(&score, &meta, &EncodeConfig::default());
//! assert!(text.contains("pitch 62"));
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(feature = "diagnostics")]
#[cfg_attr(docsrs, doc(cfg(feature = "diagnostics")))]
pub mod diagnostics;
pub mod fms;
