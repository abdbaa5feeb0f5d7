//! Writing scores as FMS text.
//!
//! The output has four sections, separated by blank lines: a header comment, global settings,
//! structural declarations, and the event stream. Within the event stream an attribute is only
//! written when it differs from what the previous entry left behind, so decoding the output
//! rebuilds the same events.

mod fragment;
mod wrap;

use std::{collections::BTreeSet, io};

use itertools::Itertools;
use thiserror::Error;
use tracing::debug;

use self::{
    fragment::{FragmentWriter, into_lines, object_text},
    wrap::wrap_line,
};
use super::{
    builder::ObjectKind,
    config::{EncodeConfig, EventOrder, SettingsScope},
    model::{Event, Measure, ObjectDef},
    registry::Registry,
    value::{Number, SettingValue},
};

/// Kinds of top-level declarations, in the order they are written.
const DECLARATION_ORDER: [ObjectKind; 5] = [
    ObjectKind::PercInst,
    ObjectKind::Inst,
    ObjectKind::Part,
    ObjectKind::MetaPart,
    ObjectKind::MeasDef,
];

/// A score that can be written out.
pub trait ScoreSource {
    /// Global settings in `scope`, as `(name, value)` in registry order.
    fn settings(&self, scope: SettingsScope) -> Vec<(&str, &SettingValue)>;

    /// Declared objects of `kind`, in declaration order.
    fn objects(&self, kind: ObjectKind) -> &[ObjectDef];

    /// Events sorted by onset.
    fn events(&self) -> &[Event];

    /// Measures sorted by onset.
    fn measures(&self) -> &[Measure];

    /// Part ids in the order their events are written by [`EventOrder::ByPart`]. Defaults to the
    /// declared parts, then the declared metaparts.
    fn part_order(&self) -> Vec<String> {
        [ObjectKind::Part, ObjectKind::MetaPart]
            .into_iter()
            .flat_map(|kind| self.objects(kind).iter().filter_map(ObjectDef::id))
            .map(str::to_string)
            .collect()
    }
}

/// An error occurred when writing a score.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The output could not be written.
    #[error("cannot write the score: {0}")]
    Io(#[from] io::Error),
}

/// An event or a measure in the merged stream.
#[derive(Debug, Clone, Copy)]
enum Entry<'s> {
    Measure(&'s Measure),
    Event(&'s Event),
}

impl Entry<'_> {
    fn onset(self) -> Number {
        match self {
            Self::Measure(measure) => measure.onset(),
            Self::Event(event) => event.onset(),
        }
    }
}

fn event_lines<S: ScoreSource + ?Sized>(score: &S, config: &EncodeConfig) -> Vec<String> {
    let mut writer = FragmentWriter::new(config);
    match config.event_order {
        EventOrder::ByPart => {
            for measure in score.measures() {
                writer.measure(measure);
            }
            let events = score.events();
            let parts = score
                .part_order()
                .into_iter()
                .map(Some)
                .chain(events.iter().filter_map(|event| event.part.clone()).map(Some))
                .chain(std::iter::once(None))
                .unique();
            for part in parts {
                for event in events.iter().filter(|event| event.part == part) {
                    writer.event(event);
                }
            }
        }
        EventOrder::Interleaved => {
            let measures = score.measures().iter().map(Entry::Measure);
            let events = score.events().iter().map(Entry::Event);
            for entry in measures.merge_by(events, |a, b| a.onset() <= b.onset()) {
                match entry {
                    Entry::Measure(measure) => writer.measure(measure),
                    Entry::Event(event) => writer.event(event),
                }
            }
        }
    }
    into_lines(writer.into_fragments())
}

fn push_section(lines: &mut Vec<String>, section: Vec<String>) {
    if !section.is_empty() {
        lines.push(String::new());
        lines.extend(section);
    }
}

/// The unwrapped lines of the output.
fn logical_lines<S: ScoreSource + ?Sized, R: Registry + ?Sized>(
    score: &S,
    meta: &R,
    config: &EncodeConfig,
) -> Vec<String> {
    let mut lines = vec![
        format!("// fms-rs {}", env!("CARGO_PKG_VERSION")),
        "// score text".to_string(),
    ];

    let known: BTreeSet<String> = meta
        .settings()
        .into_iter()
        .map(|def| def.name.to_ascii_lowercase())
        .collect();
    let settings = score
        .settings(config.settings_scope)
        .into_iter()
        .filter(|(name, _)| known.contains(&name.to_ascii_lowercase()))
        .map(|(name, value)| format!("{name} = {value}"))
        .collect();
    push_section(&mut lines, settings);

    let declarations = DECLARATION_ORDER
        .into_iter()
        .flat_map(|kind| {
            score
                .objects(kind)
                .iter()
                .map(move |object| format!("{} {}", kind.name(), object_text(object)))
        })
        .collect();
    push_section(&mut lines, declarations);

    push_section(&mut lines, event_lines(score, config));
    lines
}

/// Writes `score` as FMS text.
///
/// Settings unknown to `meta` are left out.
///
/// ```
/// use fms_rs::fms::prelude::*;
///
/// let meta = Metadata::standard();
/// let mut score = Score::new(&meta);
/// let _ = decode_str("tempo = 96 time 0 dur 1/4 pitch 60; time 1/4 note;", &meta, &mut score);
/// let text = encode(&score, &meta, &EncodeConfig::default());
/// assert!(text.contains("tempo = 96"));
/// assert!(text.contains("time 1/4 note;"));
/// ```
#[must_use]
pub fn encode<S: ScoreSource + ?Sized, R: Registry + ?Sized>(
    score: &S,
    meta: &R,
    config: &EncodeConfig,
) -> String {
    debug!(
        events = score.events().len(),
        measures = score.measures().len(),
        "encoding score"
    );
    let mut out = String::new();
    for line in logical_lines(score, meta, config) {
        for wrapped in wrap_line(&line, config.wrap_width, config.indent_width) {
            out.push_str(&wrapped);
            out.push('\n');
        }
    }
    out
}

/// Writes `score` as FMS text into `out`.
///
/// # Errors
///
/// [`EncodeError::Io`] if `out` fails.
pub fn write_score<S: ScoreSource + ?Sized, R: Registry + ?Sized>(
    score: &S,
    meta: &R,
    config: &EncodeConfig,
    mut out: impl io::Write,
) -> Result<(), EncodeError> {
    out.write_all(encode(score, meta, config).as_bytes())?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fms::{
        builder::ObjectField,
        model::FieldValue,
        registry::Metadata,
        value::Pitch,
    };

    struct Fixed {
        parts: Vec<ObjectDef>,
        events: Vec<Event>,
        measures: Vec<Measure>,
    }

    impl ScoreSource for Fixed {
        fn settings(&self, _scope: SettingsScope) -> Vec<(&str, &SettingValue)> {
            Vec::new()
        }

        fn objects(&self, kind: ObjectKind) -> &[ObjectDef] {
            if kind == ObjectKind::Part {
                &self.parts
            } else {
                &[]
            }
        }

        fn events(&self) -> &[Event] {
            &self.events
        }

        fn measures(&self) -> &[Measure] {
            &self.measures
        }
    }

    fn part(id: &str) -> ObjectDef {
        ObjectDef::new(ObjectKind::Part).with_field(ObjectField::Id, FieldValue::Ref(id.into()))
    }

    fn note(part: &str, time: i64, pitch: i64) -> Event {
        Event {
            part: Some(part.into()),
            time: Some(Number::Int(time)),
            pitch: Some(Pitch::Number(Number::Int(pitch))),
            ..Event::default()
        }
    }

    fn fixture() -> Fixed {
        Fixed {
            parts: vec![part("a"), part("b")],
            events: vec![note("b", 0, 50), note("a", 0, 60), note("b", 1, 52)],
            measures: vec![Measure {
                time: Some(Number::Int(0)),
                duration: Some(Number::Int(4)),
                def: ObjectDef::new(ObjectKind::Measure),
            }],
        }
    }

    fn body(text: &str) -> Vec<&str> {
        text.lines().filter(|line| !line.starts_with("//")).collect()
    }

    #[test]
    fn by_part_follows_declaration_order() {
        let text = encode(&fixture(), &Metadata::standard(), &EncodeConfig::default());
        assert_eq!(
            body(&text),
            vec![
                "",
                "part <id a>",
                "part <id b>",
                "",
                "time 0 duration 4 measure <>",
                "part a duration none pitch 60;",
                "part b pitch 50;",
                "time 1 pitch 52;",
            ]
        );
    }

    #[test]
    fn interleaved_merges_by_time() {
        let config = EncodeConfig::default().event_order(EventOrder::Interleaved);
        let text = encode(&fixture(), &Metadata::standard(), &config);
        assert_eq!(
            &body(&text)[4..],
            &[
                "time 0 duration 4 measure <>",
                "part b duration none pitch 50;",
                "part a pitch 60;",
                "part b time 1 pitch 52;",
            ]
        );
    }

    #[test]
    fn header_comes_first() {
        let text = encode(&fixture(), &Metadata::standard(), &EncodeConfig::default());
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some(format!("// fms-rs {}", env!("CARGO_PKG_VERSION")).as_str())
        );
        assert_eq!(lines.next(), Some("// score text"));
    }

    #[test]
    fn write_score_reports_io_errors() {
        struct Broken;
        impl io::Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::other("disk full"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let result = write_score(
            &fixture(),
            &Metadata::standard(),
            &EncodeConfig::default(),
            Broken,
        );
        assert!(matches!(result, Err(EncodeError::Io(_))));

        let mut buffer = Vec::new();
        write_score(
            &fixture(),
            &Metadata::standard(),
            &EncodeConfig::default(),
            &mut buffer,
        )
        .unwrap();
        assert!(String::from_utf8(buffer).unwrap().ends_with("pitch 52;\n"));
    }
}
