//! Per-entry fragments and non-repeat suppression.

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;

use crate::fms::{
    builder::{EventKind, ObjectField},
    config::{Category, EncodeConfig},
    model::{Event, FieldValue, MarkInstance, Measure, ObjectDef},
    value::{Number, Pitch, SettingValue, quote},
};

/// One piece of an output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Fragment {
    /// Ordinal of the entry the fragment belongs to.
    pub(super) seq: usize,
    /// Whether the line ends after this fragment.
    pub(super) line_break: bool,
    pub(super) text: String,
}

/// Sorts `fragments` and joins them into lines. The `;` terminator is glued to the fragment
/// before it.
pub(super) fn into_lines(mut fragments: Vec<Fragment>) -> Vec<String> {
    fragments.sort_by_key(|fragment| (fragment.seq, fragment.line_break));
    let mut lines = Vec::new();
    let mut line = String::new();
    for fragment in fragments {
        if !line.is_empty() && fragment.text != ";" {
            line.push(' ');
        }
        line.push_str(&fragment.text);
        if fragment.line_break {
            lines.push(std::mem::take(&mut line));
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Writes an object as `<field value ... setting: value>`.
pub(super) fn object_text(object: &ObjectDef) -> String {
    let fields = object
        .fields
        .iter()
        .map(|(field, value)| format!("{} {}", field.name(), field_text(*field, value)));
    let settings = object
        .settings
        .iter()
        .map(|(name, value)| format!("{name}: {value}"));
    format!("<{}>", fields.chain(settings).join(" "))
}

fn field_text(field: ObjectField, value: &FieldValue) -> String {
    match value {
        FieldValue::Ref(id) => quote(id),
        FieldValue::Object(object) if !field.is_list() => object_text(object),
        FieldValue::Object(object) => format!("({})", object_text(object)),
        FieldValue::Objects(objects) => format!("({})", objects.iter().map(object_text).join(" ")),
    }
}

fn mark_text(mark: &MarkInstance) -> String {
    let args = mark.args.iter().map(ToString::to_string);
    format!(
        "[{}]",
        std::iter::once(mark.name.clone()).chain(args).join(" ")
    )
}

fn pitch_text(pitch: &Pitch) -> String {
    match pitch {
        Pitch::Number(n) => n.to_string(),
        Pitch::Note(s) => quote(s),
    }
}

fn voice_text(voices: &[Number]) -> Option<String> {
    match voices {
        [] => None,
        [voice] => Some(voice.to_string()),
        many => Some(format!("({})", many.iter().join(" "))),
    }
}

/// Turns events and measures into fragments, writing only what changed since the previous
/// entry. The state it keeps is the state a decoder would hold after reading the output so far.
#[derive(Debug)]
pub(super) struct FragmentWriter<'c> {
    config: &'c EncodeConfig,
    /// Last text written per field category. Absent when the field is unset.
    fields: BTreeMap<Category, String>,
    /// Last text written per local setting.
    locals: BTreeMap<String, String>,
    fragments: Vec<Fragment>,
    seq: usize,
}

impl<'c> FragmentWriter<'c> {
    pub(super) const fn new(config: &'c EncodeConfig) -> Self {
        Self {
            config,
            fields: BTreeMap::new(),
            locals: BTreeMap::new(),
            fragments: Vec::new(),
            seq: 0,
        }
    }

    pub(super) fn into_fragments(self) -> Vec<Fragment> {
        self.fragments
    }

    fn push(&mut self, text: String, line_break: bool) {
        self.fragments.push(Fragment {
            seq: self.seq,
            line_break,
            text,
        });
    }

    fn end_entry(&mut self, text: String) {
        self.push(text, true);
        self.seq += 1;
    }

    /// Writes `keyword value` if it changed, or `keyword none` if the field became unset. Returns
    /// whether anything was written.
    fn field(&mut self, category: Category, keyword: &str, value: Option<String>) -> bool {
        match value {
            Some(value) => {
                if self.fields.get(&category) == Some(&value) && !self.config.repeats(category) {
                    return false;
                }
                self.push(format!("{keyword} {value}"), false);
                self.fields.insert(category, value);
                true
            }
            None => {
                let cleared = self.fields.remove(&category).is_some();
                if cleared {
                    self.push(format!("{keyword} none"), false);
                }
                cleared
            }
        }
    }

    fn local_settings(&mut self, settings: &[(String, SettingValue)]) {
        let current: BTreeMap<&str, String> = settings
            .iter()
            .map(|(name, value)| (name.as_str(), value.to_string()))
            .collect();
        let names: BTreeSet<String> = self
            .locals
            .keys()
            .cloned()
            .chain(current.keys().map(|name| (*name).to_string()))
            .collect();
        let repeat = self.config.repeats(Category::Settings);
        for name in names {
            match current.get(name.as_str()) {
                Some(value) => {
                    if !repeat && self.locals.get(&name) == Some(value) {
                        continue;
                    }
                    self.push(format!("{name}: {value}"), false);
                    self.locals.insert(name, value.clone());
                }
                None => {
                    self.push(format!("{name}: none"), false);
                    self.locals.remove(&name);
                }
            }
        }
    }

    pub(super) fn event(&mut self, event: &Event) {
        self.field(Category::Part, "part", event.part.as_deref().map(quote));
        self.field(Category::Time, "time", event.time.map(|n| n.to_string()));
        self.field(Category::Grace, "grace", event.grace.map(|n| n.to_string()));
        self.field(
            Category::Duration,
            "duration",
            event.duration.map(|n| n.to_string()),
        );
        let pitched = event.kind == EventKind::Note
            && self.field(Category::Pitch, "pitch", event.pitch.as_ref().map(pitch_text));
        self.field(
            Category::Dynamic,
            "dynamic",
            event.dynamic.map(|n| n.to_string()),
        );
        self.field(Category::Voice, "voice", voice_text(&event.voices));
        self.local_settings(&event.settings);
        for mark in &event.marks {
            self.push(mark_text(mark), false);
        }
        match event.kind {
            // A note needs a pitch, a mark or its keyword, or `;` only ends the statement.
            EventKind::Note if pitched || !event.marks.is_empty() => {}
            EventKind::Note => self.push("note".to_string(), false),
            EventKind::Rest => self.push("rest".to_string(), false),
            EventKind::Mark => self.push("mark".to_string(), false),
        }
        self.end_entry(";".to_string());
    }

    /// A measure takes the current time and duration, so those are written first.
    pub(super) fn measure(&mut self, measure: &Measure) {
        self.field(Category::Time, "time", measure.time.map(|n| n.to_string()));
        self.field(
            Category::Duration,
            "duration",
            measure.duration.map(|n| n.to_string()),
        );
        self.end_entry(format!("measure {}", object_text(&measure.def)));
    }
}
