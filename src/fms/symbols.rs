//! Keyword tables consulted by the decoder.
//!
//! Four tables are built for every document: entry keywords (structural, type and meta
//! keywords), event fields, settings and marks. The last two come from the [`Registry`].

use std::collections::HashMap;

use super::{
    builder::EventField,
    registry::{MarkDef, Registry, SettingDef},
};

/// A case-insensitive map from keyword to handler.
#[derive(Debug, Clone)]
pub struct SymbolTable<H> {
    entries: HashMap<String, H>,
}

impl<H> Default for SymbolTable<H> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<H> SymbolTable<H> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `handler`, replacing any earlier binding of the identical name.
    pub fn register(&mut self, name: &str, handler: H) {
        self.entries.insert(name.to_ascii_lowercase(), handler);
    }

    /// Finds the handler bound to `token`, ignoring case.
    #[must_use]
    pub fn lookup(&self, token: &str) -> Option<&H> {
        self.entries.get(&token.to_ascii_lowercase())
    }

    /// Number of bound names, aliases included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<H: Clone> SymbolTable<H> {
    /// Binds every prefix of `name`, from one character up to the full name.
    pub fn register_abbreviated(&mut self, name: &str, handler: H) {
        for (end, _) in name.char_indices().skip(1) {
            self.register(&name[..end], handler.clone());
        }
        self.register(name, handler);
    }
}

/// Keywords starting a structural, type or meta entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKeyword {
    /// `note`: the next committed event is a note.
    Note,
    /// `rest`: the next committed event is a rest.
    Rest,
    /// `mark`: the next committed event only carries marks.
    Mark,
    /// `measure <...>`
    Measure,
    /// `inst <...>`
    Inst,
    /// `percinst <...>`
    PercInst,
    /// `part <...>`
    Part,
    /// `metapart <...>`
    MetaPart,
    /// `measdef <...>`
    MeasDef,
    /// `macro(name, params...) "body"`
    Macro,
    /// `include "path"`
    Include,
}

impl EntryKeyword {
    /// The full spelling of the keyword.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Rest => "rest",
            Self::Mark => "mark",
            Self::Measure => "measure",
            Self::Inst => "inst",
            Self::PercInst => "percinst",
            Self::Part => "part",
            Self::MetaPart => "metapart",
            Self::MeasDef => "measdef",
            Self::Macro => "macro",
            Self::Include => "include",
        }
    }
}

/// Abbreviable entry keywords. Later entries win a shared prefix.
const ABBREVIATED_ENTRIES: [EntryKeyword; 9] = [
    EntryKeyword::MetaPart,
    EntryKeyword::MeasDef,
    EntryKeyword::Measure,
    EntryKeyword::Mark,
    EntryKeyword::PercInst,
    EntryKeyword::Part,
    EntryKeyword::Inst,
    EntryKeyword::Rest,
    EntryKeyword::Note,
];

/// Event fields. Later entries win a shared prefix.
const ABBREVIATED_FIELDS: [EventField; 7] = [
    EventField::Part,
    EventField::Pitch,
    EventField::Dynamic,
    EventField::Duration,
    EventField::Grace,
    EventField::Voice,
    EventField::Time,
];

/// The four keyword tables of one document.
#[derive(Debug, Clone)]
pub struct Symbols {
    /// Structural, type and meta keywords.
    pub entries: SymbolTable<EntryKeyword>,
    /// Event field keywords.
    pub fields: SymbolTable<EventField>,
    /// Setting names.
    pub settings: SymbolTable<SettingDef>,
    /// Mark names.
    pub marks: SymbolTable<MarkDef>,
}

impl Symbols {
    /// Builds the tables, querying `registry` once.
    pub fn new(registry: &impl Registry) -> Self {
        let mut entries = SymbolTable::new();
        for keyword in ABBREVIATED_ENTRIES {
            entries.register_abbreviated(keyword.name(), keyword);
        }
        for keyword in ABBREVIATED_ENTRIES {
            entries.register(keyword.name(), keyword);
        }
        entries.register(EntryKeyword::Macro.name(), EntryKeyword::Macro);
        entries.register(EntryKeyword::Include.name(), EntryKeyword::Include);

        let mut fields = SymbolTable::new();
        for field in ABBREVIATED_FIELDS {
            fields.register_abbreviated(field.name(), field);
        }
        for field in ABBREVIATED_FIELDS {
            fields.register(field.name(), field);
        }

        let mut settings = SymbolTable::new();
        for def in registry.settings() {
            let name = def.name.clone();
            settings.register(&name, def);
        }
        let mut marks = SymbolTable::new();
        for def in registry.marks() {
            let name = def.name.clone();
            marks.register(&name, def);
        }

        Self {
            entries,
            fields,
            settings,
            marks,
        }
    }
}
