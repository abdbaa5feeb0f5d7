//! Entry rules.
//!
//! Each entry is tried against these rules in order, and the first that matches consumes it:
//!
//! 1. event field, `[+-*/]FIELD [=|:] (VALUE | {label VALUE)`,
//! 2. structural, type and meta keywords (`note`, `inst <...>`, `macro(...)`, `include`),
//! 3. inline marks and the `;` / `,` terminators,
//! 4. region brackets `{label` and `}label`,
//! 5. settings, `name = value` (global) and `name : value` (per note),
//! 6. macro invocations, and finally a bare word switching the current part.
//!
//! A rule that does not match restores the cursor. Values are scanned completely before the first
//! builder call of an entry, so a malformed entry leaves no half-applied state behind.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::{
    DecodeWarning, FatalError, MAX_NESTING_DEPTH,
    loader::SourceLoader,
    values::{
        FieldInput, Scan, eat_keyword, expect, expected, field_value, list, mark_args,
        separator, setting_value, text, trivia,
    },
};
use crate::fms::{
    builder::{Action, EventField, EventKind, ObjectField, ObjectKind, ScoreBuilder, Target},
    config::DecodeConfig,
    lex::{Cursor, is_word_start},
    macros::MacroEngine,
    position::{FilePosition, Positioned},
    region::RegionTracker,
    registry::{Registry, SettingId},
    symbols::{EntryKeyword, Symbols},
    value::{Scalar, SettingValue, is_word_char},
};

/// Why an entry failed.
pub(super) enum Failure {
    /// Recorded; the decoder resynchronises and goes on.
    Warning(Positioned<DecodeWarning>),
    /// Aborts the load.
    Fatal(Positioned<FatalError>),
}

impl From<Positioned<DecodeWarning>> for Failure {
    fn from(warning: Positioned<DecodeWarning>) -> Self {
        Self::Warning(warning)
    }
}

type EntryResult<T = ()> = Result<T, Failure>;

/// A structural object scanned from a `<...>` block.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ObjectNode {
    pub(super) kind: ObjectKind,
    pub(super) entries: Vec<ObjectEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum ObjectEntry {
    Field(ObjectField, FieldNode),
    Setting(SettingId, SettingValue),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum FieldNode {
    Ref(String),
    Object(ObjectNode),
    Objects(Vec<ObjectNode>),
}

/// State owned by one document or included file. Macro expansions share the state of the unit
/// they were invoked in.
#[derive(Debug, Default)]
pub(super) struct UnitState {
    macros: MacroEngine,
    regions: RegionTracker,
    dir: Option<PathBuf>,
}

impl UnitState {
    pub(super) fn new(dir: Option<&Path>) -> Self {
        Self {
            dir: dir.map(Path::to_path_buf),
            ..Self::default()
        }
    }
}

/// State shared by the whole load.
pub(super) struct DocumentParseState<'a, B> {
    symbols: Symbols,
    pub(super) builder: B,
    loader: &'a dyn SourceLoader,
    tab_width: usize,
    warnings: Vec<Positioned<DecodeWarning>>,
    /// Start of the entry being decoded, reported with builder refusals.
    pub(super) entry_position: FilePosition,
}

impl<'a, B: ScoreBuilder> DocumentParseState<'a, B> {
    pub(super) fn new(
        registry: &impl Registry,
        builder: B,
        loader: &'a dyn SourceLoader,
        config: &DecodeConfig,
    ) -> Self {
        Self {
            symbols: Symbols::new(registry),
            builder,
            loader,
            tab_width: config.tab_width.clamp(1, 20),
            warnings: Vec::new(),
            entry_position: FilePosition::start_of(config.source_name.as_str()),
        }
    }

    pub(super) fn into_warnings(self) -> Vec<Positioned<DecodeWarning>> {
        self.warnings
    }

    pub(super) fn record(&mut self, warning: Positioned<DecodeWarning>) {
        trace!(%warning, "recovering from decode error");
        self.warnings.push(warning);
    }

    /// Decodes a whole document or included file, then flags its unclosed regions.
    pub(super) fn parse_document(
        &mut self,
        unit: &mut UnitState,
        cursor: &mut Cursor<'_>,
    ) -> Result<(), Positioned<FatalError>> {
        self.parse_unit(unit, cursor)?;
        for label in unit.regions.unclosed() {
            self.record(Positioned::new(
                DecodeWarning::UnclosedRegion(label),
                cursor.snapshot(),
            ));
        }
        Ok(())
    }

    /// Decodes entries until the cursor is exhausted.
    fn parse_unit(
        &mut self,
        unit: &mut UnitState,
        cursor: &mut Cursor<'_>,
    ) -> Result<(), Positioned<FatalError>> {
        loop {
            if let Err(warning) = trivia(cursor) {
                self.record(warning);
            }
            if cursor.is_end() {
                return Ok(());
            }
            self.entry_position = cursor.snapshot();
            match self.entry(unit, cursor) {
                Ok(()) => {}
                Err(Failure::Fatal(fatal)) => return Err(fatal),
                Err(Failure::Warning(warning)) => {
                    self.record(warning);
                    cursor.skip_to_recovery_point();
                }
            }
        }
    }

    fn entry(&mut self, unit: &mut UnitState, cursor: &mut Cursor<'_>) -> EntryResult {
        if self.field_entry(unit, cursor)?
            || self.keyword_entry(unit, cursor)?
            || self.note_entry(cursor)?
            || self.bracket_entry(unit, cursor)?
            || self.setting_entry(cursor)?
            || self.word_entry(unit, cursor)?
        {
            return Ok(());
        }
        expected(cursor, "an entry").map_err(Failure::from)
    }

    fn field_entry(&mut self, unit: &mut UnitState, cursor: &mut Cursor<'_>) -> EntryResult<bool> {
        let checkpoint = cursor.save_checkpoint();
        let action = match (cursor.peek(), cursor.peek_nth(1)) {
            (Some(op @ ('+' | '-' | '*' | '/')), Some(next)) if is_word_start(next) => {
                cursor.bump();
                match op {
                    '+' => Action::Increment,
                    '-' => Action::Decrement,
                    '*' => Action::Multiply,
                    _ => Action::Divide,
                }
            }
            _ => Action::Set,
        };
        let Some((word, &field)) = cursor
            .scan_word()
            .and_then(|word| Some((word, self.symbols.fields.lookup(word)?)))
        else {
            cursor.restore_checkpoint(checkpoint);
            return Ok(false);
        };
        if shadowed_by_macro(unit, word, field.name()) {
            cursor.restore_checkpoint(checkpoint);
            return Ok(false);
        }
        separator(cursor)?;
        if cursor.peek() == Some('<') {
            cursor.restore_checkpoint(checkpoint);
            return Ok(false);
        }

        let label = if cursor.eat('{') {
            let label = cursor.eat_while(is_word_char).to_string();
            trivia(cursor)?;
            Some(label)
        } else {
            None
        };
        let at = cursor.snapshot();
        let input = field_value(cursor, field)?;
        let numeric = matches!(input, FieldInput::Scalar(Scalar::Number(_)));
        if action != Action::Set && !numeric {
            return Err(Positioned::new(
                DecodeWarning::OperatorNotAllowed {
                    field: field.name().to_string(),
                },
                at,
            )
            .into());
        }

        if let Some(label) = label {
            let id = unit.regions.open(&label);
            self.call(|b| b.start_region(id));
        }
        let target = Target::Field(field);
        match input {
            FieldInput::Clear => self.emit_bare(target, Action::Clear),
            FieldInput::Scalar(value) => self.emit_scalar(target, action, value),
            FieldInput::List(voices) => self.emit_list(
                target,
                action,
                voices.into_iter().map(Scalar::Number).collect(),
            ),
        }
        Ok(true)
    }

    fn keyword_entry(
        &mut self,
        unit: &mut UnitState,
        cursor: &mut Cursor<'_>,
    ) -> EntryResult<bool> {
        let checkpoint = cursor.save_checkpoint();
        let Some((word, &keyword)) = cursor
            .scan_word()
            .and_then(|word| Some((word, self.symbols.entries.lookup(word)?)))
        else {
            cursor.restore_checkpoint(checkpoint);
            return Ok(false);
        };
        if shadowed_by_macro(unit, word, keyword.name()) {
            cursor.restore_checkpoint(checkpoint);
            return Ok(false);
        }
        let kind = match keyword {
            EntryKeyword::Note => return self.kind_entry(EventKind::Note),
            EntryKeyword::Rest => return self.kind_entry(EventKind::Rest),
            EntryKeyword::Mark => return self.kind_entry(EventKind::Mark),
            EntryKeyword::Macro => {
                macro_definition(unit, cursor)?;
                return Ok(true);
            }
            EntryKeyword::Include => {
                self.include(unit, cursor)?;
                return Ok(true);
            }
            EntryKeyword::Measure => ObjectKind::Measure,
            EntryKeyword::Inst => ObjectKind::Inst,
            EntryKeyword::PercInst => ObjectKind::PercInst,
            EntryKeyword::Part => ObjectKind::Part,
            EntryKeyword::MetaPart => ObjectKind::MetaPart,
            EntryKeyword::MeasDef => ObjectKind::MeasDef,
        };
        trivia(cursor)?;
        if cursor.peek() != Some('<') {
            cursor.restore_checkpoint(checkpoint);
            return Ok(false);
        }
        let node = self.object(cursor, kind)?;
        self.emit_object(node);
        Ok(true)
    }

    fn kind_entry(&mut self, kind: EventKind) -> EntryResult<bool> {
        self.emit_bare(Target::Kind(kind), Action::Set);
        Ok(true)
    }

    /// Scans a `<...>` block of `kind`. The cursor is at `<`.
    fn object(&self, cursor: &mut Cursor<'_>, kind: ObjectKind) -> Scan<ObjectNode> {
        expect(cursor, '<')?;
        let mut entries = Vec::new();
        loop {
            trivia(cursor)?;
            if cursor.eat('>') {
                return Ok(ObjectNode { kind, entries });
            }
            if cursor.is_end() {
                return Err(Positioned::new(
                    DecodeWarning::UnterminatedObject(kind.name().to_string()),
                    cursor.snapshot(),
                ));
            }
            if cursor.eat(',') {
                continue;
            }
            let at = cursor.snapshot();
            let Some(word) = cursor.scan_word() else {
                return expected(cursor, "a field name or `>`");
            };
            if let Some(field) = ObjectField::from_keyword(word).filter(|f| kind.accepts(*f)) {
                separator(cursor)?;
                let value = self.object_field(cursor, field)?;
                entries.push(ObjectEntry::Field(field, value));
            } else if let Some(def) = self.symbols.settings.lookup(word) {
                separator(cursor)?;
                let value = setting_value(cursor, def)?;
                entries.push(ObjectEntry::Setting(def.id, value));
            } else {
                return Err(Positioned::new(
                    DecodeWarning::UnknownObjectField {
                        kind: kind.name().to_string(),
                        field: word.to_string(),
                    },
                    at,
                ));
            }
        }
    }

    fn object_field(&self, cursor: &mut Cursor<'_>, field: ObjectField) -> Scan<FieldNode> {
        let element = field.element_kind();
        match (cursor.peek(), element) {
            (Some('<'), Some(kind)) => {
                let node = self.object(cursor, kind)?;
                Ok(if field.is_list() {
                    FieldNode::Objects(vec![node])
                } else {
                    FieldNode::Object(node)
                })
            }
            (Some('('), Some(kind)) if field.is_list() => {
                let nodes = list(cursor, |c| {
                    if c.peek() == Some('<') {
                        self.object(c, kind)
                    } else {
                        expected(c, &format!("an inline {}", kind.name()))
                    }
                })?;
                Ok(FieldNode::Objects(nodes.unwrap_or_default()))
            }
            _ => match text(cursor)? {
                Some(id) => Ok(FieldNode::Ref(id)),
                None => expected(cursor, &format!("a value for `{}`", field.name())),
            },
        }
    }

    fn include(&mut self, unit: &UnitState, cursor: &mut Cursor<'_>) -> EntryResult {
        trivia(cursor)?;
        let at = cursor.snapshot();
        let Some(path) = text(cursor)? else {
            return expected(cursor, "a path").map_err(Failure::from);
        };
        let depth = cursor.depth() + 1;
        if depth > MAX_NESTING_DEPTH {
            return Err(Failure::Fatal(Positioned::new(
                FatalError::MacroRecursionLimit {
                    name: path,
                    limit: MAX_NESTING_DEPTH,
                },
                at,
            )));
        }
        let resolved = self.loader.resolve(unit.dir.as_deref(), &path);
        let source = match self.loader.load(&resolved) {
            Ok(source) => source,
            Err(error) => {
                self.record(Positioned::new(
                    DecodeWarning::IncludeFailed {
                        path,
                        message: error.to_string(),
                    },
                    at,
                ));
                return Ok(());
            }
        };
        debug!(path = %resolved.display(), depth, "including");
        let name = resolved.display().to_string();
        let mut included = UnitState::new(resolved.parent());
        let mut inner = Cursor::new(&source, &name, depth, self.tab_width);
        self.parse_document(&mut included, &mut inner)
            .map_err(Failure::Fatal)
    }

    fn note_entry(&mut self, cursor: &mut Cursor<'_>) -> EntryResult<bool> {
        let action = match (cursor.peek(), cursor.peek_nth(1)) {
            (Some(';'), _) => {
                cursor.bump();
                self.emit_bare(Target::Event, Action::Queue);
                return Ok(true);
            }
            (Some(','), _) => {
                cursor.bump();
                self.emit_bare(Target::Event, Action::Resume);
                return Ok(true);
            }
            (Some('['), _) => Action::Set,
            (Some('+'), Some('[')) => {
                cursor.bump();
                Action::Add
            }
            (Some('-'), Some('[')) => {
                cursor.bump();
                Action::Remove
            }
            _ => return Ok(false),
        };
        cursor.bump();
        trivia(cursor)?;
        let at = cursor.snapshot();
        let Some(name) = cursor.scan_word() else {
            return expected(cursor, "a mark name").map_err(Failure::from);
        };
        let Some(def) = self.symbols.marks.lookup(name).cloned() else {
            return Err(
                Positioned::new(DecodeWarning::UnknownMark(name.to_string()), at).into(),
            );
        };
        let args = if action == Action::Remove {
            Vec::new()
        } else {
            mark_args(cursor, &def)?
        };
        expect(cursor, ']')?;
        self.emit_list(Target::Mark(def.id), action, args);
        Ok(true)
    }

    fn bracket_entry(
        &mut self,
        unit: &mut UnitState,
        cursor: &mut Cursor<'_>,
    ) -> EntryResult<bool> {
        let at = cursor.snapshot();
        if cursor.eat('{') {
            let id = unit.regions.open(cursor.eat_while(is_word_char));
            self.call(|b| b.start_region(id));
            return Ok(true);
        }
        if cursor.eat('}') {
            let label = cursor.eat_while(is_word_char);
            let id = unit
                .regions
                .close(label)
                .map_err(|error| Positioned::new(DecodeWarning::from(error), at))?;
            self.call(|b| b.end_region(id));
            return Ok(true);
        }
        Ok(false)
    }

    fn setting_entry(&mut self, cursor: &mut Cursor<'_>) -> EntryResult<bool> {
        let checkpoint = cursor.save_checkpoint();
        let Some(def) = cursor
            .scan_word()
            .and_then(|word| self.symbols.settings.lookup(word))
            .cloned()
        else {
            cursor.restore_checkpoint(checkpoint);
            return Ok(false);
        };
        trivia(cursor)?;
        let target = if cursor.eat('=') {
            Target::Setting(def.id)
        } else if cursor.eat(':') {
            Target::LocalSetting(def.id)
        } else {
            cursor.restore_checkpoint(checkpoint);
            return Ok(false);
        };
        trivia(cursor)?;
        if eat_keyword(cursor, "none") {
            self.emit_bare(target, Action::Clear);
        } else {
            let value = setting_value(cursor, &def)?;
            self.emit_setting(target, value);
        }
        Ok(true)
    }

    fn word_entry(&mut self, unit: &mut UnitState, cursor: &mut Cursor<'_>) -> EntryResult<bool> {
        let at = cursor.snapshot();
        let Some(word) = cursor.scan_word() else {
            return Ok(false);
        };

        if cursor.peek() == Some('(') || unit.macros.is_defined(word) {
            let args = macro_arguments(cursor)?;
            return self.invoke(unit, word, args, &at).map(|()| true);
        }

        trivia(cursor)?;
        if matches!(cursor.peek(), Some('=' | ':')) {
            return Err(Positioned::new(DecodeWarning::UnknownSetting(word.to_string()), at).into());
        }
        self.emit_scalar(
            Target::Field(EventField::Part),
            Action::Set,
            Scalar::Str(word.to_string()),
        );
        Ok(true)
    }

    fn invoke(
        &mut self,
        unit: &mut UnitState,
        name: &str,
        mut args: Vec<String>,
        at: &FilePosition,
    ) -> EntryResult {
        // `name()` passes one empty argument, unless only a nullary body can take it.
        if args.len() == 1
            && args.first().is_some_and(String::is_empty)
            && !unit.macros.arities(name).contains(&1)
            && unit.macros.has_nullary(name)
        {
            args.clear();
        }
        let expansion = unit
            .macros
            .expand(name, &args)
            .map_err(|error| Positioned::new(DecodeWarning::from(error), at.clone()))?;
        let depth = at.depth + 1;
        if depth > MAX_NESTING_DEPTH {
            return Err(Failure::Fatal(Positioned::new(
                FatalError::MacroRecursionLimit {
                    name: name.to_string(),
                    limit: MAX_NESTING_DEPTH,
                },
                at.clone(),
            )));
        }
        debug!(name, depth, "expanding macro");
        let mut inner = Cursor::expansion(&expansion, at, self.tab_width);
        self.parse_unit(unit, &mut inner).map_err(Failure::Fatal)
    }
}

/// Whether a user macro hides the abbreviation `word` of the keyword `full`. Full keywords always
/// win.
fn shadowed_by_macro(unit: &UnitState, word: &str, full: &str) -> bool {
    !word.eq_ignore_ascii_case(full) && unit.macros.is_defined(word)
}

/// Scans `(arg, arg, ...)` if present. The arguments are raw text.
fn macro_arguments(cursor: &mut Cursor<'_>) -> Scan<Vec<String>> {
    if !cursor.eat('(') {
        return Ok(Vec::new());
    }
    let mut args = Vec::new();
    loop {
        let at = cursor.snapshot();
        let arg = cursor
            .scan_raw_argument()
            .map_err(|error| Positioned::new(DecodeWarning::from(error), at))?;
        args.push(arg.to_string());
        if cursor.eat(')') {
            return Ok(args);
        }
        if !cursor.eat(',') {
            return expected(cursor, "`)`");
        }
    }
}

/// Scans `(name, param, ...) "body"` after the `macro` keyword and defines it.
fn macro_definition(unit: &mut UnitState, cursor: &mut Cursor<'_>) -> Scan<()> {
    expect(cursor, '(')?;
    trivia(cursor)?;
    let Some(name) = cursor.scan_word() else {
        return expected(cursor, "a macro name");
    };
    let mut params = Vec::new();
    loop {
        trivia(cursor)?;
        if cursor.eat(')') {
            break;
        }
        if !cursor.eat(',') {
            return expected(cursor, "`,` or `)`");
        }
        trivia(cursor)?;
        cursor.eat(crate::fms::macros::PARAM_PREFIX);
        match cursor.scan_word() {
            Some(param) => params.push(param.to_string()),
            None => return expected(cursor, "a parameter name"),
        }
    }
    trivia(cursor)?;
    let body = match cursor.peek() {
        Some('"') => text(cursor)?,
        _ => None,
    };
    let Some(body) = body else {
        return expected(cursor, "a quoted macro body");
    };
    debug!(name, arity = params.len(), "defining macro");
    unit.macros.define(name, params, body);
    Ok(())
}
