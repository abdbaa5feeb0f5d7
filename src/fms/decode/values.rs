//! Scanners for values: field values, shaped setting values and mark arguments.

use super::DecodeWarning;
use crate::fms::{
    builder::EventField,
    lex::{Cursor, LexError, is_word_start},
    position::Positioned,
    registry::{MarkDef, SettingDef},
    value::{MarkShape, Number, Scalar, SettingValue, ValueShape, is_word_char},
};

/// Result of a value scanner.
pub(super) type Scan<T> = Result<T, Positioned<DecodeWarning>>;

/// A decoded event field value.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum FieldInput {
    /// `none`
    Clear,
    /// One scalar.
    Scalar(Scalar),
    /// A voice list.
    List(Vec<Number>),
}

/// Describes what the cursor is looking at, for messages.
pub(super) fn describe(cursor: &Cursor<'_>) -> String {
    let rest = cursor.rest();
    match rest.chars().next() {
        None => "end of input".to_string(),
        Some(c) if is_word_start(c) => {
            let word: String = rest.chars().take_while(|&c| is_word_char(c)).collect();
            format!("`{word}`")
        }
        Some(c) => format!("`{c}`"),
    }
}

/// Fails with [`DecodeWarning::ExpectedToken`] at the cursor.
pub(super) fn expected<T>(cursor: &Cursor<'_>, what: &str) -> Scan<T> {
    Err(Positioned::new(
        DecodeWarning::ExpectedToken {
            expected: what.to_string(),
            found: describe(cursor),
        },
        cursor.snapshot(),
    ))
}

/// Runs a lexeme scanner, attaching the lexeme start to its error.
pub(super) fn lexed<'a, T>(
    cursor: &mut Cursor<'a>,
    scan: impl FnOnce(&mut Cursor<'a>) -> Result<T, LexError>,
) -> Scan<T> {
    let at = cursor.snapshot();
    scan(cursor).map_err(|error| Positioned::new(error.into(), at))
}

pub(super) fn trivia(cursor: &mut Cursor<'_>) -> Scan<()> {
    lexed(cursor, Cursor::skip_trivia)
}

/// Skips trivia and an optional `=` or `:`.
pub(super) fn separator(cursor: &mut Cursor<'_>) -> Scan<()> {
    trivia(cursor)?;
    if matches!(cursor.peek(), Some('=' | ':')) {
        cursor.bump();
        trivia(cursor)?;
    }
    Ok(())
}

/// Consumes `c` or fails.
pub(super) fn expect(cursor: &mut Cursor<'_>, c: char) -> Scan<()> {
    trivia(cursor)?;
    if cursor.eat(c) {
        Ok(())
    } else {
        expected(cursor, &format!("`{c}`"))
    }
}

/// Consumes the word `word`, ignoring case. Nothing is consumed otherwise.
pub(super) fn eat_keyword(cursor: &mut Cursor<'_>, word: &str) -> bool {
    let checkpoint = cursor.save_checkpoint();
    if cursor
        .scan_word()
        .is_some_and(|found| found.eq_ignore_ascii_case(word))
    {
        return true;
    }
    cursor.restore_checkpoint(checkpoint);
    false
}

fn bool_word(cursor: &mut Cursor<'_>) -> Option<bool> {
    let checkpoint = cursor.save_checkpoint();
    let value = match cursor.scan_word().map(str::to_ascii_lowercase).as_deref() {
        Some("yes" | "true") => Some(true),
        Some("no" | "false") => Some(false),
        _ => None,
    };
    if value.is_none() {
        cursor.restore_checkpoint(checkpoint);
    }
    value
}

pub(super) fn number(cursor: &mut Cursor<'_>) -> Scan<Option<Number>> {
    lexed(cursor, Cursor::scan_number)
}

pub(super) fn text(cursor: &mut Cursor<'_>) -> Scan<Option<String>> {
    lexed(cursor, Cursor::scan_text)
}

/// Scans `( item item, item )`, `None` if no `(` is next.
pub(super) fn list<'a, T>(
    cursor: &mut Cursor<'a>,
    mut item: impl FnMut(&mut Cursor<'a>) -> Scan<T>,
) -> Scan<Option<Vec<T>>> {
    if !cursor.eat('(') {
        return Ok(None);
    }
    let mut items = Vec::new();
    loop {
        trivia(cursor)?;
        if cursor.eat(')') {
            return Ok(Some(items));
        }
        if cursor.is_end() {
            return expected(cursor, "`)`");
        }
        items.push(item(cursor)?);
        trivia(cursor)?;
        cursor.eat(',');
    }
}

/// Reads values in the shape of one setting.
struct ShapeReader<'d> {
    def: &'d SettingDef,
}

impl ShapeReader<'_> {
    fn mismatch<T>(&self, cursor: &Cursor<'_>) -> Scan<T> {
        Err(Positioned::new(
            DecodeWarning::ShapeMismatch {
                name: self.def.name.clone(),
                expected: self.def.shape,
            },
            cursor.snapshot(),
        ))
    }

    fn number(&self, cursor: &mut Cursor<'_>) -> Scan<Number> {
        match number(cursor)? {
            Some(n) => Ok(n),
            None => self.mismatch(cursor),
        }
    }

    fn string(&self, cursor: &mut Cursor<'_>) -> Scan<String> {
        match text(cursor)? {
            Some(s) => Ok(s),
            None => self.mismatch(cursor),
        }
    }

    fn numbers(&self, cursor: &mut Cursor<'_>) -> Scan<Vec<Number>> {
        match list(cursor, |c| self.number(c))? {
            Some(nums) => Ok(nums),
            None => self.mismatch(cursor),
        }
    }

    fn strings(&self, cursor: &mut Cursor<'_>) -> Scan<Vec<String>> {
        match list(cursor, |c| self.string(c))? {
            Some(strs) => Ok(strs),
            None => self.mismatch(cursor),
        }
    }

    fn map<'a, T>(
        &self,
        cursor: &mut Cursor<'a>,
        mut value: impl FnMut(&mut Cursor<'a>) -> Scan<T>,
    ) -> Scan<Vec<(String, T)>> {
        let pairs = list(cursor, |c| {
            let key = self.string(c)?;
            separator(c)?;
            Ok((key, value(c)?))
        })?;
        match pairs {
            Some(pairs) => Ok(pairs),
            None => self.mismatch(cursor),
        }
    }

    fn read(&self, cursor: &mut Cursor<'_>) -> Scan<SettingValue> {
        use ValueShape as V;
        Ok(match self.def.shape {
            V::Int => match number(cursor)? {
                Some(Number::Int(i)) => SettingValue::Int(i),
                _ => return self.mismatch(cursor),
            },
            V::Rational => match number(cursor)? {
                Some(n @ (Number::Int(_) | Number::Rational(_))) => n.into(),
                _ => return self.mismatch(cursor),
            },
            V::Float => self.number(cursor)?.into(),
            V::Str => SettingValue::Str(self.string(cursor)?),
            V::Bool => match bool_word(cursor) {
                Some(b) => SettingValue::Bool(b),
                None => return self.mismatch(cursor),
            },
            V::Note => match number(cursor)? {
                Some(n) => n.into(),
                None => SettingValue::Note(self.string(cursor)?),
            },
            V::Numbers => match list(cursor, |c| self.number(c))? {
                Some(nums) => SettingValue::Numbers(nums),
                None => SettingValue::Numbers(vec![self.number(cursor)?]),
            },
            V::Strings => match list(cursor, |c| self.string(c))? {
                Some(strs) => SettingValue::Strings(strs),
                None => SettingValue::Strings(vec![self.string(cursor)?]),
            },
            V::NumberLists => match list(cursor, |c| self.numbers(c))? {
                Some(lists) => SettingValue::NumberLists(lists),
                None => return self.mismatch(cursor),
            },
            V::StringLists => match list(cursor, |c| self.strings(c))? {
                Some(lists) => SettingValue::StringLists(lists),
                None => return self.mismatch(cursor),
            },
            V::NumberMap => SettingValue::NumberMap(self.map(cursor, |c| self.number(c))?),
            V::StringMap => SettingValue::StringMap(self.map(cursor, |c| self.string(c))?),
            V::NumberListMap => {
                SettingValue::NumberListMap(self.map(cursor, |c| self.numbers(c))?)
            }
            V::StringListMap => {
                SettingValue::StringListMap(self.map(cursor, |c| self.strings(c))?)
            }
        })
    }
}

/// Reads a value for `def` and checks it against the registry predicate.
pub(super) fn setting_value(cursor: &mut Cursor<'_>, def: &SettingDef) -> Scan<SettingValue> {
    let at = cursor.snapshot();
    let value = ShapeReader { def }.read(cursor)?;
    if !def.accepts(&value) {
        return Err(Positioned::new(
            DecodeWarning::InvalidSettingValue {
                name: def.name.clone(),
                value: value.to_string(),
            },
            at,
        ));
    }
    Ok(value)
}

/// Reads the arguments `def` takes, separated by whitespace.
pub(super) fn mark_args(cursor: &mut Cursor<'_>, def: &MarkDef) -> Scan<Vec<Scalar>> {
    let mut args = Vec::new();
    let (wants_str, wants_number) = match def.shape {
        MarkShape::None => (false, false),
        MarkShape::Number => (false, true),
        MarkShape::Str => (true, false),
        MarkShape::StrNumber => (true, true),
    };
    if wants_str {
        trivia(cursor)?;
        match text(cursor)? {
            Some(s) => args.push(Scalar::Str(s)),
            None => return expected(cursor, &format!("a string argument of `{}`", def.name)),
        }
    }
    if wants_number {
        trivia(cursor)?;
        match number(cursor)? {
            Some(n) => args.push(Scalar::Number(n)),
            None => return expected(cursor, &format!("a number argument of `{}`", def.name)),
        }
    }
    Ok(args)
}

/// Reads the value of an event field.
pub(super) fn field_value(cursor: &mut Cursor<'_>, field: EventField) -> Scan<FieldInput> {
    if eat_keyword(cursor, "none") {
        return Ok(FieldInput::Clear);
    }
    let input = match field {
        EventField::Voice => match list(cursor, |c| match number(c)? {
            Some(n) => Ok(n),
            None => expected(c, "a voice number"),
        })? {
            Some(voices) => Some(FieldInput::List(voices)),
            None => number(cursor)?.map(|n| FieldInput::List(vec![n])),
        },
        EventField::Part => text(cursor)?.map(|s| FieldInput::Scalar(Scalar::Str(s))),
        EventField::Pitch => match number(cursor)? {
            Some(n) => Some(FieldInput::Scalar(Scalar::Number(n))),
            None => text(cursor)?.map(|s| FieldInput::Scalar(Scalar::Note(s))),
        },
        _ => number(cursor)?.map(|n| FieldInput::Scalar(Scalar::Number(n))),
    };
    match input {
        Some(input) => Ok(input),
        None => Err(Positioned::new(
            DecodeWarning::InvalidFieldValue {
                field: field.name().to_string(),
                found: describe(cursor),
            },
            cursor.snapshot(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use num::rational::Ratio;

    use super::*;
    use crate::fms::registry::Metadata;

    fn read(name: &str, text: &str) -> Scan<SettingValue> {
        let meta = Metadata::standard();
        let def = meta.setting_by_name(name).unwrap().clone();
        setting_value(&mut Cursor::new(text, "t", 0, 8), &def)
    }

    #[test]
    fn shapes() {
        assert_eq!(read("transpose", "-2"), Ok(SettingValue::Int(-2)));
        assert_eq!(
            read("beat", "1/8"),
            Ok(SettingValue::Rational(Ratio::new(1, 8)))
        );
        assert_eq!(read("title", "\"A B\""), Ok(SettingValue::Str("A B".into())));
        assert_eq!(read("quartertones", "yes"), Ok(SettingValue::Bool(true)));
        assert_eq!(read("min-pitch", "c3"), Ok(SettingValue::Note("c3".into())));
        assert_eq!(
            read("tuplets", "(3, 5 7)"),
            Ok(SettingValue::Numbers(vec![Number::Int(3), Number::Int(5), Number::Int(7)]))
        );
        assert_eq!(
            read("staff-names", "treble"),
            Ok(SettingValue::Strings(vec!["treble".into()]))
        );
        assert_eq!(
            read("dyn-levels", "(p = 40, f: 90)"),
            Ok(SettingValue::NumberMap(vec![
                ("p".into(), Number::Int(40)),
                ("f".into(), Number::Int(90)),
            ]))
        );
        assert_eq!(
            read("voice-names", "(a (x y), b ())"),
            Ok(SettingValue::StringListMap(vec![
                ("a".into(), vec!["x".into(), "y".into()]),
                ("b".into(), vec![]),
            ]))
        );
    }

    #[test]
    fn shape_mismatch_and_validation() {
        assert!(matches!(
            read("transpose", "1.5").map_err(Positioned::into_content),
            Err(DecodeWarning::ShapeMismatch { .. })
        ));
        assert!(matches!(
            read("tempo", "0").map_err(Positioned::into_content),
            Err(DecodeWarning::InvalidSettingValue { .. })
        ));
    }

    #[test]
    fn field_values() {
        let mut c = Cursor::new("none", "t", 0, 8);
        assert_eq!(field_value(&mut c, EventField::Pitch), Ok(FieldInput::Clear));
        let mut c = Cursor::new("fs4", "t", 0, 8);
        assert_eq!(
            field_value(&mut c, EventField::Pitch),
            Ok(FieldInput::Scalar(Scalar::Note("fs4".into())))
        );
        let mut c = Cursor::new("(1 2)", "t", 0, 8);
        assert_eq!(
            field_value(&mut c, EventField::Voice),
            Ok(FieldInput::List(vec![Number::Int(1), Number::Int(2)]))
        );
        let mut c = Cursor::new("abc", "t", 0, 8);
        assert!(field_value(&mut c, EventField::Time).is_err());
    }
}
