//! [`ScoreBuilder`] implementation for [`Score`].
//!
//! Field values live in layers. The base layer holds everything set outside of regions; each open
//! region adds an overlay on top of it. A change always goes to the most recently opened region
//! still open, and an overlay is dropped with everything in it when its region closes.

use std::collections::BTreeMap;

use super::{Event, FieldValue, Measure, MarkInstance, ObjectDef, Score, SettingEntry, SettingOrigin};
use crate::fms::{
    builder::{
        Action, BuildError, BuildResult, EventField, EventKind, ObjectField, ObjectKind,
        ScoreBuilder, Target,
    },
    region::RegionId,
    value::{Number, Pitch, Scalar, SettingValue, ValueShape},
};

/// A payload item received from the decoder.
#[derive(Debug, Clone, PartialEq)]
enum Item {
    Scalar(Scalar),
    List(Vec<Item>),
    Object(ObjectDef),
}

/// Something that persists across events.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Slot {
    Field(EventField),
    Local(String),
}

#[derive(Debug, Clone, PartialEq)]
enum Held {
    Number(Number),
    Pitch(Pitch),
    Voices(Vec<Number>),
    Part(String),
    Setting(SettingValue),
}

#[derive(Debug, Clone)]
struct Overlay {
    id: RegionId,
    /// `None` masks a value of a lower layer.
    values: BTreeMap<Slot, Option<Held>>,
    added: Vec<MarkInstance>,
    removed: Vec<String>,
}

/// One level of payload accumulation: the document root or an open object.
#[derive(Debug, Clone, Default)]
struct Frame {
    object: Option<ObjectDef>,
    current: Option<Target>,
    value: Option<Item>,
    lists: Vec<Vec<Item>>,
}

/// The state carried between builder calls.
#[derive(Debug, Clone, Default)]
pub(super) struct BuildState {
    base: BTreeMap<Slot, Held>,
    overlays: Vec<Overlay>,
    persistent_marks: Vec<MarkInstance>,
    pending_marks: Vec<MarkInstance>,
    kind: EventKind,
    /// Whether the pending statement names something to sound: a pitch, a kind or a one-shot
    /// mark. A terminator without one only ends the statement.
    armed: bool,
    root: Frame,
    frames: Vec<Frame>,
}

impl BuildState {
    fn frame(&mut self) -> &mut Frame {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => &mut self.root,
        }
    }

    fn lookup(&self, slot: &Slot) -> Option<&Held> {
        for overlay in self.overlays.iter().rev() {
            if let Some(value) = overlay.values.get(slot) {
                return value.as_ref();
            }
        }
        self.base.get(slot)
    }

    fn write(&mut self, slot: Slot, value: Option<Held>) {
        if let Some(overlay) = self.overlays.last_mut() {
            overlay.values.insert(slot, value);
            return;
        }
        match value {
            Some(value) => {
                self.base.insert(slot, value);
            }
            None => {
                self.base.remove(&slot);
            }
        }
    }

    fn effective(&self) -> BTreeMap<Slot, Held> {
        let mut state = self.base.clone();
        for overlay in &self.overlays {
            for (slot, value) in &overlay.values {
                match value {
                    Some(value) => state.insert(slot.clone(), value.clone()),
                    None => state.remove(slot),
                };
            }
        }
        state
    }

    fn effective_marks(&self) -> Vec<MarkInstance> {
        let mut marks = self.persistent_marks.clone();
        for overlay in &self.overlays {
            marks.retain(|mark| !overlay.removed.contains(&mark.name));
            for mark in &overlay.added {
                marks.retain(|m| m.name != mark.name);
                marks.push(mark.clone());
            }
        }
        for mark in &self.pending_marks {
            marks.retain(|m| m.name != mark.name);
            marks.push(mark.clone());
        }
        marks
    }
}

fn unexpected(target: Target, item: Option<&Item>) -> BuildError {
    let found = match item {
        None => "no value".to_string(),
        Some(Item::Scalar(scalar)) => format!("`{scalar}`"),
        Some(Item::List(_)) => "a list".to_string(),
        Some(Item::Object(object)) => format!("an inline {}", object.kind.name()),
    };
    BuildError::UnexpectedValue { target, found }
}

fn number_of(item: &Item) -> Option<Number> {
    match item {
        Item::Scalar(Scalar::Number(n)) => Some(*n),
        _ => None,
    }
}

fn string_of(item: &Item) -> Option<String> {
    match item {
        Item::Scalar(Scalar::Str(s) | Scalar::Note(s)) => Some(s.clone()),
        _ => None,
    }
}

fn numbers_of(item: &Item) -> Option<Vec<Number>> {
    match item {
        Item::List(items) => items.iter().map(number_of).collect(),
        item => number_of(item).map(|n| vec![n]),
    }
}

fn strings_of(item: &Item) -> Option<Vec<String>> {
    match item {
        Item::List(items) => items.iter().map(string_of).collect(),
        item => string_of(item).map(|s| vec![s]),
    }
}

fn pairs_of<T>(item: &Item, value: impl Fn(&Item) -> Option<T>) -> Option<Vec<(String, T)>> {
    let Item::List(items) = item else {
        return None;
    };
    if items.len() % 2 != 0 {
        return None;
    }
    items
        .chunks(2)
        .map(|pair| match pair {
            [key, val] => Some((string_of(key)?, value(val)?)),
            _ => None,
        })
        .collect()
}

fn lists_of<T>(item: &Item, value: impl Fn(&Item) -> Option<Vec<T>>) -> Option<Vec<Vec<T>>> {
    match item {
        Item::List(items) => items
            .iter()
            .map(|item| match item {
                Item::List(_) => value(item),
                _ => None,
            })
            .collect(),
        _ => None,
    }
}

/// Rebuilds a setting value of `shape` from a payload.
fn setting_value(shape: ValueShape, item: &Item) -> Option<SettingValue> {
    use ValueShape as V;
    Some(match shape {
        V::Int => match number_of(item)? {
            Number::Int(i) => SettingValue::Int(i),
            _ => return None,
        },
        V::Rational => match number_of(item)? {
            Number::Float(_) => return None,
            n => n.into(),
        },
        V::Float => number_of(item)?.into(),
        V::Str => SettingValue::Str(string_of(item)?),
        V::Bool => match item {
            Item::Scalar(Scalar::Bool(b)) => SettingValue::Bool(*b),
            _ => return None,
        },
        V::Note => match item {
            Item::Scalar(Scalar::Number(n)) => (*n).into(),
            item => SettingValue::Note(string_of(item)?),
        },
        V::Numbers => SettingValue::Numbers(numbers_of(item)?),
        V::Strings => SettingValue::Strings(strings_of(item)?),
        V::NumberLists => SettingValue::NumberLists(lists_of(item, numbers_of)?),
        V::StringLists => SettingValue::StringLists(lists_of(item, strings_of)?),
        V::NumberMap => SettingValue::NumberMap(pairs_of(item, number_of)?),
        V::StringMap => SettingValue::StringMap(pairs_of(item, string_of)?),
        V::NumberListMap => SettingValue::NumberListMap(pairs_of(item, |i| match i {
            Item::List(_) => numbers_of(i),
            _ => None,
        })?),
        V::StringListMap => SettingValue::StringListMap(pairs_of(item, |i| match i {
            Item::List(_) => strings_of(i),
            _ => None,
        })?),
    })
}

impl Score {
    fn held_number(&self, field: EventField) -> Option<Number> {
        match self.state.lookup(&Slot::Field(field)) {
            Some(Held::Number(n) | Held::Pitch(Pitch::Number(n))) => Some(*n),
            _ => None,
        }
    }

    fn apply_field(
        &mut self,
        field: EventField,
        action: Action,
        item: Option<Item>,
    ) -> BuildResult {
        let target = Target::Field(field);
        let slot = Slot::Field(field);
        if field == EventField::Pitch {
            self.state.armed = true;
        }
        let op: fn(Number, Number) -> Option<Number> = match action {
            Action::Clear => {
                self.state.write(slot, None);
                return Ok(());
            }
            Action::Set => {
                let held = match (field, &item) {
                    (EventField::Voice, Some(item)) => numbers_of(item).map(Held::Voices),
                    (EventField::Part, Some(item)) => string_of(item).map(Held::Part),
                    (EventField::Pitch, Some(Item::Scalar(Scalar::Number(n)))) => {
                        Some(Held::Pitch(Pitch::Number(*n)))
                    }
                    (EventField::Pitch, Some(item)) => {
                        string_of(item).map(|s| Held::Pitch(Pitch::Note(s)))
                    }
                    (_, Some(item)) => number_of(item).map(Held::Number),
                    (_, None) => None,
                };
                let held = held.ok_or_else(|| unexpected(target, item.as_ref()))?;
                if let Held::Part(id) = &held
                    && !self.is_declared_part(id)
                {
                    return Err(BuildError::UnknownPart(id.clone()));
                }
                self.state.write(slot, Some(held));
                return Ok(());
            }
            Action::Increment => Number::checked_add,
            Action::Decrement => Number::checked_sub,
            Action::Multiply => Number::checked_mul,
            Action::Divide => Number::checked_div,
            action => return Err(BuildError::UnsupportedAction { target, action }),
        };

        if !(field.is_numeric() || field == EventField::Pitch) {
            return Err(BuildError::UnsupportedAction { target, action });
        }
        let operand = item
            .as_ref()
            .and_then(number_of)
            .ok_or_else(|| unexpected(target, item.as_ref()))?;
        let current = match self.state.lookup(&slot) {
            Some(Held::Pitch(Pitch::Note(_))) => {
                return Err(BuildError::UnsupportedAction { target, action });
            }
            _ => self.held_number(field).unwrap_or(Number::ZERO),
        };
        let result = op(current, operand).ok_or(BuildError::Arithmetic(target))?;
        let held = if field == EventField::Pitch {
            Held::Pitch(Pitch::Number(result))
        } else {
            Held::Number(result)
        };
        self.state.write(slot, Some(held));
        Ok(())
    }

    fn apply_setting(
        &mut self,
        target: Target,
        action: Action,
        item: Option<Item>,
    ) -> BuildResult {
        let (Target::Setting(id) | Target::LocalSetting(id)) = target else {
            return Err(BuildError::UnknownTarget(target));
        };
        let def = self
            .setting_def(id)
            .ok_or(BuildError::UnknownTarget(target))?
            .clone();
        let value = match action {
            Action::Set => {
                let value = item
                    .as_ref()
                    .and_then(|item| setting_value(def.shape, item))
                    .ok_or_else(|| unexpected(target, item.as_ref()))?;
                if !def.accepts(&value) {
                    return Err(BuildError::UnexpectedValue {
                        target,
                        found: value.to_string(),
                    });
                }
                Some(value)
            }
            Action::Clear => None,
            action => return Err(BuildError::UnsupportedAction { target, action }),
        };

        if let Target::LocalSetting(_) = target {
            self.state
                .write(Slot::Local(def.name), value.map(Held::Setting));
            return Ok(());
        }
        if let Some(object) = self.state.frame().object.as_mut() {
            match value {
                Some(value) => object.set_setting(&def.name, value),
                None => object.settings.retain(|(name, _)| *name != def.name),
            }
            return Ok(());
        }
        match (value, def.default) {
            (Some(value), _) => {
                self.settings.insert(
                    id,
                    SettingEntry {
                        value,
                        origin: SettingOrigin::Score,
                    },
                );
            }
            (None, Some(value)) => {
                self.settings.insert(
                    id,
                    SettingEntry {
                        value,
                        origin: SettingOrigin::Default,
                    },
                );
            }
            (None, None) => {
                self.settings.remove(&id);
            }
        }
        Ok(())
    }

    fn apply_mark(&mut self, target: Target, action: Action, item: Option<Item>) -> BuildResult {
        let Target::Mark(id) = target else {
            return Err(BuildError::UnknownTarget(target));
        };
        let name = self
            .mark_def(id)
            .ok_or(BuildError::UnknownTarget(target))?
            .name
            .clone();
        let args = match item {
            None => Vec::new(),
            Some(Item::Scalar(scalar)) => vec![scalar],
            Some(Item::List(items)) => items
                .into_iter()
                .map(|item| match item {
                    Item::Scalar(scalar) => Ok(scalar),
                    other => Err(unexpected(target, Some(&other))),
                })
                .collect::<Result<_, _>>()?,
            Some(other) => return Err(unexpected(target, Some(&other))),
        };
        let mark = MarkInstance { name, args };
        let state = &mut self.state;
        match action {
            Action::Set => {
                state.pending_marks.retain(|m| m.name != mark.name);
                state.pending_marks.push(mark);
                state.armed = true;
            }
            Action::Add => match state.overlays.last_mut() {
                Some(overlay) => {
                    overlay.removed.retain(|name| *name != mark.name);
                    overlay.added.retain(|m| m.name != mark.name);
                    overlay.added.push(mark);
                }
                None => {
                    state.persistent_marks.retain(|m| m.name != mark.name);
                    state.persistent_marks.push(mark);
                }
            },
            Action::Remove => match state.overlays.last_mut() {
                Some(overlay) => {
                    overlay.added.retain(|m| m.name != mark.name);
                    overlay.removed.push(mark.name);
                }
                None => state.persistent_marks.retain(|m| m.name != mark.name),
            },
            Action::Clear => state.pending_marks.retain(|m| m.name != mark.name),
            action => return Err(BuildError::UnsupportedAction { target, action }),
        }
        Ok(())
    }

    fn apply_object_field(
        &mut self,
        field: ObjectField,
        action: Action,
        item: Option<Item>,
    ) -> BuildResult {
        let target = Target::ObjectField(field);
        if action != Action::Set {
            return Err(BuildError::UnsupportedAction { target, action });
        }
        let Some(object) = self.state.frame().object.as_mut() else {
            return Err(BuildError::Unbalanced(format!(
                "{target} set outside of an object"
            )));
        };
        if !object.kind.accepts(field) {
            return Err(unexpected(target, item.as_ref()));
        }
        let value = match item {
            Some(Item::Scalar(Scalar::Str(s) | Scalar::Note(s))) => FieldValue::Ref(s),
            Some(Item::Object(inner)) if !field.is_list() => FieldValue::Object(inner),
            Some(Item::Object(inner)) => FieldValue::Objects(vec![inner]),
            Some(Item::List(items)) if field.is_list() => FieldValue::Objects(
                items
                    .into_iter()
                    .map(|item| match item {
                        Item::Object(inner) => Ok(inner),
                        other => Err(unexpected(target, Some(&other))),
                    })
                    .collect::<Result<_, _>>()?,
            ),
            other => return Err(unexpected(target, other.as_ref())),
        };
        object.set_field(field, value);
        Ok(())
    }

    fn commit_event(&mut self, action: Action) -> BuildResult {
        if action == Action::Cancel {
            self.state.pending_marks.clear();
            self.state.kind = EventKind::Note;
            self.state.armed = false;
            return Ok(());
        }
        if !matches!(action, Action::Queue | Action::Resume) {
            return Err(BuildError::UnsupportedAction {
                target: Target::Event,
                action,
            });
        }
        if !self.state.armed {
            return Ok(());
        }

        let mut state = self.state.effective();
        let mut number = |field| match state.remove(&Slot::Field(field)) {
            Some(Held::Number(n)) => Some(n),
            _ => None,
        };
        let kind = self.state.kind;
        let mut event = Event {
            kind,
            time: number(EventField::Time),
            grace: number(EventField::Grace),
            duration: number(EventField::Duration),
            dynamic: number(EventField::Dynamic),
            marks: self.state.effective_marks(),
            ..Event::default()
        };
        for (slot, held) in state {
            match (slot, held) {
                (Slot::Field(EventField::Part), Held::Part(id)) => event.part = Some(id),
                (Slot::Field(EventField::Pitch), Held::Pitch(pitch)) => {
                    if kind == EventKind::Note {
                        event.pitch = Some(pitch);
                    }
                }
                (Slot::Field(EventField::Voice), Held::Voices(voices)) => event.voices = voices,
                (Slot::Local(name), Held::Setting(value)) => event.settings.push((name, value)),
                _ => {}
            }
        }
        self.insert_event(event);

        if action == Action::Queue {
            self.state.pending_marks.clear();
            self.state.kind = EventKind::Note;
            self.state.armed = false;
        }
        Ok(())
    }

    fn finish_object(&mut self, object: ObjectDef) -> BuildResult {
        let frame = self.state.frame();
        if let Some(list) = frame.lists.last_mut() {
            list.push(Item::Object(object));
            return Ok(());
        }
        if frame.current.is_some() {
            frame.value = Some(Item::Object(object));
            return Ok(());
        }
        if !self.state.frames.is_empty() {
            return Err(BuildError::Unbalanced(format!(
                "inline {} without a field",
                object.kind.name()
            )));
        }

        if object.kind == ObjectKind::Measure {
            let time = self.held_number(EventField::Time);
            let duration = self.held_number(EventField::Duration);
            self.insert_measure(Measure {
                time,
                duration,
                def: object,
            });
            return Ok(());
        }
        if object.id().is_none() {
            return Err(BuildError::MissingField {
                kind: object.kind.name().to_string(),
                field: ObjectField::Id.name().to_string(),
            });
        }
        self.declare(object);
        Ok(())
    }
}

impl ScoreBuilder for Score {
    fn set_current(&mut self, target: Target) -> BuildResult {
        let frame = self.state.frame();
        frame.current = Some(target);
        frame.value = None;
        frame.lists.clear();
        Ok(())
    }

    fn set_value(&mut self, value: Scalar) -> BuildResult {
        let frame = self.state.frame();
        if !frame.lists.is_empty() {
            return Err(BuildError::Unbalanced(
                "scalar value inside an open list".to_string(),
            ));
        }
        frame.value = Some(Item::Scalar(value));
        Ok(())
    }

    fn begin_list(&mut self) -> BuildResult {
        self.state.frame().lists.push(Vec::new());
        Ok(())
    }

    fn add_list_item(&mut self, value: Scalar) -> BuildResult {
        let list = self
            .state
            .frame()
            .lists
            .last_mut()
            .ok_or_else(|| BuildError::Unbalanced("list item without a list".to_string()))?;
        list.push(Item::Scalar(value));
        Ok(())
    }

    fn end_list(&mut self) -> BuildResult {
        let frame = self.state.frame();
        let list = frame
            .lists
            .pop()
            .ok_or_else(|| BuildError::Unbalanced("list end without a list".to_string()))?;
        match frame.lists.last_mut() {
            Some(parent) => parent.push(Item::List(list)),
            None => frame.value = Some(Item::List(list)),
        }
        Ok(())
    }

    fn apply(&mut self, target: Target, action: Action) -> BuildResult {
        let frame = self.state.frame();
        let item = frame.value.take();
        frame.current = None;
        frame.lists.clear();
        let in_object = !self.state.frames.is_empty();

        match target {
            Target::Setting(_) => self.apply_setting(target, action, item),
            Target::ObjectField(field) => self.apply_object_field(field, action, item),
            _ if in_object => Err(BuildError::Unbalanced(format!(
                "{target} applied inside an object"
            ))),
            Target::Field(field) => self.apply_field(field, action, item),
            Target::LocalSetting(_) => self.apply_setting(target, action, item),
            Target::Mark(_) => self.apply_mark(target, action, item),
            Target::Kind(kind) => match action {
                Action::Set => {
                    self.state.kind = kind;
                    self.state.armed = true;
                    Ok(())
                }
                action => Err(BuildError::UnsupportedAction { target, action }),
            },
            Target::Event => self.commit_event(action),
        }
    }

    fn start_object(&mut self, kind: ObjectKind) -> BuildResult {
        self.state.frames.push(Frame {
            object: Some(ObjectDef::new(kind)),
            ..Frame::default()
        });
        Ok(())
    }

    fn commit_object(&mut self) -> BuildResult {
        let object = self
            .state
            .frames
            .pop()
            .and_then(|frame| frame.object)
            .ok_or_else(|| BuildError::Unbalanced("object commit without an object".to_string()))?;
        self.finish_object(object)
    }

    fn start_region(&mut self, id: RegionId) -> BuildResult {
        if id != RegionId::ANONYMOUS && self.state.overlays.iter().any(|o| o.id == id) {
            return Ok(());
        }
        self.state.overlays.push(Overlay {
            id,
            values: BTreeMap::new(),
            added: Vec::new(),
            removed: Vec::new(),
        });
        Ok(())
    }

    fn end_region(&mut self, id: RegionId) -> BuildResult {
        match self.state.overlays.iter().rposition(|o| o.id == id) {
            Some(at) => {
                self.state.overlays.remove(at);
                Ok(())
            }
            None if id == RegionId::ANONYMOUS => Ok(()),
            None => Err(BuildError::Unbalanced(format!(
                "region #{} closed but not open",
                id.0
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fms::{encode::ScoreSource, registry::Metadata};
    use num::rational::Ratio;

    fn set(score: &mut Score, field: EventField, value: Scalar) {
        score.set_current(Target::Field(field)).unwrap();
        score.set_value(value).unwrap();
        score.apply(Target::Field(field), Action::Set).unwrap();
    }

    fn commit(score: &mut Score) {
        score.set_current(Target::Event).unwrap();
        score.apply(Target::Event, Action::Queue).unwrap();
    }

    #[test]
    fn region_overlay_reverts_on_close() {
        let meta = Metadata::standard();
        let mut score = Score::new(&meta);
        set(&mut score, EventField::Time, Scalar::Number(Number::Int(1)));
        score.start_region(RegionId(1)).unwrap();
        set(&mut score, EventField::Time, Scalar::Number(Number::Int(5)));
        set(&mut score, EventField::Pitch, Scalar::Number(Number::Int(60)));
        commit(&mut score);
        score.end_region(RegionId(1)).unwrap();
        set(&mut score, EventField::Pitch, Scalar::Number(Number::Int(62)));
        commit(&mut score);

        let times: Vec<_> = score.events().iter().map(|e| e.time).collect();
        assert_eq!(times, vec![Some(Number::Int(1)), Some(Number::Int(5))]);
    }

    #[test]
    fn increments_keep_exact_numbers() {
        let meta = Metadata::standard();
        let mut score = Score::new(&meta);
        set(&mut score, EventField::Time, Scalar::Number(Number::Int(1)));
        score.set_current(Target::Field(EventField::Time)).unwrap();
        score
            .set_value(Scalar::Number(Number::Rational(Ratio::new(1, 4))))
            .unwrap();
        score
            .apply(Target::Field(EventField::Time), Action::Increment)
            .unwrap();
        set(&mut score, EventField::Pitch, Scalar::Number(Number::Int(60)));
        commit(&mut score);
        assert_eq!(
            score.events()[0].time,
            Some(Number::Rational(Ratio::new(5, 4)))
        );
    }

    #[test]
    fn division_by_zero_is_refused() {
        let meta = Metadata::standard();
        let mut score = Score::new(&meta);
        score.set_current(Target::Field(EventField::Duration)).unwrap();
        score.set_value(Scalar::Number(Number::ZERO)).unwrap();
        assert_eq!(
            score.apply(Target::Field(EventField::Duration), Action::Divide),
            Err(BuildError::Arithmetic(Target::Field(EventField::Duration)))
        );
    }

    #[test]
    fn rests_have_no_pitch() {
        let meta = Metadata::standard();
        let mut score = Score::new(&meta);
        set(&mut score, EventField::Pitch, Scalar::Number(Number::Int(60)));
        score.set_current(Target::Kind(EventKind::Rest)).unwrap();
        score.apply(Target::Kind(EventKind::Rest), Action::Set).unwrap();
        commit(&mut score);
        score.set_current(Target::Kind(EventKind::Note)).unwrap();
        score.apply(Target::Kind(EventKind::Note), Action::Set).unwrap();
        commit(&mut score);
        assert_eq!(score.events()[0].kind, EventKind::Rest);
        assert_eq!(score.events()[0].pitch, None);
        assert_eq!(score.events()[1].kind, EventKind::Note);
        assert_eq!(
            score.events()[1].pitch,
            Some(Pitch::Number(Number::Int(60)))
        );
    }

    #[test]
    fn terminator_without_a_note_only_ends_the_statement() {
        let meta = Metadata::standard();
        let mut score = Score::new(&meta);
        set(&mut score, EventField::Time, Scalar::Number(Number::Int(1)));
        commit(&mut score);
        assert!(score.events().is_empty());

        set(&mut score, EventField::Pitch, Scalar::Number(Number::Int(60)));
        commit(&mut score);
        set(&mut score, EventField::Time, Scalar::Number(Number::Int(2)));
        commit(&mut score);
        assert_eq!(score.events().len(), 1);
        assert_eq!(score.events()[0].time, Some(Number::Int(1)));
    }

    #[test]
    fn unknown_part_is_refused() {
        let meta = Metadata::standard();
        let mut score = Score::new(&meta);
        score.set_current(Target::Field(EventField::Part)).unwrap();
        score.set_value(Scalar::Str("vln".into())).unwrap();
        assert_eq!(
            score.apply(Target::Field(EventField::Part), Action::Set),
            Err(BuildError::UnknownPart("vln".into()))
        );
    }

    #[test]
    fn declarations_need_an_id() {
        let meta = Metadata::standard();
        let mut score = Score::new(&meta);
        score.start_object(ObjectKind::Inst).unwrap();
        assert_eq!(
            score.commit_object(),
            Err(BuildError::MissingField {
                kind: "inst".into(),
                field: "id".into(),
            })
        );
    }

    #[test]
    fn map_payload_rebuilds_setting() {
        let item = Item::List(vec![
            Item::Scalar(Scalar::Str("p".into())),
            Item::Scalar(Scalar::Number(Number::Int(40))),
            Item::Scalar(Scalar::Str("f".into())),
            Item::Scalar(Scalar::Number(Number::Int(90))),
        ]);
        assert_eq!(
            setting_value(ValueShape::NumberMap, &item),
            Some(SettingValue::NumberMap(vec![
                ("p".into(), Number::Int(40)),
                ("f".into(), Number::Int(90)),
            ]))
        );
        assert_eq!(setting_value(ValueShape::StringMap, &item), None);
    }
}
