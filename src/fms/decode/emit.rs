//! Turning decoded values into builder calls.

use super::{
    DecodeWarning,
    grammar::{DocumentParseState, FieldNode, ObjectEntry, ObjectNode},
};
use crate::fms::{
    builder::{Action, BuildResult, ScoreBuilder, Target},
    position::Positioned,
    value::{Number, Scalar, SettingValue},
};

impl<B: ScoreBuilder> DocumentParseState<'_, B> {
    /// Makes one builder call. A refusal is recorded and decoding goes on.
    pub(super) fn call(&mut self, call: impl FnOnce(&mut B) -> BuildResult) {
        if let Err(error) = call(&mut self.builder) {
            let position = self.entry_position.clone();
            self.record(Positioned::new(DecodeWarning::BuilderRejected(error), position));
        }
    }

    /// `set_current`, `set_value`, `apply`.
    pub(super) fn emit_scalar(&mut self, target: Target, action: Action, value: Scalar) {
        self.call(|b| b.set_current(target));
        self.call(|b| b.set_value(value));
        self.call(|b| b.apply(target, action));
    }

    /// `set_current`, a list triplet, `apply`.
    pub(super) fn emit_list(&mut self, target: Target, action: Action, items: Vec<Scalar>) {
        self.call(|b| b.set_current(target));
        self.emit_items(items);
        self.call(|b| b.apply(target, action));
    }

    /// `set_current`, `apply` with no payload.
    pub(super) fn emit_bare(&mut self, target: Target, action: Action) {
        self.call(|b| b.set_current(target));
        self.call(|b| b.apply(target, action));
    }

    pub(super) fn emit_setting(&mut self, target: Target, value: SettingValue) {
        self.call(|b| b.set_current(target));
        self.emit_setting_payload(value);
        self.call(|b| b.apply(target, Action::Set));
    }

    fn emit_items(&mut self, items: Vec<Scalar>) {
        self.call(B::begin_list);
        for item in items {
            self.call(|b| b.add_list_item(item));
        }
        self.call(B::end_list);
    }

    fn emit_numbers(&mut self, nums: Vec<Number>) {
        self.emit_items(nums.into_iter().map(Scalar::Number).collect());
    }

    fn emit_strings(&mut self, strs: Vec<String>) {
        self.emit_items(strs.into_iter().map(Scalar::Str).collect());
    }

    fn emit_map<T>(&mut self, pairs: Vec<(String, T)>, mut value: impl FnMut(&mut Self, T)) {
        self.call(B::begin_list);
        for (key, item) in pairs {
            self.call(|b| b.add_list_item(Scalar::Str(key)));
            value(self, item);
        }
        self.call(B::end_list);
    }

    fn emit_setting_payload(&mut self, value: SettingValue) {
        let scalar = match value {
            SettingValue::Int(i) => Scalar::Number(Number::Int(i)),
            SettingValue::Rational(r) => Scalar::Number(Number::Rational(r)),
            SettingValue::Float(f) => Scalar::Number(Number::Float(f)),
            SettingValue::Str(s) => Scalar::Str(s),
            SettingValue::Bool(b) => Scalar::Bool(b),
            SettingValue::Note(s) => Scalar::Note(s),
            SettingValue::Numbers(nums) => return self.emit_numbers(nums),
            SettingValue::Strings(strs) => return self.emit_strings(strs),
            SettingValue::NumberLists(lists) => {
                self.call(B::begin_list);
                for nums in lists {
                    self.emit_numbers(nums);
                }
                self.call(B::end_list);
                return;
            }
            SettingValue::StringLists(lists) => {
                self.call(B::begin_list);
                for strs in lists {
                    self.emit_strings(strs);
                }
                self.call(B::end_list);
                return;
            }
            SettingValue::NumberMap(pairs) => {
                return self.emit_map(pairs, |this, n| {
                    this.call(|b| b.add_list_item(Scalar::Number(n)));
                });
            }
            SettingValue::StringMap(pairs) => {
                return self.emit_map(pairs, |this, s| {
                    this.call(|b| b.add_list_item(Scalar::Str(s)));
                });
            }
            SettingValue::NumberListMap(pairs) => return self.emit_map(pairs, Self::emit_numbers),
            SettingValue::StringListMap(pairs) => return self.emit_map(pairs, Self::emit_strings),
        };
        self.call(|b| b.set_value(scalar));
    }

    /// `start_object`, every field and setting, `commit_object`.
    pub(super) fn emit_object(&mut self, node: ObjectNode) {
        self.call(|b| b.start_object(node.kind));
        for entry in node.entries {
            match entry {
                ObjectEntry::Field(field, value) => {
                    let target = Target::ObjectField(field);
                    self.call(|b| b.set_current(target));
                    match value {
                        FieldNode::Ref(id) => self.call(|b| b.set_value(Scalar::Str(id))),
                        FieldNode::Object(inner) => self.emit_object(inner),
                        FieldNode::Objects(inner) => {
                            self.call(B::begin_list);
                            for object in inner {
                                self.emit_object(object);
                            }
                            self.call(B::end_list);
                        }
                    }
                    self.call(|b| b.apply(target, Action::Set));
                }
                ObjectEntry::Setting(id, value) => self.emit_setting(Target::Setting(id), value),
            }
        }
        self.call(B::commit_object);
    }
}
