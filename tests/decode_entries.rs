use fms_rs::fms::prelude::*;
use num::rational::Ratio;
use pretty_assertions::assert_eq;

fn record(source: &str) -> (Vec<BuilderCall>, LoadOutput) {
    let mut recorder = RecordingBuilder::new();
    let output = decode_str(source, &Metadata::standard(), &mut recorder);
    (recorder.calls, output)
}

fn load(source: &str) -> (Score, LoadOutput) {
    let meta = Metadata::standard();
    let mut score = Score::new(&meta);
    let output = decode_str(source, &meta, &mut score);
    (score, output)
}

fn int(i: i64) -> Number {
    Number::Int(i)
}

fn ratio(n: i64, d: i64) -> Number {
    Number::Rational(Ratio::new(n, d))
}

#[test]
fn fields_and_terminators_become_builder_calls() {
    use BuilderCall::*;

    let (calls, output) = record("time 1/4 pitch 60; time 1/4 pitch 62;");
    assert_eq!(output.status, LoadStatus::Clean);
    let time = Target::Field(EventField::Time);
    let pitch = Target::Field(EventField::Pitch);
    let note = |p: i64| {
        vec![
            SetCurrent(time),
            SetValue(Scalar::Number(ratio(1, 4))),
            Apply(time, Action::Set),
            SetCurrent(pitch),
            SetValue(Scalar::Number(int(p))),
            Apply(pitch, Action::Set),
            SetCurrent(Target::Event),
            Apply(Target::Event, Action::Queue),
        ]
    };
    assert_eq!(calls, [note(60), note(62)].concat());
}

#[test]
fn voices_always_use_a_list() {
    use BuilderCall::*;

    let voice = Target::Field(EventField::Voice);
    let (calls, _) = record("voice 3");
    assert_eq!(
        calls,
        vec![
            SetCurrent(voice),
            BeginList,
            AddListItem(Scalar::Number(int(3))),
            EndList,
            Apply(voice, Action::Set),
        ]
    );
    let (calls, _) = record("v: (1, 2)");
    assert_eq!(
        calls,
        vec![
            SetCurrent(voice),
            BeginList,
            AddListItem(Scalar::Number(int(1))),
            AddListItem(Scalar::Number(int(2))),
            EndList,
            Apply(voice, Action::Set),
        ]
    );
}

#[test]
fn operators_and_abbreviations() {
    use BuilderCall::*;

    let (calls, output) = record("+t 1/2 *dyn 2 -p 12");
    assert!(output.status.is_clean());
    assert_eq!(
        calls,
        vec![
            SetCurrent(Target::Field(EventField::Time)),
            SetValue(Scalar::Number(ratio(1, 2))),
            Apply(Target::Field(EventField::Time), Action::Increment),
            SetCurrent(Target::Field(EventField::Dynamic)),
            SetValue(Scalar::Number(int(2))),
            Apply(Target::Field(EventField::Dynamic), Action::Multiply),
            SetCurrent(Target::Field(EventField::Pitch)),
            SetValue(Scalar::Number(int(12))),
            Apply(Target::Field(EventField::Pitch), Action::Decrement),
        ]
    );
}

#[test]
fn operator_on_a_part_is_refused() {
    let (calls, output) = record("+part rh");
    assert!(calls.is_empty());
    assert_eq!(
        output.warnings[0].content(),
        &DecodeWarning::OperatorNotAllowed {
            field: "part".into()
        }
    );
}

#[test]
fn a_small_score() {
    let (score, output) = load(
        r#"
        // strings
        inst <id violin name: "Violin I">
        part <id vn inst violin>
        vn time 0 dur 1/2 pitch c4;
        +time 1/2 pitch 62 [accent];
        +t 1/2 rest;
        "#,
    );
    assert_eq!(output.warnings, vec![]);
    assert_eq!(output.status, LoadStatus::Clean);

    let violin = score.object(ObjectKind::Inst, "violin").unwrap();
    assert_eq!(
        violin.settings,
        vec![("name".to_string(), SettingValue::Str("Violin I".into()))]
    );
    let part = score.object(ObjectKind::Part, "vn").unwrap();
    assert_eq!(
        part.field(ObjectField::Inst),
        Some(&FieldValue::Ref("violin".into()))
    );

    let events = score.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].part.as_deref(), Some("vn"));
    assert_eq!(events[0].time, Some(int(0)));
    assert_eq!(events[0].duration, Some(ratio(1, 2)));
    assert_eq!(events[0].pitch, Some(Pitch::Note("c4".into())));
    assert_eq!(events[1].time, Some(ratio(1, 2)));
    assert_eq!(events[1].pitch, Some(Pitch::Number(int(62))));
    assert_eq!(
        events[1].marks,
        vec![MarkInstance {
            name: "accent".into(),
            args: vec![]
        }]
    );
    assert_eq!(events[2].kind, EventKind::Rest);
    assert_eq!(events[2].time, Some(ratio(1, 1)));
    assert_eq!(events[2].pitch, None);
    assert_eq!(events[2].marks, vec![]);
}

#[test]
fn settings_global_and_local() {
    let (score, output) = load(
        "tempo = 120 timesig = (3 4) title = \"Sonata\" quartertones = yes\n\
         clef: bass pitch 40; clef: none pitch 41;",
    );
    assert!(output.status.is_clean());
    assert_eq!(score.setting("tempo"), Some(&SettingValue::Int(120)));
    assert_eq!(
        score.setting("timesig"),
        Some(&SettingValue::Numbers(vec![int(3), int(4)]))
    );
    assert_eq!(score.setting("title"), Some(&SettingValue::Str("Sonata".into())));
    assert_eq!(score.setting("quartertones"), Some(&SettingValue::Bool(true)));
    assert_eq!(score.setting_origin("tempo"), Some(SettingOrigin::Score));
    assert_eq!(score.setting_origin("beat"), Some(SettingOrigin::Default));

    let events = score.events();
    assert_eq!(
        events[0].settings,
        vec![("clef".to_string(), SettingValue::Str("bass".into()))]
    );
    assert_eq!(events[1].settings, vec![]);
}

#[test]
fn mark_arguments() {
    let (score, output) = load("[tempo \"Allegro\" 132] [tremolo 3] [text dolce] pitch 60;");
    assert!(output.status.is_clean());
    assert_eq!(
        score.events()[0].marks,
        vec![
            MarkInstance {
                name: "tempo".into(),
                args: vec![Scalar::Str("Allegro".into()), Scalar::Number(int(132))],
            },
            MarkInstance {
                name: "tremolo".into(),
                args: vec![Scalar::Number(int(3))],
            },
            MarkInstance {
                name: "text".into(),
                args: vec![Scalar::Str("dolce".into())],
            },
        ]
    );
}

#[test]
fn resume_keeps_one_shot_marks() {
    let (score, _) = load("[staccato] pitch 60, pitch 62; pitch 64;");
    let marked: Vec<bool> = score
        .events()
        .iter()
        .map(|event| !event.marks.is_empty())
        .collect();
    assert_eq!(marked, vec![true, true, false]);
}

#[test]
fn persistent_marks() {
    let (score, _) = load("+[staccato] pitch 60; pitch 62; -[staccato] pitch 64;");
    let marked: Vec<bool> = score
        .events()
        .iter()
        .map(|event| !event.marks.is_empty())
        .collect();
    assert_eq!(marked, vec![true, true, false]);
}

#[test]
fn recovery_skips_to_the_next_terminator() {
    let (score, output) = load("pitch 60; time abc; pitch 62;");
    assert_eq!(output.status, LoadStatus::HadErrors);
    assert_eq!(output.warnings.len(), 1);
    let warning = &output.warnings[0];
    assert_eq!(
        warning.content(),
        &DecodeWarning::InvalidFieldValue {
            field: "time".into(),
            found: "`abc`".into()
        }
    );
    assert_eq!((warning.position().line, warning.position().col), (1, 16));
    let pitches: Vec<_> = score.events().iter().map(|e| e.pitch.clone()).collect();
    assert_eq!(
        pitches,
        vec![Some(Pitch::Number(int(60))), Some(Pitch::Number(int(62)))]
    );
}

#[test]
fn recovery_stops_at_the_line_end() {
    let (score, output) = load("pitch 60 ) garbage\npitch 62;");
    assert_eq!(output.warnings.len(), 1);
    assert!(matches!(
        output.warnings[0].content(),
        DecodeWarning::ExpectedToken { .. }
    ));
    assert_eq!(score.events().len(), 1);
}

#[test]
fn unknown_names() {
    let (_, output) = load("bogus = 3; [wiggle] pitch 60;\nmeasure <bpm 3>");
    let warnings: Vec<_> = output
        .warnings
        .iter()
        .map(|w| w.content().clone())
        .collect();
    assert_eq!(
        warnings,
        vec![
            DecodeWarning::UnknownSetting("bogus".into()),
            DecodeWarning::UnknownMark("wiggle".into()),
            DecodeWarning::UnknownObjectField {
                kind: "measure".into(),
                field: "bpm".into()
            },
        ]
    );
}

#[test]
fn invalid_setting_values() {
    let (score, output) = load("tempo = 0\ntranspose = 1.5\ntempo = 90");
    let warnings: Vec<_> = output
        .warnings
        .iter()
        .map(|w| w.content().clone())
        .collect();
    assert_eq!(
        warnings,
        vec![
            DecodeWarning::InvalidSettingValue {
                name: "tempo".into(),
                value: "0".into()
            },
            DecodeWarning::ShapeMismatch {
                name: "transpose".into(),
                expected: ValueShape::Int
            },
        ]
    );
    assert_eq!(score.setting("tempo"), Some(&SettingValue::Int(90)));
    assert_eq!(score.setting("transpose"), Some(&SettingValue::Int(0)));
}

#[test]
fn unterminated_object_makes_no_calls() {
    let (calls, output) = record("inst <id piano staves (<>");
    assert!(calls.is_empty());
    assert_eq!(
        output.warnings[0].content(),
        &DecodeWarning::UnterminatedObject("inst".into())
    );
}

#[test]
fn nested_objects() {
    let (score, output) = load(
        "inst <id piano staves (<clefs (<clef: treble>)> <clefs <clef: bass>>)>\n\
         metapart <id both parts (<part rh> <part <id lh>>)>",
    );
    assert_eq!(output.warnings, vec![]);
    let piano = score.object(ObjectKind::Inst, "piano").unwrap();
    let clef = |name: &str| {
        ObjectDef::new(ObjectKind::Clef).with_setting("clef", SettingValue::Str(name.into()))
    };
    let staff = |name: &str| {
        ObjectDef::new(ObjectKind::Staff)
            .with_field(ObjectField::Clefs, FieldValue::Objects(vec![clef(name)]))
    };
    assert_eq!(
        piano.field(ObjectField::Staves),
        Some(&FieldValue::Objects(vec![staff("treble"), staff("bass")]))
    );

    let both = score.object(ObjectKind::MetaPart, "both").unwrap();
    let Some(FieldValue::Objects(maps)) = both.field(ObjectField::Parts) else {
        panic!("parts must be a list");
    };
    assert_eq!(maps.len(), 2);
    assert_eq!(maps[0].field(ObjectField::Part), Some(&FieldValue::Ref("rh".into())));
    assert!(matches!(
        maps[1].field(ObjectField::Part),
        Some(FieldValue::Object(_))
    ));
}

#[test]
fn declarations_need_an_id() {
    let (score, output) = load("part <inst piano>");
    assert_eq!(
        output.warnings[0].content(),
        &DecodeWarning::BuilderRejected(BuildError::MissingField {
            kind: "part".into(),
            field: "id".into()
        })
    );
    assert!(score.objects(ObjectKind::Part).is_empty());
}

#[test]
fn builder_rejections_do_not_stop_the_entry() {
    let mut recorder = RecordingBuilder::new().rejecting(Target::Field(EventField::Pitch));
    let output = decode_str("pitch 60;", &Metadata::standard(), &mut recorder);
    assert_eq!(output.status, LoadStatus::HadErrors);
    assert_eq!(
        output.warnings[0].content(),
        &DecodeWarning::BuilderRejected(BuildError::UnsupportedAction {
            target: Target::Field(EventField::Pitch),
            action: Action::Set
        })
    );
    assert_eq!(recorder.committed_events(), 1);
}

#[test]
fn undeclared_part_is_rejected() {
    let (score, output) = load("cello pitch 36;");
    assert_eq!(
        output.warnings[0].content(),
        &DecodeWarning::BuilderRejected(BuildError::UnknownPart("cello".into()))
    );
    assert_eq!(score.events()[0].part, None);
}

#[test]
fn comments_and_tabs() {
    let config = DecodeConfig::default().tab_width(4).source_name("tabs.fms");
    let meta = Metadata::standard();
    let mut score = Score::new(&meta);
    let output = Decoder::new(&config, &FsLoader).decode_str(
        "/* block\n comment */ pitch 60; // tail\n\tpitch ?",
        &meta,
        &mut score,
    );
    assert_eq!(score.events().len(), 1);
    let position = output.warnings[0].position();
    assert_eq!(position.source, "tabs.fms");
    assert_eq!((position.line, position.col), (3, 11));
}
