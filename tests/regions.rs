use fms_rs::fms::prelude::*;
use num::rational::Ratio;
use pretty_assertions::assert_eq;

fn load(source: &str) -> (Score, LoadOutput) {
    let meta = Metadata::standard();
    let mut score = Score::new(&meta);
    let output = decode_str(source, &meta, &mut score);
    (score, output)
}

fn summary(score: &Score) -> Vec<(Option<Number>, Option<Number>, Option<Pitch>)> {
    score
        .events()
        .iter()
        .map(|event| (event.time, event.duration, event.pitch.clone()))
        .collect()
}

fn int(i: i64) -> Option<Number> {
    Some(Number::Int(i))
}

fn key(n: i64) -> Option<Pitch> {
    Some(Pitch::Number(Number::Int(n)))
}

#[test]
fn labelled_region_restores_fields() {
    let (score, output) = load(
        "time 0 duration 1 pitch 60;\n\
         {v time 2 duration 1/4 note ; }v\n\
         pitch 62;",
    );
    assert!(output.status.is_clean());
    assert_eq!(
        summary(&score),
        vec![
            (int(0), int(1), key(60)),
            (int(0), int(1), key(62)),
            (int(2), Some(Number::Rational(Ratio::new(1, 4))), key(60)),
        ]
    );
}

#[test]
fn field_scoped_region() {
    let (score, output) = load("pitch 60 dyn 80; dyn {loud 110 pitch 61; }loud pitch 62;");
    assert!(output.status.is_clean());
    let dynamics: Vec<_> = score.events().iter().map(|e| e.dynamic).collect();
    assert_eq!(dynamics, vec![int(80), int(110), int(80)]);
}

#[test]
fn anonymous_regions_nest() {
    let (score, output) = load("time 0 { time 1 { time 2 pitch 60; } pitch 61; } pitch 62;");
    assert!(output.status.is_clean());
    let times: Vec<_> = score.events().iter().map(|e| e.time).collect();
    assert_eq!(times, vec![int(0), int(1), int(2)]);
    assert_eq!(
        score.events().iter().map(|e| e.pitch.clone()).collect::<Vec<_>>(),
        vec![key(62), key(61), key(60)]
    );
}

#[test]
fn overlapping_labels() {
    let (score, _) = load("{a dyn 50 {b pitch 70 }a pitch 71; }b pitch 72;");
    let notes: Vec<_> = score
        .events()
        .iter()
        .map(|e| (e.dynamic, e.pitch.clone()))
        .collect();
    assert_eq!(notes, vec![(None, key(71)), (None, key(72))]);
}

#[test]
fn marks_added_in_a_region_end_with_it() {
    let (score, output) = load("{s +[accent] pitch 60; }s pitch 62;");
    assert!(output.status.is_clean());
    let marks: Vec<usize> = score.events().iter().map(|e| e.marks.len()).collect();
    assert_eq!(marks, vec![1, 0]);
}

#[test]
fn unmatched_close() {
    let (score, output) = load("pitch 60; }nowhere pitch 62;");
    assert_eq!(
        output.warnings[0].content(),
        &DecodeWarning::Region(RegionError::UnmatchedClose("nowhere".into()))
    );
    assert_eq!(score.events().len(), 1);
}

#[test]
fn unclosed_regions_are_reported_at_the_end() {
    let (_, output) = load("{outer pitch 60;\n{ pitch 61;");
    let unclosed: Vec<_> = output
        .warnings
        .iter()
        .map(|w| (w.content().clone(), w.position().line))
        .collect();
    assert_eq!(
        unclosed,
        vec![
            (DecodeWarning::UnclosedRegion("outer".into()), 2),
            (DecodeWarning::UnclosedRegion(String::new()), 2),
        ]
    );
}

#[test]
fn region_calls() {
    use BuilderCall::*;

    let mut recorder = RecordingBuilder::new();
    let output = decode_str("{x }x", &Metadata::standard(), &mut recorder);
    assert!(output.status.is_clean());
    let [StartRegion(open), EndRegion(close)] = recorder.calls.as_slice() else {
        panic!("unexpected calls: {:?}", recorder.calls);
    };
    assert_eq!(open, close);
    assert_ne!(*open, RegionId::ANONYMOUS);
}
