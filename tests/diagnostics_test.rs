//! Test diagnostics module functionality

use fms_rs::diagnostics::{SimpleSource, ToAriadne, collect_fms_reports, emit_fms_warnings};
use fms_rs::fms::{
    decode::{DecodeWarning, LoadStatus},
    parse_fms,
    position::Positioned,
};

#[test]
fn test_simple_source_creation() {
    let source_text = "title = \"Etude\"\ntempo = 120\n";
    let source = SimpleSource::new("etude.fms", source_text);

    assert_eq!(source.text(), source_text);
    assert_eq!(source.name(), "etude.fms");
}

#[test]
fn test_emit_warnings_with_real_fms() {
    let fms_source = "title = Etude\nbogus = 3\npitch 60;\n";

    // Decode FMS text, should produce warnings
    let output = parse_fms(fms_source);
    assert_eq!(output.load.status, LoadStatus::HadErrors);
    assert!(
        output
            .load
            .warnings
            .iter()
            .any(|w| matches!(w.content(), DecodeWarning::UnknownSetting(name) if name == "bogus"))
    );

    // Note: here we just verify the function can be called normally
    emit_fms_warnings("<input>", fms_source, &output.load.warnings);
}

#[test]
fn test_empty_warnings() {
    let fms_source = "pitch 60;\n";
    let empty_warnings: Vec<Positioned<DecodeWarning>> = vec![];

    // Test empty warnings list case
    emit_fms_warnings("<input>", fms_source, &empty_warnings);
    assert!(collect_fms_reports("<input>", fms_source, &empty_warnings).is_empty());
}

#[test]
fn test_reports_point_at_the_warning() {
    let fms_source = "pitch 60;\ntime abc;\n";
    let output = parse_fms(fms_source);
    assert_eq!(output.load.warnings.len(), 1);

    let source = SimpleSource::new("<input>", fms_source);
    let warning = &output.load.warnings[0];
    assert_eq!(source.span_of(warning.position()), 15..16);

    let mut rendered = Vec::new();
    warning
        .to_report(&source)
        .write(
            ("<input>".to_string(), ariadne::Source::from(fms_source)),
            &mut rendered,
        )
        .unwrap();
    let rendered = String::from_utf8(rendered).unwrap();
    assert!(rendered.contains("invalid value for `time`"));
}

#[test]
fn test_collect_reports_for_every_warning() {
    let fms_source = "[wiggle] pitch 60;\nbogus = 1\n{open\n";
    let output = parse_fms(fms_source);
    let reports = collect_fms_reports("<input>", fms_source, &output.load.warnings);
    assert_eq!(reports.len(), output.load.warnings.len());
    assert_eq!(reports.len(), 3);
}
