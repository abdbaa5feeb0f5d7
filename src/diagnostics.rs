//! Fancy diagnostics support using `ariadne`.
//!
//! This module converts positioned decode warnings and fatal errors into `ariadne::Report`s.
//! A [`FilePosition`] keeps line and column; the byte span handed to ariadne is recomputed from
//! them against the source text being rendered. Positions inside another unit (an included file)
//! are labeled at the start of the text, with the original position in the message.
//!
//! # Usage Example
//!
//! ```rust
//! use fms_rs::{diagnostics::emit_fms_warnings, fms::parse_fms};
//!
//! let source = "time 0 pitch 60;\nbogus = 1\npitch 62;\n";
//! let output = parse_fms(source);
//!
//! // Output all warnings
//! emit_fms_warnings("<input>", source, &output.load.warnings);
//! ```

use std::ops::Range;

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::fms::{
    config::DEFAULT_TAB_WIDTH,
    decode::{DecodeWarning, FatalError},
    position::{FilePosition, Positioned},
};

/// Simple source container that holds the filename and source text.
///
/// # Usage Example
///
/// ```rust
/// use fms_rs::diagnostics::SimpleSource;
///
/// let source_text = "title = \"Etude\"\npitch 60;\n";
/// let source = SimpleSource::new("etude.fms", source_text);
///
/// assert_eq!(source.text(), source_text);
/// assert_eq!(source.name(), "etude.fms");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SimpleSource<'a> {
    /// Name of the source file.
    name: &'a str,
    /// Source text content.
    text: &'a str,
    /// Tab stop interval the decoder counted columns with.
    tab_width: usize,
}

impl<'a> SimpleSource<'a> {
    /// Create a new source container instance.
    #[must_use]
    pub const fn new(name: &'a str, text: &'a str) -> Self {
        Self {
            name,
            text,
            tab_width: DEFAULT_TAB_WIDTH,
        }
    }

    /// Sets the tab stop interval used to map columns back to bytes. Match the decoder's
    /// `DecodeConfig::tab_width`; clamped into `1..=20` the same way.
    #[must_use]
    pub fn with_tab_width(mut self, width: usize) -> Self {
        self.tab_width = width.clamp(1, 20);
        self
    }

    /// Get source text content.
    #[must_use]
    pub const fn text(&self) -> &'a str {
        self.text
    }

    /// Get source file name.
    #[must_use]
    pub const fn name(&self) -> &'a str {
        self.name
    }

    /// The byte span of the character at `position`, empty at the end of a line or the text.
    #[must_use]
    pub fn span_of(&self, position: &FilePosition) -> Range<usize> {
        if position.source != self.name {
            return 0..0;
        }
        let Some(line) = self.text.split_inclusive('\n').nth(position.line.saturating_sub(1))
        else {
            return self.text.len()..self.text.len();
        };
        let line_start = line.as_ptr() as usize - self.text.as_ptr() as usize;
        // Columns advance the way the decoder's cursor counts them.
        let width = self.tab_width;
        let mut col = 1;
        for (offset, c) in line.char_indices().filter(|(_, c)| *c != '\n') {
            let next = match c {
                '\t' => (col - 1) / width * width + width + 1,
                '\r' => col,
                _ => col + 1,
            };
            if position.col < next {
                return line_start + offset..line_start + offset + c.len_utf8();
            }
            col = next;
        }
        let end = line_start + line.trim_end_matches('\n').len();
        end..end
    }
}

/// Trait for converting positioned errors to `ariadne::Report`.
///
/// # Usage Example
///
/// ```rust
/// use fms_rs::{diagnostics::{SimpleSource, ToAriadne}, fms::parse_fms};
/// use ariadne::Source;
///
/// let source_text = "pitch 60\n[nonsense]\n";
/// let output = parse_fms(source_text);
///
/// let source = SimpleSource::new("<input>", source_text);
/// for warning in &output.load.warnings {
///     let report = warning.to_report(&source);
///     let _ = report.print(("<input>".to_string(), Source::from(source_text)));
/// }
/// ```
pub trait ToAriadne {
    /// Convert error to ariadne Report.
    fn to_report<'a>(&self, src: &SimpleSource<'a>) -> Report<'a, (String, Range<usize>)>;
}

/// Helper to build a styled ariadne `Report` consistently.
#[must_use]
pub fn build_report<'a>(
    src: &SimpleSource<'a>,
    kind: ReportKind<'a>,
    range: Range<usize>,
    title: &str,
    label_message: impl ToString,
    color: Color,
) -> Report<'a, (String, Range<usize>)> {
    let filename = src.name().to_string();
    Report::build(kind, (filename.clone(), range.clone()))
        .with_message(title)
        .with_label(
            Label::new((filename, range))
                .with_message(label_message.to_string())
                .with_color(color),
        )
        .finish()
}

fn label_for(src: &SimpleSource<'_>, position: &FilePosition) -> String {
    if position.source == src.name() && position.depth == 0 {
        "here".to_string()
    } else {
        format!("at {position}")
    }
}

impl ToAriadne for Positioned<DecodeWarning> {
    fn to_report<'a>(&self, src: &SimpleSource<'a>) -> Report<'a, (String, Range<usize>)> {
        let position = self.position();
        build_report(
            src,
            ReportKind::Warning,
            src.span_of(position),
            &self.content().to_string(),
            label_for(src, position),
            Color::Yellow,
        )
    }
}

impl ToAriadne for Positioned<FatalError> {
    fn to_report<'a>(&self, src: &SimpleSource<'a>) -> Report<'a, (String, Range<usize>)> {
        let position = self.position();
        build_report(
            src,
            ReportKind::Error,
            src.span_of(position),
            &self.content().to_string(),
            label_for(src, position),
            Color::Red,
        )
    }
}

/// Convenience method: batch render decode warnings.
///
/// # Parameters
/// * `name` - Name of the source file, as given to the decoder
/// * `source` - Complete FMS source text
/// * `warnings` - List of warnings to display
pub fn emit_fms_warnings<'a>(
    name: &'a str,
    source: &'a str,
    warnings: impl IntoIterator<Item = &'a Positioned<DecodeWarning>>,
) {
    let simple = SimpleSource::new(name, source);
    let ariadne_source = Source::from(source);
    for warning in warnings {
        let report = warning.to_report(&simple);
        let _ = report.eprint((name.to_string(), ariadne_source.clone()));
    }
}

/// Collect `ariadne::Report` instances for a list of warnings without printing.
#[must_use]
pub fn collect_fms_reports<'a>(
    name: &'a str,
    source: &'a str,
    warnings: impl IntoIterator<Item = &'a Positioned<DecodeWarning>>,
) -> Vec<Report<'a, (String, Range<usize>)>> {
    let simple = SimpleSource::new(name, source);
    warnings
        .into_iter()
        .map(|warning| warning.to_report(&simple))
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fms::{
        builder::RecordingBuilder,
        config::DecodeConfig,
        decode::{Decoder, MemoryLoader},
        registry::Metadata,
    };

    fn at(line: usize, col: usize) -> FilePosition {
        let mut position = FilePosition::start_of("t");
        position.line = line;
        position.col = col;
        position
    }

    #[test]
    fn spans_follow_lines_and_columns() {
        let source = SimpleSource::new("t", "ab\ncdé\n");
        assert_eq!(source.span_of(&at(1, 1)), 0..1);
        assert_eq!(source.span_of(&at(2, 2)), 4..5);
        assert_eq!(source.span_of(&at(2, 3)), 5..7);
        assert_eq!(source.span_of(&at(2, 9)), 7..7);
        assert_eq!(source.span_of(&at(5, 1)), 8..8);
    }

    #[test]
    fn tabs_advance_to_the_next_stop() {
        let text = "\tpitch ?\n\t\tx\n";
        let source = SimpleSource::new("t", text).with_tab_width(4);
        assert_eq!(source.span_of(&at(1, 1)), 0..1);
        assert_eq!(source.span_of(&at(1, 5)), 1..2);
        assert_eq!(source.span_of(&at(1, 11)), 7..8);
        assert_eq!(source.span_of(&at(2, 9)), 11..12);

        let default = SimpleSource::new("t", text);
        assert_eq!(default.span_of(&at(1, 9)), 1..2);
        assert_eq!(default.span_of(&at(2, 17)), 11..12);
    }

    #[test]
    fn spans_match_decoded_positions() {
        let text = "\tpitch 60;\n\t\tbogus = 1\n";
        let config = DecodeConfig::default().tab_width(4).source_name("t");
        let output = Decoder::new(&config, &MemoryLoader::default()).decode_str(
            text,
            &Metadata::standard(),
            &mut RecordingBuilder::new(),
        );
        let warning = output
            .warnings
            .first()
            .expect("unknown setting warns");
        let source = SimpleSource::new("t", text).with_tab_width(4);
        assert_eq!(&text[source.span_of(warning.position())], "b");
    }

    #[test]
    fn other_units_point_at_the_start() {
        let source = SimpleSource::new("main.fms", "pitch 60;");
        let mut position = at(1, 5);
        position.source = "part.fms".into();
        assert_eq!(source.span_of(&position), 0..0);
    }
}
