//! Minimal PDF 1.4 writer for the patient report.
//!
//! Only what the report needs: A4 pages, the two standard Helvetica faces with
//! WinAnsi encoding, coloured text, word wrapping and pagination. The layout comes
//! from [`super::text::report_lines`].

use itertools::Itertools;
use std::io::{self, Write};

use super::ScoredPatient;
use super::text::{LineKind, ReportLine, TITLE, report_lines};

const PAGE_WIDTH: f64 = 595.0;
const PAGE_HEIGHT: f64 = 842.0;
const MARGIN: f64 = 56.0;
const LEADING_FACTOR: f64 = 1.45;
/// Average Helvetica advance as a fraction of the font size, used for wrapping.
const AVERAGE_GLYPH_WIDTH: f64 = 0.5;
const BULLET_INDENT: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Face {
    Regular,
    Bold,
}

impl Face {
    fn resource(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Style {
    face: Face,
    size: f64,
    rgb: (f64, f64, f64),
    indent: f64,
}

fn style_for(kind: LineKind) -> Style {
    let black = (0.0, 0.0, 0.0);
    let grey = (0.42, 0.45, 0.50);
    match kind {
        LineKind::Title => Style {
            face: Face::Bold,
            size: 16.0,
            rgb: black,
            indent: 0.0,
        },
        LineKind::Subtitle => Style {
            face: Face::Regular,
            size: 10.0,
            rgb: grey,
            indent: 0.0,
        },
        LineKind::Tier(tier) => Style {
            face: Face::Bold,
            size: 12.0,
            rgb: tier.rgb(),
            indent: 0.0,
        },
        LineKind::Heading => Style {
            face: Face::Bold,
            size: 12.0,
            rgb: black,
            indent: 0.0,
        },
        LineKind::Bullet => Style {
            face: Face::Regular,
            size: 10.5,
            rgb: black,
            indent: BULLET_INDENT,
        },
        LineKind::Body | LineKind::Blank => Style {
            face: Face::Regular,
            size: 11.0,
            rgb: black,
            indent: 0.0,
        },
    }
}

/// Encodes text for a literal string in a WinAnsi-encoded font, escaping the
/// delimiters. Characters outside the encoding degrade to an ASCII stand-in or '?'.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' | '(' | ')' => {
                out.push(b'\\');
                out.push(ch as u8);
            }
            '\t' => out.push(b' '),
            c if c.is_ascii_control() => {}
            c if c.is_ascii() => out.push(c as u8),
            '‘' => out.push(0x91),
            '’' => out.push(0x92),
            '“' => out.push(0x93),
            '”' => out.push(0x94),
            '•' => out.push(0x95),
            '–' => out.push(0x96),
            '—' => out.push(0x97),
            '≥' => out.extend_from_slice(b">="),
            '≤' => out.extend_from_slice(b"<="),
            c if ('\u{a0}'..='\u{ff}').contains(&c) => out.push(c as u32 as u8),
            _ => out.push(b'?'),
        }
    }
    out
}

/// Greedy word wrap on an estimated character budget.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

struct PlacedLine {
    style: Style,
    x: f64,
    y: f64,
    text: String,
}

/// Wraps and positions every line, starting a page whenever the bottom margin
/// is reached.
fn paginate(lines: &[ReportLine]) -> Vec<Vec<PlacedLine>> {
    let mut pages: Vec<Vec<PlacedLine>> = vec![Vec::new()];
    let mut y = PAGE_HEIGHT - MARGIN;

    for line in lines {
        let style = style_for(line.kind);
        let leading = style.size * LEADING_FACTOR;
        let usable = PAGE_WIDTH - 2.0 * MARGIN - style.indent;
        let max_chars = (usable / (style.size * AVERAGE_GLYPH_WIDTH)).floor().max(1.0) as usize;

        for (piece_index, piece) in wrap(&line.text, max_chars).into_iter().enumerate() {
            y -= leading;
            if y < MARGIN {
                pages.push(Vec::new());
                y = PAGE_HEIGHT - MARGIN - leading;
            }
            // Continuation lines of a bullet hang under its text, past the bullet glyph.
            let hang = if piece_index > 0 && line.kind == LineKind::Bullet {
                style.size
            } else {
                0.0
            };
            if line.kind != LineKind::Blank {
                if let Some(page) = pages.last_mut() {
                    page.push(PlacedLine {
                        style,
                        x: MARGIN + style.indent + hang,
                        y,
                        text: piece,
                    });
                }
            }
        }
    }
    pages
}

fn content_stream(page: &[PlacedLine]) -> Vec<u8> {
    let mut stream = Vec::new();
    for placed in page {
        let (r, g, b) = placed.style.rgb;
        stream.extend_from_slice(
            format!(
                "BT /{} {} Tf {r:.3} {g:.3} {b:.3} rg 1 0 0 1 {:.2} {:.2} Tm (",
                placed.style.face.resource(),
                placed.style.size,
                placed.x,
                placed.y
            )
            .as_bytes(),
        );
        stream.extend_from_slice(&encode_win_ansi(&placed.text));
        stream.extend_from_slice(b") Tj ET\n");
    }
    stream
}

/// Serialises objects and tracks their byte offsets for the cross-reference table.
struct PdfBuilder {
    buffer: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfBuilder {
    fn new() -> Self {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buffer,
            offsets: Vec::new(),
        }
    }

    /// Object numbers are assigned in call order, starting at 1.
    fn object(&mut self, body: &[u8]) -> usize {
        self.offsets.push(self.buffer.len());
        let number = self.offsets.len();
        self.buffer
            .extend_from_slice(format!("{number} 0 obj\n").as_bytes());
        self.buffer.extend_from_slice(body);
        self.buffer.extend_from_slice(b"\nendobj\n");
        number
    }

    fn stream(&mut self, data: &[u8]) -> usize {
        let mut body = format!("<< /Length {} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.object(&body)
    }

    fn finish(mut self, root: usize, info: usize) -> Vec<u8> {
        let xref_offset = self.buffer.len();
        let size = self.offsets.len() + 1;
        self.buffer
            .extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
        for offset in &self.offsets {
            self.buffer
                .extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        self.buffer.extend_from_slice(
            format!(
                "trailer\n<< /Size {size} /Root {root} 0 R /Info {info} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
            )
            .as_bytes(),
        );
        self.buffer
    }
}

/// Renders the report as a complete PDF document.
pub fn render_pdf(scored: &ScoredPatient) -> Vec<u8> {
    let pages = paginate(&report_lines(scored));

    // Object layout: 1 catalog, 2 page tree, 3-4 fonts, 5 info, then a
    // (content, page) pair per page.
    let page_count = pages.len();
    let first_page_object = 7;
    let kids = (0..page_count)
        .map(|index| format!("{} 0 R", first_page_object + 2 * index))
        .join(" ");

    let mut pdf = PdfBuilder::new();
    let root = pdf.object(b"<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(format!("<< /Type /Pages /Kids [{kids}] /Count {page_count} >>").as_bytes());
    pdf.object(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
    );
    pdf.object(
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>",
    );
    let mut info = b"<< /Title (".to_vec();
    info.extend_from_slice(&encode_win_ansi(TITLE));
    info.extend_from_slice(
        format!(") /Producer ({} {}) >>", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
            .as_bytes(),
    );
    let info = pdf.object(&info);

    for page in &pages {
        let content = pdf.stream(&content_stream(page));
        pdf.object(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {content} 0 R >>"
            )
            .as_bytes(),
        );
    }

    pdf.finish(root, info)
}

pub fn write_pdf<W: Write>(mut output: W, scored: &ScoredPatient) -> io::Result<()> {
    output.write_all(&render_pdf(scored))?;
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PatientInput;
    use crate::scorer::RiskScorer;

    fn scored() -> ScoredPatient {
        let scorer = RiskScorer::builtin();
        let patient =
            PatientInput::new("Male", 50, "Diabetic Nephropathy", scorer.catalog()).unwrap();
        let result = scorer.score_patient(&patient).unwrap();
        ScoredPatient { patient, result }
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    #[test]
    fn document_has_header_trailer_and_report_text() {
        let pdf = render_pdf(&scored());
        assert!(pdf.starts_with(b"%PDF-1.4\n"));
        assert!(pdf.ends_with(b"%%EOF\n"));
        assert!(find(&pdf, b"(Hazard Risk Ratio: 3.677) Tj").is_some());
        assert!(find(&pdf, b"(Risk level: Medium Risk) Tj").is_some());
        assert!(find(&pdf, b"(Patient: Male, 50 years at start of dialysis) Tj").is_some());
        assert!(find(&pdf, b"3.68\xD7 higher").is_some());
        assert!(find(&pdf, b"(\x95 Tighten glycaemic").is_some());
    }

    #[test]
    fn tier_line_is_drawn_in_tier_colour() {
        let pdf = render_pdf(&scored());
        // #f59e0b
        assert!(find(&pdf, b"0.961 0.620 0.043 rg").is_some());
    }

    #[test]
    fn cross_reference_offsets_point_at_objects() {
        let pdf = render_pdf(&scored());
        let text = String::from_utf8_lossy(&pdf);
        let startxref = text.rfind("startxref\n").unwrap();
        let offset: usize = text[startxref + 10..]
            .lines()
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert!(pdf[offset..].starts_with(b"xref\n"));

        let xref = String::from_utf8_lossy(&pdf[offset..]);
        let entries: Vec<usize> = xref
            .lines()
            .skip(3)
            .take_while(|line| line.ends_with(" n "))
            .map(|line| line[..10].parse().unwrap())
            .collect();
        assert_eq!(entries.len(), 7);
        for (index, entry) in entries.iter().enumerate() {
            let expected = format!("{} 0 obj\n", index + 1);
            assert!(pdf[*entry..].starts_with(expected.as_bytes()));
        }
    }

    #[test]
    fn win_ansi_encoding_escapes_and_maps() {
        assert_eq!(encode_win_ansi("a(b)c\\"), b"a\\(b\\)c\\\\".to_vec());
        assert_eq!(encode_win_ansi("• ×"), vec![0x95, b' ', 0xD7]);
        assert_eq!(encode_win_ansi("≥ 1.2"), b">= 1.2".to_vec());
        assert_eq!(encode_win_ansi("漢"), b"?".to_vec());
    }

    #[test]
    fn wrap_respects_budget_and_keeps_words() {
        let lines = wrap("alpha beta gamma delta epsilon", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta", "epsilon"]);
        assert_eq!(wrap("", 10), vec![String::new()]);
        assert_eq!(wrap("unbreakablelongword", 5), vec!["unbreakablelongword"]);
    }

    #[test]
    fn long_reports_span_several_pages() {
        let many: Vec<ReportLine> = (0..120)
            .map(|index| ReportLine {
                kind: LineKind::Body,
                text: format!("line {index}"),
            })
            .collect();
        let pages = paginate(&many);
        assert!(pages.len() >= 2);
        assert!(pages
            .iter()
            .flatten()
            .all(|placed| placed.y >= MARGIN && placed.y <= PAGE_HEIGHT - MARGIN));
        assert_eq!(pages.iter().map(Vec::len).sum::<usize>(), 120);
    }
}
