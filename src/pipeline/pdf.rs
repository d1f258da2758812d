//! [`ReportSurface`] backed by a lopdf [`Document`].
//!
//! Text uses the standard Helvetica faces with WinAnsiEncoding, so no font is
//! embedded. Characters outside that encoding are written as `?`.

use crate::error::GazetteError;
use crate::pipeline::layout::{ReportSurface, Rgb, TextStyle};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

const REGULAR: &[u8] = b"F1";
const BOLD: &[u8] = b"F2";

/// Distance from the top of a line box to the baseline, in ems.
const ASCENT: f32 = 0.8;

/// Collects drawing operations page by page and serialises them on
/// [`PdfSurface::finish`].
pub struct PdfSurface {
    size: (f32, f32),
    pages: Vec<Vec<Operation>>,
    cursor: f32,
}

impl PdfSurface {
    /// A surface with one empty page of `size` points.
    pub fn new(size: (f32, f32)) -> Self {
        Self {
            size,
            pages: vec![Vec::new()],
            cursor: 0.0,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn ops(&mut self) -> &mut Vec<Operation> {
        // `new` starts with one page and pages are never removed.
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Flip a top-down `y` into PDF user space.
    fn pdf_y(&self, y: f32) -> f32 {
        self.size.1 - y
    }

    /// Serialise to PDF bytes. `title` lands in the document info dictionary.
    pub fn finish(self, title: &str) -> Result<Vec<u8>, GazetteError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(font("Helvetica"));
        let bold = doc.add_object(font("Helvetica-Bold"));
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
            },
        });

        let media_box = vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(self.size.0),
            Object::Real(self.size.1),
        ];

        let mut kids = Vec::with_capacity(self.pages.len());
        for operations in self.pages {
            let encoded = Content { operations }
                .encode()
                .map_err(|e| GazetteError::PdfEncodeFailed(format!("content stream: {e}")))?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box.clone(),
                "Resources" => resources_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(encode_win_ansi(title), StringFormat::Literal),
            "Producer" => Object::string_literal(concat!("gazette-report ", env!("CARGO_PKG_VERSION"))),
        });
        doc.trailer.set("Root", catalog_id);
        doc.trailer.set("Info", info_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| GazetteError::PdfEncodeFailed(e.to_string()))?;
        Ok(buffer)
    }
}

fn font(base: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn real(v: f32) -> Object {
    Object::Real(v)
}

fn color_operands(c: Rgb) -> Vec<Object> {
    vec![real(c.r), real(c.g), real(c.b)]
}

impl ReportSurface for PdfSurface {
    fn page_size(&self) -> (f32, f32) {
        self.size
    }

    fn cursor_y(&self) -> f32 {
        self.cursor
    }

    fn set_cursor_y(&mut self, y: f32) {
        self.cursor = y;
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        let bottom = self.pdf_y(y + height);
        let ops = self.ops();
        ops.push(Operation::new("rg", color_operands(color)));
        ops.push(Operation::new(
            "re",
            vec![real(x), real(bottom), real(width), real(height)],
        ));
        ops.push(Operation::new("f", vec![]));
    }

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgb) {
        let (y1, y2) = (self.pdf_y(from.1), self.pdf_y(to.1));
        let ops = self.ops();
        ops.push(Operation::new("RG", color_operands(color)));
        ops.push(Operation::new("w", vec![real(width)]));
        ops.push(Operation::new("m", vec![real(from.0), real(y1)]));
        ops.push(Operation::new("l", vec![real(to.0), real(y2)]));
        ops.push(Operation::new("S", vec![]));
    }

    fn write_text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle) {
        if text.is_empty() {
            return;
        }
        let baseline = self.pdf_y(y + style.size * ASCENT);
        let face = if style.bold { BOLD } else { REGULAR };
        let ops = self.ops();
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(face.to_vec()), real(style.size)],
        ));
        ops.push(Operation::new("rg", color_operands(style.color)));
        ops.push(Operation::new("Td", vec![real(x), real(baseline)]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }

    fn page_break(&mut self, top: f32) {
        self.pages.push(Vec::new());
        self.cursor = top;
    }

    fn text_width(&self, text: &str, style: &TextStyle) -> f32 {
        let units: u32 = text.chars().map(|c| helvetica_width(c) as u32).sum();
        let scale = if style.bold { 1.06 } else { 1.0 };
        units as f32 / 1000.0 * style.size * scale
    }
}

/// Map text to WinAnsiEncoding (CP1252) bytes.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\t' => b' ',
            c if (' '..='~').contains(&c) => c as u8,
            c if ('\u{A0}'..='\u{FF}').contains(&c) => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Helvetica advance widths in 1/1000 em (standard AFM metrics for ASCII,
/// base-letter width for accented Latin-1).
fn helvetica_width(c: char) -> u16 {
    const ASCII: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
        278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // 'A'..'M'
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'N'..'Z'
        278, 278, 278, 469, 556, 333, // '['..'`'
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // 'a'..'m'
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'n'..'z'
        334, 260, 334, 584, // '{'..'~'
    ];
    match c {
        ' '..='~' => ASCII[c as usize - 0x20],
        'Á' | 'À' | 'Â' | 'Ä' | 'É' | 'Ê' | 'Ñ' => 700,
        'Í' | 'ì' | 'í' | 'î' | 'ï' => 278,
        'Ó' | 'Ú' | 'Ü' => 750,
        _ => 556,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::layout::{layout_report, ReportTheme, A4};
    use crate::model::AnalysisResult;

    fn tj_strings(doc: &Document) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        for (_, page_id) in doc.get_pages() {
            let bytes = doc.get_page_content(page_id).unwrap();
            let content = Content::decode(&bytes).unwrap();
            for op in content.operations {
                if op.operator == "Tj" {
                    if let Some(Object::String(s, _)) = op.operands.first() {
                        out.push(s.clone());
                    }
                }
            }
        }
        out
    }

    #[test]
    fn empty_surface_is_a_one_page_pdf() {
        let bytes = PdfSurface::new(A4).finish("t").unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn page_breaks_become_pages() {
        let mut s = PdfSurface::new(A4);
        s.page_break(50.0);
        s.page_break(50.0);
        assert_eq!(s.page_count(), 3);
        assert_eq!(s.cursor_y(), 50.0);
        let doc = Document::load_mem(&s.finish("t").unwrap()).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn report_text_is_readable_back() {
        let mut s = PdfSurface::new(A4);
        let analysis = AnalysisResult::empty();
        let pages = layout_report(&mut s, &analysis, "diario.pdf", &ReportTheme::sunass());
        let doc = Document::load_mem(&s.finish("informe").unwrap()).unwrap();
        assert_eq!(doc.get_pages().len(), pages);

        let strings = tj_strings(&doc);
        assert!(strings.contains(&b"No se encontraron registros.".to_vec()));
        assert!(strings.contains(&b"Archivo analizado: diario.pdf".to_vec()));
        assert!(strings.contains(&encode_win_ansi("Normas legales relevantes")));
    }

    #[test]
    fn win_ansi_maps_latin1_and_typographic_marks() {
        assert_eq!(encode_win_ansi("año"), vec![b'a', 0xF1, b'o']);
        assert_eq!(encode_win_ansi("\u{201C}x\u{201D}"), vec![0x93, b'x', 0x94]);
        assert_eq!(encode_win_ansi("N\u{00B0}"), vec![b'N', 0xB0]);
        assert_eq!(encode_win_ansi("\u{4E2D}"), vec![b'?']);
    }

    #[test]
    fn width_scales_with_size_and_weight() {
        let s = PdfSurface::new(A4);
        let regular = TextStyle::new(10.0, Rgb::BLACK);
        let w10 = s.text_width("Hola", &regular);
        let w20 = s.text_width("Hola", &TextStyle::new(20.0, Rgb::BLACK));
        assert!((w20 - 2.0 * w10).abs() < 1e-3);
        assert!(s.text_width("Hola", &regular.bold()) > w10);
        // "H" 722 + "o" 556 + "l" 222 + "a" 556 at 10 pt.
        assert!((w10 - 20.56).abs() < 1e-3);
    }
}
