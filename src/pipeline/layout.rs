//! Report layout: [`AnalysisResult`] → drawing calls on a [`ReportSurface`].
//!
//! The layout knows nothing about PDF. It talks to a small drawing surface
//! (rectangles, lines, single text lines, a top-down vertical cursor and an
//! explicit page break), which the PDF backend implements in
//! [`crate::pipeline::pdf`] and tests implement with a recorder.
//!
//! ## Page flow
//!
//! ```text
//! ┌──────────── header band ───────────┐  brand, subtitle, gazette date
//! │ Archivo analizado: …               │
//! │ SECTION TITLE  ───────────────     │  rule or banner
//! │ 1. entry title                     │
//! │    metadata (muted)                │
//! │    summary (body)                  │
//! │ …                                  │  soft break when an entry would
//! └────────────────────────────────────┘  cross the bottom threshold
//!   hard break before each following section (configurable)
//! ```
//!
//! Soft breaks are checked twice: once per entry (keep an entry together when
//! it fits on a fresh page) and once per line (an entry taller than a page
//! still never writes below the threshold).

use crate::model::{AnalysisResult, Appointment, Norm};
use tracing::debug;

/// Width × height of an A4 page in points.
pub const A4: (f32, f32) = (595.28, 841.89);

/// An RGB colour with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::hex(0x000000);
    pub const WHITE: Rgb = Rgb::hex(0xFFFFFF);

    /// Build from a `0xRRGGBB` literal.
    pub const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as f32 / 255.0,
            g: ((rgb >> 8) & 0xFF) as f32 / 255.0,
            b: (rgb & 0xFF) as f32 / 255.0,
        }
    }
}

/// How a single line of text is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: Rgb,
    pub bold: bool,
}

impl TextStyle {
    pub const fn new(size: f32, color: Rgb) -> Self {
        Self {
            size,
            color,
            bold: false,
        }
    }

    pub const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Vertical space one line of this style occupies.
    pub fn line_height(&self) -> f32 {
        self.size * 1.25
    }
}

/// The drawing capabilities the layout needs.
///
/// Coordinates are in points with the origin at the top-left of the current
/// page; `y` grows downwards. The cursor is only moved by the layout
/// ([`ReportSurface::set_cursor_y`]) and by [`ReportSurface::page_break`].
pub trait ReportSurface {
    /// Page width and height in points.
    fn page_size(&self) -> (f32, f32);

    /// Current vertical write position.
    fn cursor_y(&self) -> f32;

    fn set_cursor_y(&mut self, y: f32);

    /// Move the cursor down by `dy`.
    fn advance(&mut self, dy: f32) {
        let y = self.cursor_y();
        self.set_cursor_y(y + dy);
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb);

    fn stroke_line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Rgb);

    /// Draw one line of text whose top edge is at `y`. Does not move the cursor.
    fn write_text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle);

    /// Start a new page; the cursor moves to `top`.
    fn page_break(&mut self, top: f32);

    /// Rendered width of `text` in `style`.
    fn text_width(&self, text: &str, style: &TextStyle) -> f32;
}

/// The three report sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Norms,
    DesignatedAppointments,
    ConcludedAppointments,
}

/// How section titles are set off from their content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingStyle {
    /// Coloured title with a rule underneath.
    Rule,
    /// Title in reverse type on a filled band.
    Banner,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    /// Header band, entry titles, banners.
    pub primary: Rgb,
    /// Section titles and rules.
    pub accent: Rgb,
    /// Metadata lines.
    pub muted: Rgb,
    /// Summaries and plain text.
    pub body: Rgb,
    /// Text drawn on top of `primary`.
    pub on_primary: Rgb,
}

/// Everything that varies between report designs.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTheme {
    pub brand: String,
    pub subtitle: String,
    pub palette: Palette,
    pub heading_style: HeadingStyle,
    /// Sections in the order they appear.
    pub sections: Vec<SectionKind>,
    pub norms_title: String,
    pub designated_title: String,
    pub concluded_title: String,
    pub norms_placeholder: String,
    pub appointments_placeholder: String,
    /// Start every section after the first on a new page.
    pub hard_section_breaks: bool,
    pub page_size: (f32, f32),
    pub margin: f32,
    pub header_height: f32,
}

impl Default for ReportTheme {
    fn default() -> Self {
        Self::sunass()
    }
}

impl ReportTheme {
    /// Institutional blues with ruled section titles.
    pub fn sunass() -> Self {
        Self {
            brand: "SUNASS - Análisis de Normas Legales".into(),
            subtitle: "Diario Oficial \"El Peruano\"".into(),
            palette: Palette {
                primary: Rgb::hex(0x0055A4),
                accent: Rgb::hex(0x00A3E0),
                muted: Rgb::hex(0x4D4D4D),
                body: Rgb::BLACK,
                on_primary: Rgb::WHITE,
            },
            heading_style: HeadingStyle::Rule,
            sections: vec![
                SectionKind::Norms,
                SectionKind::DesignatedAppointments,
                SectionKind::ConcludedAppointments,
            ],
            norms_title: "Normas legales relevantes".into(),
            designated_title: "Movimientos de cargos públicos - Designados".into(),
            concluded_title: "Movimientos de cargos públicos - Concluidos".into(),
            norms_placeholder: "No se encontraron normas legales relevantes.".into(),
            appointments_placeholder: "No se encontraron registros.".into(),
            hard_section_breaks: true,
            page_size: A4,
            margin: 50.0,
            header_height: 70.0,
        }
    }

    /// Same content, darker palette, titles on filled banners.
    pub fn banner() -> Self {
        Self {
            palette: Palette {
                primary: Rgb::hex(0x1F3A5F),
                accent: Rgb::hex(0x1F3A5F),
                muted: Rgb::hex(0x5F6B7A),
                body: Rgb::hex(0x1A1A1A),
                on_primary: Rgb::WHITE,
            },
            heading_style: HeadingStyle::Banner,
            ..Self::sunass()
        }
    }

    pub fn title_for(&self, kind: SectionKind) -> &str {
        match kind {
            SectionKind::Norms => &self.norms_title,
            SectionKind::DesignatedAppointments => &self.designated_title,
            SectionKind::ConcludedAppointments => &self.concluded_title,
        }
    }

    fn placeholder_for(&self, kind: SectionKind) -> &str {
        match kind {
            SectionKind::Norms => &self.norms_placeholder,
            _ => &self.appointments_placeholder,
        }
    }

    /// Lowest `y` a line may extend to before a soft break.
    pub fn bottom_threshold(&self) -> f32 {
        self.page_size.1 - self.margin
    }

    fn content_width(&self) -> f32 {
        self.page_size.0 - 2.0 * self.margin
    }
}

/// Gap after an entry, and between a section heading and its content.
const ENTRY_GAP: f32 = 8.0;
const PARAGRAPH_GAP: f32 = 3.0;
const SECTION_GAP: f32 = 18.0;

/// Lay out the whole report on `surface`.
///
/// Returns the number of the last page written (1-based), i.e. the page
/// count when the surface started on a fresh page.
pub fn layout_report<S: ReportSurface>(
    surface: &mut S,
    analysis: &AnalysisResult,
    source_label: &str,
    theme: &ReportTheme,
) -> usize {
    let mut layout = Layout {
        surface,
        theme,
        page: 1,
    };

    layout.header(&analysis.gazette_date, source_label);
    for (i, kind) in theme.sections.iter().copied().enumerate() {
        if i > 0 {
            if theme.hard_section_breaks {
                layout.new_page();
            } else {
                layout.surface.advance(SECTION_GAP);
            }
        }
        layout.section(kind, analysis);
    }

    debug!("Report laid out on {} pages", layout.page);
    layout.page
}

/// Greedy word wrap; words wider than `max_width` are split by character.
pub fn wrap_text<S: ReportSurface + ?Sized>(
    surface: &S,
    text: &str,
    max_width: f32,
    style: &TextStyle,
) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if surface.text_width(&candidate, style) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if surface.text_width(word, style) <= max_width {
                current = word.to_string();
            } else {
                for ch in word.chars() {
                    current.push(ch);
                    if surface.text_width(&current, style) > max_width && current.chars().count() > 1
                    {
                        let last = current.pop().unwrap_or(ch);
                        lines.push(std::mem::take(&mut current));
                        current.push(last);
                    }
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Collapses `text` onto one line and cuts it with "..." past `max_width`.
fn fit_line<S: ReportSurface + ?Sized>(
    surface: &S,
    text: &str,
    max_width: f32,
    style: &TextStyle,
) -> String {
    let mut line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if surface.text_width(&line, style) <= max_width {
        return line;
    }
    while !line.is_empty() && surface.text_width(&format!("{line}..."), style) > max_width {
        line.pop();
    }
    format!("{}...", line.trim_end())
}

struct Layout<'a, S: ReportSurface> {
    surface: &'a mut S,
    theme: &'a ReportTheme,
    page: usize,
}

/// A block of wrapped lines sharing one style.
struct Block {
    lines: Vec<String>,
    style: TextStyle,
    indent: f32,
}

impl Block {
    fn height(&self) -> f32 {
        self.lines.len() as f32 * self.style.line_height()
    }
}

fn entry_height(blocks: &[Block]) -> f32 {
    blocks.iter().map(Block::height).sum::<f32>()
        + PARAGRAPH_GAP * blocks.len().saturating_sub(1) as f32
}

impl<'a, S: ReportSurface> Layout<'a, S> {
    fn new_page(&mut self) {
        self.surface.page_break(self.theme.margin);
        self.page += 1;
    }

    /// Soft break when `height` more points would cross the threshold.
    /// Never breaks at the top of a page, where nothing more can be gained.
    fn ensure_room(&mut self, height: f32) {
        let y = self.surface.cursor_y();
        if y + height > self.theme.bottom_threshold() && y > self.theme.margin {
            self.new_page();
        }
    }

    fn header(&mut self, gazette_date: &str, source_label: &str) {
        let t = self.theme;
        let (width, _) = self.surface.page_size();
        let on_primary = t.palette.on_primary;

        self.surface
            .fill_rect(0.0, 0.0, width, t.header_height, t.palette.primary);
        self.surface.write_text(
            &t.brand,
            t.margin,
            12.0,
            &TextStyle::new(18.0, on_primary).bold(),
        );
        self.surface.write_text(
            &t.subtitle,
            t.margin,
            34.0,
            &TextStyle::new(11.0, on_primary),
        );
        // The band has a fixed height, so the date stays on one line.
        let date_style = TextStyle::new(10.0, on_primary);
        let date_line = fit_line(
            &*self.surface,
            &format!("Fecha del diario: {gazette_date}"),
            t.content_width(),
            &date_style,
        );
        self.surface
            .write_text(&date_line, t.margin, 50.0, &date_style);

        self.surface.set_cursor_y(t.header_height + 20.0);
        let label = format!("Archivo analizado: {source_label}");
        self.paragraph(&label, TextStyle::new(11.0, t.palette.body), 0.0);
    }

    fn section(&mut self, kind: SectionKind, analysis: &AnalysisResult) {
        let theme = self.theme;
        let body = TextStyle::new(10.0, theme.palette.body);

        let entries: Vec<Vec<Block>> = match kind {
            SectionKind::Norms => analysis
                .norms
                .iter()
                .enumerate()
                .map(|(i, n)| self.norm_blocks(i + 1, n))
                .collect(),
            SectionKind::DesignatedAppointments => analysis
                .designated_appointments
                .iter()
                .enumerate()
                .map(|(i, a)| self.appointment_blocks(i + 1, a))
                .collect(),
            SectionKind::ConcludedAppointments => analysis
                .concluded_appointments
                .iter()
                .enumerate()
                .map(|(i, a)| self.appointment_blocks(i + 1, a))
                .collect(),
        };

        // The heading moves with whatever comes first underneath it.
        if entries.is_empty() {
            let placeholder = self.block(theme.placeholder_for(kind), body, 0.0);
            self.ensure_room(self.heading_height() + placeholder.height());
            self.section_heading(theme.title_for(kind));
            self.write_block(&placeholder);
            return;
        }

        for (n, blocks) in entries.iter().enumerate() {
            let height = entry_height(blocks);
            if n == 0 {
                self.ensure_room(self.heading_height() + height);
                self.section_heading(theme.title_for(kind));
            } else {
                self.ensure_room(height);
            }
            for (i, block) in blocks.iter().enumerate() {
                if i > 0 {
                    self.surface.advance(PARAGRAPH_GAP);
                }
                self.write_block(block);
            }
            self.surface.advance(ENTRY_GAP);
        }
    }

    fn heading_style(&self) -> TextStyle {
        let t = self.theme;
        match t.heading_style {
            HeadingStyle::Rule => TextStyle::new(14.0, t.palette.accent).bold(),
            HeadingStyle::Banner => TextStyle::new(13.0, t.palette.on_primary).bold(),
        }
    }

    /// Vertical space a section heading takes, gap below included.
    fn heading_height(&self) -> f32 {
        let lh = self.heading_style().line_height();
        match self.theme.heading_style {
            HeadingStyle::Rule => lh + 12.0,
            HeadingStyle::Banner => lh + 8.0 + 10.0,
        }
    }

    /// Draws the heading at the cursor; callers reserve room first.
    fn section_heading(&mut self, title: &str) {
        let t = self.theme;
        let style = self.heading_style();
        let band = style.line_height() + 8.0;

        let y = self.surface.cursor_y();
        match t.heading_style {
            HeadingStyle::Rule => {
                self.surface.write_text(title, t.margin, y, &style);
                let rule_y = y + style.line_height() + 2.0;
                self.surface.stroke_line(
                    (t.margin, rule_y),
                    (t.page_size.0 - t.margin, rule_y),
                    2.0,
                    t.palette.accent,
                );
                self.surface.set_cursor_y(rule_y + 10.0);
            }
            HeadingStyle::Banner => {
                self.surface
                    .fill_rect(t.margin, y, t.content_width(), band, t.palette.primary);
                self.surface.write_text(title, t.margin + 8.0, y + 4.0, &style);
                self.surface.set_cursor_y(y + band + 10.0);
            }
        }
    }

    fn block(&self, text: &str, style: TextStyle, indent: f32) -> Block {
        let width = self.theme.content_width() - indent;
        Block {
            lines: wrap_text(&*self.surface, text, width, &style),
            style,
            indent,
        }
    }

    fn norm_blocks(&self, ordinal: usize, norm: &Norm) -> Vec<Block> {
        let p = &self.theme.palette;
        let meta = format!(
            "Sector: {} | Id: {} | Publicación: {} | Página: {} | Relevancia: {}",
            norm.sector,
            norm.norm_id,
            norm.publication_date,
            norm.page_number,
            norm.relevance_to_water_sector
        );
        vec![
            self.block(
                &format!("{ordinal}. {}", norm.title),
                TextStyle::new(11.0, p.primary).bold(),
                0.0,
            ),
            self.block(&meta, TextStyle::new(9.0, p.muted), 12.0),
            self.block(&norm.summary, TextStyle::new(9.0, p.body), 12.0),
        ]
    }

    fn appointment_blocks(&self, ordinal: usize, appt: &Appointment) -> Vec<Block> {
        let p = &self.theme.palette;
        let meta = format!(
            "Institución: {} | Cargo: {}",
            appt.institution, appt.position
        );
        vec![
            self.block(
                &format!("{ordinal}. {}", appt.person_name),
                TextStyle::new(11.0, p.primary).bold(),
                0.0,
            ),
            self.block(&meta, TextStyle::new(9.0, p.muted), 12.0),
            self.block(&appt.summary, TextStyle::new(9.0, p.body), 12.0),
        ]
    }

    fn paragraph(&mut self, text: &str, style: TextStyle, indent: f32) {
        let block = self.block(text, style, indent);
        self.write_block(&block);
    }

    fn write_block(&mut self, block: &Block) {
        let lh = block.style.line_height();
        for line in &block.lines {
            self.ensure_room(lh);
            let y = self.surface.cursor_y();
            self.surface
                .write_text(line, self.theme.margin + block.indent, y, &block.style);
            self.surface.advance(lh);
        }
    }
}
