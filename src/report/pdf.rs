//! Paginated A4 rendering of a `ReportDocument`.
//!
//! Layout works top-down in millimetres on a `PageComposer`, which turns
//! every drawing call into PDF content operations for the current page.
//! Running headers and footers are added once the page count is known.
//!
//! Pagination is two-level: before a record block the composer compares
//! a rough height estimate (`estimate_text_height`) against the space
//! left, and before every field row it checks the row's real wrapped
//! height. Rows taller than a whole page are split line by line.

use super::content::{DATA_SOURCE, RecordBlock, ReportDocument, Section, format_timestamp};
use crate::errors::{AppError, Result};
use log::debug;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_L: f32 = 15.0;
const MARGIN_R: f32 = 15.0;
const USABLE_W: f32 = PAGE_W - MARGIN_L - MARGIN_R;
const COL_LABEL: f32 = 38.0;
const COL_VALUE: f32 = USABLE_W - COL_LABEL;
const STAT_COL_LABEL: f32 = 55.0;

const HEADER_BAR_H: f32 = 14.0;
const HEADER_TEXT: &str = "ANÁLISIS DE LA DEMANDA — SECOP — COLOMBIA COMPRA EFICIENTE";
const FOOTER_RULE_Y: f32 = PAGE_H - 12.0;

const CONTENT_TOP: f32 = 20.0;
/// No content is placed below this line
pub const CONTENT_BOTTOM: f32 = PAGE_H - 18.0;
/// A record block whose estimate ends below this starts a new page
const BLOCK_BREAK_Y: f32 = 270.0;

const VALUE_FONT: f32 = 7.5;
const VALUE_LINE_H: f32 = 4.2;
const MIN_ROW_H: f32 = 6.0;
const RECORD_HEADING_H: f32 = 8.0;
const PARAGRAPH_LINE_H: f32 = 4.5;

type Rgb = (u8, u8, u8);
const DARK_BLUE: Rgb = (0, 51, 102);
const LIGHT_BLUE: Rgb = (230, 240, 250);
const GREY_FILL: Rgb = (245, 245, 248);
const WHITE: Rgb = (255, 255, 255);
const BLACK: Rgb = (0, 0, 0);
const GREY_TEXT: Rgb = (80, 80, 80);
const GREY_LINE: Rgb = (180, 180, 190);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Font {
    Regular,
    Bold,
    Italic,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Italic => "F3",
        }
    }
}

fn pt(mm: f32) -> f32 {
    mm * 72.0 / 25.4
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

fn color_operands(color: Rgb) -> Vec<Object> {
    vec![real(color.0 as f32 / 255.0), real(color.1 as f32 / 255.0), real(color.2 as f32 / 255.0)]
}

//
// Text metrics
//

/// Helvetica capital widths, A to Z
const CAPS_REGULAR: [u16; 26] = [
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611,
];
const CAPS_BOLD: [u16; 26] = [
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611,
];

/// Accented capitals share the width of their base letter
fn capital_width(c: char, bold: bool) -> Option<u16> {
    let base = match c {
        'Á' => 'A',
        'É' => 'E',
        'Í' => 'I',
        'Ó' => 'O',
        'Ú' | 'Ü' => 'U',
        'Ñ' => 'N',
        'A'..='Z' => c,
        _ => return None,
    };
    let table = if bold { &CAPS_BOLD } else { &CAPS_REGULAR };
    Some(table[(base as u8 - b'A') as usize])
}

/// Helvetica advance width, in 1/1000 em. Exact for capitals,
/// approximate for lower case and symbols
fn glyph_width(c: char, font: Font) -> u16 {
    let bold = font == Font::Bold;
    if let Some(width) = capital_width(c, bold) {
        return width;
    }
    match c {
        'i' | 'j' | 'l' | 'í' => {
            if bold {
                278
            } else {
                222
            }
        }
        ' ' | ',' | '.' | '/' | ':' | ';' | '!' | '\'' | '|' | '[' | ']' => 278,
        'f' | 't' | 'r' | '(' | ')' | '-' => 333,
        'm' => 833,
        'w' => 722,
        '%' => 889,
        '@' => 1015,
        '—' => 1000,
        _ => {
            if bold {
                611
            } else {
                556
            }
        }
    }
}

/// Rendered width of `text` in millimetres
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| glyph_width(c, font) as u32).sum();
    units as f32 / 1000.0 * size * 25.4 / 72.0
}

/// Greedy word wrap to `width` mm; words wider than a line are broken.
///
/// Always returns at least one (possibly empty) line.
pub fn wrap_text(text: &str, width: f32, font: Font, size: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() { word.to_string() } else { format!("{} {}", current, word) };
            if text_width(&candidate, font, size) <= width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for c in word.chars() {
                current.push(c);
                if current.chars().count() > 1 && text_width(&current, font, size) > width {
                    current.pop();
                    lines.push(std::mem::replace(&mut current, c.to_string()));
                }
            }
        }
        lines.push(current);
    }

    lines
}

/// Rough height in mm of `text` wrapped into a column `width` mm wide.
///
/// Assumes about 2.1 mm per character at the value font size and adds
/// one line of slack. Only the block-level page break uses it.
pub fn estimate_text_height(text: &str, width: f32) -> f32 {
    let per_line = ((width / 2.1) as usize).max(1);
    let lines: usize = 1 + text.split('\n').map(|line| line.chars().count().div_ceil(per_line).max(1)).sum::<usize>();
    lines as f32 * VALUE_LINE_H
}

fn estimate_block_height(block: &RecordBlock) -> f32 {
    RECORD_HEADING_H
        + block.fields.iter().map(|(_, value)| estimate_text_height(value, COL_VALUE - 4.0).max(MIN_ROW_H)).sum::<f32>()
}

/// Height of a field row holding `lines` wrapped value lines
fn field_row_height(lines: usize) -> f32 {
    (lines as f32 * VALUE_LINE_H + 2.0).max(MIN_ROW_H)
}

/// How many value lines fit in `space` mm
fn lines_fitting(space: f32) -> usize {
    if space < field_row_height(1) { 0 } else { ((space - 2.0) / VALUE_LINE_H + 1e-3).floor() as usize }
}

/// Encode text for the built-in fonts' WinAnsi encoding; unmapped characters become `?`
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '─' | '━' => b'-',
            _ => b'?',
        })
        .collect()
}

//
// Drawing primitives (millimetres, y grows downwards)
//

fn fill_rect(ops: &mut Vec<Operation>, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
    ops.push(Operation::new("rg", color_operands(color)));
    ops.push(Operation::new("re", vec![real(pt(x)), real(pt(PAGE_H - y - h)), real(pt(w)), real(pt(h))]));
    ops.push(Operation::new("f", vec![]));
}

fn stroke_rect(ops: &mut Vec<Operation>, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
    ops.push(Operation::new("RG", color_operands(color)));
    ops.push(Operation::new("w", vec![real(pt(0.2))]));
    ops.push(Operation::new("re", vec![real(pt(x)), real(pt(PAGE_H - y - h)), real(pt(w)), real(pt(h))]));
    ops.push(Operation::new("S", vec![]));
}

fn line(ops: &mut Vec<Operation>, x1: f32, x2: f32, y: f32, width: f32, color: Rgb) {
    ops.push(Operation::new("RG", color_operands(color)));
    ops.push(Operation::new("w", vec![real(pt(width))]));
    ops.push(Operation::new("m", vec![real(pt(x1)), real(pt(PAGE_H - y))]));
    ops.push(Operation::new("l", vec![real(pt(x2)), real(pt(PAGE_H - y))]));
    ops.push(Operation::new("S", vec![]));
}

fn text(ops: &mut Vec<Operation>, x: f32, baseline: f32, font: Font, size: f32, color: Rgb, content: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("rg", color_operands(color)));
    ops.push(Operation::new("Tf", vec![font.resource().into(), real(size)]));
    ops.push(Operation::new("Td", vec![real(pt(x)), real(pt(PAGE_H - baseline))]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(content))]));
    ops.push(Operation::new("ET", vec![]));
}

/// Baseline that vertically centres a single line of `size` pt text in a cell
fn centred_baseline(top: f32, height: f32, size: f32) -> f32 {
    let cap_height = size * 0.7 * 25.4 / 72.0;
    top + (height + cap_height) / 2.0
}

//
// Layout
//

/// Laid-out pages before header/footer decoration
#[derive(Debug)]
pub struct PdfLayout {
    pub pages: Vec<Vec<Operation>>,
    /// Lowest y reached by content on each page
    pub page_bottoms: Vec<f32>,
    pub record_blocks: usize,
    pub stats_tables: usize,
}

struct PageComposer {
    pages: Vec<Vec<Operation>>,
    page_bottoms: Vec<f32>,
    current: Vec<Operation>,
    lowest: f32,
    y: f32,
}

impl PageComposer {
    fn new() -> Self {
        Self { pages: Vec::new(), page_bottoms: Vec::new(), current: Vec::new(), lowest: CONTENT_TOP, y: CONTENT_TOP }
    }

    fn new_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.page_bottoms.push(self.lowest);
        self.y = CONTENT_TOP;
        self.lowest = CONTENT_TOP;
    }

    fn at_page_top(&self) -> bool {
        self.y <= CONTENT_TOP
    }

    fn remaining(&self) -> f32 {
        CONTENT_BOTTOM - self.y
    }

    /// Start a new page unless `height` mm fit below the cursor
    fn ensure_space(&mut self, height: f32) {
        if height > self.remaining() && !self.at_page_top() {
            self.new_page();
        }
    }

    /// Move past content just drawn
    fn advance(&mut self, height: f32) {
        self.y += height;
        self.lowest = self.lowest.max(self.y);
    }

    /// Blank spacing; at the page end it becomes a page break instead
    fn gap(&mut self, height: f32) {
        if self.y + height > CONTENT_BOTTOM {
            self.new_page();
        } else {
            self.y += height;
        }
    }

    fn title(&mut self, title: &str) {
        self.ensure_space(15.0);
        text(&mut self.current, MARGIN_L, self.y + 7.0, Font::Bold, 15.0, DARK_BLUE, title);
        self.advance(10.0);
        line(&mut self.current, MARGIN_L, MARGIN_L + 60.0, self.y, 0.6, DARK_BLUE);
        self.gap(5.0);
    }

    fn paragraph(&mut self, paragraph: &str) {
        for row in wrap_text(paragraph, USABLE_W, Font::Regular, 8.5) {
            self.ensure_space(PARAGRAPH_LINE_H);
            text(&mut self.current, MARGIN_L, self.y + 3.4, Font::Regular, 8.5, GREY_TEXT, &row);
            self.advance(PARAGRAPH_LINE_H);
        }
        self.gap(PARAGRAPH_LINE_H);
    }

    fn callout(&mut self, callout: &str) {
        for row in wrap_text(callout, USABLE_W - 4.0, Font::Bold, 8.0) {
            self.ensure_space(7.0);
            fill_rect(&mut self.current, MARGIN_L, self.y, USABLE_W, 7.0, LIGHT_BLUE);
            text(&mut self.current, MARGIN_L + 2.0, centred_baseline(self.y, 7.0, 8.0), Font::Bold, 8.0, DARK_BLUE, &row);
            self.advance(7.0);
        }
        self.gap(4.0);
    }

    fn heading(&mut self, heading: &str) {
        // Keep the heading with at least its first table row
        self.ensure_space(8.0 + 4.0 + MIN_ROW_H);
        text(&mut self.current, MARGIN_L, centred_baseline(self.y, 8.0, 11.0), Font::Bold, 11.0, DARK_BLUE, heading);
        self.advance(8.0);
        line(&mut self.current, MARGIN_L, MARGIN_L + 50.0, self.y, 0.4, DARK_BLUE);
        self.gap(4.0);
    }

    fn stats_table(&mut self, rows: &[(&'static str, String)]) {
        let value_x = MARGIN_L + STAT_COL_LABEL;
        for (i, (label, value)) in rows.iter().enumerate() {
            let lines = wrap_text(value, USABLE_W - STAT_COL_LABEL - 4.0, Font::Regular, VALUE_FONT);
            let height = field_row_height(lines.len());
            self.ensure_space(height);

            let fill = if i % 2 == 0 { GREY_FILL } else { WHITE };
            fill_rect(&mut self.current, MARGIN_L, self.y, USABLE_W, height, fill);
            text(
                &mut self.current,
                MARGIN_L + 2.0,
                centred_baseline(self.y, MIN_ROW_H, VALUE_FONT),
                Font::Bold,
                VALUE_FONT,
                DARK_BLUE,
                label,
            );
            for (k, row) in lines.iter().enumerate() {
                let baseline = centred_baseline(self.y + k as f32 * VALUE_LINE_H, MIN_ROW_H, VALUE_FONT);
                text(&mut self.current, value_x + 2.0, baseline, Font::Regular, VALUE_FONT, BLACK, row);
            }
            self.advance(height);
        }

        self.gap(6.0);
        line(&mut self.current, MARGIN_L + 20.0, PAGE_W - MARGIN_R - 20.0, self.y, 0.2, GREY_LINE);
        self.gap(6.0);
    }

    fn record(&mut self, block: &RecordBlock) {
        if self.y + estimate_block_height(block) > BLOCK_BREAK_Y && !self.at_page_top() {
            debug!("page break before contract {}", block.index);
            self.new_page();
        }
        self.ensure_space(RECORD_HEADING_H + MIN_ROW_H);

        fill_rect(&mut self.current, MARGIN_L, self.y, USABLE_W, RECORD_HEADING_H, DARK_BLUE);
        text(
            &mut self.current,
            MARGIN_L + 3.0,
            centred_baseline(self.y, RECORD_HEADING_H, 9.0),
            Font::Bold,
            9.0,
            WHITE,
            &block.heading(),
        );
        self.advance(RECORD_HEADING_H);

        for (i, (label, value)) in block.fields.iter().enumerate() {
            self.field_row(i, label, value);
        }

        self.gap(4.0);
        line(&mut self.current, MARGIN_L + 20.0, PAGE_W - MARGIN_R - 20.0, self.y, 0.2, GREY_LINE);
        self.gap(4.0);
    }

    /// Place one label/value row, checking the real wrapped height first
    fn field_row(&mut self, index: usize, label: &str, value: &str) {
        let lines = wrap_text(value, COL_VALUE - 4.0, Font::Regular, VALUE_FONT);
        let page_capacity = CONTENT_BOTTOM - CONTENT_TOP;
        let mut pending: &[String] = &lines;

        while !pending.is_empty() {
            let needed = field_row_height(pending.len());
            if needed <= self.remaining() {
                self.draw_field_row(index, label, pending);
                break;
            }
            if !self.at_page_top() && (needed <= page_capacity || lines_fitting(self.remaining()) == 0) {
                self.new_page();
                continue;
            }

            // Taller than the space left on this page: place what fits
            let fit = lines_fitting(self.remaining()).max(1);
            let (chunk, rest) = pending.split_at(fit.min(pending.len()));
            self.draw_field_row(index, label, chunk);
            pending = rest;
        }
    }

    fn draw_field_row(&mut self, index: usize, label: &str, lines: &[String]) {
        let top = self.y;
        let height = field_row_height(lines.len());
        let value_x = MARGIN_L + COL_LABEL;
        let fill = if index % 2 == 0 { GREY_FILL } else { WHITE };

        fill_rect(&mut self.current, MARGIN_L, top, COL_LABEL, height, LIGHT_BLUE);
        text(
            &mut self.current,
            MARGIN_L + 2.0,
            centred_baseline(top, height, VALUE_FONT),
            Font::Bold,
            VALUE_FONT,
            DARK_BLUE,
            label,
        );

        fill_rect(&mut self.current, value_x, top, COL_VALUE, height, fill);
        stroke_rect(&mut self.current, MARGIN_L, top, USABLE_W, height, GREY_LINE);
        for (k, row) in lines.iter().enumerate() {
            let baseline = top + 1.0 + k as f32 * VALUE_LINE_H + 3.2;
            text(&mut self.current, value_x + 2.0, baseline, Font::Regular, VALUE_FONT, BLACK, row);
        }

        self.advance(height);
    }

    fn closing(&mut self, generated_at: &chrono::NaiveDateTime, total: usize) {
        self.gap(3.0);
        self.ensure_space(11.0);
        line(&mut self.current, MARGIN_L, PAGE_W - MARGIN_R, self.y, 0.4, DARK_BLUE);
        self.advance(3.0);
        let closing = format!(
            "Informe generado el {}  |  Total contratos: {}  |  Fuente: {}",
            format_timestamp(generated_at),
            total,
            DATA_SOURCE
        );
        text(&mut self.current, MARGIN_L, self.y + 3.5, Font::Italic, 7.0, GREY_TEXT, &closing);
        self.advance(5.0);
    }

    fn finish(mut self) -> (Vec<Vec<Operation>>, Vec<f32>) {
        self.new_page();
        (self.pages, self.page_bottoms)
    }
}

/// Lay out every section of `doc` onto pages
pub fn layout(doc: &ReportDocument) -> PdfLayout {
    let mut composer = PageComposer::new();
    let mut record_blocks = 0;
    let mut stats_tables = 0;

    for section in &doc.sections {
        match section {
            Section::Title(title) => composer.title(title),
            Section::Paragraph(paragraph) => composer.paragraph(paragraph),
            Section::Callout(callout) => composer.callout(callout),
            Section::Heading(heading) => composer.heading(heading),
            Section::StatsTable(rows) => {
                composer.stats_table(rows);
                stats_tables += 1;
            }
            Section::Record(block) => {
                composer.record(block);
                record_blocks += 1;
            }
            Section::Closing { generated_at, total } => composer.closing(generated_at, *total),
        }
    }

    let (pages, page_bottoms) = composer.finish();
    PdfLayout { pages, page_bottoms, record_blocks, stats_tables }
}

fn page_header(ops: &mut Vec<Operation>) {
    fill_rect(ops, 0.0, 0.0, PAGE_W, HEADER_BAR_H, DARK_BLUE);
    let x = (PAGE_W - text_width(HEADER_TEXT, Font::Bold, 9.0)) / 2.0;
    text(ops, x, centred_baseline(3.0, 8.0, 9.0), Font::Bold, 9.0, WHITE, HEADER_TEXT);
}

fn page_footer(ops: &mut Vec<Operation>, page: usize, total: usize) {
    line(ops, MARGIN_L, PAGE_W - MARGIN_R, FOOTER_RULE_Y, 0.2, GREY_LINE);
    let label = format!("Página {}/{}", page, total);
    let x = PAGE_W - MARGIN_R - text_width(&label, Font::Regular, 6.5);
    text(ops, x, FOOTER_RULE_Y + 2.0 + centred_baseline(0.0, 5.0, 6.5), Font::Regular, 6.5, GREY_TEXT, &label);
}

fn pdf_error(err: lopdf::Error) -> AppError {
    AppError::Pdf(err.to_string())
}

/// Render the report as a PDF document
pub fn render_pdf(doc: &ReportDocument) -> Result<Vec<u8>> {
    let layout = layout(doc);
    let total_pages = layout.pages.len();
    debug!(
        "PDF layout: {} page(s), {} contract block(s), {} statistics table(s), lowest content at {:.1} mm",
        total_pages,
        layout.record_blocks,
        layout.stats_tables,
        layout.page_bottoms.iter().fold(0.0_f32, |lowest, y| lowest.max(*y))
    );

    let mut pdf = Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for (resource, base_font) in [("F1", "Helvetica"), ("F2", "Helvetica-Bold"), ("F3", "Helvetica-Oblique")] {
        let font_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => base_font,
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(resource, font_id);
    }
    let resources_id = pdf.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(total_pages);
    for (i, body) in layout.pages.into_iter().enumerate() {
        let mut operations = Vec::with_capacity(body.len() + 32);
        page_header(&mut operations);
        operations.extend(body);
        page_footer(&mut operations, i + 1, total_pages);

        let encoded = Content { operations }.encode().map_err(pdf_error)?;
        let content_id = pdf.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => total_pages as i64,
        "Resources" => resources_id,
        "MediaBox" => vec![real(0.0), real(0.0), real(pt(PAGE_W)), real(pt(PAGE_H))],
    };
    pdf.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);
    pdf.compress();

    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
#[path = "pdf_test.rs"]
mod pdf_test;
