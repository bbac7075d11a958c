//! Report serialization. Every format renders the same [`ReportTable`]; only the encoding
//! differs.

use std::fmt;

use chrono::NaiveDate;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;

use super::ReportError;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// A4 landscape in points.
const PAGE_WIDTH: i64 = 842;
const PAGE_HEIGHT: i64 = 595;
const MARGIN: i64 = 36;
const FONT_SIZE: i64 = 8;
const LEADING: i64 = 11;
const LINES_PER_PAGE: usize = 46;
// Courier advances 0.6em, so 160 columns span the printable width at 8pt.
const MAX_LINE_CHARS: usize = 160;
const MIN_CELL_CHARS: usize = 8;
const COLUMN_GAP: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Overview,
    Companies,
    Candidates,
    Vacancies,
    Applications,
}

impl ReportKind {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Overview,
            Self::Companies,
            Self::Candidates,
            Self::Vacancies,
            Self::Applications,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Companies => "companies",
            Self::Candidates => "candidates",
            Self::Vacancies => "vacancies",
            Self::Applications => "applications",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ReportError> {
        let wanted = raw.trim().to_ascii_lowercase();
        Self::ordered()
            .into_iter()
            .find(|kind| kind.label() == wanted)
            .ok_or_else(|| ReportError::UnknownKind(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Excel,
    Pdf,
}

impl ExportFormat {
    pub fn parse(raw: &str) -> Result<Self, ReportError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "excel" | "xlsx" => Ok(Self::Excel),
            "pdf" => Ok(Self::Pdf),
            _ => Err(ReportError::UnknownFormat(raw.to_string())),
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Excel => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(self) -> String {
        match self {
            Self::Csv => mime::TEXT_CSV_UTF_8.to_string(),
            Self::Excel => XLSX_CONTENT_TYPE.to_string(),
            Self::Pdf => mime::APPLICATION_PDF.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    Text(String),
    Count(u64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(text) => f.write_str(text),
            Cell::Count(count) => write!(f, "{count}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        Cell::Count(value)
    }
}

/// Titled grid of cells; the one shape every export format consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTable {
    pub title: String,
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Cell>>,
}

impl ReportTable {
    pub fn new(title: impl Into<String>, columns: &[&'static str]) -> Self {
        Self {
            title: title.into(),
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }
}

#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub buffer: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

pub fn filename(kind: ReportKind, format: ExportFormat, today: NaiveDate) -> String {
    format!(
        "{}-report-{}.{}",
        kind.label(),
        today.format("%Y-%m-%d"),
        format.extension()
    )
}

pub fn render(
    table: &ReportTable,
    kind: ReportKind,
    format: ExportFormat,
    today: NaiveDate,
) -> Result<ExportedReport, ReportError> {
    let buffer = match format {
        ExportFormat::Csv => render_csv(table)?,
        ExportFormat::Excel => render_excel(table)?,
        ExportFormat::Pdf => render_pdf(table, today)?,
    };
    Ok(ExportedReport {
        buffer,
        content_type: format.content_type(),
        filename: filename(kind, format, today),
    })
}

fn render_error(err: impl fmt::Display) -> ReportError {
    ReportError::Render(err.to_string())
}

pub fn render_csv(table: &ReportTable) -> Result<Vec<u8>, ReportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.columns).map_err(render_error)?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(Cell::to_string))
            .map_err(render_error)?;
    }
    writer.into_inner().map_err(render_error)
}

pub fn render_excel(table: &ReportTable) -> Result<Vec<u8>, ReportError> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let sheet = workbook.add_worksheet();
    let name: String = table.title.chars().take(31).collect();
    sheet.set_name(name).map_err(render_error)?;

    for (col, column) in table.columns.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *column, &header)
            .map_err(render_error)?;
    }
    for (index, row) in table.rows.iter().enumerate() {
        let line = (index + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            let written = match cell {
                Cell::Text(text) => sheet.write_string(line, col, text.as_str()),
                Cell::Count(count) => sheet.write_number(line, col, *count as f64),
            };
            written.map_err(render_error)?;
        }
    }
    sheet.autofit();

    workbook.save_to_buffer().map_err(render_error)
}

fn pdf_text(text: &str) -> String {
    text.chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect()
}

/// Encodes a line for a `WinAnsiEncoding` font. Latin-1 maps byte for byte; characters
/// the code page cannot express become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| match ch {
            '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => ch as u8,
            '€' => 0x80,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '–' => 0x96,
            '—' => 0x97,
            _ => b'?',
        })
        .collect()
}

fn pad(text: &str, width: usize) -> String {
    let mut cell = text.to_string();
    let len = cell.chars().count();
    cell.extend(std::iter::repeat(' ').take(width.saturating_sub(len)));
    cell
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || width == 0 {
        return vec![String::new()];
    }
    chars.chunks(width).map(|chunk| chunk.iter().collect()).collect()
}

/// Narrows the widest columns until a full line fits the page.
fn fit_widths(mut widths: Vec<usize>) -> Vec<usize> {
    let gaps = COLUMN_GAP.len() * widths.len().saturating_sub(1);
    while widths.iter().sum::<usize>() + gaps > MAX_LINE_CHARS {
        match widths.iter_mut().max() {
            Some(widest) if *widest > MIN_CELL_CHARS => *widest -= 1,
            _ => break,
        }
    }
    widths
}

/// One physical line per wrapped slice; cells too wide for their column continue below.
fn row_lines(cells: &[String], widths: &[usize]) -> Vec<String> {
    let wrapped: Vec<Vec<String>> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| wrap(cell, *width))
        .collect();
    let height = wrapped.iter().map(Vec::len).max().unwrap_or(1);
    (0..height)
        .map(|index| {
            let line = wrapped
                .iter()
                .zip(widths)
                .map(|(parts, width)| {
                    pad(parts.get(index).map(String::as_str).unwrap_or(""), *width)
                })
                .collect::<Vec<_>>()
                .join(COLUMN_GAP);
            line.trim_end().to_string()
        })
        .collect()
}

/// Fixed-width text lines: title, date, header, rule, rows.
fn text_lines(table: &ReportTable, today: NaiveDate) -> Vec<String> {
    let rendered: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| pdf_text(&cell.to_string())).collect())
        .collect();
    let header: Vec<String> = table.columns.iter().map(|name| name.to_string()).collect();
    let widths = fit_widths(
        header
            .iter()
            .enumerate()
            .map(|(col, name)| {
                rendered
                    .iter()
                    .filter_map(|row| row.get(col))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect(),
    );

    let mut lines = wrap(&pdf_text(&table.title), MAX_LINE_CHARS);
    lines.push(format!("Generated {}", today.format("%Y-%m-%d")));
    lines.push(String::new());
    lines.extend(row_lines(&header, &widths));
    let rule: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
    lines.push(rule.join(COLUMN_GAP));
    for row in &rendered {
        lines.extend(row_lines(row, &widths));
    }
    if rendered.is_empty() {
        lines.push("No records.".to_string());
    }
    lines
}

pub fn render_pdf(table: &ReportTable, today: NaiveDate) -> Result<Vec<u8>, ReportError> {
    let lines = text_lines(table, today);
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for chunk in lines.chunks(LINES_PER_PAGE) {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), Object::Integer(FONT_SIZE)]),
            Operation::new("TL", vec![Object::Integer(LEADING)]),
            Operation::new(
                "Td",
                vec![
                    Object::Integer(MARGIN),
                    Object::Integer(PAGE_HEIGHT - MARGIN),
                ],
            ),
        ];
        for line in chunk {
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(win_ansi(line), StringFormat::Literal)],
            ));
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations }.encode().map_err(render_error)?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(page_count),
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(render_error)?;
    Ok(buffer)
}
