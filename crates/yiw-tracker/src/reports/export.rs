use std::io::{Cursor, Write};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use zip::write::{FileOptions, ZipWriter};

use super::domain::{FieldValue, ReportEntity, ReportRecord};

/// Downloadable tabular formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Excel,
    Csv,
}

impl ExportFormat {
    /// Parse the raw wire value. Anything outside the supported set fails
    /// here, before any store work happens.
    pub fn parse(raw: &str) -> Result<Self, ExportError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "excel" | "xlsx" => Ok(Self::Excel),
            "csv" => Ok(Self::Csv),
            other => Err(ExportError::UnsupportedFormat(other.to_string())),
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            ExportFormat::Excel => ".xlsx",
            ExportFormat::Csv => ".csv",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv",
        }
    }
}

/// Per-cell display transforms applied before serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    /// Render a stored timestamp as a bare `YYYY-MM-DD` date.
    Date,
    /// Render a numeric score with one decimal place.
    Score,
}

impl CellFormat {
    pub fn apply(self, value: &FieldValue) -> String {
        match self {
            CellFormat::Date => value
                .as_text()
                .and_then(parse_date)
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| value.display_text()),
            CellFormat::Score => value
                .as_number()
                .map(|number| format!("{number:.1}"))
                .unwrap_or_else(|| value.display_text()),
        }
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(stamp) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S") {
        return Some(stamp.date());
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(stamp.date_naive());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()
}

/// One export column: the record key it projects, the header title, and an
/// optional display format.
#[derive(Debug, Clone, Copy)]
pub struct Column {
    pub key: &'static str,
    pub title: &'static str,
    pub format: Option<CellFormat>,
}

const fn column(key: &'static str, title: &'static str) -> Column {
    Column {
        key,
        title,
        format: None,
    }
}

const fn formatted(key: &'static str, title: &'static str, format: CellFormat) -> Column {
    Column {
        key,
        title,
        format: Some(format),
    }
}

/// Ordered projection from records to export rows. A key absent from a
/// record renders as an empty cell, never an error.
#[derive(Debug, Clone)]
pub struct ColumnManifest {
    columns: &'static [Column],
}

const YOUTH_COLUMNS: &[Column] = &[
    column("id", "ID"),
    column("full_name", "Full Name"),
    column("age", "Age"),
    column("gender", "Gender"),
    column("district", "District"),
    column("training_program", "Training Program"),
    column("status", "Status"),
    formatted("updated_at", "Last Updated", CellFormat::Date),
];

const BUSINESS_COLUMNS: &[Column] = &[
    column("id", "ID"),
    column("name", "Business Name"),
    column("district", "District"),
    column("category", "Category"),
    column("owner_name", "Owner"),
    column("mentor_assigned", "Mentor Assigned"),
    formatted("updated_at", "Last Updated", CellFormat::Date),
];

const ASSESSMENT_COLUMNS: &[Column] = &[
    column("id", "ID"),
    column("business_idea", "Business Idea"),
    column("district", "District"),
    formatted("market_score", "Market", CellFormat::Score),
    formatted("financial_score", "Financial", CellFormat::Score),
    formatted("technical_score", "Technical", CellFormat::Score),
    formatted("management_score", "Management", CellFormat::Score),
    formatted("risk_score", "Risk", CellFormat::Score),
    formatted("updated_at", "Last Updated", CellFormat::Date),
];

impl ColumnManifest {
    pub fn for_entity(entity: ReportEntity) -> Self {
        let columns = match entity {
            ReportEntity::Youth => YOUTH_COLUMNS,
            ReportEntity::Businesses => BUSINESS_COLUMNS,
            ReportEntity::Assessments => ASSESSMENT_COLUMNS,
        };
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        self.columns
    }

    pub fn titles(&self) -> Vec<&'static str> {
        self.columns.iter().map(|column| column.title).collect()
    }

    /// Project one record into display cells, in manifest order.
    pub fn row(&self, record: &ReportRecord) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| Self::cell(column, record))
            .collect()
    }

    fn cell(column: &Column, record: &ReportRecord) -> String {
        match record.field(column.key) {
            Some(value) => match column.format {
                Some(format) => format.apply(value),
                None => value.display_text(),
            },
            None => String::new(),
        }
    }
}

/// An assembled export: the bytes, the suggested download name, and the
/// matching content type.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("unsupported export format '{0}'")]
    UnsupportedFormat(String),
    #[error("filtered set of {rows} rows exceeds the {cap} row export cap; narrow the filter and retry")]
    TooLarge { rows: usize, cap: usize },
    #[error("csv serialization failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("workbook assembly failed: {0}")]
    Workbook(#[from] zip::result::ZipError),
    #[error("export buffer error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serialize records in manifest order. An empty set produces a valid
/// header-only file for either format.
pub fn export_records(
    report_name: &str,
    format: ExportFormat,
    manifest: &ColumnManifest,
    records: &[ReportRecord],
) -> Result<ExportFile, ExportError> {
    let bytes = match format {
        ExportFormat::Csv => write_csv(manifest, records)?,
        ExportFormat::Excel => write_xlsx(manifest, records)?,
    };

    Ok(ExportFile {
        bytes,
        file_name: format!("{report_name}{}", format.extension()),
        content_type: format.content_type(),
    })
}

fn write_csv(manifest: &ColumnManifest, records: &[ReportRecord]) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(manifest.columns().iter().map(|column| column.title))?;
        for record in records {
            writer.write_record(manifest.row(record))?;
        }
        writer.flush()?;
    }
    Ok(buffer)
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Report" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Assemble a minimal single-sheet OOXML workbook: the container is a zip
/// archive holding the content-types part, the relationship parts, the
/// workbook part, and one worksheet with every cell as an inline string.
fn write_xlsx(manifest: &ColumnManifest, records: &[ReportRecord]) -> Result<Vec<u8>, ExportError> {
    let sheet = worksheet_xml(manifest, records);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file::<_, ()>("[Content_Types].xml", FileOptions::default())?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())?;

    zip.start_file::<_, ()>("_rels/.rels", FileOptions::default())?;
    zip.write_all(ROOT_RELS_XML.as_bytes())?;

    zip.start_file::<_, ()>("xl/workbook.xml", FileOptions::default())?;
    zip.write_all(WORKBOOK_XML.as_bytes())?;

    zip.start_file::<_, ()>("xl/_rels/workbook.xml.rels", FileOptions::default())?;
    zip.write_all(WORKBOOK_RELS_XML.as_bytes())?;

    zip.start_file::<_, ()>("xl/worksheets/sheet1.xml", FileOptions::default())?;
    zip.write_all(sheet.as_bytes())?;

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

fn worksheet_xml(manifest: &ColumnManifest, records: &[ReportRecord]) -> String {
    let mut sheet = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );

    let header: Vec<String> = manifest
        .columns()
        .iter()
        .map(|column| column.title.to_string())
        .collect();
    push_row(&mut sheet, 1, &header);

    for (index, record) in records.iter().enumerate() {
        let cells: Vec<String> = manifest
            .columns()
            .iter()
            .map(|column| ColumnManifest::cell(column, record))
            .collect();
        push_row(&mut sheet, index + 2, &cells);
    }

    sheet.push_str("</sheetData></worksheet>");
    sheet
}

fn push_row(sheet: &mut String, row: usize, cells: &[String]) {
    sheet.push_str(&format!(r#"<row r="{row}">"#));
    for (index, cell) in cells.iter().enumerate() {
        sheet.push_str(&format!(
            r#"<c r="{}{row}" t="inlineStr"><is><t>{}</t></is></c>"#,
            column_letters(index),
            xml_escape(cell),
        ));
    }
    sheet.push_str("</row>");
}

/// 0-based column index to spreadsheet letters (0 -> A, 26 -> AA).
fn column_letters(index: usize) -> String {
    let mut index = index;
    let mut letters = Vec::new();
    loop {
        letters.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.reverse();
    String::from_utf8(letters).expect("ascii letters")
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn sample_records(count: usize) -> Vec<ReportRecord> {
        (0..count)
            .map(|index| {
                ReportRecord::new()
                    .with("id", FieldValue::text(format!("yiw-{index:04}")))
                    .with("full_name", FieldValue::text(format!("Person {index}")))
                    .with("age", FieldValue::number(20.0 + index as f64))
                    .with("updated_at", FieldValue::text("2025-06-03T09:30:00"))
            })
            .collect()
    }

    #[test]
    fn unsupported_format_is_rejected() {
        match ExportFormat::parse("pdf") {
            Err(ExportError::UnsupportedFormat(raw)) => assert_eq!(raw, "pdf"),
            other => panic!("expected unsupported format, got {other:?}"),
        }
        assert_eq!(ExportFormat::parse("Excel").expect("parses"), ExportFormat::Excel);
        assert_eq!(ExportFormat::parse(" csv ").expect("parses"), ExportFormat::Csv);
    }

    #[test]
    fn csv_export_emits_header_plus_one_line_per_record() {
        let manifest = ColumnManifest::for_entity(ReportEntity::Youth);
        let file = export_records("youth_profiles", ExportFormat::Csv, &manifest, &sample_records(3))
            .expect("export succeeds");

        assert_eq!(file.file_name, "youth_profiles.csv");
        assert_eq!(file.content_type, "text/csv");

        let text = String::from_utf8(file.bytes).expect("utf8 csv");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        for line in &lines {
            assert_eq!(line.split(',').count(), manifest.columns().len());
        }
        assert!(lines[0].starts_with("ID,Full Name,Age"));
    }

    #[test]
    fn empty_set_exports_header_only_csv() {
        let manifest = ColumnManifest::for_entity(ReportEntity::Businesses);
        let file = export_records("business_listing", ExportFormat::Csv, &manifest, &[])
            .expect("export succeeds");
        let text = String::from_utf8(file.bytes).expect("utf8 csv");
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn missing_manifest_keys_render_as_empty_cells() {
        let manifest = ColumnManifest::for_entity(ReportEntity::Youth);
        let sparse = vec![ReportRecord::new().with("id", FieldValue::text("yiw-0001"))];
        let file = export_records("youth_profiles", ExportFormat::Csv, &manifest, &sparse)
            .expect("export succeeds");
        let text = String::from_utf8(file.bytes).expect("utf8 csv");
        let row = text.lines().nth(1).expect("data row present");
        assert!(row.starts_with("yiw-0001,,"));
    }

    #[test]
    fn csv_escapes_embedded_delimiters() {
        let manifest = ColumnManifest::for_entity(ReportEntity::Businesses);
        let records = vec![ReportRecord::new()
            .with("id", FieldValue::text("biz-01"))
            .with("name", FieldValue::text("Adum Fabrics, Ltd"))];
        let file = export_records("business_listing", ExportFormat::Csv, &manifest, &records)
            .expect("export succeeds");
        let text = String::from_utf8(file.bytes).expect("utf8 csv");
        assert!(text.contains("\"Adum Fabrics, Ltd\""));
    }

    #[test]
    fn date_format_strips_the_time_component() {
        let value = FieldValue::text("2025-06-03T09:30:00");
        assert_eq!(CellFormat::Date.apply(&value), "2025-06-03");
        let unparseable = FieldValue::text("yesterday");
        assert_eq!(CellFormat::Date.apply(&unparseable), "yesterday");
    }

    #[test]
    fn score_format_keeps_one_decimal() {
        assert_eq!(CellFormat::Score.apply(&FieldValue::number(4.0)), "4.0");
        assert_eq!(CellFormat::Score.apply(&FieldValue::Null), "");
    }

    #[test]
    fn xlsx_archive_carries_the_workbook_parts() {
        let manifest = ColumnManifest::for_entity(ReportEntity::Assessments);
        let file = export_records(
            "feasibility_assessments",
            ExportFormat::Excel,
            &manifest,
            &sample_records(2),
        )
        .expect("export succeeds");

        assert_eq!(file.file_name, "feasibility_assessments.xlsx");

        let cursor = Cursor::new(file.bytes);
        let mut archive = zip::ZipArchive::new(cursor).expect("valid archive");
        let mut names: Vec<String> = (0..archive.len())
            .map(|index| {
                archive
                    .by_index(index)
                    .expect("entry readable")
                    .name()
                    .to_string()
            })
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "xl/_rels/workbook.xml.rels",
                "xl/workbook.xml",
                "xl/worksheets/sheet1.xml",
            ]
        );

        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .expect("worksheet present")
            .read_to_string(&mut sheet)
            .expect("worksheet readable");
        assert!(sheet.contains("<t>Business Idea</t>"));
        // Header plus two data rows.
        assert_eq!(sheet.matches("<row ").count(), 3);
    }

    #[test]
    fn empty_set_still_produces_a_valid_workbook() {
        let manifest = ColumnManifest::for_entity(ReportEntity::Youth);
        let file = export_records("youth_profiles", ExportFormat::Excel, &manifest, &[])
            .expect("export succeeds");

        let cursor = Cursor::new(file.bytes);
        let mut archive = zip::ZipArchive::new(cursor).expect("valid archive");
        let mut sheet = String::new();
        archive
            .by_name("xl/worksheets/sheet1.xml")
            .expect("worksheet present")
            .read_to_string(&mut sheet)
            .expect("worksheet readable");
        assert_eq!(sheet.matches("<row ").count(), 1);
    }

    #[test]
    fn worksheet_cells_are_xml_escaped() {
        let manifest = ColumnManifest::for_entity(ReportEntity::Businesses);
        let records = vec![ReportRecord::new()
            .with("id", FieldValue::text("biz-02"))
            .with("name", FieldValue::text("Nana & Sons <Workshop>"))];
        let sheet = worksheet_xml(&manifest, &records);
        assert!(sheet.contains("Nana &amp; Sons &lt;Workshop&gt;"));
    }

    #[test]
    fn column_letters_roll_over_past_z() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
    }
}
