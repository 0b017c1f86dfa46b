use crate::infra::seeded_store;
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use yiw_tracker::error::AppError;
use yiw_tracker::reports::{
    ColumnManifest, FilterSpec, PageRequest, ReportEntity, ReportOptions, ReportPage,
    ReportService,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum EntityArg {
    Youth,
    Businesses,
    Assessments,
}

impl EntityArg {
    fn entity(self) -> ReportEntity {
        match self {
            EntityArg::Youth => ReportEntity::Youth,
            EntityArg::Businesses => ReportEntity::Businesses,
            EntityArg::Assessments => ReportEntity::Assessments,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum ExportFormatArg {
    Csv,
    Excel,
}

impl ExportFormatArg {
    const fn wire_value(self) -> &'static str {
        match self {
            ExportFormatArg::Csv => "csv",
            ExportFormatArg::Excel => "excel",
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Entity to report on
    #[arg(long, value_enum, default_value = "youth")]
    pub(crate) entity: EntityArg,
    /// Restrict to the given district (repeatable)
    #[arg(long)]
    pub(crate) district: Vec<String>,
    /// Keyword matched across the entity's searchable columns
    #[arg(long)]
    pub(crate) keyword: Option<String>,
    /// 1-based page to display
    #[arg(long, default_value_t = 1)]
    pub(crate) page: usize,
    /// Rows per page
    #[arg(long, default_value_t = 20)]
    pub(crate) page_size: usize,
    /// Include group counts for the given field
    #[arg(long)]
    pub(crate) group_by: Option<String>,
    /// Write the full filtered set to a file instead of listing a page
    #[arg(long, value_enum)]
    pub(crate) export: Option<ExportFormatArg>,
    /// Output path for --export (defaults to the suggested file name)
    #[arg(long)]
    pub(crate) out: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {}

fn demo_service() -> ReportService<yiw_tracker::reports::InMemoryReportStore> {
    ReportService::new(Arc::new(seeded_store()), ReportOptions::default())
}

fn filters_from(entity: ReportEntity, district: &[String], keyword: Option<&str>) -> FilterSpec {
    let mut raw = std::collections::BTreeMap::new();
    if !district.is_empty() {
        raw.insert("district".to_string(), serde_json::json!(district));
    }
    if let Some(keyword) = keyword {
        raw.insert("keyword".to_string(), serde_json::json!(keyword));
    }
    FilterSpec::from_raw(entity, &raw)
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let ReportArgs {
        entity,
        district,
        keyword,
        page,
        page_size,
        group_by,
        export,
        out,
    } = args;

    let entity = entity.entity();
    let service = demo_service();
    let spec = filters_from(entity, &district, keyword.as_deref());

    if let Some(format) = export {
        let file = service.export(entity, &spec, format.wire_value())?;
        let path = out.unwrap_or_else(|| PathBuf::from(&file.file_name));
        std::fs::write(&path, &file.bytes)?;
        println!(
            "Wrote {} ({} bytes) to {}",
            file.file_name,
            file.bytes.len(),
            path.display()
        );
        return Ok(());
    }

    let report = service.list(
        entity,
        &spec,
        PageRequest::new(page, page_size),
        group_by.as_deref(),
    )?;
    render_report(entity, &report);
    Ok(())
}

pub(crate) fn run_demo(_args: DemoArgs) -> Result<(), AppError> {
    let service = demo_service();

    println!("DARE YIW Tracker report demo");

    let spec = filters_from(ReportEntity::Youth, &["Bekwai".to_string()], None);
    let report = service.list(
        ReportEntity::Youth,
        &spec,
        PageRequest::new(1, 10),
        Some("training_program"),
    )?;
    println!("\nYouth in Bekwai ({} total)", report.total);
    render_report(ReportEntity::Youth, &report);

    let assessments = service.list(
        ReportEntity::Assessments,
        &FilterSpec::default(),
        PageRequest::new(1, 10),
        Some("district"),
    )?;
    println!("\nFeasibility assessments ({} total)", assessments.total);
    render_report(ReportEntity::Assessments, &assessments);

    let file = service.export(ReportEntity::Businesses, &FilterSpec::default(), "csv")?;
    let lines = file.bytes.iter().filter(|byte| **byte == b'\n').count();
    println!(
        "\nBusiness listing export: {} ({} rows incl. header)",
        file.file_name, lines
    );

    Ok(())
}

fn render_report(entity: ReportEntity, report: &ReportPage) {
    let manifest = ColumnManifest::for_entity(entity);
    let titles = manifest.titles();
    let rows: Vec<Vec<String>> = report
        .records
        .iter()
        .map(|record| manifest.row(record))
        .collect();

    let mut widths: Vec<usize> = titles.iter().map(|title| title.len()).collect();
    for row in &rows {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.len());
        }
    }

    let header: Vec<String> = titles
        .iter()
        .zip(widths.iter().copied())
        .map(|(title, width)| format!("{title:<width$}"))
        .collect();
    println!("{}", header.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        println!("{}", cells.join("  "));
    }

    println!(
        "page {}/{} (page size {}, {} total)",
        report.page,
        report.total.div_ceil(report.page_size).max(1),
        report.page_size,
        report.total
    );

    if let Some(aggregate) = &report.aggregate {
        for (group, count) in &aggregate.groups {
            println!("  {group}: {count}");
        }
        if let Some(mean) = aggregate.mean_score {
            println!("  mean score: {mean:.1}");
        }
    }
}
