use log::{debug, info, warn};

use consultation_digest::aggregate::build_store;
use consultation_digest::normalize::{normalize_records, Labels};
use consultation_digest::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::{AggregateArgs, ReportArgs, TableArgs};
use crate::digest::config_reader::*;

mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod render;

/// The output location that prints to the standard output.
const STDOUT: &str = "stdout";

#[derive(Debug, Snafu)]
pub enum DigestError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Malformed document {path}: {message}"))]
    MalformedDocument { path: String, message: String },
    #[snafu(display("Error opening the CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of the CSV input"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing the CSV output"))]
    CsvWrite { source: csv::Error },
    #[snafu(display("Error flushing the CSV output"))]
    CsvFlush { source: std::io::Error },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file {path} has no worksheet or no header row"))]
    EmptyExcel { path: String },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing the output"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Difference detected between the computed view and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DigestResult<T> = Result<T, DigestError>;

pub fn load_config(path: Option<&str>) -> DigestResult<Option<LoadedConfig>> {
    match path {
        Some(p) => {
            info!("Reading configuration {:?}", p);
            read_config(p).map(Some)
        }
        None => Ok(None),
    }
}

/// The flag when given, else the value of the configuration file.
fn pick(flag: &Option<String>, config_value: Option<String>) -> Option<String> {
    flag.clone().or(config_value)
}

fn provider_of(path: &str, explicit: Option<String>) -> String {
    if let Some(p) = explicit {
        return p.to_lowercase();
    }
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("csv") => "csv".to_string(),
        Some("xlsx") => "xlsx".to_string(),
        _ => "json".to_string(),
    }
}

fn read_records(path: &str, provider: &str, worksheet: Option<&str>) -> DigestResult<Vec<Record>> {
    info!(
        "Attempting to read records {:?} with provider {:?}",
        io_common::simplify_file_name(path),
        provider
    );
    let records: Vec<Record> = match provider {
        "json" => {
            let rows = read_records_document(path)?;
            rows.iter().map(io_common::record_from_json).collect()
        }
        "csv" => io_csv::read_records_csv(path)?,
        "xlsx" => io_excel::read_records_xlsx(path, worksheet)?,
        x => whatever!("Provider not implemented {:?}", x),
    };
    info!("Read {} records from {:?}", records.len(), path);
    Ok(records)
}

fn write_output(path: Option<&str>, content: &str) -> DigestResult<()> {
    match path {
        None | Some(STDOUT) => {
            println!("{}", content);
        }
        Some(p) => {
            if let Some(parent) = Path::new(p).parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).context(WritingOutputSnafu { path: p })?;
                }
            }
            fs::write(p, content).context(WritingOutputSnafu { path: p })?;
            info!("Wrote {:?}", p);
        }
    }
    Ok(())
}

fn pretty(js: &JSValue) -> DigestResult<String> {
    serde_json::to_string_pretty(js).context(SerializingJsonSnafu {})
}

pub fn run_aggregate(args: &AggregateArgs, config: Option<&LoadedConfig>) -> DigestResult<()> {
    let input = match pick(
        &args.input,
        config.and_then(|c| c.source(&c.config.sources.records_path)),
    ) {
        Some(p) => p,
        None => {
            whatever!("No input provided: use --input or the recordsPath of a configuration")
        }
    };
    let provider = provider_of(
        &input,
        pick(
            &args.input_type,
            config.and_then(|c| c.config.sources.records_provider.clone()),
        ),
    );
    let worksheet = pick(
        &args.excel_worksheet_name,
        config.and_then(|c| c.config.sources.excel_worksheet_name.clone()),
    );
    let raw = read_records(&input, &provider, worksheet.as_deref())?;

    let labels = match pick(
        &args.labels,
        config.and_then(|c| c.source(&c.config.sources.labels_path)),
    ) {
        Some(p) => Labels::default().with_overrides(read_labels(&p)?),
        None => Labels::default(),
    };
    let records = normalize_records(&raw, &labels);
    let generated_at = chrono::Utc::now().to_rfc3339();
    let store = build_store(&records, Some(generated_at.clone()));

    let data_out = pick(&args.out, config.and_then(|c| c.output(&c.config.output.data_path)));
    write_output(data_out.as_deref(), &pretty(&io_common::store_to_json(&store))?)?;

    let records_out = pick(
        &args.records_out,
        config.and_then(|c| c.output(&c.config.output.records_path)),
    );
    if let Some(p) = records_out {
        let js = io_common::records_document_to_json(&records, &generated_at);
        write_output(Some(p.as_str()), &pretty(&js)?)?;
    }
    Ok(())
}

pub fn run_report(args: &ReportArgs, config: Option<&LoadedConfig>) -> DigestResult<()> {
    let data = match pick(
        &args.data,
        config.and_then(|c| c.source(&c.config.sources.aggregates_path)),
    ) {
        Some(p) => p,
        None => whatever!(
            "No aggregate document provided: use --data or the aggregatesPath of a configuration"
        ),
    };
    let scope = pick(&args.scope, config.and_then(|c| c.config.view.scope.clone()))
        .unwrap_or_else(|| ALL_SENTINEL.to_string());

    let doc = read_aggregate_document(&data)?;
    let mut dashboard = Dashboard::with_store(io_common::store_from_document(&doc));
    dashboard.select(ScopeSelector::parse(&scope));

    let view_js = render::view_to_json(&dashboard);
    let pretty_view = pretty(&view_js)?;
    debug!("run_report: view: {}", pretty_view);

    let format = args.format.clone().unwrap_or_else(|| "markdown".to_string());
    let (content, configured_out) = match format.as_str() {
        "json" => (
            pretty_view.clone(),
            config.and_then(|c| c.output(&c.config.output.view_path)),
        ),
        "markdown" | "md" => (
            render::report_markdown(&dashboard),
            config.and_then(|c| c.output(&c.config.output.narratives_path)),
        ),
        x => whatever!("Unknown report format {:?}", x),
    };
    write_output(pick(&args.out, configured_out).as_deref(), &content)?;

    // The reference view, if provided for comparison
    if let Some(reference_p) = &args.reference {
        check_reference(reference_p, &pretty_view)?;
    }
    Ok(())
}

fn check_reference(reference_p: &str, pretty_view: &str) -> DigestResult<()> {
    let contents =
        fs::read_to_string(reference_p).context(OpeningJsonSnafu { path: reference_p })?;
    let reference: JSValue = serde_json::from_str(contents.as_str())
        .context(ParsingJsonSnafu { path: reference_p })?;
    let pretty_reference = pretty(&reference)?;
    if pretty_reference != pretty_view {
        warn!("Found differences with the reference view");
        print_diff(pretty_reference.as_str(), pretty_view, "\n");
        return ReferenceMismatchSnafu { path: reference_p }.fail();
    }
    info!("The view matches the reference {:?}", reference_p);
    Ok(())
}

pub fn run_table(args: &TableArgs, config: Option<&LoadedConfig>) -> DigestResult<()> {
    let path = match pick(
        &args.records,
        config.and_then(|c| c.source(&c.config.sources.records_path)),
    ) {
        Some(p) => p,
        None => whatever!(
            "No records provided: use --records or the recordsPath of a configuration"
        ),
    };
    let provider = provider_of(
        &path,
        pick(
            &args.input_type,
            config.and_then(|c| c.config.sources.records_provider.clone()),
        ),
    );
    let worksheet = config.and_then(|c| c.config.sources.excel_worksheet_name.clone());
    let records = read_records(&path, &provider, worksheet.as_deref())?;

    let view = config.map(|c| c.config.view.clone()).unwrap_or_default();
    let sort = match pick(&args.sort, view.sort) {
        Some(s) => match SortMode::parse(&s) {
            Some(m) => m,
            None => whatever!("Unknown sort mode {:?}", s),
        },
        None => SortMode::default(),
    };
    let mut filter = FilterState {
        org_type: pick(&args.org, view.scope).unwrap_or_else(|| ALL_SENTINEL.to_string()),
        area: pick(&args.province, view.province).unwrap_or_else(|| ALL_SENTINEL.to_string()),
        query: pick(&args.query, view.query).unwrap_or_default(),
        sort,
    };
    filter.retain_known(
        &distinct_values(&records, columns::ORG_TYPE),
        &distinct_values(&records, columns::PROVINCE),
    );

    let visible = apply_filters(&records, &filter);
    let kpis = TableKpis::new(&records, &visible, &filter);
    info!(
        "run_table: {} of {} records visible for {:?}",
        kpis.visible, kpis.total, kpis.scope_name
    );
    println!("{}", render::table_text(&kpis, &visible));

    let csv_out = pick(&args.csv, config.and_then(|c| c.output(&c.config.output.csv_path)));
    if let Some(csv_p) = csv_out {
        io_csv::write_records_csv_file(&csv_p, &visible)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_from_extension() {
        assert_eq!(provider_of("export/CERF.XLSX", None), "xlsx");
        assert_eq!(provider_of("records.csv", None), "csv");
        assert_eq!(provider_of("records.json", None), "json");
        assert_eq!(provider_of("records", None), "json");
        assert_eq!(provider_of("records.json", Some("CSV".to_string())), "csv");
    }

    #[test]
    fn flags_override_config() {
        assert_eq!(
            pick(&Some("a".to_string()), Some("b".to_string())),
            Some("a".to_string())
        );
        assert_eq!(pick(&None, Some("b".to_string())), Some("b".to_string()));
        assert_eq!(pick(&None, None), None);
    }
}
