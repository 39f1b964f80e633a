use crate::digest::*;

use consultation_digest::normalize::Dictionary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct SourceSettings {
    #[serde(rename = "aggregatesPath")]
    pub aggregates_path: Option<String>,
    #[serde(rename = "recordsPath")]
    pub records_path: Option<String>,
    #[serde(rename = "recordsProvider")]
    pub records_provider: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "labelsPath")]
    pub labels_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct ViewSettings {
    pub scope: Option<String>,
    pub province: Option<String>,
    pub query: Option<String>,
    pub sort: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "viewPath")]
    pub view_path: Option<String>,
    #[serde(rename = "narrativesPath")]
    pub narratives_path: Option<String>,
    #[serde(rename = "csvPath")]
    pub csv_path: Option<String>,
    #[serde(rename = "dataPath")]
    pub data_path: Option<String>,
    #[serde(rename = "recordsPath")]
    pub records_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct DigestConfig {
    #[serde(default)]
    pub sources: SourceSettings,
    #[serde(default)]
    pub view: ViewSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

/// The aggregate document. The scopes are kept as raw JSON objects and
/// converted leniently (see [crate::digest::io_common]).
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AggregateDocument {
    pub total_responses: Option<JSValue>,
    pub generated_at: Option<String>,
    pub summary: JSMap<String, JSValue>,
    #[serde(default)]
    pub by_org_type: JSMap<String, JSValue>,
}

/// The labels file: for each answer domain, the label of each code.
pub type LabelsDocument = BTreeMap<String, Dictionary>;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RecordsDocument {
    pub generated_at: Option<String>,
    pub records: Vec<JSMap<String, JSValue>>,
}

/// A configuration file, with the directory its relative paths refer to.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct LoadedConfig {
    pub config: DigestConfig,
    pub root: PathBuf,
}

impl LoadedConfig {
    pub fn resolve(&self, path: &str) -> String {
        let p = Path::new(path);
        if p.is_absolute() {
            path.to_string()
        } else {
            self.root.join(p).display().to_string()
        }
    }

    pub fn source(&self, path: &Option<String>) -> Option<String> {
        path.as_ref().map(|p| self.resolve(p))
    }

    /// Output paths are relative to the output directory, itself relative
    /// to the configuration file.
    pub fn output(&self, path: &Option<String>) -> Option<String> {
        let p = path.as_ref()?;
        if p == STDOUT || Path::new(p).is_absolute() {
            return Some(p.clone());
        }
        let dir = match &self.config.output.output_directory {
            Some(d) => PathBuf::from(self.resolve(d)),
            None => self.root.clone(),
        };
        Some(dir.join(p).display().to_string())
    }
}

pub fn read_config(path: &str) -> DigestResult<LoadedConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: DigestConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    info!("read_config: {:?}", config);
    let root = Path::new(path)
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();
    Ok(LoadedConfig { config, root })
}

pub fn read_aggregate_document(path: &str) -> DigestResult<AggregateDocument> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let doc: AggregateDocument =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!(
        "read_aggregate_document: {} organization types in {:?}",
        doc.by_org_type.len(),
        path
    );
    Ok(doc)
}

pub fn read_labels(path: &str) -> DigestResult<LabelsDocument> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let doc: LabelsDocument =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    info!(
        "read_labels: {} domains in {:?}: {:?}",
        doc.len(),
        path,
        doc.keys().collect::<Vec<&String>>()
    );
    Ok(doc)
}

/// The rows of a JSON records file.
///
/// Accepts a records document, a bare array of rows or the `results` array
/// of a survey-tool export.
pub fn read_records_document(path: &str) -> DigestResult<Vec<JSMap<String, JSValue>>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    let rows: Vec<JSValue> = match js {
        JSValue::Array(rows) => rows,
        JSValue::Object(mut obj) => {
            match obj.remove("records").or_else(|| obj.remove("results")) {
                Some(JSValue::Array(rows)) => rows,
                _ => {
                    return MalformedDocumentSnafu {
                        path,
                        message: "expected a 'records' array",
                    }
                    .fail()
                }
            }
        }
        _ => {
            return MalformedDocumentSnafu {
                path,
                message: "expected an object or an array",
            }
            .fail()
        }
    };
    let mut res: Vec<JSMap<String, JSValue>> = Vec::new();
    for (idx, row) in rows.into_iter().enumerate() {
        match row {
            JSValue::Object(obj) => res.push(obj),
            x => {
                return MalformedDocumentSnafu {
                    path,
                    message: format!("record {} is not an object: {}", idx, x),
                }
                .fail()
            }
        }
    }
    Ok(res)
}
