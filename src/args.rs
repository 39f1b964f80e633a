use clap::{Parser, Subcommand};

/// This is a digest program for the results of a CERF consultation survey.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the sources, view and outputs of a run.
    /// Relative paths in this file are resolved against its directory. The options
    /// passed on the command line take precedence over this file.
    #[clap(short, long, value_parser, global = true)]
    pub config: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Normalizes the survey records and counts them into the aggregate document.
    Aggregate(AggregateArgs),
    /// Key figures, charts and narratives of one scope of the aggregates.
    Report(ReportArgs),
    /// Filters, sorts and exports the survey records.
    Table(TableArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct AggregateArgs {
    /// (file path) The survey records: a JSON records document, a CSV file or an Excel
    /// export.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (json, csv or xlsx) The type of the input. By default, guessed from the file
    /// extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the aggregate document.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the normalized records are written to this
    /// location.
    #[clap(long, value_parser)]
    pub records_out: Option<String>,

    /// (file path) A JSON file of code labels per answer domain, for example
    /// {"groupes": {"deplacees": "Femmes déplacées"}}. Its labels complete and replace
    /// the built-in ones.
    #[clap(long, value_parser)]
    pub labels: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReportArgs {
    /// (file path) The aggregate document.
    #[clap(short, long, value_parser)]
    pub data: Option<String>,

    /// (organization type or __all__) The scope to report on. Unknown organization
    /// types report on all the responses.
    #[clap(short, long, value_parser)]
    pub scope: Option<String>,

    /// (markdown or json, default markdown) The format of the report.
    #[clap(short, long, value_parser)]
    pub format: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the report.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference view in JSON format. If provided, the program checks
    /// that the computed view matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct TableArgs {
    /// (file path) The records: a JSON records document, a CSV file or an Excel export.
    #[clap(short, long, value_parser)]
    pub records: Option<String>,

    /// (json, csv or xlsx) The type of the records file. By default, guessed from the file
    /// extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// Only keep the records of this organization type.
    #[clap(long, value_parser)]
    pub org: Option<String>,

    /// Only keep the records of this province.
    #[clap(long, value_parser)]
    pub province: Option<String>,

    /// Only keep the records containing this text (case insensitive).
    #[clap(short, long, value_parser)]
    pub query: Option<String>,

    /// (date_desc, date_asc, org_asc or prov_asc, default date_desc) The order of the records.
    #[clap(long, value_parser)]
    pub sort: Option<String>,

    /// (file path) If specified, the visible records are exported in CSV format to this location.
    #[clap(long, value_parser)]
    pub csv: Option<String>,
}
