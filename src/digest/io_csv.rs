// Primitives for reading and writing CSV files.

use std::fs::File;
use std::io::Write;

use csv::{QuoteStyle, ReaderBuilder, Terminator, WriterBuilder};

use crate::digest::*;

/// Writes the records in CSV format.
///
/// The header is the list of field names of the first record. Every value
/// is quoted and embedded quotes are doubled. Lines end with a line feed.
/// An empty list writes nothing.
pub fn write_records_csv<W: Write>(records: &[Record], out: W) -> DigestResult<()> {
    let first = match records.first() {
        Some(r) => r,
        None => {
            warn!("write_records_csv: no record to export");
            return Ok(());
        }
    };
    let header = first.field_names();
    debug!("write_records_csv: header: {:?}", header);

    let mut wtr = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(out);
    wtr.write_record(&header).context(CsvWriteSnafu {})?;
    for r in records.iter() {
        let row: Vec<String> = header
            .iter()
            .map(|name| r.get(name).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        wtr.write_record(&row).context(CsvWriteSnafu {})?;
    }
    wtr.flush().context(CsvFlushSnafu {})?;
    Ok(())
}

pub fn write_records_csv_file(path: &str, records: &[Record]) -> DigestResult<()> {
    if records.is_empty() {
        warn!("write_records_csv_file: no record to export to {:?}", path);
        return Ok(());
    }
    let file = File::create(path).context(WritingOutputSnafu { path })?;
    write_records_csv(records, file)?;
    info!("Exported {} records to {:?}", records.len(), path);
    Ok(())
}

/// Reads records from a CSV file with one header row.
pub fn read_records_csv(path: &str) -> DigestResult<Vec<Record>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { lineno: 1_usize })?
        .iter()
        .map(|s| s.trim().to_string())
        .collect();
    debug!("read_records_csv: header: {:?}", header);

    let mut res: Vec<Record> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is the first line.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let r = Record::from_pairs(
            header
                .iter()
                .enumerate()
                .map(|(i, name)| (name.clone(), line.get(i).unwrap_or("").to_string())),
        );
        res.push(r);
    }
    Ok(res)
}
