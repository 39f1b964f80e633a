// Reading the Excel exports of the survey tool.

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};

use crate::digest::*;

fn get_range(path: &str, worksheet_name_o: Option<&str>) -> DigestResult<Range<DataType>> {
    debug!(
        "read_records_xlsx: path: {:?} worksheet: {:?}",
        path, worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(worksheet_name)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?;
        return Ok(wrange);
    }
    let names = workbook.sheet_names().to_owned();
    if names.len() > 1 {
        info!(
            "read_records_xlsx: {} worksheets in {:?}, using the first one {:?}",
            names.len(),
            path,
            names.first()
        );
    }
    let wrange = workbook
        .worksheet_range_at(0)
        .context(EmptyExcelSnafu { path })?
        .context(OpeningExcelSnafu { path })?;
    Ok(wrange)
}

fn read_cell(cell: &DataType) -> FieldValue {
    match cell {
        DataType::String(s) => FieldValue::Text(s.clone()),
        DataType::Float(f) => FieldValue::Number(*f),
        DataType::Int(i) => FieldValue::Number(*i as f64),
        DataType::Bool(b) => FieldValue::Text(b.to_string()),
        DataType::DateTime(f) => FieldValue::Number(*f),
        DataType::Empty => FieldValue::Null,
        x => {
            warn!("read_cell: could not understand cell {:?}", x);
            FieldValue::Null
        }
    }
}

/// Reads records from an Excel file: one header row with the question
/// names, then one row per response. Columns without a name are skipped.
pub fn read_records_xlsx(path: &str, worksheet_name: Option<&str>) -> DigestResult<Vec<Record>> {
    let wrange = get_range(path, worksheet_name)?;
    let mut rows = wrange.rows();
    let header: Vec<String> = rows
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        .map(|c| match c {
            DataType::String(s) => s.trim().to_string(),
            DataType::Empty => String::new(),
            x => x.to_string(),
        })
        .collect();
    debug!("read_records_xlsx: header: {:?}", header);

    let mut res: Vec<Record> = Vec::new();
    for (idx, row) in rows.enumerate() {
        let mut r = Record::new();
        for (name, cell) in header.iter().zip(row.iter()) {
            if !name.is_empty() {
                r.set(name.clone(), read_cell(cell));
            }
        }
        if r.iter().all(|(_, v)| v.to_string().trim().is_empty()) {
            debug!("read_records_xlsx: skipping empty row {}", idx + 2);
            continue;
        }
        res.push(r);
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cells() {
        assert_eq!(
            read_cell(&DataType::String("ONG".to_string())),
            FieldValue::Text("ONG".to_string())
        );
        assert_eq!(read_cell(&DataType::Int(3)), FieldValue::Number(3.0));
        assert_eq!(read_cell(&DataType::Empty), FieldValue::Null);
    }

    #[test]
    fn missing_file() {
        let res = read_records_xlsx("/nonexistent/export.xlsx", None);
        assert!(matches!(res, Err(DigestError::OpeningExcel { .. })));
    }
}
