use super::ExportError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Write serializable rows as CSV with a header line
pub fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<(), ExportError> {
    let mut wtr = ::csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Export rows to a CSV file (suitable for spreadsheet plotting)
pub fn export_rows<T: Serialize, P: AsRef<Path>>(
    rows: &[T],
    output_path: P,
) -> Result<(), ExportError> {
    let file = std::fs::File::create(output_path)?;
    write_rows(file, rows)
}
