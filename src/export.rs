use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::types::ResultRow;

pub const CSV_HEADERS: [&str; 5] = ["Index", "Identifier", "Name", "Address", "Phone"];

/// Write the header plus one record per row, indexed from 1.
pub fn write_csv<W: Write>(rows: &[ResultRow], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADERS)?;
    for (i, row) in rows.iter().enumerate() {
        let index = (i + 1).to_string();
        writer.write_record([
            index.as_str(),
            row.identifier.as_str(),
            row.name.as_str(),
            row.address.as_str(),
            row.phone.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn export_to_path(rows: &[ResultRow], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(rows, file)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "exported csv");
    Ok(())
}
