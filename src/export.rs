use std::io::Write;

use log::info;
use strum::{AsRefStr, Display, EnumString};

use crate::error::ResqError;
use crate::query::{ColSet, ListQuery, ResourceQueryBuilder};
use crate::record::{Record, Value};
use crate::store::RecordStore;

#[derive(AsRefStr, EnumString, Display, Debug, Default, PartialEq, Eq, Copy, Clone)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

/// Writes every record matching the query's filters and search, in sort
/// order, ignoring pagination. Returns the number of records written.
pub fn export<S: RecordStore + ?Sized>(
    store: &S,
    query: &ListQuery,
    format: ExportFormat,
    out: &mut dyn Write,
) -> Result<usize, ResqError> {
    let records = ResourceQueryBuilder::new(store).list_all(query)?;

    match format {
        ExportFormat::Csv => write_csv(&store.col_set(), &records, out)?,
        ExportFormat::Json => {
            serde_json::to_writer(&mut *out, &records)?;
            writeln!(out)?;
        }
    }

    info!(
        "Exported {} {} records as {}",
        records.len(),
        store.col_set().table(),
        format
    );

    Ok(records.len())
}

/// One header row of field names, then one row per record. NULL and
/// missing fields are written as empty cells.
fn write_csv(col_set: &ColSet, records: &[Record], out: &mut dyn Write) -> Result<(), ResqError> {
    let mut writer = csv::Writer::from_writer(out);
    let header: Vec<&str> = col_set.col_map().keys().copied().collect();
    writer.write_record(&header)?;

    for record in records {
        writer.write_record(
            header
                .iter()
                .map(|field| record.get(field).map(Value::to_string).unwrap_or_default()),
        )?;
    }

    writer.flush()?;
    Ok(())
}
