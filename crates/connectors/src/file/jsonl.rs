use crate::file::{TableWriter, error::FileError};
use serde_json::{Map, Value};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Writes one JSON object per line, keys in header order.
#[derive(Default)]
pub struct JsonlDestination;

impl TableWriter for JsonlDestination {
    fn write(
        &self,
        path: &Path,
        headers: &[String],
        rows: &[Vec<String>],
    ) -> Result<(), FileError> {
        let mut out = BufWriter::new(File::create(path)?);

        for row in rows {
            let object: Map<String, Value> = headers
                .iter()
                .zip(row.iter())
                .map(|(h, v)| (h.clone(), Value::String(v.clone())))
                .collect();
            serde_json::to_writer(&mut out, &object)?;
            out.write_all(b"\n")?;
        }
        out.flush()?;

        Ok(())
    }
}
