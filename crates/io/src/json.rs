// JSON export of the visible grid view

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde_json::{Map, Value};
use tabula_engine::ExportView;

/// Export the view as a JSON array of objects, one per visible row,
/// keyed by the current header labels.
pub fn export(view: &ExportView, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    let writer = BufWriter::new(file);

    let rows: Vec<Value> = view
        .records
        .iter()
        .map(|record| {
            let mut object = Map::new();
            for (header, cell) in view.headers.iter().zip(record) {
                object.insert(header.clone(), Value::String(cell.clone()));
            }
            Value::Object(object)
        })
        .collect();

    serde_json::to_writer_pretty(writer, &rows).map_err(|e| e.to_string())?;
    Ok(())
}
