// CSV export of the visible grid view

use std::path::Path;

use tabula_engine::ExportView;

/// Write the view to `path`: header row first (current, possibly
/// renamed labels), then one record per visible row, in display order.
pub fn export(view: &ExportView, path: &Path) -> Result<(), String> {
    export_with_delimiter(view, path, b',')
}

pub fn export_tsv(view: &ExportView, path: &Path) -> Result<(), String> {
    export_with_delimiter(view, path, b'\t')
}

fn export_with_delimiter(view: &ExportView, path: &Path, delimiter: u8) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .map_err(|e| e.to_string())?;

    writer
        .write_record(&view.headers)
        .map_err(|e| e.to_string())?;
    for record in &view.records {
        writer.write_record(record).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn view() -> ExportView {
        ExportView {
            headers: vec!["ID".to_string(), "State".to_string()],
            records: vec![
                vec!["1".to_string(), "Released".to_string()],
                vec!["2".to_string(), "has, comma".to_string()],
            ],
        }
    }

    #[test]
    fn test_csv_export_headers_first() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.csv");

        export(&view(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("ID,State"));
        assert_eq!(lines.next(), Some("1,Released"));
        // Field with a comma gets quoted
        assert_eq!(lines.next(), Some("2,\"has, comma\""));
    }

    #[test]
    fn test_tsv_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("orders.tsv");

        export_tsv(&view(), &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("ID\tState\n"));
    }

    #[test]
    fn test_empty_view_writes_headers_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.csv");

        let view = ExportView {
            headers: vec!["ID".to_string()],
            records: Vec::new(),
        };
        export(&view, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "ID\n");
    }
}
