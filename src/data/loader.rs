use super::{DataError, Result, Table};
use csv::{ReaderBuilder, WriterBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

pub struct DataLoader;

impl DataLoader {
    pub fn verify_required_columns(headers: &[String], required: &[&str]) -> Result<()> {
        let headers_set: HashSet<_> = headers.iter().map(String::as_str).collect();

        for column in required {
            if !headers_set.contains(column) {
                return Err(DataError::MissingColumn(column.to_string()));
            }
        }
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Table> {
        let path = path.as_ref();
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();
        let width = headers.len();
        let mut table = Table::new(headers);

        for result in rdr.records() {
            let record = result?;
            // Short rows are padded so every row lines up with the header
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            if row.len() < width {
                row.resize(width, String::new());
            }
            table.rows.push(row);
        }

        if table.is_empty() {
            return Err(DataError::EmptyInput(path.display().to_string()));
        }

        debug!(
            path = %path.display(),
            rows = table.len(),
            columns = table.headers.len(),
            "loaded table"
        );
        Ok(table)
    }

    pub fn load_with_columns<P: AsRef<Path>>(path: P, required: &[&str]) -> Result<Table> {
        let table = Self::load(path)?;
        Self::verify_required_columns(&table.headers, required)?;
        Ok(table)
    }

    pub fn save<P: AsRef<Path>>(path: P, table: &Table) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut wtr = WriterBuilder::new().flexible(true).from_path(path)?;
        wtr.write_record(&table.headers)?;
        for row in &table.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;

        debug!(path = %path.display(), rows = table.len(), "wrote table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_keeps_grouped_amounts_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");

        let mut table = Table::new(vec!["Film Title".into(), "Revenue".into()]);
        table.rows.push(vec!["Alien".into(), "~104,931,801".into()]);
        DataLoader::save(&path, &table).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("\"~104,931,801\""));
        assert_eq!(DataLoader::load(&path).unwrap(), table);
    }

    #[test]
    fn test_header_only_file_is_empty_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        fs::write(&path, "Film Title,Year\n").unwrap();
        assert!(matches!(
            DataLoader::load(&path),
            Err(DataError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_required_columns() {
        let headers = vec!["Film Title".to_string(), "Year".to_string()];
        assert!(DataLoader::verify_required_columns(&headers, &["Year"]).is_ok());
        assert!(matches!(
            DataLoader::verify_required_columns(&headers, &["Year", "Budget"]),
            Err(DataError::MissingColumn(c)) if c == "Budget"
        ));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        fs::write(&path, "Film Title,Year,Budget\nAlien,1979\n").unwrap();
        let table = DataLoader::load(&path).unwrap();
        assert_eq!(table.rows[0], vec!["Alien", "1979", ""]);
    }
}
