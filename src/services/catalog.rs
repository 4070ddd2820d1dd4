use std::path::Path;

use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    error::{AppError, AppResult},
    models::{Recipient, Sku},
};

#[derive(Debug, Deserialize)]
struct SkuRow {
    sku: u32,
}

/// Recipients and candidate products for one campaign run
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub recipients: Vec<Recipient>,
    pub skus: Vec<Sku>,
}

impl Catalog {
    /// Loads both source files
    pub fn load(recipients_path: &Path, skus_path: &Path) -> AppResult<Self> {
        let recipients = load_recipients(recipients_path)?;
        let skus = load_skus(skus_path)?;

        tracing::info!(
            recipients = recipients.len(),
            skus = skus.len(),
            "Catalog loaded"
        );

        Ok(Self { recipients, skus })
    }
}

/// Reads recipients from a CSV with `id,email` and optional
/// `first_name,last_name,segment` columns
pub fn load_recipients(path: &Path) -> AppResult<Vec<Recipient>> {
    read_rows(path)
}

/// Reads SKUs from a single-column CSV headed `sku`
pub fn load_skus(path: &Path) -> AppResult<Vec<Sku>> {
    let rows: Vec<SkuRow> = read_rows(path)?;
    Ok(rows.into_iter().map(|row| Sku(row.sku)).collect())
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    let file = std::fs::File::open(path).map_err(|source| AppError::DataSourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut rows = Vec::new();
    for result in reader.deserialize::<T>() {
        let row = result.map_err(|e| malformed(path, e))?;
        rows.push(row);
    }

    Ok(rows)
}

fn malformed(path: &Path, err: csv::Error) -> AppError {
    let line = err.position().map(|p| p.line()).unwrap_or(0);
    let reason = err.to_string();

    match err.into_kind() {
        csv::ErrorKind::Io(source) => AppError::DataSourceUnavailable {
            path: path.to_path_buf(),
            source,
        },
        _ => AppError::MalformedRecord {
            path: path.to_path_buf(),
            line,
            reason,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_recipients_two_columns() {
        let file = csv_file("id,email\n1,ada@example.com\n2,grace@example.com\n");

        let recipients = load_recipients(file.path()).unwrap();
        assert_eq!(recipients.len(), 2);
        assert_eq!(recipients[0], Recipient::new(1, "ada@example.com"));
        assert_eq!(recipients[1].customer_id, 2);
    }

    #[test]
    fn test_load_recipients_optional_columns() {
        let file = csv_file(
            "id,email,first_name,last_name,segment\n\
             1,ada@example.com,Ada,Lovelace,vip\n\
             2,grace@example.com,,,\n",
        );

        let recipients = load_recipients(file.path()).unwrap();
        assert_eq!(recipients[0].display_name(), "Ada Lovelace");
        assert_eq!(recipients[0].segment.as_deref(), Some("vip"));
        assert_eq!(recipients[1].first_name, None);
        assert_eq!(recipients[1].segment, None);
    }

    #[test]
    fn test_load_recipients_keeps_blank_email() {
        let file = csv_file("id,email\n1,\n");

        let recipients = load_recipients(file.path()).unwrap();
        assert_eq!(recipients.len(), 1);
        assert!(!recipients[0].has_email());
    }

    #[test]
    fn test_empty_file_is_valid() {
        let file = csv_file("id,email\n");
        assert!(load_recipients(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_negative_customer_id_is_malformed() {
        let file = csv_file("id,email\n1,ada@example.com\n-5,bad@example.com\n");

        match load_recipients(file.path()) {
            Err(AppError::MalformedRecord { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected MalformedRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let result = load_skus(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(AppError::DataSourceUnavailable { .. })));
    }

    #[test]
    fn test_load_skus() {
        let file = csv_file("sku\n100\n 200 \n300\n");

        let skus = load_skus(file.path()).unwrap();
        assert_eq!(skus, vec![Sku(100), Sku(200), Sku(300)]);
    }

    #[test]
    fn test_non_numeric_sku_is_malformed() {
        let file = csv_file("sku\n100\nabc\n");
        assert!(matches!(
            load_skus(file.path()),
            Err(AppError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_catalog_load() {
        let recipients = csv_file("id,email\n1,ada@example.com\n");
        let skus = csv_file("sku\n1\n2\n");

        let catalog = Catalog::load(recipients.path(), skus.path()).unwrap();
        assert_eq!(catalog.recipients.len(), 1);
        assert_eq!(catalog.skus.len(), 2);
    }
}
