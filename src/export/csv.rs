use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use crate::error::ExportError;
use crate::logging::LogContext;
use crate::models::{PricedToken, TokenRecord};

/// Column order of the spam bag and the first six columns of the clean bag
pub const SPAM_BAG_HEADERS: [&str; 6] = [
    "last_updated",
    "title",
    "description",
    "contract_address",
    "token_type",
    "raw_token_uri",
];

pub const CLEAN_BAG_HEADERS: [&str; 10] = [
    "last_updated",
    "title",
    "description",
    "contract_address",
    "token_type",
    "raw_token_uri",
    "opensea_floorprice",
    "opensea_currency",
    "looksrare_floorprice",
    "looksrare_currency",
];

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Write the clean bag with its floor price columns
pub fn write_clean_bag<W: Write>(writer: W, rows: &[PricedToken]) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(CLEAN_BAG_HEADERS)?;

    for row in rows {
        let mut record = token_cells(&row.token).to_vec();
        record.extend(row.price.display_cells());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_spam_bag<W: Write>(writer: W, rows: &[TokenRecord]) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    wtr.write_record(SPAM_BAG_HEADERS)?;

    for row in rows {
        wtr.write_record(&token_cells(row))?;
    }

    wtr.flush()?;
    Ok(())
}

/// Clean bag CSV in memory, for downloads
pub fn clean_bag_csv(rows: &[PricedToken]) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    write_clean_bag(&mut buffer, rows)?;
    Ok(buffer)
}

/// Output file name for a user supplied title; `.csv` is appended when missing
pub fn csv_file_name(title: &str) -> Result<String, ExportError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ExportError::InvalidName("file name is empty".to_string()));
    }
    if title.contains('/') || title.contains('\\') {
        return Err(ExportError::InvalidName(format!("{} contains a path separator", title)));
    }

    if title.to_ascii_lowercase().ends_with(".csv") {
        Ok(title.to_string())
    } else {
        Ok(format!("{}.csv", title))
    }
}

pub fn save_clean_bag(dir: &Path, title: &str, rows: &[PricedToken]) -> Result<PathBuf, ExportError> {
    let path = output_path(dir, title)?;
    write_clean_bag(fs::File::create(&path)?, rows)?;
    log_saved("save_clean_bag", &path, rows.len());
    Ok(path)
}

pub fn save_spam_bag(dir: &Path, title: &str, rows: &[TokenRecord]) -> Result<PathBuf, ExportError> {
    let path = output_path(dir, title)?;
    write_spam_bag(fs::File::create(&path)?, rows)?;
    log_saved("save_spam_bag", &path, rows.len());
    Ok(path)
}

fn output_path(dir: &Path, title: &str) -> Result<PathBuf, ExportError> {
    let name = csv_file_name(title)?;
    fs::create_dir_all(dir)?;
    Ok(dir.join(name))
}

fn log_saved(operation: &str, path: &Path, row_count: usize) {
    LogContext::new("csv_export", operation)
        .with_metadata("path", serde_json::json!(path.display().to_string()))
        .with_metadata("row_count", serde_json::json!(row_count))
        .info("Bag written to CSV");
}

/// The six token columns as written to CSV; missing values are empty
pub fn token_cells(row: &TokenRecord) -> [String; 6] {
    [
        row.last_updated
            .map(|ts| ts.format(DATE_FORMAT).to_string())
            .unwrap_or_default(),
        row.title.clone().unwrap_or_default(),
        row.description.clone().unwrap_or_default(),
        row.contract_address.clone().unwrap_or_default(),
        row.token_type.clone().unwrap_or_default(),
        row.raw_token_uri.clone().unwrap_or_default(),
    ]
}
