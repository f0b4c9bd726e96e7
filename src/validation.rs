//! Intake checks on the two uploaded files, run before any parsing.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("File must be a ZIP archive")]
    NotZip,
    #[error("ZIP file must be smaller than {}", limit_label(.0))]
    ZipTooLarge(u64),
    #[error("ZIP file cannot be empty")]
    ZipEmpty,
    #[error("File must be a CSV file")]
    NotCsv,
    #[error("CSV file must be smaller than {}", limit_label(.0))]
    CsvTooLarge(u64),
    #[error("CSV file cannot be empty")]
    CsvEmpty,
}

fn limit_label(bytes: &u64) -> String {
    format_file_size(*bytes)
}

fn has_extension(name: &str, ext: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, e)| e.eq_ignore_ascii_case(ext))
}

/// Check the image archive's name and size against `max_bytes`.
pub fn validate_archive_file(name: &str, size: u64, max_bytes: u64) -> Result<(), IntakeError> {
    if !has_extension(name, "zip") {
        return Err(IntakeError::NotZip);
    }
    if size > max_bytes {
        return Err(IntakeError::ZipTooLarge(max_bytes));
    }
    if size == 0 {
        return Err(IntakeError::ZipEmpty);
    }
    Ok(())
}

/// Check the size sheet's name and size against `max_bytes`.
pub fn validate_sheet_file(name: &str, size: u64, max_bytes: u64) -> Result<(), IntakeError> {
    if !has_extension(name, "csv") {
        return Err(IntakeError::NotCsv);
    }
    if size > max_bytes {
        return Err(IntakeError::CsvTooLarge(max_bytes));
    }
    if size == 0 {
        return Err(IntakeError::CsvEmpty);
    }
    Ok(())
}

/// Byte count in binary units with up to two decimals: `0 Bytes`, `1.5 KB`, `5 MB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn archive_checks_in_order() {
        assert_eq!(validate_archive_file("photos.ZIP", 10, 100 * MB), Ok(()));
        assert_eq!(
            validate_archive_file("photos.rar", 10, 100 * MB),
            Err(IntakeError::NotZip)
        );
        assert_eq!(
            validate_archive_file("photos.zip", 100 * MB + 1, 100 * MB),
            Err(IntakeError::ZipTooLarge(100 * MB))
        );
        assert_eq!(
            validate_archive_file("photos.zip", 0, 100 * MB),
            Err(IntakeError::ZipEmpty)
        );
    }

    #[test]
    fn sheet_checks_in_order() {
        assert_eq!(validate_sheet_file("sizes.csv", 1, 10 * MB), Ok(()));
        assert_eq!(
            validate_sheet_file("sizes.xlsx", 1, 10 * MB),
            Err(IntakeError::NotCsv)
        );
        assert_eq!(
            validate_sheet_file("sizes.csv", 10 * MB + 1, 10 * MB),
            Err(IntakeError::CsvTooLarge(10 * MB))
        );
        assert_eq!(
            validate_sheet_file("sizes.csv", 0, 10 * MB),
            Err(IntakeError::CsvEmpty)
        );
        assert_eq!(validate_sheet_file("csv", 1, 10 * MB), Err(IntakeError::NotCsv));
    }

    #[test]
    fn limit_is_named_in_message() {
        assert_eq!(
            IntakeError::ZipTooLarge(100 * MB).to_string(),
            "ZIP file must be smaller than 100 MB"
        );
        assert_eq!(
            IntakeError::CsvTooLarge(10 * MB).to_string(),
            "CSV file must be smaller than 10 MB"
        );
    }

    #[test]
    fn file_sizes() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * MB), "5 MB");
        assert_eq!(format_file_size(1234567), "1.18 MB");
        assert_eq!(format_file_size(3 * 1024 * MB), "3 GB");
    }
}
