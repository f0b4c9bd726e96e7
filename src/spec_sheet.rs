//! Size sheet parsing and validation.
//!
//! A size sheet is a CSV file with one row per output image. The layout
//! depends on the [`ResizeMode`]:
//!
//! ```text
//! file / constrained:   filename,length,width        photo1.jpg,8.5,11
//! brand:                product,length,width,variant Laptop Bag,4,3,Full Black
//! ```
//!
//! Lengths and widths are physical inches. Length maps to pixel height, width
//! maps to pixel width (see [`crate::imaging::requested_pixels`]).
//!
//! ## Validation
//!
//! Problems are collected, never thrown. A row with an *error* is dropped; a
//! row with a *warning* is kept. The resulting [`SpecDocument`] is usable iff
//! it has no errors:
//!
//! | Condition | Outcome |
//! |---|---|
//! | Too few columns | error, row dropped |
//! | Empty key / product name | error, row dropped |
//! | Unknown brand variant | error, row dropped |
//! | Key without image extension | warning |
//! | Length/width not a positive number | error, row dropped |
//! | Length/width over 100 inches | warning |
//! | Duplicate row identity | one aggregated warning, rows kept |
//!
//! A first row that looks like a header (`filename,length,width`,
//! `product name,...`) is detected and skipped with a warning.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Extensions accepted as image files, both in sheets and archives.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".webp"];

/// Dimensions above this many inches are suspicious but allowed.
const LARGE_DIMENSION_INCHES: f64 = 100.0;

/// Case-insensitive check against [`IMAGE_EXTENSIONS`].
pub fn has_image_extension(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// How spec rows are turned into pixel boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Preserve the source aspect ratio, anchored to the smaller requested side.
    Constrained,
    /// Force the exact requested pixel box.
    File,
    /// Pick one of three source variants per product, exact pixel box.
    Brand,
}

impl ResizeMode {
    /// Minimum number of columns a data row must have.
    pub fn required_columns(self) -> usize {
        match self {
            ResizeMode::Brand => 4,
            ResizeMode::Constrained | ResizeMode::File => 3,
        }
    }
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResizeMode::Constrained => "constrained",
            ResizeMode::File => "file",
            ResizeMode::Brand => "brand",
        };
        f.write_str(name)
    }
}

/// Source image role selectable in brand mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    Original,
    FullBlack,
    FullWhite,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Original, Variant::FullBlack, Variant::FullWhite];

    /// The exact tag used in sheets and as the archive lookup key.
    pub fn tag(self) -> &'static str {
        match self {
            Variant::Original => "Original",
            Variant::FullBlack => "Full Black",
            Variant::FullWhite => "Full White",
        }
    }

    /// Parse an exact tag. Case and spacing must match.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.tag() == tag)
    }
}

/// One validated unit of work. The shape is fixed by the mode that parsed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SpecRow {
    /// File and constrained mode: the key is an archive filename.
    Named {
        key: String,
        length_inches: f64,
        width_inches: f64,
    },
    /// Brand mode: the variant is the archive key, the product names the output.
    Brand {
        product_name: String,
        variant: Variant,
        length_inches: f64,
        width_inches: f64,
    },
}

impl SpecRow {
    /// Archive lookup key.
    pub fn key(&self) -> &str {
        match self {
            SpecRow::Named { key, .. } => key,
            SpecRow::Brand { variant, .. } => variant.tag(),
        }
    }

    pub fn length_inches(&self) -> f64 {
        match self {
            SpecRow::Named { length_inches, .. } | SpecRow::Brand { length_inches, .. } => {
                *length_inches
            }
        }
    }

    pub fn width_inches(&self) -> f64 {
        match self {
            SpecRow::Named { width_inches, .. } | SpecRow::Brand { width_inches, .. } => {
                *width_inches
            }
        }
    }

    /// What makes this row distinct from the others in its sheet.
    ///
    /// The filename for named rows, the product for brand rows (many products
    /// share a variant).
    pub fn identity(&self) -> &str {
        match self {
            SpecRow::Named { key, .. } => key,
            SpecRow::Brand { product_name, .. } => product_name,
        }
    }

    /// Entry name of the resized image inside the output archive.
    pub fn output_name(&self) -> String {
        match self {
            SpecRow::Named { key, .. } => key.clone(),
            SpecRow::Brand { product_name, .. } => {
                format!("{}.jpg", sanitize_filename(product_name))
            }
        }
    }
}

/// Replace characters that are not valid in archive entry names.
pub fn sanitize_filename(name: &str) -> String {
    const INVALID: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
    name.trim()
        .chars()
        .map(|c| if INVALID.contains(&c) { '_' } else { c })
        .collect()
}

/// Parsed sheet: retained rows in input order plus everything noticed on the way.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpecDocument {
    pub rows: Vec<SpecRow>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl SpecDocument {
    /// Usable for processing. Warnings never block.
    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }

    fn failed(message: String) -> Self {
        Self {
            rows: Vec::new(),
            errors: vec![message],
            warnings: Vec::new(),
        }
    }
}

/// Parse CSV bytes into a validated document.
///
/// Malformed CSV and empty input become document errors rather than `Err`.
pub fn parse_csv(bytes: &[u8], mode: ResizeMode) -> SpecDocument {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        match record {
            Ok(record) => rows.push(record.iter().map(str::to_string).collect::<Vec<_>>()),
            Err(e) => return SpecDocument::failed(format!("Failed to parse CSV: {e}")),
        }
    }
    validate_rows(&rows, mode)
}

/// Validate already-split rows. Cells are trimmed, blank rows ignored.
pub fn validate_rows(raw: &[Vec<String>], mode: ResizeMode) -> SpecDocument {
    let rows: Vec<Vec<&str>> = raw
        .iter()
        .map(|row| row.iter().map(|cell| cell.trim()).collect::<Vec<_>>())
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    if rows.is_empty() {
        return SpecDocument::failed("CSV file is empty".to_string());
    }

    let mut doc = SpecDocument::default();

    let start = if looks_like_header(&rows[0]) {
        doc.warnings
            .push("Detected header row - skipping first row".to_string());
        1
    } else {
        0
    };

    for (i, cells) in rows.iter().enumerate().skip(start) {
        let row_number = i + 1;
        match validate_row(cells, mode, row_number, &mut doc.warnings) {
            Ok(row) => doc.rows.push(row),
            Err(message) => doc.errors.push(message),
        }
    }

    let duplicates = find_duplicates(&doc.rows);
    if !duplicates.is_empty() {
        let label = match mode {
            ResizeMode::Brand => "product names",
            ResizeMode::Constrained | ResizeMode::File => "filenames",
        };
        doc.warnings.push(format!(
            "Duplicate {label} found: {}",
            duplicates.join(", ")
        ));
    }

    doc
}

fn looks_like_header(first: &[&str]) -> bool {
    if first.len() < 3 {
        return false;
    }
    let col0 = first[0].to_lowercase();
    let col1 = first[1].to_lowercase();
    col0.contains("filename")
        || col0.contains("name")
        || col0.contains("product")
        || col1.contains("length")
        || col1.contains("width")
}

fn validate_row(
    cells: &[&str],
    mode: ResizeMode,
    row_number: usize,
    warnings: &mut Vec<String>,
) -> Result<SpecRow, String> {
    let required = mode.required_columns();
    if cells.len() < required {
        let expected = match mode {
            ResizeMode::Brand => "4: product name, length, width, variant",
            ResizeMode::Constrained | ResizeMode::File => "3: filename, length, width",
        };
        return Err(format!(
            "Row {row_number}: Missing columns (expected {expected})"
        ));
    }

    match mode {
        ResizeMode::Brand => {
            let (product_name, length, width, variant) = (cells[0], cells[1], cells[2], cells[3]);
            if product_name.is_empty() {
                return Err(format!("Row {row_number}: Product name cannot be empty"));
            }
            if variant.is_empty() {
                return Err(format!("Row {row_number}: Image variant cannot be empty"));
            }
            let variant = Variant::from_tag(variant).ok_or_else(|| {
                format!(
                    "Row {row_number}: Image variant must be one of \"Original\", \"Full Black\", \"Full White\" (got \"{variant}\")"
                )
            })?;
            let length_inches = parse_dimension(length, "Length", row_number, warnings)?;
            let width_inches = parse_dimension(width, "Width", row_number, warnings)?;
            Ok(SpecRow::Brand {
                product_name: product_name.to_string(),
                variant,
                length_inches,
                width_inches,
            })
        }
        ResizeMode::Constrained | ResizeMode::File => {
            let (key, length, width) = (cells[0], cells[1], cells[2]);
            if key.is_empty() {
                return Err(format!("Row {row_number}: Filename cannot be empty"));
            }
            if !has_image_extension(key) {
                warnings.push(format!(
                    "Row {row_number}: \"{key}\" may not be a valid image file"
                ));
            }
            let length_inches = parse_dimension(length, "Length", row_number, warnings)?;
            let width_inches = parse_dimension(width, "Width", row_number, warnings)?;
            Ok(SpecRow::Named {
                key: key.to_string(),
                length_inches,
                width_inches,
            })
        }
    }
}

fn parse_dimension(
    raw: &str,
    label: &str,
    row_number: usize,
    warnings: &mut Vec<String>,
) -> Result<f64, String> {
    let value = raw
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| {
            format!("Row {row_number}: {label} must be a positive number (got \"{raw}\")")
        })?;
    if value > LARGE_DIMENSION_INCHES {
        warnings.push(format!(
            "Row {row_number}: {label} {value} inches is very large"
        ));
    }
    Ok(value)
}

/// Identities seen more than once, in order of their first repeat.
fn find_duplicates(rows: &[SpecRow]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for row in rows {
        let identity = row.identity();
        if !seen.insert(identity) && reported.insert(identity) {
            duplicates.push(identity.to_string());
        }
    }
    duplicates
}

/// Example sheet for the given mode, header included.
pub fn sample_csv(mode: ResizeMode) -> String {
    let rows: &[[&str; 4]] = match mode {
        ResizeMode::Brand => &[
            ["product name", "length", "width", "variant"],
            ["Supreme Laptop Bag", "4", "3", "Original"],
            ["Travel Mug", "5", "7", "Full Black"],
            ["Canvas Tote", "4", "6", "Full White"],
        ],
        ResizeMode::Constrained | ResizeMode::File => &[
            ["filename", "length", "width", ""],
            ["photo1.jpg", "8.5", "11", ""],
            ["image2.png", "5", "7", ""],
            ["picture3.jpeg", "4", "6", ""],
        ],
    };
    let columns = mode.required_columns();
    rows.iter()
        .map(|row| row[..columns].join(",") + "\n")
        .collect()
}
