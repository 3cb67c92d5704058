//! Zero-padded rendering of the year and month directory names.
//!
//! Only the two widths used for destination directories are accepted.

use thiserror::Error;

/// Width of a year directory name, e.g. `2022`.
pub const YEAR_WIDTH: usize = 4;
/// Width of a month directory name, e.g. `03`.
pub const MONTH_WIDTH: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("unsupported pad width {0} (expected 4 or 2)")]
    InvalidWidth(usize),
    #[error("cannot format negative value {0}")]
    Negative(i64),
}

/// Renders `value` in decimal, left-padded with zeros to `width` digits.
///
/// Values wider than `width` are returned unpadded, e.g. year `12345` stays `"12345"`.
///
/// # Examples
///
/// ```
/// use datesort::format::format_padded;
///
/// assert_eq!(format_padded(3, 2).unwrap(), "03");
/// assert_eq!(format_padded(987, 4).unwrap(), "0987");
/// assert!(format_padded(3, 3).is_err());
/// ```
pub fn format_padded(value: i64, width: usize) -> Result<String, FormatError> {
    if width != YEAR_WIDTH && width != MONTH_WIDTH {
        return Err(FormatError::InvalidWidth(width));
    }
    if value < 0 {
        return Err(FormatError::Negative(value));
    }
    Ok(format!("{value:0width$}"))
}
