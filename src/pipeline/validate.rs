//! Upload validation: size floor and `%PDF` magic number.

use crate::error::ValidationError;

/// Smallest upload accepted as a PDF, in bytes.
pub const MIN_PDF_SIZE: usize = 1024;

/// Leading bytes of every PDF file.
pub const PDF_MAGIC: &str = "%PDF";

/// Check an uploaded buffer before it reaches the rasterizer.
///
/// The size check runs first; a buffer that passes it always has at least
/// four bytes for the magic comparison.
pub fn validate_upload(bytes: &[u8]) -> Result<(), ValidationError> {
    if bytes.len() < MIN_PDF_SIZE {
        return Err(ValidationError::TooSmall {
            size: bytes.len(),
            minimum: MIN_PDF_SIZE,
        });
    }

    let prefix = &bytes[..PDF_MAGIC.len()];
    if prefix != PDF_MAGIC.as_bytes() {
        return Err(ValidationError::BadMagic {
            found: String::from_utf8_lossy(prefix).into_owned(),
            expected: PDF_MAGIC,
        });
    }

    Ok(())
}
