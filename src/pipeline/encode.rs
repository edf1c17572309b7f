//! Image encoding: `DynamicImage` → base64 PNG wrapped in `ImageData`.
//!
//! PNG rather than JPEG: reference ranges and units are printed small, and
//! JPEG ringing around glyphs is enough to turn `0.4` into `0.1`.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as a base64 PNG ready for the vision model.
///
/// `detail: "high"` asks GPT-4-class models for the full tile budget so that
/// table cells stay readable.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!(png_bytes = buf.len(), base64_bytes = b64.len(), "Encoded page image");

    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}
