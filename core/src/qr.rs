//! QR rendering for signed tokens.
//!
//! A pure transform from a signed token string to a scannable raster
//! image, delivered as a base64 PNG data URL so clients can drop it
//! straight into an `<img>` tag. The token content is never inspected
//! here; semantic validation belongs to the codec and the check-in
//! pipeline.

use crate::error::QrError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};
use std::io::Cursor;

/// Pixels per QR module.
const MODULE_PIXELS: u32 = 8;

/// Quiet-zone width around the symbol, in modules.
const MARGIN_MODULES: u32 = 1;

/// Render a signed token as a PNG data URL
/// (`data:image/png;base64,...`).
///
/// Error-correction level M, one module of quiet zone, black on white.
///
/// # Errors
///
/// Returns [`QrError`] if the payload does not fit into a QR symbol or
/// the raster cannot be serialized to PNG.
pub fn render_qr_png(token: &str) -> Result<String, QrError> {
    let code = QrCode::with_error_correction_level(token.as_bytes(), EcLevel::M)
        .map_err(|e| QrError::Encode(e.to_string()))?;

    let png = rasterize(&code)?;
    Ok(format!("data:image/png;base64,{}", BASE64.encode(png)))
}

/// Draw the symbol into a grayscale buffer and PNG-encode it.
fn rasterize(code: &QrCode) -> Result<Vec<u8>, QrError> {
    let modules = code.to_colors();
    #[allow(clippy::cast_possible_truncation)]
    let width = code.width() as u32;
    let size = (width + 2 * MARGIN_MODULES) * MODULE_PIXELS;

    let mut img = GrayImage::from_pixel(size, size, Luma([0xFF]));
    for (idx, module) in modules.iter().enumerate() {
        if *module != Color::Dark {
            continue;
        }
        #[allow(clippy::cast_possible_truncation)]
        let (mx, my) = ((idx as u32) % width, (idx as u32) / width);
        let x0 = (mx + MARGIN_MODULES) * MODULE_PIXELS;
        let y0 = (my + MARGIN_MODULES) * MODULE_PIXELS;
        for dy in 0..MODULE_PIXELS {
            for dx in 0..MODULE_PIXELS {
                img.put_pixel(x0 + dx, y0 + dy, Luma([0x00]));
            }
        }
    }

    let mut png = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
        .map_err(|e| QrError::Image(e.to_string()))?;
    Ok(png)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn renders_a_png_data_url() {
        let url = render_qr_png("some.signed.token").unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        // The payload must decode back to a PNG stream.
        let png = BASE64
            .decode(url.trim_start_matches("data:image/png;base64,"))
            .unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn identical_input_renders_identically() {
        let a = render_qr_png("token").unwrap();
        let b = render_qr_png("token").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn oversized_payload_is_reported() {
        // QR version 40 tops out well below 8 KiB of byte data.
        let huge = "x".repeat(8192);
        assert!(matches!(render_qr_png(&huge), Err(QrError::Encode(_))));
    }
}
