//! PNG serializer for edge maps.
//!
//! Edge maps are written as 8-bit PNGs, either as full RGBA (the same
//! bytes a canvas `toDataURL("image/png")` would capture) or as a
//! single-channel grayscale image, which is lossless because every edge
//! pixel has equal R, G and B.

use edgeview_pipeline::EdgeMap;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

/// Errors produced while serializing an edge map.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// The PNG encoder rejected the image.
    #[error("PNG encode error: {0}")]
    PngEncode(#[from] image::ImageError),
}

/// Pixel layout of the written PNG.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PngColor {
    /// Four channels, alpha always 255.
    #[default]
    Rgba,
    /// One channel holding the edge value.
    Luma,
}

/// Encode an edge map as an RGBA PNG.
///
/// # Errors
///
/// Returns [`ExportError::PngEncode`] if encoding fails.
pub fn to_png(edges: &EdgeMap) -> Result<Vec<u8>, ExportError> {
    encode_png(edges, PngColor::Rgba)
}

/// Encode an edge map as a PNG with the given pixel layout.
///
/// # Errors
///
/// Returns [`ExportError::PngEncode`] if encoding fails.
pub fn encode_png(edges: &EdgeMap, color: PngColor) -> Result<Vec<u8>, ExportError> {
    let dims = edges.dimensions();
    let mut buf = Vec::new();
    let encoder = PngEncoder::new(&mut buf);
    match color {
        PngColor::Rgba => encoder.write_image(
            edges.as_raw(),
            dims.width,
            dims.height,
            ExtendedColorType::Rgba8,
        )?,
        PngColor::Luma => {
            let luma: Vec<u8> = edges.as_image().pixels().map(|px| px.0[0]).collect();
            encoder.write_image(&luma, dims.width, dims.height, ExtendedColorType::L8)?;
        }
    }
    Ok(buf)
}

/// File name offered when the user saves the current edge map.
#[must_use]
pub fn download_filename(timestamp_ms: u128) -> String {
    format!("edge-{timestamp_ms}.png")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use edgeview_pipeline::{EdgeDetector, Parameters, RgbaImage};

    use super::*;

    fn split_edges() -> EdgeMap {
        let img = RgbaImage::from_fn(6, 4, |x, _| {
            if x < 3 {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        });
        EdgeDetector::new()
            .detect_image(&img, &Parameters::default())
            .unwrap()
    }

    #[test]
    fn rgba_png_decodes_to_same_pixels() {
        let edges = split_edges();
        let png = to_png(&edges).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (6, 4));
        assert_eq!(decoded.as_raw(), edges.as_raw());
    }

    #[test]
    fn luma_png_keeps_edge_values() {
        let edges = split_edges();
        let png = encode_png(&edges, PngColor::Luma).unwrap();

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
        let luma = decoded.to_luma8();
        for (x, y, px) in luma.enumerate_pixels() {
            let expected = if edges.is_edge(x, y) {
                EdgeMap::EDGE
            } else {
                EdgeMap::BACKGROUND
            };
            assert_eq!(px.0[0], expected, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn filename_uses_timestamp() {
        assert_eq!(download_filename(1_700_000_000_123), "edge-1700000000123.png");
        assert_eq!(download_filename(0), "edge-0.png");
    }
}
