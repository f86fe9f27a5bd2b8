//! Integration test: run a synthetic photo through the full pipeline and export to PNG.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::PathBuf;

use edgeview_pipeline::{EdgeMap, RgbaImage, ViewerConfig};
use image::{ExtendedColorType, ImageEncoder, Rgba, codecs::png::PngEncoder};

/// A 1200x800 frame with a bright disc on a dark gradient background.
fn disc_png() -> Vec<u8> {
    let img = RgbaImage::from_fn(1200, 800, |x, y| {
        let dx = f64::from(x) - 600.0;
        let dy = f64::from(y) - 400.0;
        if dx.hypot(dy) < 250.0 {
            Rgba([240, 220, 200, 255])
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let shade = (x / 40) as u8;
            Rgba([shade, shade, shade, 255])
        }
    });
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(img.as_raw(), 1200, 800, ExtendedColorType::Rgba8)
        .unwrap();
    buf
}

#[test]
fn disc_pipeline_to_png() {
    let workspace_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .to_path_buf();

    let image_bytes = disc_png();
    let result = edgeview_pipeline::process(&image_bytes, &ViewerConfig::default())
        .expect("pipeline should succeed");

    // 1200 wide is scaled to 900; the disc (radius 187.5) stays centred.
    assert_eq!(result.dimensions.width, 900);
    assert_eq!(result.dimensions.height, 600);
    assert!(result.edges.edge_pixel_count() > 0);
    assert!(!result.edges.is_edge(450, 300), "disc interior is flat");
    assert!(!result.edges.is_edge(20, 20), "background ramp is gentle");
    assert!(
        (440..=460).any(|x| result.edges.is_edge(x, 112) || result.edges.is_edge(x, 113)),
        "expected the top of the disc outline"
    );

    let png = edgeview_export::to_png(&result.edges).unwrap();
    let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(decoded.dimensions(), (900, 600));
    assert!(decoded.pixels().all(|p| p.0[3] == 255));
    assert!(
        decoded
            .pixels()
            .all(|p| p.0[0] == EdgeMap::EDGE || p.0[0] == EdgeMap::BACKGROUND)
    );

    let output_path =
        workspace_root.join(format!("target/{}", edgeview_export::download_filename(0)));
    if std::fs::create_dir_all(workspace_root.join("target")).is_ok() {
        std::fs::write(&output_path, &png).unwrap();
        eprintln!("PNG written to {output_path:?} ({} bytes)", png.len());
    }
}
