//! edgeview-export: Pure format serializers (sans-IO)
//!
//! Converts edge maps into output formats. Currently supports PNG.

pub mod png;

pub use png::{ExportError, PngColor, download_filename, encode_png, to_png};
