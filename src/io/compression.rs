//! Transparent compression for input logs, datasets and output tables.
//!
//! Every reader and writer in [`crate::io`] goes through [`auto_detect_reader`] or
//! [`auto_detect_writer`], so a `cowrie.json.gz` log or an `out.csv.zst` table work
//! without extra flags.
//!
//! ## Built-in Codecs
//!
//! When enabled via feature flags:
//! - **Gzip** (`.gz`) - via `flate2` (feature: `compression-gzip`)
//! - **Zstd** (`.zst`) - via `zstd` (feature: `compression-zstd`)
//!
//! Readers check the file extension first and fall back to magic bytes. Writers only
//! look at the extension. With no codec features enabled both functions are plain
//! buffered pass-throughs.

use anyhow::{Context, Result};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Compression codec detected by extension or magic bytes.
pub trait CompressionCodec: Send + Sync {
    /// Human-readable codec name (e.g., "gzip", "zstd").
    fn name(&self) -> &str;

    /// Lowercase file extensions with the leading dot.
    fn extensions(&self) -> &[&str];

    /// Optional magic byte signature for content-based detection.
    fn magic_bytes(&self) -> Option<&[u8]>;

    /// Wrap a reader with decompression.
    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>>;

    /// Wrap a writer with compression.
    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>>;
}

/// Built-in codecs enabled for this build.
fn codecs() -> Vec<Box<dyn CompressionCodec>> {
    vec![
        #[cfg(feature = "compression-gzip")]
        Box::new(GzipCodec),
        #[cfg(feature = "compression-zstd")]
        Box::new(ZstdCodec),
    ]
}

/// Names of the codecs compiled in, for diagnostics.
#[must_use]
pub fn available_codecs() -> Vec<String> {
    codecs().iter().map(|c| c.name().to_string()).collect()
}

fn detect_from_extension(path: &Path) -> Option<Box<dyn CompressionCodec>> {
    let path_str = path.to_string_lossy().to_lowercase();
    codecs()
        .into_iter()
        .find(|codec| codec.extensions().iter().any(|ext| path_str.ends_with(ext)))
}

/// Peek at the start of the buffered reader without advancing it.
fn detect_from_magic<R: BufRead>(reader: &mut R) -> Option<Box<dyn CompressionCodec>> {
    let buf = reader.fill_buf().ok()?;
    if buf.is_empty() {
        return None;
    }
    codecs().into_iter().find(|codec| {
        codec
            .magic_bytes()
            .is_some_and(|magic| buf.starts_with(magic))
    })
}

/// Wrap `reader` with decompression when the path or content calls for it.
///
/// # Errors
/// Returns an error if the codec cannot initialize its decoder.
pub fn auto_detect_reader<R: Read + 'static>(
    reader: R,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Read>> {
    if let Some(codec) = detect_from_extension(path_hint.as_ref()) {
        return codec
            .wrap_reader_dyn(Box::new(reader))
            .with_context(|| format!("wrap reader with {} codec", codec.name()));
    }

    let mut buf_reader = BufReader::new(reader);
    if let Some(codec) = detect_from_magic(&mut buf_reader) {
        return codec
            .wrap_reader_dyn(Box::new(buf_reader))
            .with_context(|| format!("wrap reader with {} codec", codec.name()));
    }

    Ok(Box::new(buf_reader))
}

/// Wrap `writer` with compression when the path extension names a codec.
///
/// # Errors
/// Returns an error if the codec cannot initialize its encoder.
pub fn auto_detect_writer<W: Write + 'static>(
    writer: W,
    path_hint: impl AsRef<Path>,
) -> Result<Box<dyn Write>> {
    if let Some(codec) = detect_from_extension(path_hint.as_ref()) {
        return codec
            .wrap_writer_dyn(Box::new(BufWriter::new(writer)))
            .with_context(|| format!("wrap writer with {} codec", codec.name()));
    }
    Ok(Box::new(BufWriter::new(writer)))
}

#[cfg(feature = "compression-gzip")]
struct GzipCodec;

#[cfg(feature = "compression-gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extensions(&self) -> &[&str] {
        &[".gz", ".gzip"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x1f, 0x8b])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        use flate2::read::MultiGzDecoder;
        // rotated logs are often concatenated gzip members
        Ok(Box::new(MultiGzDecoder::new(reader)))
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>> {
        use flate2::Compression;
        use flate2::write::GzEncoder;
        Ok(Box::new(GzEncoder::new(writer, Compression::default())))
    }
}

#[cfg(feature = "compression-zstd")]
struct ZstdCodec;

#[cfg(feature = "compression-zstd")]
impl CompressionCodec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn extensions(&self) -> &[&str] {
        &[".zst", ".zstd"]
    }

    fn magic_bytes(&self) -> Option<&[u8]> {
        Some(&[0x28, 0xb5, 0x2f, 0xfd])
    }

    fn wrap_reader_dyn(&self, reader: Box<dyn Read>) -> std::io::Result<Box<dyn Read>> {
        zstd::stream::read::Decoder::new(reader).map(|d| Box::new(d) as Box<dyn Read>)
    }

    fn wrap_writer_dyn(&self, writer: Box<dyn Write>) -> std::io::Result<Box<dyn Write>> {
        zstd::stream::write::Encoder::new(writer, 3)
            .map(|e| Box::new(e.auto_finish()) as Box<dyn Write>)
    }
}
