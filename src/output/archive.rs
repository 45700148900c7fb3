//! Zip packaging of unit bundles.

use std::io::{Cursor, Read, Write};

use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::RedactorResult;

/// Writes `(name, bytes)` entries into an in-memory deflated zip.
pub fn zip_entries<N, B>(entries: impl IntoIterator<Item = (N, B)>) -> RedactorResult<Vec<u8>>
where
    N: Into<String>,
    B: AsRef<[u8]>,
{
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in entries {
        writer.start_file(name.into(), options)?;
        writer.write_all(bytes.as_ref()).map_err(ZipError::from)?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Reads every file entry of a zip, in archive order.
pub fn read_entries(bytes: &[u8]) -> RedactorResult<Vec<(String, Vec<u8>)>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());
    for idx in 0..archive.len() {
        let mut file = archive.by_index(idx)?;
        if file.is_dir() {
            continue;
        }
        let mut data = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut data).map_err(ZipError::from)?;
        entries.push((file.name().to_string(), data));
    }
    Ok(entries)
}
