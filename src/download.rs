//! A single file download into the scratch directory.

use crate::{client::Client, config::Origin, error::Error};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

/// Download `/<name>` from `origin` into `<dir>/<name>`.
///
/// Returns only once the destination file has been flushed, synced and
/// closed. Returns the number of bytes written.
pub fn download(client: &dyn Client, origin: &Origin, name: &str, dir: &Path) -> Result<u64, Error> {
    let path = dir.join(name);
    let file = File::create(&path).map_err(Error::Stream)?;
    let mut writer = BufWriter::new(file);

    let bytes = client.fetch(&origin.url(name), &mut writer)?;

    writer.flush().map_err(Error::Stream)?;
    let file = writer
        .into_inner()
        .map_err(|e| Error::Stream(e.into_error()))?;
    file.sync_all().map_err(Error::Stream)?;
    drop(file);

    tracing::trace!(name, bytes, path = %path.display(), "download complete");

    Ok(bytes)
}
