use std::fs::Metadata;

use async_zip::base::write::ZipFileWriter;
use async_zip::{Compression, StringEncoding, ZipDateTime, ZipEntryBuilder, ZipString};
use chrono::{DateTime, Utc};
use futures::AsyncWriteExt as _;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::debug;

use crate::error::{BuildError, Result};
use crate::packaging::{Compressor, FileEntry};

/// Writes `entries` as a zip container into `file` (also used for jar).
///
/// Entry names are handed to the writer as raw bytes; the zip writer stores
/// them without resolving `..` segments.
pub async fn write_zip(file: &mut File, entries: &[FileEntry], compressor: Compressor) -> Result<()> {
    let compression = match compressor {
        Compressor::Deflate => Compression::Deflate,
        Compressor::Stored => Compression::Stored,
    };

    let mut writer = ZipFileWriter::with_tokio(&mut *file);

    let mut buf = [0u8; 8192]; // 8KB read buffer

    for fe in entries {
        let mut source = File::open(&fe.path)
            .await
            .map_err(|e| BuildError::read_failed(&fe.path, e))?;
        let metadata = source
            .metadata()
            .await
            .map_err(|e| BuildError::read_failed(&fe.path, e))?;

        let mut entry_writer = writer
            .write_entry_stream(entry_builder(fe, &metadata, compression))
            .await?;

        // Pipe the source through in chunks instead of loading it whole.
        let mut copied: u64 = 0;
        loop {
            let n = source
                .read(&mut buf)
                .await
                .map_err(|e| BuildError::read_failed(&fe.path, e))?;
            if n == 0 {
                break; // End of file
            }
            entry_writer.write_all(&buf[..n]).await?;
            copied += n as u64;
        }

        // Finishing the entry writes its sizes and CRC.
        entry_writer.close().await?;

        debug!(
            source = %fe.path.display(),
            name = %fe.display_name(),
            bytes = copied,
            "added zip entry"
        );
    }

    writer.close().await?;
    file.flush().await?;
    Ok(())
}

/// Carries over what the zip entry model has room for: mtime and unix mode.
fn entry_builder(fe: &FileEntry, metadata: &Metadata, compression: Compression) -> ZipEntryBuilder {
    let mut builder = ZipEntryBuilder::new(raw_name(&fe.name_in_archive), compression);

    if let Ok(modified) = metadata.modified() {
        let modified: DateTime<Utc> = modified.into();
        builder = builder.last_modification_date(ZipDateTime::from_chrono(&modified));
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder = builder.unix_permissions(metadata.permissions().mode() as u16);
    }

    builder
}

/// UTF-8 names get the zip UTF-8 flag; anything else is stored as raw bytes
/// with no flag, the way zip tools store names in the local code page.
fn raw_name(name: &[u8]) -> ZipString {
    let encoding = if std::str::from_utf8(name).is_ok() {
        StringEncoding::Utf8
    } else {
        StringEncoding::Raw
    };
    ZipString::new(name.to_vec(), encoding)
}
