use std::fs::File;
use std::io::Write;

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use tar::{Builder, EntryType, Header, HeaderMode};
use tracing::debug;

use crate::error::{BuildError, Result};
use crate::format::ArchiveFormat;
use crate::packaging::FileEntry;

/// Size of the `name` field in a tar header.
const NAME_FIELD_LEN: usize = 100;

/// Name of the pseudo-entry that carries a GNU long name.
const GNU_LONG_LINK: &[u8] = b"././@LongLink";

/// Writes `entries` as a tar stream into `file`, compressed per `format`.
///
/// Blocking; run it off the async runtime.
pub fn write_tar(file: File, format: ArchiveFormat, entries: &[FileEntry]) -> Result<()> {
    match format {
        ArchiveFormat::TarGz => {
            let encoder = GzEncoder::new(file, flate2::Compression::default());
            write_entries(encoder, entries)?.finish()?;
        }
        ArchiveFormat::TarBz2 => {
            let encoder = BzEncoder::new(file, bzip2::Compression::default());
            write_entries(encoder, entries)?.finish()?;
        }
        _ => {
            write_entries(file, entries)?;
        }
    }
    Ok(())
}

/// Appends every entry, writes the end-of-archive marker and hands back the
/// inner writer so a compressor can be finished.
fn write_entries<W: Write>(writer: W, entries: &[FileEntry]) -> Result<W> {
    let mut builder = Builder::new(writer);
    for fe in entries {
        append_entry(&mut builder, fe)?;
    }
    Ok(builder.into_inner()?)
}

// `Builder::append_path_with_name` and friends refuse names containing `..`,
// so the header is filled in by hand and written with `Builder::append`.
fn append_entry<W: Write>(builder: &mut Builder<W>, fe: &FileEntry) -> Result<()> {
    let mut source = File::open(&fe.path).map_err(|e| BuildError::read_failed(&fe.path, e))?;
    let metadata = source
        .metadata()
        .map_err(|e| BuildError::read_failed(&fe.path, e))?;

    let mut header = Header::new_gnu();
    header.set_metadata_in_mode(&metadata, HeaderMode::Complete);

    let name = fe.name_in_archive.as_slice();
    if name.len() > NAME_FIELD_LEN {
        append_long_name(builder, name)?;
    }
    set_raw_name(&mut header, name);
    header.set_cksum();

    builder
        .append(&header, &mut source)
        .map_err(|e| BuildError::read_failed(&fe.path, e))?;

    debug!(
        source = %fe.path.display(),
        name = %fe.display_name(),
        bytes = metadata.len(),
        "added tar entry"
    );
    Ok(())
}

/// Copies as much of `name` as fits into the header's name field.
fn set_raw_name(header: &mut Header, name: &[u8]) {
    let field = &mut header.as_old_mut().name;
    field.fill(0);
    let len = name.len().min(NAME_FIELD_LEN);
    field[..len].copy_from_slice(&name[..len]);
}

/// Emits the GNU `L` record that tells readers the full name of the next entry.
fn append_long_name<W: Write>(builder: &mut Builder<W>, name: &[u8]) -> Result<()> {
    let mut header = Header::new_gnu();
    set_raw_name(&mut header, GNU_LONG_LINK);
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_size(name.len() as u64 + 1);
    header.set_entry_type(EntryType::GNULongName);
    header.set_cksum();

    let mut data = name.to_vec();
    data.push(0);
    builder.append(&header, data.as_slice())?;
    Ok(())
}
