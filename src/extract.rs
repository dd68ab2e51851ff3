use std::{
    fs::{self, File},
    io::{self, BufRead, BufReader, Read},
    path::{Component, Path, PathBuf},
};

use tar::EntryType;

use crate::errors::UbiJavaBuildpackError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Expands a gzip-compressed or plain tar archive into `destination`, dropping
/// the first `strip_components` path components of every entry.
pub(crate) fn extract(
    archive: &Path,
    destination: &Path,
    strip_components: usize,
) -> Result<(), UbiJavaBuildpackError> {
    expand(archive, destination, strip_components).map_err(|source| {
        UbiJavaBuildpackError::ArchiveExtract {
            path: archive.to_path_buf(),
            source,
        }
    })
}

fn expand(archive: &Path, destination: &Path, strip_components: usize) -> io::Result<()> {
    let mut reader = BufReader::new(File::open(archive)?);
    let compressed = reader.fill_buf()?.starts_with(&GZIP_MAGIC);

    let input: Box<dyn Read> = if compressed {
        Box::new(flate2::read::GzDecoder::new(reader))
    } else {
        Box::new(reader)
    };
    let mut tar = tar::Archive::new(input);
    tar.set_preserve_permissions(true);

    for entry in tar.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        let Some(relative) = stripped(&path, strip_components)? else {
            continue;
        };

        let target = destination.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        // hard link names are archive paths and are stripped like entry paths
        if entry.header().entry_type() == EntryType::Link {
            let link_name = entry
                .link_name()?
                .ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("hard link {} has no target", path.display()),
                    )
                })?
                .into_owned();
            let Some(source) = stripped(&link_name, strip_components)? else {
                continue;
            };
            if target.symlink_metadata().is_ok() {
                fs::remove_file(&target)?;
            }
            fs::hard_link(destination.join(source), &target)?;
            continue;
        }

        entry.unpack(&target)?;
    }

    Ok(())
}

fn stripped(path: &Path, strip_components: usize) -> io::Result<Option<PathBuf>> {
    let mut relative = PathBuf::new();
    for component in path.components().skip(strip_components) {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("archive entry {} escapes the destination", path.display()),
                ));
            }
        }
    }
    Ok((!relative.as_os_str().is_empty()).then_some(relative))
}
