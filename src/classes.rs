use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use walkdir::WalkDir;
use zip::ZipArchive;

/// Counts the classes a JVM may load from its runtime image.
pub(crate) trait ClassCounter {
    fn count(&self, java_home: &Path) -> io::Result<usize>;
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct JvmClassCounter;

impl ClassCounter for JvmClassCounter {
    fn count(&self, java_home: &Path) -> io::Result<usize> {
        let modules = java_home.join("lib").join("modules");
        if modules.is_file() {
            return jimage_resources(&modules);
        }

        let mut count = 0;
        for entry in WalkDir::new(java_home) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            match entry.path().extension().and_then(|ext| ext.to_str()) {
                Some("class") => count += 1,
                Some("jar") => count += jar_classes(entry.path())?,
                _ => {}
            }
        }
        Ok(count)
    }
}

const JIMAGE_MAGIC: u32 = 0xCAFE_DADA;

/// Reads the resource count from a jimage (`lib/modules`) header.
fn jimage_resources(path: &Path) -> io::Result<usize> {
    let mut header = [0; 16];
    File::open(path)?.read_exact(&mut header)?;

    let word = |offset: usize, big_endian: bool| {
        let bytes = [
            header[offset],
            header[offset + 1],
            header[offset + 2],
            header[offset + 3],
        ];
        if big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        }
    };

    // jimage files are written in the byte order of the platform that built them
    let big_endian = match (word(0, false), word(0, true)) {
        (JIMAGE_MAGIC, _) => false,
        (_, JIMAGE_MAGIC) => true,
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} is not a jimage file", path.display()),
            ));
        }
    };

    Ok(word(12, big_endian) as usize)
}

/// Counts `.class` entries listed in a jar's central directory.
fn jar_classes(path: &Path) -> io::Result<usize> {
    let archive = ZipArchive::new(File::open(path)?).map_err(|error| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is not a valid jar file: {error}", path.display()),
        )
    })?;

    Ok(archive
        .file_names()
        .filter(|name| name.ends_with(".class"))
        .count())
}
