//! Reader for Java `.properties` files, as used by `java.security`.

use std::{collections::BTreeMap, fs::File, io::Read, path::Path};

use encoding_rs::UTF_8;
use java_properties::PropertiesIter;

#[derive(thiserror::Error, Debug)]
pub enum PropertiesError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Parse(#[from] java_properties::PropertiesError),
}

pub(crate) fn load(path: &Path) -> Result<BTreeMap<String, String>, PropertiesError> {
    parse(File::open(path)?)
}

pub(crate) fn parse<R: Read>(input: R) -> Result<BTreeMap<String, String>, PropertiesError> {
    let mut properties = BTreeMap::new();
    PropertiesIter::new_with_encoding(input, UTF_8).read_into(|key, value| {
        properties.insert(key, value);
    })?;
    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_separators_and_comments() {
        let properties = parse(
            "# comment\n\
             ! another comment\n\
             \n\
             a=1\n\
             b : 2\n\
             c 3\n\
             d\n\
             \t  e = spaced value\n"
                .as_bytes(),
        )
        .unwrap();

        assert_eq!(properties["a"], "1");
        assert_eq!(properties["b"], "2");
        assert_eq!(properties["c"], "3");
        assert_eq!(properties["d"], "");
        assert_eq!(properties["e"], "spaced value");
        assert_eq!(properties.len(), 5);
    }

    #[test]
    fn joins_continuation_lines() {
        let properties = parse(
            "jdk.tls.disabledAlgorithms=SSLv3, TLSv1, \\\n    RC4, DES\nnext=value\n"
                .as_bytes(),
        )
        .unwrap();

        assert_eq!(properties["jdk.tls.disabledAlgorithms"], "SSLv3, TLSv1, RC4, DES");
        assert_eq!(properties["next"], "value");
    }

    #[test]
    fn even_backslashes_do_not_continue() {
        let properties = parse("path=C:\\\\\nother=x\n".as_bytes()).unwrap();

        assert_eq!(properties["path"], "C:\\");
        assert_eq!(properties["other"], "x");
    }

    #[test]
    fn decodes_escapes() {
        let properties = parse("key\\=with\\:seps=tab\\there \\u00e9\n".as_bytes()).unwrap();

        assert_eq!(properties["key=with:seps"], "tab\there \u{e9}");
    }

    #[test]
    fn malformed_unicode_escape_fails_the_read() {
        let result = parse("good=1\nbad=\\u12G4\n".as_bytes());

        assert!(matches!(result, Err(PropertiesError::Parse(_))));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            load(&dir.path().join("java.security")),
            Err(PropertiesError::Io(_))
        ));
    }
}
