use std::path::Path;

use crate::{errors::UbiJavaBuildpackError, properties};

const PROVIDER_PREFIX: &str = "security.provider.";

/// Lists the `security.provider.<n>` entries of a `java.security` file as
/// `<n>|<provider>`, ordered by the raw `<n>` string so the output is reproducible.
pub(crate) fn security_providers(
    java_security: &Path,
) -> Result<Vec<String>, UbiJavaBuildpackError> {
    let properties =
        properties::load(java_security).map_err(|source| UbiJavaBuildpackError::ConfigRead {
            path: java_security.to_path_buf(),
            source,
        })?;

    // BTreeMap iteration is already ordered by key
    Ok(properties
        .iter()
        .filter_map(|(key, value)| {
            key.strip_prefix(PROVIDER_PREFIX)
                .map(|index| format!("{index}|{value}"))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn providers_sort_lexicographically_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("java.security");
        fs::write(
            &path,
            "security.provider.2=SUN\n\
             security.provider.10=SunJSSE\n\
             securerandom.source=file:/dev/random\n",
        )
        .unwrap();

        assert_eq!(
            security_providers(&path).unwrap(),
            vec!["10|SunJSSE".to_string(), "2|SUN".to_string()]
        );
    }

    #[test]
    fn provider_values_keep_arguments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("java.security");
        fs::write(
            &path,
            "security.provider.1=SunPKCS11 ${java.home}/lib/security/nss.cfg\n",
        )
        .unwrap();

        assert_eq!(
            security_providers(&path).unwrap(),
            vec!["1|SunPKCS11 ${java.home}/lib/security/nss.cfg".to_string()]
        );
    }

    #[test]
    fn missing_file_is_a_config_read_error() {
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            security_providers(&dir.path().join("java.security")),
            Err(UbiJavaBuildpackError::ConfigRead { .. })
        ));
    }

    #[test]
    fn malformed_file_yields_no_partial_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("java.security");
        fs::write(&path, "security.provider.1=SUN\nsecurity.provider.2=\\uZZZZ\n").unwrap();

        assert!(matches!(
            security_providers(&path),
            Err(UbiJavaBuildpackError::ConfigRead { .. })
        ));
    }
}
