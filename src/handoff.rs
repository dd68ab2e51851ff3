use std::{
    fs, io,
    path::{Path, PathBuf},
};

use libcnb::Env;

use crate::errors::UbiJavaBuildpackError;

pub(crate) const VERSION_VAR: &str = "BPI_UBI_JAVA_EXTENSION_VERSION";
pub(crate) const HELPERS_VAR: &str = "BPI_UBI_JAVA_EXTENSION_HELPERS";
pub(crate) const LEGACY_VERSION_VAR: &str = "UBI_JAVA_EXTENSION_VERSION";
pub(crate) const LEGACY_HELPERS_VAR: &str = "UBI_JAVA_EXTENSION_HELPERS";

pub(crate) const VERSION_MARKER: &str = "bpi.paketo.ubi.java.version";
pub(crate) const HELPERS_MARKER: &str = "bpi.paketo.ubi.java.helpers";

/// What the UBI Java extension passed on from its generate phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Handoff {
    pub(crate) version: String,
    pub(crate) helpers: String,
}

impl Handoff {
    pub(crate) fn is_absent(&self) -> bool {
        self.version.is_empty()
    }

    /// Helper names from the comma-separated list, blanks dropped.
    pub(crate) fn helper_names(&self) -> Vec<String> {
        self.helpers
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

pub(crate) trait HandoffSource {
    fn read(&self) -> Result<Handoff, UbiJavaBuildpackError>;
}

/// Reads the hand-off from environment variables, preferring the `BPI_` names.
#[derive(Debug, Clone)]
pub(crate) struct EnvHandoffSource {
    env: Env,
}

impl EnvHandoffSource {
    pub(crate) fn new(env: Env) -> Self {
        Self { env }
    }

    fn lookup(&self, name: &str, legacy: &str) -> String {
        [name, legacy]
            .iter()
            .filter_map(|key| self.env.get(key))
            .map(|value| value.to_string_lossy().trim().to_string())
            .find(|value| !value.is_empty())
            .unwrap_or_default()
    }
}

impl HandoffSource for EnvHandoffSource {
    fn read(&self) -> Result<Handoff, UbiJavaBuildpackError> {
        let version = self.lookup(VERSION_VAR, LEGACY_VERSION_VAR);
        if version.is_empty() {
            return Ok(Handoff::default());
        }

        Ok(Handoff {
            version,
            helpers: self.lookup(HELPERS_VAR, LEGACY_HELPERS_VAR),
        })
    }
}

/// Reads the hand-off from the marker files the extension writes into the build image.
#[derive(Debug, Clone)]
pub(crate) struct MarkerFileHandoffSource {
    root: PathBuf,
}

impl MarkerFileHandoffSource {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) fn is_present(&self) -> bool {
        self.root.join(VERSION_MARKER).exists()
    }
}

impl HandoffSource for MarkerFileHandoffSource {
    fn read(&self) -> Result<Handoff, UbiJavaBuildpackError> {
        let version = match read_marker(&self.root.join(VERSION_MARKER)) {
            Err(UbiJavaBuildpackError::HandoffRead { source, .. })
                if source.kind() == io::ErrorKind::NotFound =>
            {
                return Ok(Handoff::default());
            }
            other => other?,
        };
        if version.is_empty() {
            return Ok(Handoff::default());
        }

        Ok(Handoff {
            version,
            helpers: read_marker(&self.root.join(HELPERS_MARKER))?,
        })
    }
}

fn read_marker(path: &Path) -> Result<String, UbiJavaBuildpackError> {
    fs::read_to_string(path)
        .map(|content| content.trim().to_string())
        .map_err(|source| UbiJavaBuildpackError::HandoffRead {
            path: path.to_path_buf(),
            source,
        })
}

/// Marker files win when the extension wrote them, otherwise the environment is used.
pub(crate) fn handoff_source(marker_root: &Path, env: &Env) -> Box<dyn HandoffSource> {
    let markers = MarkerFileHandoffSource::new(marker_root);
    if markers.is_present() {
        Box::new(markers)
    } else {
        Box::new(EnvHandoffSource::new(env.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Env {
        let mut env = Env::new();
        for (key, value) in vars {
            env.insert(*key, *value);
        }
        env
    }

    #[test]
    fn env_source_prefers_current_names() {
        let source = EnvHandoffSource::new(env(&[
            (VERSION_VAR, "17"),
            (HELPERS_VAR, "java-opts,jvm-heap"),
            (LEGACY_VERSION_VAR, "11"),
            (LEGACY_HELPERS_VAR, "legacy"),
        ]));

        assert_eq!(
            source.read().unwrap(),
            Handoff {
                version: "17".to_string(),
                helpers: "java-opts,jvm-heap".to_string()
            }
        );
    }

    #[test]
    fn env_source_falls_back_to_legacy_names() {
        let source = EnvHandoffSource::new(env(&[
            (LEGACY_VERSION_VAR, "11"),
            (LEGACY_HELPERS_VAR, "java-opts"),
        ]));

        let handoff = source.read().unwrap();
        assert_eq!(handoff.version, "11");
        assert_eq!(handoff.helpers, "java-opts");
    }

    #[test]
    fn env_source_without_version_is_absent() {
        let source = EnvHandoffSource::new(env(&[(HELPERS_VAR, "java-opts")]));

        assert!(source.read().unwrap().is_absent());
    }

    #[test]
    fn marker_files_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(VERSION_MARKER), "21\n").unwrap();
        fs::write(dir.path().join(HELPERS_MARKER), "java-opts,memory-calculator\n").unwrap();

        let handoff = MarkerFileHandoffSource::new(dir.path()).read().unwrap();

        assert_eq!(handoff.version, "21");
        assert_eq!(
            handoff.helper_names(),
            vec!["java-opts".to_string(), "memory-calculator".to_string()]
        );
    }

    #[test]
    fn missing_version_marker_is_absent() {
        let dir = tempfile::tempdir().unwrap();

        assert!(
            MarkerFileHandoffSource::new(dir.path())
                .read()
                .unwrap()
                .is_absent()
        );
    }

    #[test]
    fn missing_helpers_marker_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(VERSION_MARKER), "21").unwrap();

        assert!(matches!(
            MarkerFileHandoffSource::new(dir.path()).read(),
            Err(UbiJavaBuildpackError::HandoffRead { .. })
        ));
    }

    #[test]
    fn unreadable_version_marker_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        // a directory in place of the file cannot be read, but is not "not found"
        fs::create_dir(dir.path().join(VERSION_MARKER)).unwrap();

        assert!(matches!(
            MarkerFileHandoffSource::new(dir.path()).read(),
            Err(UbiJavaBuildpackError::HandoffRead { .. })
        ));
    }

    #[test]
    fn source_selection_follows_marker_presence() {
        let dir = tempfile::tempdir().unwrap();
        let vars = env(&[(VERSION_VAR, "17"), (HELPERS_VAR, "java-opts")]);

        assert_eq!(handoff_source(dir.path(), &vars).read().unwrap().version, "17");

        fs::write(dir.path().join(VERSION_MARKER), "21").unwrap();
        fs::write(dir.path().join(HELPERS_MARKER), "").unwrap();
        assert_eq!(handoff_source(dir.path(), &vars).read().unwrap().version, "21");
    }

    #[test]
    fn helper_names_drop_blanks() {
        let handoff = Handoff {
            version: "17".to_string(),
            helpers: " a, ,b,,c ".to_string(),
        };

        assert_eq!(handoff.helper_names(), vec!["a", "b", "c"]);
    }
}
