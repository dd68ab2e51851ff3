use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{errors::UbiJavaBuildpackError, layout::DistributionType, version::JavaVersion};

/// A runtime distribution declared under `[[metadata.dependencies]]` in `buildpack.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RuntimeDependency {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) name: String,
    pub(crate) version: String,
    pub(crate) uri: String,
    pub(crate) sha256: String,
}

impl RuntimeDependency {
    pub(crate) fn distribution_type(&self) -> DistributionType {
        if self.id == DistributionType::Jdk.dependency_id() {
            DistributionType::Jdk
        } else {
            DistributionType::Jre
        }
    }

    /// Locates the already-present artifact: `file://` URIs point at it directly,
    /// anything else must be in the buildpack's offline dependency cache.
    pub(crate) fn artifact(&self, buildpack_dir: &Path) -> Result<PathBuf, UbiJavaBuildpackError> {
        let path = match self.uri.strip_prefix("file://") {
            Some(local) => PathBuf::from(local),
            None => {
                let file_name = self.uri.rsplit('/').next().unwrap_or(&self.uri);
                buildpack_dir
                    .join("dependencies")
                    .join(&self.sha256)
                    .join(file_name)
            }
        };

        if !path.is_file() {
            return Err(UbiJavaBuildpackError::ArtifactUnavailable {
                id: self.id.clone(),
                version: self.version.clone(),
                path,
            });
        }

        let actual = libherokubuildpack::digest::sha256(&path).map_err(UbiJavaBuildpackError::Io)?;
        if !actual.eq_ignore_ascii_case(&self.sha256) {
            return Err(UbiJavaBuildpackError::ChecksumMismatch {
                path,
                expected: self.sha256.clone(),
                actual,
            });
        }

        Ok(path)
    }
}

/// Picks the first declared dependency for the distribution type, restricted to
/// `requested_version`'s feature release when one is configured. No dependency
/// of that type at all is not an error.
pub(crate) fn select<'a>(
    dependencies: &'a [RuntimeDependency],
    distribution: DistributionType,
    requested_version: Option<&str>,
) -> Result<Option<&'a RuntimeDependency>, UbiJavaBuildpackError> {
    let candidates = dependencies
        .iter()
        .filter(|dependency| dependency.id == distribution.dependency_id())
        .collect::<Vec<_>>();

    let Some(requested) = requested_version else {
        return Ok(candidates.first().copied());
    };
    if candidates.is_empty() {
        return Ok(None);
    }

    let requested_feature = requested.parse::<JavaVersion>()?.feature();
    for dependency in candidates {
        if dependency.version.parse::<JavaVersion>()?.feature() == requested_feature {
            return Ok(Some(dependency));
        }
    }

    Err(UbiJavaBuildpackError::NoMatchingDependency {
        id: distribution.dependency_id().to_string(),
        version: requested.to_string(),
    })
}
