use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use libcnb::{
    build::BuildContext,
    data::layer::LayerName,
    layer::{
        CachedLayerDefinition, InvalidMetadataAction, LayerRef, LayerState, RestoredLayerAction,
    },
    layer_env::LayerEnv,
};
use serde::{Deserialize, Serialize};

use crate::{UbiJavaBuildpack, errors::UbiJavaBuildpackError};

pub(crate) mod config_only_jre;
pub(crate) mod helpers;
pub(crate) mod jre;
pub(crate) mod security_properties;

/// Fingerprint stored with a layer. A restored layer is reused only when its
/// stored value equals the freshly computed one, participation flags included.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct ContributionMetadata {
    pub(crate) build: bool,
    pub(crate) launch: bool,
    #[serde(default)]
    pub(crate) entries: BTreeMap<String, String>,
}

impl ContributionMetadata {
    pub(crate) fn new(build: bool, launch: bool) -> Self {
        Self {
            build,
            launch,
            entries: BTreeMap::new(),
        }
    }

    pub(crate) fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.entries.insert(key.to_string(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LayerStatus {
    Restored,
    Empty,
}

/// A layer directory handed to a contributor.
pub(crate) trait ContributedLayer {
    fn path(&self) -> PathBuf;

    fn write_env(&self, env: &LayerEnv) -> libcnb::Result<(), UbiJavaBuildpackError>;

    fn write_exec_d_programs(
        &self,
        programs: BTreeMap<String, PathBuf>,
    ) -> libcnb::Result<(), UbiJavaBuildpackError>;

    fn write_metadata(
        &self,
        metadata: &ContributionMetadata,
    ) -> libcnb::Result<(), UbiJavaBuildpackError>;
}

/// Where layers live between builds.
pub(crate) trait LayerStore {
    type Layer: ContributedLayer;

    /// Restores the named layer when its metadata equals `expected`, otherwise
    /// hands back an empty layer.
    fn open_layer(
        &self,
        name: LayerName,
        expected: &ContributionMetadata,
    ) -> libcnb::Result<(Self::Layer, LayerStatus), UbiJavaBuildpackError>;
}

pub(crate) trait Contributor {
    fn name(&self) -> LayerName;

    fn expected_metadata(&self) -> Result<ContributionMetadata, UbiJavaBuildpackError>;

    fn populate<L: ContributedLayer>(&self, layer: &L)
    -> libcnb::Result<(), UbiJavaBuildpackError>;
}

/// Reuses the cached layer when nothing changed, otherwise populates a fresh
/// one. Metadata is only written once population succeeded.
pub(crate) fn contribute<S: LayerStore, C: Contributor>(
    store: &S,
    contributor: &C,
) -> libcnb::Result<S::Layer, UbiJavaBuildpackError> {
    let expected = contributor.expected_metadata()?;
    let name = contributor.name();
    let (layer, status) = store.open_layer(name.clone(), &expected)?;

    match status {
        LayerStatus::Restored => {
            println!("---> Reusing cached layer {name}");
        }
        LayerStatus::Empty => {
            println!("---> Contributing {name} layer");
            contributor.populate(&layer)?;
            layer.write_metadata(&expected)?;
        }
    }

    Ok(layer)
}

impl LayerStore for BuildContext<UbiJavaBuildpack> {
    type Layer = LayerRef<UbiJavaBuildpack, (), ()>;

    fn open_layer(
        &self,
        name: LayerName,
        expected: &ContributionMetadata,
    ) -> libcnb::Result<(Self::Layer, LayerStatus), UbiJavaBuildpackError> {
        let layer_ref = self.cached_layer(
            name,
            CachedLayerDefinition {
                build: expected.build,
                launch: expected.launch,
                invalid_metadata_action: &|_| InvalidMetadataAction::DeleteLayer,
                restored_layer_action: &|stored: &ContributionMetadata, _| {
                    if stored == expected {
                        RestoredLayerAction::KeepLayer
                    } else {
                        RestoredLayerAction::DeleteLayer
                    }
                },
            },
        )?;

        let status = match layer_ref.state {
            LayerState::Restored { .. } => LayerStatus::Restored,
            LayerState::Empty { .. } => LayerStatus::Empty,
        };
        Ok((layer_ref, status))
    }
}

impl ContributedLayer for LayerRef<UbiJavaBuildpack, (), ()> {
    fn path(&self) -> PathBuf {
        LayerRef::path(self).to_path_buf()
    }

    fn write_env(&self, env: &LayerEnv) -> libcnb::Result<(), UbiJavaBuildpackError> {
        LayerRef::write_env(self, env)
    }

    fn write_exec_d_programs(
        &self,
        programs: BTreeMap<String, PathBuf>,
    ) -> libcnb::Result<(), UbiJavaBuildpackError> {
        LayerRef::write_exec_d_programs(self, programs)
    }

    fn write_metadata(
        &self,
        metadata: &ContributionMetadata,
    ) -> libcnb::Result<(), UbiJavaBuildpackError> {
        LayerRef::write_metadata(self, metadata)
    }
}

/// Fails with `Io(NotFound)` unless `path` is a regular file.
pub(crate) fn require_file(path: &Path) -> Result<(), UbiJavaBuildpackError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(UbiJavaBuildpackError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use libcnb::data::layer_name;
    use std::{cell::Cell, fs};

    /// Layer store over a plain directory, persisting metadata and env the way
    /// the lifecycle would between builds.
    pub(crate) struct DirLayerStore {
        pub(crate) root: PathBuf,
    }

    pub(crate) struct DirLayer {
        path: PathBuf,
        metadata_path: PathBuf,
    }

    impl DirLayer {
        pub(crate) fn read_env(&self) -> LayerEnv {
            LayerEnv::read_from_layer_dir(&self.path).unwrap()
        }

        pub(crate) fn read_metadata(&self) -> Option<ContributionMetadata> {
            fs::read_to_string(&self.metadata_path)
                .ok()
                .and_then(|content| toml::from_str(&content).ok())
        }
    }

    impl LayerStore for DirLayerStore {
        type Layer = DirLayer;

        fn open_layer(
            &self,
            name: LayerName,
            expected: &ContributionMetadata,
        ) -> libcnb::Result<(DirLayer, LayerStatus), UbiJavaBuildpackError> {
            let layer = DirLayer {
                path: self.root.join(name.to_string()),
                metadata_path: self.root.join(format!("{name}.toml")),
            };

            if layer.path.is_dir() && layer.read_metadata().as_ref() == Some(expected) {
                return Ok((layer, LayerStatus::Restored));
            }

            if layer.path.exists() {
                fs::remove_dir_all(&layer.path).map_err(UbiJavaBuildpackError::Io)?;
            }
            if layer.metadata_path.exists() {
                fs::remove_file(&layer.metadata_path).map_err(UbiJavaBuildpackError::Io)?;
            }
            fs::create_dir_all(&layer.path).map_err(UbiJavaBuildpackError::Io)?;
            Ok((layer, LayerStatus::Empty))
        }
    }

    impl ContributedLayer for DirLayer {
        fn path(&self) -> PathBuf {
            self.path.clone()
        }

        fn write_env(&self, env: &LayerEnv) -> libcnb::Result<(), UbiJavaBuildpackError> {
            env.write_to_layer_dir(&self.path)
                .map_err(UbiJavaBuildpackError::Io)?;
            Ok(())
        }

        fn write_exec_d_programs(
            &self,
            programs: BTreeMap<String, PathBuf>,
        ) -> libcnb::Result<(), UbiJavaBuildpackError> {
            let exec_d = self.path.join("exec.d");
            fs::create_dir_all(&exec_d).map_err(UbiJavaBuildpackError::Io)?;
            for (name, program) in programs {
                fs::copy(&program, exec_d.join(name)).map_err(UbiJavaBuildpackError::Io)?;
            }
            Ok(())
        }

        fn write_metadata(
            &self,
            metadata: &ContributionMetadata,
        ) -> libcnb::Result<(), UbiJavaBuildpackError> {
            let content = toml::to_string(metadata).map_err(|error| {
                UbiJavaBuildpackError::Io(std::io::Error::other(error.to_string()))
            })?;
            fs::write(&self.metadata_path, content).map_err(UbiJavaBuildpackError::Io)?;
            Ok(())
        }
    }

    struct CountingContributor {
        version: String,
        populated: Cell<usize>,
        fail: bool,
    }

    impl CountingContributor {
        fn new(version: &str) -> Self {
            Self {
                version: version.to_string(),
                populated: Cell::new(0),
                fail: false,
            }
        }
    }

    impl Contributor for CountingContributor {
        fn name(&self) -> LayerName {
            layer_name!("jre")
        }

        fn expected_metadata(&self) -> Result<ContributionMetadata, UbiJavaBuildpackError> {
            Ok(ContributionMetadata::new(false, true).with("dependency.version", &self.version))
        }

        fn populate<L: ContributedLayer>(
            &self,
            layer: &L,
        ) -> libcnb::Result<(), UbiJavaBuildpackError> {
            self.populated.set(self.populated.get() + 1);
            fs::write(layer.path().join("release"), &self.version)
                .map_err(UbiJavaBuildpackError::Io)?;
            if self.fail {
                return Err(UbiJavaBuildpackError::Io(std::io::Error::other("boom")).into());
            }
            Ok(())
        }
    }

    #[test]
    fn unchanged_metadata_populates_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirLayerStore {
            root: dir.path().to_path_buf(),
        };
        let contributor = CountingContributor::new("17.0.8");

        let first = contribute(&store, &contributor).unwrap();
        let second = contribute(&store, &contributor).unwrap();

        assert_eq!(contributor.populated.get(), 1);
        assert_eq!(first.path(), second.path());
        assert_eq!(first.read_metadata(), second.read_metadata());
        assert_eq!(
            fs::read_to_string(second.path().join("release")).unwrap(),
            "17.0.8"
        );
    }

    #[test]
    fn changed_version_repopulates() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirLayerStore {
            root: dir.path().to_path_buf(),
        };
        let old = CountingContributor::new("17.0.8");
        let new = CountingContributor::new("17.0.9");

        contribute(&store, &old).unwrap();
        let layer = contribute(&store, &new).unwrap();

        assert_eq!(old.populated.get() + new.populated.get(), 2);
        assert_eq!(
            fs::read_to_string(layer.path().join("release")).unwrap(),
            "17.0.9"
        );
        assert_eq!(
            layer.read_metadata().unwrap().entries["dependency.version"],
            "17.0.9"
        );
    }

    #[test]
    fn failed_population_leaves_no_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirLayerStore {
            root: dir.path().to_path_buf(),
        };
        let mut contributor = CountingContributor::new("17.0.8");
        contributor.fail = true;

        assert!(contribute(&store, &contributor).is_err());
        assert!(!dir.path().join("jre.toml").exists());

        contributor.fail = false;
        contribute(&store, &contributor).unwrap();
        assert_eq!(contributor.populated.get(), 2);
    }

    #[test]
    fn participation_flags_are_part_of_the_fingerprint() {
        let launch = ContributionMetadata::new(false, true).with("dependency.version", "17");
        let build_and_launch = ContributionMetadata::new(true, true).with("dependency.version", "17");

        assert_ne!(launch, build_and_launch);
    }
}
