use std::path::{Path, PathBuf};

use crate::{
    config::BuildpackConfig,
    dependency::{RuntimeDependency, select},
    errors::UbiJavaBuildpackError,
    handoff::Handoff,
    layers::{
        LayerStore, contribute, helpers::HelpersLayer,
        security_properties::SecurityPropertiesLayer,
    },
};

/// A layer contributed on behalf of the UBI Java extension.
#[derive(Debug, Clone)]
pub(crate) enum Unit {
    Helpers(HelpersLayer),
    SecurityProperties(SecurityPropertiesLayer),
}

impl Unit {
    pub(crate) fn contribute<S: LayerStore>(
        &self,
        store: &S,
    ) -> libcnb::Result<(), UbiJavaBuildpackError> {
        match self {
            Unit::Helpers(layer) => contribute(store, layer).map(drop),
            Unit::SecurityProperties(layer) => contribute(store, layer).map(drop),
        }
    }
}

/// The exec.d helper binary, packaged by libcnb-cargo alongside the buildpack.
pub(crate) fn helper_binary() -> PathBuf {
    libcnb::additional_buildpack_binary_path!("helper")
}

/// Units to contribute for the hand-off. Without one, this buildpack has
/// nothing to add on the extension's behalf.
pub(crate) fn dispatch(
    handoff: &Handoff,
    helper_binary: &Path,
    buildpack_version: &str,
) -> Vec<Unit> {
    if handoff.is_absent() {
        println!("---> No UBI Java extension configuration detected");
        return Vec::new();
    }

    println!("---> UBI Java extension provided Java {}", handoff.version);
    vec![
        Unit::Helpers(HelpersLayer {
            helpers: handoff.helper_names(),
            helper_binary: helper_binary.to_path_buf(),
            buildpack_version: buildpack_version.to_string(),
        }),
        Unit::SecurityProperties(SecurityPropertiesLayer {
            buildpack_version: buildpack_version.to_string(),
        }),
    ]
}

/// Where the runtime layer's Java comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RuntimeSource {
    /// Installed by the extension, only needs configuring.
    PreExtracted { java_home: PathBuf, version: String },
    /// Expanded from a declared dependency's archive.
    Archive {
        dependency: RuntimeDependency,
        artifact: PathBuf,
    },
    None,
}

pub(crate) fn select_runtime(
    handoff: &Handoff,
    config: &BuildpackConfig,
    dependencies: &[RuntimeDependency],
    buildpack_dir: &Path,
) -> Result<RuntimeSource, UbiJavaBuildpackError> {
    if !handoff.is_absent() {
        return Ok(match &config.java_home {
            Some(java_home) => RuntimeSource::PreExtracted {
                java_home: java_home.clone(),
                version: handoff.version.clone(),
            },
            None => {
                println!("---> JAVA_HOME is not set, skipping runtime configuration");
                RuntimeSource::None
            }
        });
    }

    match select(dependencies, config.jvm_type, config.jvm_version.as_deref())? {
        Some(dependency) => Ok(RuntimeSource::Archive {
            artifact: dependency.artifact(buildpack_dir)?,
            dependency: dependency.clone(),
        }),
        None => {
            println!("---> No {} dependency declared, skipping runtime", config.jvm_type.dependency_id());
            Ok(RuntimeSource::None)
        }
    }
}
