use std::{ffi::OsStr, fs, os::unix::fs::PermissionsExt, path::PathBuf};

use libcnb::layer_env::{LayerEnv, ModificationBehavior, Scope};

use crate::{
    certificates::{CertificateLoader, DEFAULT_KEYSTORE_PASSWORD},
    classes::ClassCounter,
    errors::UbiJavaBuildpackError,
    layout::{DistributionType, RuntimeLayout},
    security::security_providers,
    version::is_before_java_18,
};

const EXIT_ON_OOM: &str = "-XX:+ExitOnOutOfMemoryError";

#[derive(Debug, Clone)]
pub(crate) struct RuntimeConfiguration {
    pub(crate) java_home: PathBuf,
    pub(crate) version: String,
    pub(crate) application_path: PathBuf,
    pub(crate) build: bool,
    pub(crate) launch: bool,
    pub(crate) distribution: DistributionType,
}

/// Prepares the runtime at `java_home` and records the environment it needs in `env`.
pub(crate) fn configure(
    env: &mut LayerEnv,
    configuration: &RuntimeConfiguration,
    certificate_loader: &dyn CertificateLoader,
    class_counter: &dyn ClassCounter,
) -> Result<(), UbiJavaBuildpackError> {
    let java_home = configuration.java_home.as_path();
    let layout = RuntimeLayout::resolve(
        java_home,
        &configuration.version,
        configuration.distribution,
    )?;

    fs::set_permissions(&layout.cacerts, fs::Permissions::from_mode(0o664)).map_err(
        |source| UbiJavaBuildpackError::KeystorePermissions {
            path: layout.cacerts.clone(),
            source,
        },
    )?;

    if is_before_java_18(&configuration.version)? {
        certificate_loader
            .load(&layout.cacerts, DEFAULT_KEYSTORE_PASSWORD)
            .map_err(|source| UbiJavaBuildpackError::CertificateLoad {
                path: layout.cacerts.clone(),
                source,
            })?;
    } else {
        println!(
            "---> Warning: The JVM cacerts entries cannot be loaded with Java 18+, for more information see: https://github.com/paketo-buildpacks/libjvm/issues/158"
        );
    }

    if configuration.build {
        default(env, Scope::Build, "JAVA_HOME", java_home);
    }

    if configuration.launch {
        default(env, Scope::Launch, "BPI_APPLICATION_PATH", &configuration.application_path);
        default(env, Scope::Launch, "BPI_JVM_CACERTS", &layout.cacerts);

        let classes =
            class_counter
                .count(java_home)
                .map_err(|source| UbiJavaBuildpackError::ClassCount {
                    path: java_home.to_path_buf(),
                    source,
                })?;
        default(env, Scope::Launch, "BPI_JVM_CLASS_COUNT", classes.to_string());

        if let Some(ext_dir) = &layout.ext_dir {
            default(env, Scope::Launch, "BPI_JVM_EXT_DIR", ext_dir);
        }

        let providers = security_providers(&layout.security_properties)?;
        default(env, Scope::Launch, "BPI_JVM_SECURITY_PROVIDERS", providers.join(" "));

        default(env, Scope::Launch, "JAVA_HOME", java_home);
        default(env, Scope::Launch, "MALLOC_ARENA_MAX", "2");

        append(env, Scope::Launch, "JAVA_TOOL_OPTIONS", " ", EXIT_ON_OOM);
    }

    Ok(())
}

/// Sets `name` unless an earlier layer or the user already did.
pub(crate) fn default(env: &mut LayerEnv, scope: Scope, name: &str, value: impl AsRef<OsStr>) {
    env.insert(scope, ModificationBehavior::Default, name, value.as_ref());
}

/// Appends `value` to whatever `name` holds at launch, joined by `delimiter`.
/// Repeating the call replaces the pending append rather than stacking it.
pub(crate) fn append(env: &mut LayerEnv, scope: Scope, name: &str, delimiter: &str, value: &str) {
    env.insert(scope.clone(), ModificationBehavior::Append, name, value);
    env.insert(scope, ModificationBehavior::Delimiter, name, delimiter);
}
