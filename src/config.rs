use std::path::PathBuf;

use libcnb::{Env, data::buildpack_plan::Entry};

use crate::{
    certificates::{DEFAULT_CERTIFICATE_FILE, PemCertificateLoader},
    layout::DistributionType,
};

pub(crate) const HELPER_PLAN_ENTRY: &str = "ubi-java-helper";

/// Buildpack settings drawn from the build environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BuildpackConfig {
    /// `BP_JVM_TYPE`
    pub(crate) jvm_type: DistributionType,
    /// `BP_JVM_VERSION`
    pub(crate) jvm_version: Option<String>,
    /// `JAVA_HOME` of a runtime the extension installed
    pub(crate) java_home: Option<PathBuf>,
    /// `SSL_CERT_FILE`, `None` when it is set to an empty value
    pub(crate) cert_file: Option<PathBuf>,
    pub(crate) cert_dirs: Vec<PathBuf>,
}

impl BuildpackConfig {
    pub(crate) fn from_env(env: &Env) -> Self {
        let var = |name: &str| {
            env.get(name)
                .map(|value| value.to_string_lossy().trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let jvm_type = match var("BP_JVM_TYPE") {
            None => DistributionType::Jre,
            Some(value) => DistributionType::from_config(&value).unwrap_or_else(|| {
                println!("---> Warning: Unknown BP_JVM_TYPE '{value}', using JRE");
                DistributionType::Jre
            }),
        };

        BuildpackConfig {
            jvm_type,
            jvm_version: var("BP_JVM_VERSION"),
            java_home: var("JAVA_HOME").map(PathBuf::from),
            cert_file: match env.get("SSL_CERT_FILE") {
                None => Some(PathBuf::from(DEFAULT_CERTIFICATE_FILE)),
                Some(_) => var("SSL_CERT_FILE").map(PathBuf::from),
            },
            cert_dirs: var("SSL_CERT_DIR")
                .map(|dirs| {
                    dirs.split(':')
                        .filter(|dir| !dir.is_empty())
                        .map(PathBuf::from)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    pub(crate) fn certificate_loader(&self) -> PemCertificateLoader {
        PemCertificateLoader::new(self.cert_file.clone(), self.cert_dirs.clone())
    }
}

/// The process environment with the platform's user-provided variables applied on top.
pub(crate) fn build_env(platform_env: &Env) -> Env {
    let mut env = Env::from_current();
    for (key, value) in platform_env {
        env.insert(key, value);
    }
    env
}

/// Whether the runtime layer is visible at build and launch time, as requested
/// by the `ubi-java-helper` plan entry's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Participation {
    pub(crate) build: bool,
    pub(crate) launch: bool,
}

impl Participation {
    pub(crate) fn from_plan(entries: &[Entry], distribution: DistributionType) -> Self {
        let mut participation = Participation {
            build: distribution == DistributionType::Jdk,
            launch: true,
        };

        for entry in entries.iter().filter(|entry| entry.name == HELPER_PLAN_ENTRY) {
            if let Some(build) = entry.metadata.get("build").and_then(|value| value.as_bool()) {
                participation.build = build;
            }
            if let Some(launch) = entry.metadata.get("launch").and_then(|value| value.as_bool()) {
                participation.launch = launch;
            }
        }

        participation
    }
}
