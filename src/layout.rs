use std::path::{Path, PathBuf};

use crate::{errors::UbiJavaBuildpackError, version::is_before_java_9};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DistributionType {
    Jdk,
    Jre,
}

impl DistributionType {
    /// Parses `BP_JVM_TYPE`, which is matched case-insensitively.
    pub(crate) fn from_config(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "JDK" => Some(DistributionType::Jdk),
            "JRE" => Some(DistributionType::Jre),
            _ => None,
        }
    }

    pub(crate) fn dependency_id(self) -> &'static str {
        match self {
            DistributionType::Jdk => "jdk",
            DistributionType::Jre => "jre",
        }
    }
}

/// Directory layout of a Java runtime, which changed with the module system in Java 9.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LayoutEra {
    /// Java 8 and earlier JDK, with the runtime nested under `jre/`.
    Pre9Jdk,
    /// Java 8 and earlier JRE.
    Pre9Jre,
    /// Java 9 and later, with configuration under `conf/`.
    Modular,
}

impl LayoutEra {
    pub(crate) fn of(before_java_9: bool, distribution: DistributionType) -> Self {
        match (before_java_9, distribution) {
            (true, DistributionType::Jdk) => LayoutEra::Pre9Jdk,
            (true, DistributionType::Jre) => LayoutEra::Pre9Jre,
            (false, _) => LayoutEra::Modular,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RuntimeLayout {
    pub(crate) era: LayoutEra,
    pub(crate) cacerts: PathBuf,
    pub(crate) security_properties: PathBuf,
    pub(crate) ext_dir: Option<PathBuf>,
}

impl RuntimeLayout {
    pub(crate) fn resolve(
        java_home: &Path,
        version: &str,
        distribution: DistributionType,
    ) -> Result<Self, UbiJavaBuildpackError> {
        let era = LayoutEra::of(is_before_java_9(version)?, distribution);
        Ok(Self::for_era(java_home, era))
    }

    pub(crate) fn for_era(java_home: &Path, era: LayoutEra) -> Self {
        match era {
            LayoutEra::Pre9Jdk => {
                let lib = java_home.join("jre").join("lib");
                RuntimeLayout {
                    era,
                    cacerts: lib.join("security").join("cacerts"),
                    security_properties: lib.join("security").join("java.security"),
                    ext_dir: Some(lib.join("ext")),
                }
            }
            LayoutEra::Pre9Jre => {
                let lib = java_home.join("lib");
                RuntimeLayout {
                    era,
                    cacerts: lib.join("security").join("cacerts"),
                    security_properties: lib.join("security").join("java.security"),
                    ext_dir: Some(lib.join("ext")),
                }
            }
            LayoutEra::Modular => RuntimeLayout {
                era,
                cacerts: java_home.join("lib").join("security").join("cacerts"),
                security_properties: java_home.join("conf").join("security").join("java.security"),
                ext_dir: None,
            },
        }
    }
}
