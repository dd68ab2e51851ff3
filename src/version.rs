use std::{fmt, str::FromStr};

use crate::errors::UbiJavaBuildpackError;

/// A Java runtime version such as `17.0.2`, `11.0.20+8` or `1.8.0_382`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct JavaVersion(semver::Version);

impl JavaVersion {
    /// The feature release: `8` for both `1.8.0_382` and `8.0.382`.
    pub(crate) fn feature(&self) -> u64 {
        if self.0.major == 1 {
            self.0.minor
        } else {
            self.0.major
        }
    }
}

impl FromStr for JavaVersion {
    type Err = UbiJavaBuildpackError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || UbiJavaBuildpackError::MalformedVersion(value.to_string());

        let trimmed = value.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        // `1.8.0_382` carries the update number after an underscore
        let normalized = trimmed.replacen('_', "+", 1);

        let split = normalized.find(&['-', '+'][..]).unwrap_or(normalized.len());
        let (core, suffix) = normalized.split_at(split);

        let mut components = core.split('.').collect::<Vec<_>>();
        if components.is_empty() || components.len() > 4 {
            return Err(malformed());
        }
        // a fourth component (`11.0.20.1`) is a vendor patch level
        components.truncate(3);
        while components.len() < 3 {
            components.push("0");
        }

        semver::Version::parse(&format!("{}{suffix}", components.join(".")))
            .map(JavaVersion)
            .map_err(|_| malformed())
    }
}

impl fmt::Display for JavaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub(crate) fn is_before_java_9(version: &str) -> Result<bool, UbiJavaBuildpackError> {
    Ok(version.parse::<JavaVersion>()?.feature() < 9)
}

pub(crate) fn is_before_java_18(version: &str) -> Result<bool, UbiJavaBuildpackError> {
    Ok(version.parse::<JavaVersion>()?.feature() < 18)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_release_of_common_version_shapes() {
        for (version, feature) in [
            ("17", 17),
            ("17.0.2", 17),
            ("11.0.20+8", 11),
            ("1.8.0_382", 8),
            ("8.0.382", 8),
            ("21.0.1-ea", 21),
            ("11.0.20.1", 11),
        ] {
            let parsed = version.parse::<JavaVersion>().unwrap();
            assert_eq!(parsed.feature(), feature, "{version}");
        }
    }

    #[test]
    fn java_9_threshold() {
        assert!(is_before_java_9("1.8.0_382").unwrap());
        assert!(is_before_java_9("8.0.382").unwrap());
        assert!(!is_before_java_9("9.0.4").unwrap());
        assert!(!is_before_java_9("11.0.20").unwrap());
    }

    #[test]
    fn java_18_threshold() {
        assert!(is_before_java_18("17.0.9").unwrap());
        assert!(!is_before_java_18("18").unwrap());
        assert!(!is_before_java_18("21.0.1").unwrap());
    }

    #[test]
    fn malformed_versions_are_errors() {
        for version in ["", "latest", "17.x", "1.2.3.4.5"] {
            assert!(
                matches!(
                    is_before_java_9(version),
                    Err(UbiJavaBuildpackError::MalformedVersion(_))
                ),
                "{version}"
            );
        }
    }
}
