use std::fs;

use libcnb::{
    data::layer::LayerName,
    data::layer_name,
    layer_env::{LayerEnv, Scope},
};

use crate::{
    configure::{append, default},
    errors::UbiJavaBuildpackError,
    layers::{ContributedLayer, ContributionMetadata, Contributor},
};

const PROPERTIES_FILE: &str = "java-security.properties";

/// An initially empty `java.security` override file that helpers append to at launch.
#[derive(Debug, Clone)]
pub(crate) struct SecurityPropertiesLayer {
    pub(crate) buildpack_version: String,
}

impl Contributor for SecurityPropertiesLayer {
    fn name(&self) -> LayerName {
        layer_name!("java-security-properties")
    }

    fn expected_metadata(&self) -> Result<ContributionMetadata, UbiJavaBuildpackError> {
        Ok(ContributionMetadata::new(false, true).with("buildpack-version", &self.buildpack_version))
    }

    fn populate<L: ContributedLayer>(
        &self,
        layer: &L,
    ) -> libcnb::Result<(), UbiJavaBuildpackError> {
        let file = layer.path().join(PROPERTIES_FILE);
        fs::write(&file, "").map_err(UbiJavaBuildpackError::Io)?;

        let mut env = LayerEnv::new();
        append(
            &mut env,
            Scope::Launch,
            "JAVA_TOOL_OPTIONS",
            " ",
            &format!("-Djava.security.properties={}", file.display()),
        );
        default(&mut env, Scope::Launch, "JAVA_SECURITY_PROPERTIES", &file);
        layer.write_env(&env)?;

        Ok(())
    }
}
