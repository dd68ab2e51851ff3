use std::path::PathBuf;

use libcnb::{data::layer::LayerName, data::layer_name, layer_env::LayerEnv};

use crate::{
    certificates::CertificateLoader,
    classes::ClassCounter,
    configure::{RuntimeConfiguration, configure},
    errors::UbiJavaBuildpackError,
    layers::{ContributedLayer, ContributionMetadata, Contributor},
    layout::DistributionType,
};

// the runtime itself ships in the run image; this layer only carries its launch configuration
const BUILD: bool = false;
const LAUNCH: bool = true;

/// Launch configuration for a runtime the UBI extension already installed.
pub(crate) struct ConfigOnlyJreLayer<'a> {
    pub(crate) java_home: PathBuf,
    pub(crate) version: String,
    pub(crate) application_path: PathBuf,
    pub(crate) distribution: DistributionType,
    pub(crate) certificate_loader: &'a dyn CertificateLoader,
    pub(crate) class_counter: &'a dyn ClassCounter,
}

impl Contributor for ConfigOnlyJreLayer<'_> {
    fn name(&self) -> LayerName {
        layer_name!("jre")
    }

    fn expected_metadata(&self) -> Result<ContributionMetadata, UbiJavaBuildpackError> {
        let mut metadata = ContributionMetadata::new(BUILD, LAUNCH)
            .with("java-home", self.java_home.to_string_lossy())
            .with("java-version", &self.version)
            .with("distribution", self.distribution.dependency_id());

        let certificates = self
            .certificate_loader
            .metadata()
            .map_err(UbiJavaBuildpackError::LayerMetadata)?;
        metadata.entries.extend(certificates);

        Ok(metadata)
    }

    fn populate<L: ContributedLayer>(
        &self,
        layer: &L,
    ) -> libcnb::Result<(), UbiJavaBuildpackError> {
        println!(
            "---> Configuring Java {} at {}",
            self.version,
            self.java_home.display()
        );

        let mut env = LayerEnv::new();
        configure(
            &mut env,
            &RuntimeConfiguration {
                java_home: self.java_home.clone(),
                version: self.version.clone(),
                application_path: self.application_path.clone(),
                build: BUILD,
                launch: LAUNCH,
                distribution: self.distribution,
            },
            self.certificate_loader,
            self.class_counter,
        )?;
        layer.write_env(&env)?;

        Ok(())
    }
}
