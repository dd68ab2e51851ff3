use std::path::PathBuf;

use libcnb::{data::layer::LayerName, data::layer_name, layer_env::LayerEnv};

use crate::{
    certificates::CertificateLoader,
    classes::ClassCounter,
    configure::{RuntimeConfiguration, configure},
    dependency::RuntimeDependency,
    errors::UbiJavaBuildpackError,
    extract::extract,
    layers::{ContributedLayer, ContributionMetadata, Contributor},
    layout::DistributionType,
};

/// A JRE or JDK layer expanded from a runtime archive.
pub(crate) struct JreLayer<'a> {
    pub(crate) dependency: RuntimeDependency,
    pub(crate) artifact: PathBuf,
    pub(crate) application_path: PathBuf,
    pub(crate) build: bool,
    pub(crate) launch: bool,
    pub(crate) certificate_loader: &'a dyn CertificateLoader,
    pub(crate) class_counter: &'a dyn ClassCounter,
}

impl Contributor for JreLayer<'_> {
    fn name(&self) -> LayerName {
        match self.dependency.distribution_type() {
            DistributionType::Jdk => layer_name!("jdk"),
            DistributionType::Jre => layer_name!("jre"),
        }
    }

    fn expected_metadata(&self) -> Result<ContributionMetadata, UbiJavaBuildpackError> {
        let mut metadata = ContributionMetadata::new(self.build, self.launch)
            .with("dependency.id", &self.dependency.id)
            .with("dependency.version", &self.dependency.version)
            .with("dependency.uri", &self.dependency.uri)
            .with("dependency.sha256", &self.dependency.sha256);

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
        let java_home = layer.path();
        println!(
            "---> Expanding {} {} to {}",
            self.dependency.name,
            self.dependency.version,
            java_home.display()
        );
        extract(&self.artifact, &java_home, 1)?;

        let mut env = LayerEnv::new();
        configure(
            &mut env,
            &RuntimeConfiguration {
                java_home,
                version: self.dependency.version.clone(),
                application_path: self.application_path.clone(),
                build: self.build,
                launch: self.launch,
                distribution: self.dependency.distribution_type(),
            },
            self.certificate_loader,
            self.class_counter,
        )?;
        layer.write_env(&env)?;

        Ok(())
    }
}
