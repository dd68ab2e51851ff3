use std::{collections::BTreeMap, path::PathBuf};

use libcnb::{data::layer::LayerName, data::layer_name};

use crate::{
    errors::UbiJavaBuildpackError,
    layers::{ContributedLayer, ContributionMetadata, Contributor, require_file},
};

/// Installs the buildpack's helper binary as one exec.d program per helper name.
/// The binary picks its behaviour from the name it is invoked under.
#[derive(Debug, Clone)]
pub(crate) struct HelpersLayer {
    pub(crate) helpers: Vec<String>,
    pub(crate) helper_binary: PathBuf,
    pub(crate) buildpack_version: String,
}

impl Contributor for HelpersLayer {
    fn name(&self) -> LayerName {
        layer_name!("helpers")
    }

    fn expected_metadata(&self) -> Result<ContributionMetadata, UbiJavaBuildpackError> {
        Ok(ContributionMetadata::new(false, true)
            .with("buildpack-version", &self.buildpack_version)
            .with("helpers", self.helpers.join(",")))
    }

    fn populate<L: ContributedLayer>(
        &self,
        layer: &L,
    ) -> libcnb::Result<(), UbiJavaBuildpackError> {
        require_file(&self.helper_binary)?;

        let programs = self
            .helpers
            .iter()
            .map(|helper| {
                println!("---> Adding helper {helper}");
                (helper.clone(), self.helper_binary.clone())
            })
            .collect::<BTreeMap<_, _>>();
        layer.write_exec_d_programs(programs)?;

        Ok(())
    }
}
