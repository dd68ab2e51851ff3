use std::path::Path;

use libcnb::build::{BuildContext, BuildResult, BuildResultBuilder};
use libcnb::data::build_plan::BuildPlanBuilder;
use libcnb::detect::{DetectContext, DetectResult, DetectResultBuilder};
use libcnb::generic::GenericPlatform;
use libcnb::{Buildpack, Platform, buildpack_main};
use serde::Deserialize;

mod certificates;
mod classes;
mod config;
mod configure;
mod dependency;
mod dispatch;
mod errors;
mod extract;
mod handoff;
mod keystore;
mod layers;
mod layout;
mod properties;
mod security;
mod version;

use crate::classes::JvmClassCounter;
use crate::config::{BuildpackConfig, HELPER_PLAN_ENTRY, Participation, build_env};
use crate::dependency::RuntimeDependency;
use crate::dispatch::{RuntimeSource, dispatch, helper_binary, select_runtime};
use crate::errors::UbiJavaBuildpackError;
use crate::handoff::handoff_source;
use crate::layers::{config_only_jre::ConfigOnlyJreLayer, contribute, jre::JreLayer};

// the extension writes its marker files at the root of the build image
const MARKER_ROOT: &str = "/";

pub(crate) struct UbiJavaBuildpack;

#[derive(Deserialize, Debug, Clone, Default)]
pub(crate) struct UbiJavaBuildpackMetadata {
    #[serde(default)]
    dependencies: Vec<RuntimeDependency>,
}

impl Buildpack for UbiJavaBuildpack {
    type Platform = GenericPlatform;
    type Metadata = UbiJavaBuildpackMetadata;
    type Error = UbiJavaBuildpackError;

    fn detect(&self, _context: DetectContext<Self>) -> libcnb::Result<DetectResult, Self::Error> {
        DetectResultBuilder::pass()
            .build_plan(
                BuildPlanBuilder::new()
                    .provides(HELPER_PLAN_ENTRY)
                    .or()
                    .requires(HELPER_PLAN_ENTRY)
                    .build(),
            )
            .build()
    }

    fn build(&self, context: BuildContext<Self>) -> libcnb::Result<BuildResult, Self::Error> {
        println!("---> UBI Java Buildpack");

        let env = build_env(context.platform.env());
        let config = BuildpackConfig::from_env(&env);
        let buildpack_version = context.buildpack_descriptor.buildpack.version.to_string();

        let handoff = handoff_source(Path::new(MARKER_ROOT), &env).read()?;
        for unit in dispatch(&handoff, &helper_binary(), &buildpack_version) {
            unit.contribute(&context)?;
        }

        let certificate_loader = config.certificate_loader();
        let class_counter = JvmClassCounter;

        match select_runtime(
            &handoff,
            &config,
            &context.buildpack_descriptor.metadata.dependencies,
            &context.buildpack_dir,
        )? {
            RuntimeSource::PreExtracted { java_home, version } => {
                contribute(
                    &context,
                    &ConfigOnlyJreLayer {
                        java_home,
                        version,
                        application_path: context.app_dir.clone(),
                        distribution: config.jvm_type,
                        certificate_loader: &certificate_loader,
                        class_counter: &class_counter,
                    },
                )?;
            }
            RuntimeSource::Archive {
                dependency,
                artifact,
            } => {
                let participation = Participation::from_plan(
                    &context.buildpack_plan.entries,
                    dependency.distribution_type(),
                );
                contribute(
                    &context,
                    &JreLayer {
                        dependency,
                        artifact,
                        application_path: context.app_dir.clone(),
                        build: participation.build,
                        launch: participation.launch,
                        certificate_loader: &certificate_loader,
                        class_counter: &class_counter,
                    },
                )?;
            }
            RuntimeSource::None => {}
        }

        BuildResultBuilder::new().build()
    }
}

buildpack_main!(UbiJavaBuildpack);
