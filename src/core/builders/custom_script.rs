//! Custom script build generator
//!
//! Runs an arbitrary script inside the target's build directory. Useful for
//! vendor SDK wrappers and glue steps that have no dedicated builder.
//!
//! ```yaml
//! builder:
//!   type: custom_script
//!   script: ./build_sdk.sh
//!   args: [--release, --out, images]
//!   target_images:
//!     - images/firmware.bin
//! ```

use super::{artifact_path, builder_rule, Builder, BuilderContext, BuilderKind};
use crate::error::ConfigError;
use crate::infra::ninja::{Edge, NinjaWriter};

/// Kind name used in `builder.type`
pub const NAME: &str = "custom_script";

/// Shared rule name
pub const RULE: &str = "custom_script";

/// Registry entry
pub const KIND: BuilderKind = BuilderKind {
    name: NAME,
    factory: get_builder,
    gen_build_rules,
};

/// Return configured custom script builder
pub fn get_builder(ctx: &BuilderContext<'_>) -> Result<Box<dyn Builder>, ConfigError> {
    Ok(Box::new(CustomScriptBuilder::new(ctx)?))
}

/// Emit the shared custom script rule
pub fn gen_build_rules(writer: &mut NinjaWriter) {
    let rule = builder_rule(&["cd $build_dir", "$script $args"], "Run custom build script");
    writer.rule(RULE, &rule);
    writer.newline();
}

/// Script-driven target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomScriptBuilder {
    name: String,
    build_dir: String,
    inputs: Vec<String>,
    script: String,
    args: Vec<String>,
    target_images: Vec<String>,
}

impl CustomScriptBuilder {
    /// Extract the script parameters of one target
    pub fn new(ctx: &BuilderContext<'_>) -> Result<Self, ConfigError> {
        let args = match ctx.conf.get_opt("args") {
            Some(args) => args.as_str_or_list()?,
            None => Vec::new(),
        };
        Ok(Self {
            name: ctx.name.to_string(),
            build_dir: ctx.build_dir.to_string(),
            inputs: ctx.inputs.clone(),
            script: ctx.conf.get("script")?.as_str()?,
            args,
            target_images: ctx.conf.get("target_images")?.as_non_empty_str_list()?,
        })
    }
}

impl Builder for CustomScriptBuilder {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &'static str {
        NAME
    }

    fn inputs(&self) -> &[String] {
        &self.inputs
    }

    fn get_targets(&self) -> Vec<String> {
        self.target_images
            .iter()
            .map(|image| artifact_path(&self.build_dir, image))
            .collect()
    }

    fn gen_build(&self, writer: &mut NinjaWriter) -> Vec<String> {
        let targets = self.get_targets();
        let edge = Edge::new(targets.clone(), RULE)
            .with_inputs(self.inputs.clone())
            .with_variable("name", &self.name)
            .with_variable("build_dir", &self.build_dir)
            .with_variable("script", &self.script)
            .with_variable("args", self.args.join(" "));
        writer.build(edge);
        writer.newline();
        targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config_value::ConfigValue;
    use serde_yaml::Value;

    fn build(yaml: &str) -> Result<CustomScriptBuilder, ConfigError> {
        let conf: Value = serde_yaml::from_str(yaml).unwrap();
        let ctx = BuilderContext {
            conf: ConfigValue::new(&conf, "sdk", "targets.sdk.builder"),
            name: "sdk",
            build_dir: "out/sdk",
            inputs: vec!["fetch/sdk.stamp".to_string()],
        };
        CustomScriptBuilder::new(&ctx)
    }

    #[test]
    fn test_args_accept_list() {
        let builder = build(
            "script: ./build.sh\nargs: [--release, -j4]\ntarget_images: [fw.bin]\n",
        )
        .unwrap();
        let mut writer = NinjaWriter::new();
        let targets = builder.gen_build(&mut writer);
        assert_eq!(targets, ["out/sdk/fw.bin"]);
        let edge = &writer.edges()[0];
        assert_eq!(edge.variable("args"), Some("--release -j4"));
        assert_eq!(edge.variable("script"), Some("./build.sh"));
        assert_eq!(edge.inputs, ["fetch/sdk.stamp"]);
    }

    #[test]
    fn test_args_accept_string_and_are_optional() {
        let with = build("script: s\nargs: --fast\ntarget_images: [a]\n").unwrap();
        assert_eq!(with.args, ["--fast"]);
        let without = build("script: s\ntarget_images: [a]\n").unwrap();
        assert!(without.args.is_empty());
    }

    #[test]
    fn test_missing_script_fails_fast() {
        let err = build("target_images: [a]\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingKey { ref key, .. } if key == "targets.sdk.builder.script"
        ));
    }

    #[test]
    fn test_empty_target_images_rejected() {
        let err = build("script: s\ntarget_images: []\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidType { ref target, ref key, .. }
                if target == "sdk" && key == "targets.sdk.builder.target_images"
        ));
    }

    #[test]
    fn test_no_state_capture() {
        let builder = build("script: s\ntarget_images: [a]\n").unwrap();
        assert!(builder.state_capture().is_none());
    }

    #[test]
    fn test_rule_runs_script_in_build_dir() {
        let mut writer = NinjaWriter::new();
        gen_build_rules(&mut writer);
        assert!(writer.as_str().contains("&& cd $build_dir && $script $args\""));
        assert_eq!(writer.rules(), ["custom_script"]);
    }
}
