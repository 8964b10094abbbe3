//! Zephyr build generator
//!
//! Builds a Zephyr RTOS application with `west build`. Sources are expected
//! under `<build_dir>/zephyr`.
//!
//! ```yaml
//! builder:
//!   type: zephyr
//!   board: qemu_x86
//!   target: samples/hello_world
//!   target_images:
//!     - build/zephyr/zephyr.elf
//! ```

use std::collections::BTreeMap;

use super::{artifact_path, builder_rule, Builder, BuilderContext, BuilderKind, CaptureState};
use crate::core::state::BuilderState;
use crate::error::ConfigError;
use crate::infra::ninja::{Edge, NinjaWriter};

/// Kind name used in `builder.type`
pub const NAME: &str = "zephyr";

/// Shared rule name
pub const RULE: &str = "zephyr_build";

/// Registry entry
pub const KIND: BuilderKind = BuilderKind {
    name: NAME,
    factory: get_builder,
    gen_build_rules,
};

/// Return configured Zephyr builder
pub fn get_builder(ctx: &BuilderContext<'_>) -> Result<Box<dyn Builder>, ConfigError> {
    Ok(Box::new(ZephyrBuilder::new(ctx)?))
}

/// Emit the shared Zephyr rule
pub fn gen_build_rules(writer: &mut NinjaWriter) {
    let rule = builder_rule(
        &["cd $build_dir/zephyr", "west build -p auto -b $board $target"],
        "Invoke Zephyr build system",
    );
    writer.rule(RULE, &rule);
    writer.newline();
}

/// Zephyr application target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZephyrBuilder {
    name: String,
    build_dir: String,
    inputs: Vec<String>,
    board: String,
    target: String,
    target_images: Vec<String>,
}

impl ZephyrBuilder {
    /// Extract the Zephyr parameters of one target
    pub fn new(ctx: &BuilderContext<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            name: ctx.name.to_string(),
            build_dir: ctx.build_dir.to_string(),
            inputs: ctx.inputs.clone(),
            board: ctx.conf.get("board")?.as_str()?,
            target: ctx.conf.get("target")?.as_str()?,
            target_images: ctx.conf.get("target_images")?.as_non_empty_str_list()?,
        })
    }
}

impl Builder for ZephyrBuilder {
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
            .with_variable("board", &self.board)
            .with_variable("target", &self.target);
        writer.build(edge);
        writer.newline();
        targets
    }

    fn state_capture(&self) -> Option<&dyn CaptureState> {
        Some(self)
    }
}

impl CaptureState for ZephyrBuilder {
    fn capture_state(&self) -> BuilderState {
        let params = BTreeMap::from([
            ("board".to_string(), self.board.clone()),
            ("target".to_string(), self.target.clone()),
            ("target_images".to_string(), self.target_images.join(" ")),
        ]);
        BuilderState::new(NAME, &self.build_dir, params, self.inputs.clone())
    }
}
