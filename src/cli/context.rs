use std::path::{Path, PathBuf};

use gp_moderation_policy::{ModerationCenter, ModerationEvaluator, SharedModerationCenter};

use super::output::OutputFormat;

pub struct CliContext {
    center: SharedModerationCenter,
    config_path: PathBuf,
    config_found: bool,
    output: OutputFormat,
}

impl CliContext {
    pub fn new(
        center: SharedModerationCenter,
        config_path: PathBuf,
        config_found: bool,
        output: OutputFormat,
    ) -> Self {
        Self {
            center,
            config_path,
            config_found,
            output,
        }
    }

    pub fn center(&self) -> &SharedModerationCenter {
        &self.center
    }

    pub fn evaluator(&self) -> ModerationEvaluator {
        self.center.evaluator()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn config_found(&self) -> bool {
        self.config_found
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }
}
