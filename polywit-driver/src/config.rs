// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Default settings read from `polywit.toml`.
//!
//! The file holds a single `[polywit]` table:
//!
//! ```toml
//! [polywit]
//! language = "java"
//! show-assumptions = true
//! keep-temps = false
//! harness = "target/debug/replay"
//! harness-args = ["--quiet"]
//! ```
//!
//! Every value is a default: the matching command line option wins when it is given.

use anyhow::{Context, Result};
use polywit_metadata::SourceLanguage;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the configuration file looked up in the benchmark directory.
pub const CONFIG_FILE_NAME: &str = "polywit.toml";

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PolywitConfig {
    pub language: Option<SourceLanguage>,
    pub show_assumptions: Option<bool>,
    pub keep_temps: Option<bool>,
    /// Relative paths with a directory part are resolved against the directory of the
    /// configuration file. Bare names are looked up in `PATH`.
    pub harness: Option<PathBuf>,
    pub harness_args: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    polywit: PolywitConfig,
}

impl PolywitConfig {
    /// Load the configuration given by `--config`, or `polywit.toml` in the benchmark directory
    /// if there is one.
    pub fn load(explicit: Option<&Path>, benchmark: &Path) -> Result<PolywitConfig> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = benchmark.join(CONFIG_FILE_NAME);
                if !path.is_file() {
                    return Ok(PolywitConfig::default());
                }
                path
            }
        };
        debug!(?path, "load_config");
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration `{}`", path.display()))?;
        let mut config = PolywitConfig::parse(&content)
            .with_context(|| format!("Invalid configuration `{}`", path.display()))?;
        if let (Some(harness), Some(base)) = (&config.harness, path.parent()) {
            if harness.is_relative() && harness.components().count() > 1 {
                config.harness = Some(base.join(harness));
            }
        }
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<PolywitConfig> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.polywit)
    }
}

/// A flag is on if the command line sets it, otherwise the configuration decides.
pub fn flag(cli: bool, config: Option<bool>) -> bool {
    cli || config.unwrap_or(false)
}
