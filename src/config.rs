use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Engine configuration: initial dimensions, scrollback capacity, and the
/// launch options new sessions start from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub cols: u16,
    pub rows: u16,
    pub scrollback_lines: usize,
    pub launch: LaunchOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            scrollback_lines: 2_500,
            launch: LaunchOptions::default(),
        }
    }
}

/// How to start a child process: command, arguments, working directory,
/// and extra environment variables. An empty command falls back to the
/// user's shell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchOptions {
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl LaunchOptions {
    /// Merge with a fallback: unset fields take the fallback's value and
    /// fallback env entries fill in around this set's.
    pub fn merged_with(mut self, fallback: &LaunchOptions) -> LaunchOptions {
        if self.command.is_none() {
            self.command = fallback.command.clone();
            if self.args.is_empty() {
                self.args = fallback.args.clone();
            }
        }
        if self.cwd.is_none() {
            self.cwd = fallback.cwd.clone();
        }
        for (key, value) in &fallback.env {
            self.env.entry(key.clone()).or_insert_with(|| value.clone());
        }
        self
    }
}
