// Named run profiles.
//
// A profile picks the log filter for a run. `RUST_LOG`, when set, still wins
// over the profile (the binary only falls back to `log_directive()`).

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Settings {
    /// Generation progress and admissions.
    #[default]
    Default,
    /// Composer internals at debug, everything else at info.
    Test,
    /// Everything, including per-composition cache checks.
    Debug,
    /// Warnings and errors only.
    Quiet,
}

impl Settings {
    /// `tracing_subscriber::EnvFilter` directive for this profile.
    pub fn log_directive(self) -> &'static str {
        match self {
            Settings::Default => "info",
            Settings::Test => "info,ec_composer=debug",
            Settings::Debug => "trace",
            Settings::Quiet => "warn",
        }
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Settings::Default => "default",
            Settings::Test => "test",
            Settings::Debug => "debug",
            Settings::Quiet => "quiet",
        };
        f.write_str(name)
    }
}
