//! Command line interface.

use std::path::PathBuf;

use clap::Parser;

/// cedit: a small terminal editor that builds and runs C++ files.
///
/// Examples:
///   cedit                       # Start with no tabs
///   cedit main.cpp util.cpp     # Open each file in a tab
///   cedit --log-level debug     # More detail in cedit.log
#[derive(Parser, Debug, Clone)]
#[command(name = "cedit", version, about = "Terminal C++ editor with build and run")]
pub struct CliArgs {
    /// Files to open; paths that do not exist yet open as empty tabs.
    pub files: Vec<PathBuf>,

    /// Log filter used when RUST_LOG is not set (e.g. `debug`, `cedit=trace`).
    #[arg(long = "log-level", default_value = "info")]
    pub log_level: String,

    /// Do not write a log file.
    #[arg(long = "no-log")]
    pub no_log: bool,
}
