use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod envinfo;
pub mod exec;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run an operation script against an in-process device registry.
    Exec(ExecArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Show the message limits and device admission an `exec` run would use.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Exec(args) => exec::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Script file. Reads stdin when omitted or `-`.
    pub script: Option<PathBuf>,
    /// Continue after a failed operation instead of stopping.
    #[arg(long)]
    pub keep_going: bool,
    /// Reject device ids at or above this limit.
    #[arg(long, value_name = "N", env = "MSGSLOT_DEVICE_LIMIT")]
    pub device_limit: Option<u32>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {
    /// Device id limit to report. Same source as `exec --device-limit`.
    #[arg(long, value_name = "N", env = "MSGSLOT_DEVICE_LIMIT")]
    pub device_limit: Option<u32>,
}
