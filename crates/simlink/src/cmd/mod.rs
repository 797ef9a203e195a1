use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod envinfo;
pub mod ports;
pub mod replay;
pub mod sim;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the control protocol on stdin/stdout with a register model.
    Sim(SimArgs),
    /// List the events of an execution script.
    Replay(ReplayArgs),
    /// Show the ports of a register model.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Sim(args) => sim::run(args),
        Command::Replay(args) => replay::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
        Command::Envinfo(args) => envinfo::run(args, format),
    }
}

#[derive(Args, Debug)]
pub struct SimArgs {
    /// Register model definition (JSON).
    #[arg(long, value_name = "FILE")]
    pub model: PathBuf,
    /// Refuse to start if address-space randomization is enabled.
    #[arg(long)]
    pub require_no_aslr: bool,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Execution script to read.
    pub script: PathBuf,
}

#[derive(Args, Debug)]
pub struct PortsArgs {
    /// Register model definition (JSON).
    #[arg(long, value_name = "FILE")]
    pub model: PathBuf,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}
