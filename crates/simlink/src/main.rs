mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "simlink", version, about = "Simulation control protocol tools")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sim_subcommand() {
        let cli = Cli::try_parse_from(["simlink", "sim", "--model", "model.json", "--require-no-aslr"])
            .expect("sim args should parse");

        match cli.command {
            Command::Sim(args) => {
                assert_eq!(args.model, std::path::PathBuf::from("model.json"));
                assert!(args.require_no_aslr);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn sim_requires_model() {
        let err = Cli::try_parse_from(["simlink", "sim"]).expect_err("missing model should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_replay_with_global_format() {
        let cli = Cli::try_parse_from(["simlink", "replay", "script.txt", "--format", "raw"])
            .expect("replay args should parse");
        assert!(matches!(cli.command, Command::Replay(_)));
        assert!(matches!(cli.format, Some(OutputFormat::Raw)));
    }

    #[test]
    fn rejects_unknown_log_level() {
        let err = Cli::try_parse_from(["simlink", "--log-level", "loud", "envinfo"])
            .expect_err("bad level should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
