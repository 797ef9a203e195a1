use simlink::frame::parse_script;

use crate::cmd::ReplayArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_entries, OutputFormat};

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let context = format!("reading {}", args.script.display());
    let data = std::fs::read(&args.script).map_err(|err| io_error(&context, err))?;
    let entries = parse_script(&data).map_err(|err| frame_error(&context, err))?;
    print_entries(&entries, format);
    Ok(SUCCESS)
}
