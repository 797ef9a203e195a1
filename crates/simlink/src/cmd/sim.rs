use simlink::model::RegisterModel;
use tracing::info;

use crate::cmd::SimArgs;
use crate::exit::{model_error, CliResult};

/// Load the model, then hand the process over to the driver.
///
/// Model errors are reported on stderr with a CLI exit code, before the
/// standard streams are touched. Once the driver runs, errors go to the host
/// as `e` messages and the exit code is the driver's.
pub fn run(args: SimArgs) -> CliResult<i32> {
    let model = RegisterModel::load(&args.model)
        .map_err(|err| model_error(&format!("loading {}", args.model.display()), err))?;
    info!(
        model = model.name(),
        ports = model.ports().count(),
        "starting simulation"
    );
    serve(model, args.require_no_aslr)
}

#[cfg(unix)]
fn serve(model: RegisterModel, require_no_aslr: bool) -> CliResult<i32> {
    let options = simlink::driver::LaunchOptions {
        require_aslr_disabled: require_no_aslr,
    };
    Ok(simlink::driver::launch(model, options))
}

#[cfg(not(unix))]
fn serve(_model: RegisterModel, _require_no_aslr: bool) -> CliResult<i32> {
    Err(crate::exit::CliError::new(
        crate::exit::USAGE,
        "sim requires a unix host",
    ))
}
