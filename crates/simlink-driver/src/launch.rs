//! Process entry point for simulation backends.

use std::fs::File;
use std::io::{Read, Write};

use simlink_frame::{ExecutionScript, Link};
use tracing::info;

use crate::config::{DriverConfig, LaunchOptions};
use crate::driver::{report, Driver};
use crate::engine::Engine;
use crate::error::{DriverError, Result};

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Take over the standard streams and serve the host until `D`.
///
/// Returns the process exit status: zero after a clean `D`, nonzero after
/// any error (which has already been reported to the host when possible).
#[cfg(unix)]
pub fn launch<E: Engine>(engine: E, options: LaunchOptions) -> i32 {
    let config = DriverConfig::from_env();
    let mut streams = match simlink_transport::StdioStreams::capture() {
        Ok(streams) => streams,
        Err(err) => {
            tracing::error!(error = %err, "could not capture standard streams");
            return EXIT_FAILURE;
        }
    };
    if let Err(err) = streams.redirect_to_log(&config.log_path) {
        let (commands, messages) = streams.into_parts();
        report(&mut Link::new(commands, messages), &DriverError::from(err));
        return EXIT_FAILURE;
    }
    let (commands, messages) = streams.into_parts();
    serve(engine, commands, messages, &config, options)
}

/// Serve the protocol over already-separated streams.
pub fn serve<E, R, W>(
    engine: E,
    commands: R,
    messages: W,
    config: &DriverConfig,
    options: LaunchOptions,
) -> i32
where
    E: Engine,
    R: Read,
    W: Write,
{
    let script = match open_script(config) {
        Ok(script) => script,
        Err(err) => {
            report(&mut Link::new(commands, messages), &err);
            return EXIT_FAILURE;
        }
    };
    let mut link = match script {
        Some(script) => Link::with_script(commands, messages, script),
        None => Link::new(commands, messages),
    };

    if options.require_aslr_disabled && simlink_transport::aslr_disabled() == Some(false) {
        report(&mut link, &DriverError::AslrEnabled);
        return EXIT_FAILURE;
    }

    match Driver::new(engine, link, config).run() {
        Ok(()) => EXIT_SUCCESS,
        Err(_) => EXIT_FAILURE,
    }
}

fn open_script(config: &DriverConfig) -> Result<Option<ExecutionScript<File>>> {
    let Some(path) = config.script_path.as_ref() else {
        return Ok(None);
    };
    let limit = config.parsed_script_limit()?;
    let file = File::create(path).map_err(|source| DriverError::ScriptOpen {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), ?limit, "recording execution script");
    Ok(Some(ExecutionScript::new(file, limit)))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::path::PathBuf;

    use super::*;
    use crate::mock::MockEngine;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("simlink-launch-{tag}-{}", std::process::id()))
    }

    fn serve_text(config: &DriverConfig, commands: &str) -> (i32, String) {
        let mut messages = Vec::new();
        let status = serve(
            MockEngine::default().with_settable(1, 8),
            Cursor::new(commands.as_bytes().to_vec()),
            &mut messages,
            config,
            LaunchOptions::default(),
        );
        (status, String::from_utf8(messages).unwrap())
    }

    #[test]
    fn clean_session_exits_zero() {
        let (status, messages) = serve_text(&DriverConfig::default(), "S 1 FF\nD\n");
        assert_eq!(status, EXIT_SUCCESS);
        assert_eq!(messages, "r ready\nk ack\n");
    }

    #[test]
    fn failed_session_exits_nonzero() {
        let (status, messages) = serve_text(&DriverConfig::default(), "S 1 1FF\nD\n");
        assert_eq!(status, EXIT_FAILURE);
        assert!(messages.starts_with("r ready\ne "));
    }

    #[test]
    fn bad_script_limit_is_reported_instead_of_ready() {
        let config = DriverConfig {
            script_path: Some(temp_path("bad-limit")),
            script_limit: Some("abc".to_string()),
            ..DriverConfig::default()
        };
        let (status, messages) = serve_text(&config, "D\n");
        assert_eq!(status, EXIT_FAILURE);
        assert_eq!(messages, "e Invalid execution script limit 'abc'.\n");
    }

    #[test]
    fn limit_without_script_is_ignored() {
        let config = DriverConfig {
            script_limit: Some("abc".to_string()),
            ..DriverConfig::default()
        };
        let (status, _) = serve_text(&config, "D\n");
        assert_eq!(status, EXIT_SUCCESS);
    }

    #[test]
    fn script_is_written_with_limit() {
        let path = temp_path("script");
        let config = DriverConfig {
            script_path: Some(path.clone()),
            script_limit: Some("1".to_string()),
            ..DriverConfig::default()
        };
        let (status, _) = serve_text(&config, "S 1 1\nS 1 2\nD\n");
        assert_eq!(status, EXIT_SUCCESS);

        let script = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            script,
            "0< r ready\n1> S 1 1\n\
             # Execution script limited to 1 commands (not counting implicit 'Done').\n\
             2> D\n"
        );
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unwritable_script_is_reported() {
        let config = DriverConfig {
            script_path: Some(PathBuf::from("/nonexistent-dir/simlink/script.txt")),
            ..DriverConfig::default()
        };
        let (status, messages) = serve_text(&config, "D\n");
        assert_eq!(status, EXIT_FAILURE);
        assert!(messages.starts_with("e failed to open execution script"));
    }
}
