use std::collections::BTreeMap;

use serde::Serialize;
use simlink::driver::config::{LOG_ENV, SCRIPT_ENV, SCRIPT_LIMIT_ENV, TRACE_ENV};
use simlink::driver::DriverConfig;

use crate::cmd::EnvinfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct PlatformInfo {
    os: String,
    arch: String,
}

#[derive(Serialize)]
struct ResolvedConfig {
    log_path: String,
    trace_path: String,
    script_path: Option<String>,
    script_limit: Result<Option<u32>, String>,
}

#[derive(Serialize)]
struct EnvInfoOutput {
    version: String,
    target: String,
    git_hash: String,
    platform: PlatformInfo,
    aslr_disabled: Option<bool>,
    features: Vec<String>,
    environment: BTreeMap<String, Option<String>>,
    resolved: ResolvedConfig,
}

pub fn run(_args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let mut env = BTreeMap::new();
    for key in [LOG_ENV, TRACE_ENV, SCRIPT_ENV, SCRIPT_LIMIT_ENV] {
        env.insert(key.to_string(), std::env::var(key).ok());
    }

    let config = DriverConfig::from_env();
    let resolved = ResolvedConfig {
        log_path: config.log_path.display().to_string(),
        trace_path: config.trace_path.display().to_string(),
        script_path: config
            .script_path
            .as_ref()
            .map(|path| path.display().to_string()),
        script_limit: config.parsed_script_limit().map_err(|err| err.to_string()),
    };

    let output = EnvInfoOutput {
        version: env!("CARGO_PKG_VERSION").to_string(),
        target: target_triple(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        platform: PlatformInfo {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
        },
        aslr_disabled: simlink::transport::aslr_disabled(),
        features: active_features(),
        environment: env,
        resolved,
    };

    print_envinfo(&output, format);
    Ok(SUCCESS)
}

fn target_triple() -> String {
    if let Some(target) = option_env!("SIMLINK_BUILD_TARGET") {
        return target.to_string();
    }

    match (std::env::consts::ARCH, std::env::consts::OS) {
        ("aarch64", "macos") => "aarch64-apple-darwin".to_string(),
        ("x86_64", "macos") => "x86_64-apple-darwin".to_string(),
        ("aarch64", "linux") => "aarch64-unknown-linux-gnu".to_string(),
        ("x86_64", "linux") => "x86_64-unknown-linux-gnu".to_string(),
        (arch, os) => format!("{arch}-unknown-{os}"),
    }
}

fn print_envinfo(output: &EnvInfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("simlink environment\n");
            println!("  Version:    {}", output.version);
            println!("  Target:     {}", output.target);
            println!("  Git hash:   {}", output.git_hash);
            println!(
                "  Platform:   {} ({})",
                output.platform.os, output.platform.arch
            );
            println!(
                "  ASLR off:   {}",
                output
                    .aslr_disabled
                    .map_or("unknown".to_string(), |off| off.to_string())
            );
            println!("  Features:   {}", output.features.join(", "));
            println!("\n  Environment:");
            for (k, v) in &output.environment {
                println!("    {:<30} {}", k, v.as_deref().unwrap_or("(not set)"));
            }
            println!("\n  Resolved:");
            println!("    log          {}", output.resolved.log_path);
            println!("    trace        {}", output.resolved.trace_path);
            println!(
                "    script       {}",
                output.resolved.script_path.as_deref().unwrap_or("(none)")
            );
            let limit = match &output.resolved.script_limit {
                Ok(Some(limit)) => limit.to_string(),
                Ok(None) => "(none)".to_string(),
                Err(err) => err.clone(),
            };
            println!("    script limit {limit}");
        }
        OutputFormat::Raw => println!("{}", output.version),
    }
}

fn active_features() -> Vec<String> {
    let mut features = Vec::new();
    if cfg!(feature = "model") {
        features.push("model".to_string());
    }
    if cfg!(feature = "cli") {
        features.push("cli".to_string());
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_limit_serializes_as_error() {
        let resolved = ResolvedConfig {
            log_path: "simulation-log.txt".to_string(),
            trace_path: "trace".to_string(),
            script_path: None,
            script_limit: Err("Invalid execution script limit 'x'.".to_string()),
        };
        let json = serde_json::to_string(&resolved).expect("config should serialize");
        assert!(json.contains(r#""script_limit":{"Err":"Invalid execution script limit 'x'."}"#));
    }

    #[test]
    fn target_looks_like_triple() {
        let target = target_triple();
        assert!(target.split('-').count() >= 3);
    }
}
