#![cfg(all(unix, feature = "cli"))]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const MODEL: &str = r#"{
    "name": "demo",
    "ports": [
        { "id": 0, "name": "clock", "width": 1, "direction": "input" },
        { "id": 1, "name": "nibble", "width": 4, "direction": "input" },
        { "id": 5, "name": "byte", "width": 8, "direction": "inout" },
        { "id": 7, "name": "count", "width": 8, "direction": "output" },
        { "id": 42, "name": "data", "width": 12, "direction": "inout", "monitor": true }
    ],
    "counter": { "clock": 0, "output": 7 }
}"#;

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = PathBuf::from(format!(
        "/tmp/simlink-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    std::fs::write(dir.join("model.json"), MODEL).expect("model should be writable");
    dir
}

fn simlink(dir: &Path) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_simlink"));
    command
        .current_dir(dir)
        .arg("--log-level")
        .arg("off")
        .env_remove("SVSIM_EXECUTION_SCRIPT")
        .env_remove("SVSIM_EXECUTION_SCRIPT_LIMIT")
        .env("SVSIM_SIMULATION_LOG", dir.join("log.txt"))
        .env("SVSIM_SIMULATION_TRACE", dir.join("wave.txt"));
    command
}

fn run_sim(mut command: Command, commands: &str) -> Output {
    let mut child = command
        .arg("sim")
        .arg("--model")
        .arg("model.json")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("sim should start");
    if let Some(mut stdin) = child.stdin.take() {
        let _ = stdin.write_all(commands.as_bytes());
    }
    child.wait_with_output().expect("sim should exit")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn set_get_and_log_round_trip() {
    let dir = unique_temp_dir("basic");

    let output = run_sim(simlink(&dir), "S 2A ABC\nG u 2A\nS 5 F0\nG s 5\nL\nL\nD\n");

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        stdout(&output),
        "r ready\nk ack\nb 0000000C ABC\nk ack\nb 00000008 -10\n\
         l 0000000C data <= ABC\n\nl 00000000 \n"
    );
    assert_eq!(
        std::fs::read_to_string(dir.join("log.txt")).unwrap(),
        "data <= ABC\n"
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn overflow_is_reported_and_exit_is_nonzero() {
    let dir = unique_temp_dir("overflow");

    let output = run_sim(simlink(&dir), "S 1 1F\nR 1\nD\n");

    assert!(!output.status.success());
    assert_eq!(
        stdout(&output),
        "r ready\ne scanned value exceeded 4 bits when parsing value for SET_BITS command\n"
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn tick_stops_at_sentinel() {
    let dir = unique_temp_dir("tick");

    let output = run_sim(simlink(&dir), "T 0 1,0-A*64 7=5\nG u 7\nT 0 1,0-1*3\nG u 7\nD\n");

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "r ready\nb 00000040 5\nb 00000008 5\nb 00000040 3\nb 00000008 8\n"
    );

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn trace_writes_waveform_dump() {
    let dir = unique_temp_dir("trace");

    let output = run_sim(simlink(&dir), "W 1\nS 5 3\nR 2\nW 0\nR 2\nD\n");

    assert!(output.status.success());
    assert_eq!(stdout(&output), "r ready\nk ack\nk ack\nk ack\nk ack\nk ack\n");
    let wave = std::fs::read_to_string(dir.join("wave.txt")).unwrap();
    assert_eq!(wave, "#2 clock=0 nibble=0 byte=3 count=0 data=0\n");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn execution_script_replays_to_same_result() {
    let dir = unique_temp_dir("script");
    let script = dir.join("script.txt");

    let mut command = simlink(&dir);
    command
        .env("SVSIM_EXECUTION_SCRIPT", &script)
        .env("SVSIM_EXECUTION_SCRIPT_LIMIT", "2");
    let output = run_sim(command, "S 5 1\nG u 5\nS 5 3\nD\n");
    assert!(output.status.success());

    assert_eq!(
        std::fs::read_to_string(&script).unwrap(),
        "0< r ready\n1> S 5 1\n1< k ack\n2> G u 5\n\
         # Execution script limited to 2 commands (not counting implicit 'Done').\n\
         3> D\n"
    );

    let replay = simlink(&dir)
        .arg("--format")
        .arg("raw")
        .arg("replay")
        .arg(&script)
        .output()
        .expect("replay should run");
    assert!(replay.status.success());
    let commands = stdout(&replay);
    assert_eq!(commands, "S 5 1\nG u 5\nD\n");

    let rerun = run_sim(simlink(&dir), &commands);
    assert!(rerun.status.success());
    assert_eq!(stdout(&rerun), "r ready\nk ack\nb 00000008 1\n");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn invalid_script_limit_replaces_ready() {
    let dir = unique_temp_dir("limit");

    let mut command = simlink(&dir);
    command
        .env("SVSIM_EXECUTION_SCRIPT", dir.join("script.txt"))
        .env("SVSIM_EXECUTION_SCRIPT_LIMIT", "abc");
    let output = run_sim(command, "D\n");

    assert!(!output.status.success());
    assert_eq!(stdout(&output), "e Invalid execution script limit 'abc'.\n");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unwritable_log_is_reported_to_host() {
    let dir = unique_temp_dir("badlog");
    let log = dir.join("missing-dir").join("log.txt");

    let mut command = simlink(&dir);
    command.env("SVSIM_SIMULATION_LOG", &log);
    let output = run_sim(command, "D\n");

    assert_eq!(output.status.code(), Some(1));
    let messages = stdout(&output);
    assert!(
        messages.starts_with(&format!(
            "e failed to redirect stdout to {}: ",
            log.display()
        )),
        "unexpected messages: {messages:?}"
    );
    assert_eq!(messages.lines().count(), 1);
    assert!(!messages.contains("r ready"));

    let _ = std::fs::remove_dir_all(&dir);
}
