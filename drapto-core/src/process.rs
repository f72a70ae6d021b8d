// ============================================================================
// drapto-core/src/process.rs
// ============================================================================
//
// EXTERNAL-PROCESS RUNNER (C1)
//
// Executes child processes (ffmpeg, ffprobe, ab-av1, mediainfo), captures
// stdout/stderr, and parses the periodic `-progress pipe:1` key/value stream
// that ffmpeg emits. All spawns inherit a sanitized environment so that no
// stray path variables leak into children.
//
// AI-ASSISTANT-INFO: Child-process execution and ffmpeg progress parsing

use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::process::{Command, Output, Stdio};
use std::sync::{Mutex, OnceLock};
use std::time::{Duration, Instant};

use log::debug;

use crate::error::{command_failed_error, command_start_error, command_wait_error, CoreResult};
use crate::logging;

/// Environment variables passed through to every spawned child, in addition
/// to whatever the command's own `env()` calls add. Keeps children from
/// inheriting the parent's full environment.
const PASSTHROUGH_ENV_VARS: &[&str] = &["PATH", "HOME", "TMPDIR", "LANG", "LC_ALL"];

/// Process-wide registry of live children's process-group ids. Every
/// `run`/`run_with_progress` spawn places its child in its own group
/// (`setpgid`, via `process_group(0)`) and records the group leader's pid
/// here for the duration of the call, so `cancel_all_children` can reach a
/// child's own grandchildren (e.g. ffmpeg's helper processes) through one
/// group signal instead of hunting them down individually.
static CHILD_GROUPS: OnceLock<Mutex<HashSet<u32>>> = OnceLock::new();

fn child_groups() -> &'static Mutex<HashSet<u32>> {
    CHILD_GROUPS.get_or_init(|| Mutex::new(HashSet::new()))
}

fn register_child(pid: u32) {
    child_groups().lock().unwrap().insert(pid);
}

fn deregister_child(pid: u32) {
    child_groups().lock().unwrap().remove(&pid);
}

/// Puts `cmd`'s child in its own process group so a later cancel can signal
/// the whole group. No-op on non-Unix targets.
#[cfg(unix)]
fn group_child(cmd: &mut Command) {
    use std::os::unix::process::CommandExt;
    cmd.process_group(0);
}

#[cfg(not(unix))]
fn group_child(_cmd: &mut Command) {}

/// A single progress record surfaced from a `run_with_progress` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressRecord {
    pub percent: f32,
    pub fps: Option<f32>,
    pub eta_secs: Option<f64>,
}

/// Progress callback signature.
pub type ProgressCallback<'a> = &'a mut dyn FnMut(ProgressRecord);

/// Sanitizes a command's environment down to an explicit allow-list plus
/// whatever the caller has already set via `.env()`/`.envs()`.
fn sanitize_env(cmd: &mut Command) {
    cmd.env_clear();
    for key in PASSTHROUGH_ENV_VARS {
        if let Ok(value) = std::env::var(key) {
            cmd.env(key, value);
        }
    }
}

/// Runs a command to completion and returns its captured output.
///
/// Fails with a `CoreError::Command`/`ProcessError` if the process could not
/// be started, could not be waited on, or exited non-zero.
pub fn run(cmd: &mut Command) -> CoreResult<Output> {
    sanitize_env(cmd);
    group_child(cmd);
    logging::log_command(cmd);

    let program = cmd.get_program().to_string_lossy().to_string();

    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| command_start_error(program.clone(), e))?;
    let pid = child.id();
    register_child(pid);

    let mut stdout = child.stdout.take().expect("stdout was piped");
    let mut stderr = child.stderr.take().expect("stderr was piped");
    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = std::io::Read::read_to_end(&mut stdout, &mut buf);
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = std::io::Read::read_to_end(&mut stderr, &mut buf);
        buf
    });

    let status = child.wait().map_err(|e| command_wait_error(program.clone(), e));
    deregister_child(pid);
    let status = status?;

    let output = Output {
        status,
        stdout: stdout_handle.join().unwrap_or_default(),
        stderr: stderr_handle.join().unwrap_or_default(),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(command_failed_error(program, output.status, stderr));
    }

    Ok(output)
}

/// Runs a command with `-progress pipe:1` appended before spawn, reading
/// lines from stdout and recognizing `out_time=`, `fps=`, and `progress=end`.
/// Emits a progress record at most once per `log_interval_pct` of completed
/// duration (when `total_duration` is known); `progress=end` always forces a
/// terminal 100% record.
pub fn run_with_progress(
    cmd: &mut Command,
    total_duration: Option<f64>,
    log_interval_pct: f32,
    mut on_progress: Option<ProgressCallback>,
) -> CoreResult<Output> {
    cmd.arg("-progress").arg("pipe:1");
    sanitize_env(cmd);
    group_child(cmd);
    logging::log_command(cmd);

    let program = cmd.get_program().to_string_lossy().to_string();

    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| command_start_error(program.clone(), e))?;
    let pid = child.id();
    register_child(pid);

    let stdout = BufReader::new(child.stdout.take().expect("stdout was piped"));
    let stderr = BufReader::new(child.stderr.take().expect("stderr was piped"));

    let stderr_handle = std::thread::spawn(move || {
        let mut lines = Vec::new();
        for line in stderr.lines().map_while(Result::ok) {
            debug!("STDERR: {}", line);
            lines.push(line);
        }
        lines
    });

    let mut last_emitted_pct: f32 = -1.0;
    let mut cur_out_time: Option<f64> = None;
    let mut cur_fps: Option<f32> = None;
    let mut stdout_lines = Vec::new();

    for line in stdout.lines().map_while(Result::ok) {
        debug!("STDOUT: {}", line);
        if let Some((key, value)) = line.split_once('=') {
            match key {
                "out_time" => cur_out_time = parse_time_to_seconds(value.trim()),
                "fps" => cur_fps = value.trim().parse::<f32>().ok(),
                "progress" if value.trim() == "end" => {
                    if let Some(cb) = on_progress.as_deref_mut() {
                        cb(ProgressRecord {
                            percent: 100.0,
                            fps: cur_fps,
                            eta_secs: Some(0.0),
                        });
                    }
                }
                _ => {}
            }
        }

        if let (Some(out_time), Some(total)) = (cur_out_time, total_duration) {
            if total > 0.0 {
                let pct = ((out_time / total) * 100.0).clamp(0.0, 100.0) as f32;
                if pct - last_emitted_pct >= log_interval_pct || pct >= 100.0 {
                    last_emitted_pct = pct;
                    let eta = cur_fps.map(|_| ((total - out_time).max(0.0)));
                    if let Some(cb) = on_progress.as_deref_mut() {
                        cb(ProgressRecord {
                            percent: pct,
                            fps: cur_fps,
                            eta_secs: eta,
                        });
                    }
                }
            }
        }

        stdout_lines.push(line);
    }

    let status = child.wait().map_err(|e| command_wait_error(program.clone(), e));
    deregister_child(pid);
    let status = status?;
    let stderr_lines = stderr_handle.join().unwrap_or_default();

    let output = Output {
        status,
        stdout: stdout_lines.join("\n").into_bytes(),
        stderr: stderr_lines.join("\n").into_bytes(),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(command_failed_error(program, output.status, stderr));
    }

    Ok(output)
}

/// Parses a time string in `HH:MM:SS.ms` (ffmpeg's `out_time=`) format to seconds.
fn parse_time_to_seconds(time_str: &str) -> Option<f64> {
    let parts: Vec<&str> = time_str.split(':').collect();
    if parts.len() != 3 {
        return None;
    }

    let hours: f64 = parts[0].parse().ok()?;
    let minutes: f64 = parts[1].parse().ok()?;
    let seconds: f64 = parts[2].parse().ok()?;

    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Sends `SIGTERM` to the process group led by `pid`, waits up to `grace` for
/// it to exit, then escalates to `SIGKILL`. Signals the group (`-pid`) rather
/// than the single process so a child's own children — e.g. ffmpeg's helper
/// processes — are reached by the same signal instead of being orphaned.
/// Best-effort: a process that already exited, or a signal that fails to
/// send, is silently ignored.
fn terminate_then_kill(pid: u32, grace: Duration) {
    let _ = Command::new("kill").arg("-TERM").arg(format!("-{pid}")).status();

    let start = Instant::now();
    while start.elapsed() < grace {
        let still_alive = Command::new("kill")
            .arg("-0")
            .arg(format!("-{pid}"))
            .status()
            .map(|s| s.success())
            .unwrap_or(false);
        if !still_alive {
            return;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    let _ = Command::new("kill").arg("-KILL").arg(format!("-{pid}")).status();
}

/// Orchestrator cancellation: terminates (then kills after `grace`) every
/// child currently registered by `run`/`run_with_progress`, across every
/// worker thread. Wired into the CLI's SIGINT handler so Ctrl-C doesn't leave
/// ffmpeg/ab-av1 processes running after the parent exits (§4.1 signal
/// discipline). A no-op when nothing is in flight.
pub fn cancel_all_children(grace: Duration) {
    let pids: Vec<u32> = child_groups().lock().unwrap().iter().copied().collect();
    for pid in pids {
        terminate_then_kill(pid, grace);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_time_to_seconds() {
        assert_eq!(parse_time_to_seconds("01:30:45"), Some(5445.0));
        assert_eq!(parse_time_to_seconds("00:05:30"), Some(330.0));
        assert_eq!(parse_time_to_seconds("invalid"), None);
    }

    #[test]
    fn run_echo_succeeds() {
        let mut cmd = Command::new("echo");
        cmd.arg("test");
        let output = run(&mut cmd).unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "test");
    }

    #[test]
    fn run_failing_command_errors() {
        let mut cmd = Command::new("false");
        assert!(run(&mut cmd).is_err());
    }

    // Uses a pid far outside any real process's range so the registry tests
    // don't collide with pids other tests register concurrently in this
    // process-wide static.
    const FAKE_PID: u32 = u32::MAX - 7;

    #[test]
    fn register_and_deregister_child_round_trip() {
        register_child(FAKE_PID);
        assert!(child_groups().lock().unwrap().contains(&FAKE_PID));
        deregister_child(FAKE_PID);
        assert!(!child_groups().lock().unwrap().contains(&FAKE_PID));
    }

    #[test]
    fn cancel_all_children_is_a_noop_when_nothing_is_running() {
        cancel_all_children(Duration::from_millis(10));
    }

    #[test]
    fn terminate_then_kill_reaps_a_backgrounded_group_leader() {
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        group_child(&mut cmd);
        let mut child = cmd.spawn().unwrap();
        let pid = child.id();

        terminate_then_kill(pid, Duration::from_millis(200));

        let exited = Command::new("kill")
            .arg("-0")
            .arg(pid.to_string())
            .status()
            .map(|s| !s.success())
            .unwrap_or(true);
        assert!(exited, "process {pid} should have been terminated");
        let _ = child.wait();
    }
}
