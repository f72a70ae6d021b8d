use assert_cmd::Command;
use std::error::Error;
use tempfile::tempdir;

fn drapto_cmd() -> Command {
    Command::cargo_bin("drapto").expect("Failed to find drapto binary")
}

#[test]
fn missing_args_fails_parsing() {
    let mut cmd = drapto_cmd();
    cmd.assert().failure();
}

#[test]
fn nonexistent_input_fails_with_message() -> Result<(), Box<dyn Error>> {
    let output_dir = tempdir()?;

    let mut cmd = drapto_cmd();
    cmd.arg("/no/such/input.mkv").arg(output_dir.path());

    cmd.assert().failure();
    Ok(())
}

#[test]
fn version_flag_prints_version() {
    let mut cmd = drapto_cmd();
    cmd.arg("--version");
    cmd.assert().success();
}
