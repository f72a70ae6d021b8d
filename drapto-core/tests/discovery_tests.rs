// drapto-core/tests/discovery_tests.rs

use drapto_core::discovery::find_processable_files;
use drapto_core::error::CoreError;
use std::fs::{self, File};
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn finds_mkv_and_mp4_case_insensitively_non_recursive() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input_dir = dir.path();

    File::create(input_dir.join("video1.mkv"))?;
    File::create(input_dir.join("video2.MKV"))?;
    File::create(input_dir.join("video3.mp4"))?;
    File::create(input_dir.join("document.txt"))?;
    File::create(input_dir.join("image.jpg"))?;
    fs::create_dir(input_dir.join("subdir"))?;
    File::create(input_dir.join("subdir").join("nested_video.mkv"))?;

    let mut files = find_processable_files(input_dir)?;
    files.sort();

    assert_eq!(files.len(), 3);
    assert_eq!(files[0].file_name().unwrap(), "video1.mkv");
    assert_eq!(files[1].file_name().unwrap(), "video2.MKV");
    assert_eq!(files[2].file_name().unwrap(), "video3.mp4");

    Ok(())
}

#[test]
fn empty_directory_yields_no_files_found() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input_dir = dir.path();

    File::create(input_dir.join("document.txt"))?;
    fs::create_dir(input_dir.join("subdir"))?;

    let result = find_processable_files(input_dir);
    match result {
        Err(CoreError::NoFilesFound) => {}
        other => panic!("expected NoFilesFound, got {other:?}"),
    }

    Ok(())
}

#[test]
fn nonexistent_dir_is_an_io_error() {
    let non_existent_path = PathBuf::from("surely_this_does_not_exist_42_integration");
    let result = find_processable_files(&non_existent_path);
    match result {
        Err(CoreError::Io(_)) => {}
        other => panic!("expected Io error, got {other:?}"),
    }
}
