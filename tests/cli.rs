use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

mod common;
use common::{class_ids, image_at, label_at, read_lines, write_file, write_list};

fn bin(name: &str) -> Command {
    Command::cargo_bin(name).unwrap()
}

#[test]
fn tools_report_their_versions() {
    for name in ["dataset-check", "label-transform", "json-to-yolo"] {
        bin(name)
            .arg("-V")
            .assert()
            .success()
            .stdout(format!("{name} 0.1.0\n"));
    }
}

// dataset-check

#[test]
fn dataset_check_writes_buckets_and_prints_summary() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path();
    let image = image_at(root, "a", "x");
    label_at(root, "a", "x", "2 0.5 0.5 0.2 0.2\n");
    let list = root.join("train.txt");
    write_list(&list, &[image]);
    let out = root.join("out");

    bin("dataset-check")
        .arg("-i")
        .arg(&list)
        .arg("-o")
        .arg(&out)
        .args(["--progress-every", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total entries: 1"))
        .stdout(predicate::str::contains("class 2"));

    assert_eq!(read_lines(&out.join("train_normal.txt")).len(), 1);
    assert!(out.join("train_summary.txt").is_file());
}

#[test]
fn dataset_check_json_report() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path();
    let list = root.join("list.txt");
    write_list(&list, &[root.join("gone/JPEGImages/a.jpg")]);

    let output = bin("dataset-check")
        .arg("-i")
        .arg(&list)
        .arg("-o")
        .arg(root.join("out"))
        .args(["--report-format", "json", "--progress-every", "0"])
        .output()
        .expect("run dataset-check");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json stdout");
    assert_eq!(json["total"], 1);
    assert_eq!(json["buckets"]["both_missing"], 1);
    assert_eq!(json["total_annotations"], 0);
}

#[test]
fn dataset_check_json_report_is_parseable_with_default_progress() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path();
    let image = image_at(root, "a", "x");
    label_at(root, "a", "x", "1 0.5 0.5 0.2 0.2\n");
    let list = root.join("list.txt");
    write_list(&list, &[image]);

    let output = bin("dataset-check")
        .arg("-i")
        .arg(&list)
        .arg("-o")
        .arg(root.join("out"))
        .args(["--report-format", "json"])
        .output()
        .expect("run dataset-check");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json stdout");
    assert_eq!(json["buckets"]["normal"], 1);
    assert_eq!(json["classes"]["1"], 1);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("dataset-check: 1/1"));
}

#[test]
fn dataset_check_missing_list_exits_one() {
    let temp = tempfile::tempdir().expect("create temp dir");
    bin("dataset-check")
        .arg("-i")
        .arg(temp.path().join("missing.txt"))
        .arg("-o")
        .arg(temp.path().join("out"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn usage_errors_exit_one() {
    bin("dataset-check").args(["-o", "out"]).assert().code(1);
    bin("label-transform")
        .args(["-i", "list.txt"])
        .assert()
        .code(1);
    bin("json-to-yolo")
        .args(["in", "out", "--mapping", "m.json", "--default-mapping"])
        .assert()
        .code(1);
}

// label-transform

#[test]
fn label_transform_conflicting_filters_exit_one() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let list = temp.path().join("list.txt");
    write_file(&list, "");

    bin("label-transform")
        .arg("-i")
        .arg(&list)
        .arg("-o")
        .arg(temp.path().join("out"))
        .args(["--delete-classes", "1", "--select-classes", "2"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"));
}

#[test]
fn label_transform_in_place_with_negative_shift() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path();
    let image = image_at(root, "set", "img");
    let label = label_at(root, "set", "img", "1 0.5 0.5 0.2 0.2\n5 0.5 0.5 0.2 0.2\n");
    let list = root.join("list.txt");
    write_list(&list, &[image]);

    bin("label-transform")
        .args(["--input-mode", "file", "-i"])
        .arg(&list)
        .args(["--in-place", "--backup"])
        .args(["--shift-start", "3", "--shift-value", "-2"])
        .args(["--progress-every", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("shift"));

    assert_eq!(class_ids(&label), vec![1, 3]);
    let mut backup = label.clone().into_os_string();
    backup.push(".bak");
    assert_eq!(
        fs::read_to_string(backup).expect("read backup"),
        "1 0.5 0.5 0.2 0.2\n5 0.5 0.5 0.2 0.2\n"
    );
    assert!(root.join("result_summary.txt").is_file());
}

#[test]
fn label_transform_folder_to_output_root() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let data = temp.path().join("data");
    image_at(&data, "set", "img");
    label_at(&data, "set", "img", "0 0.5 0.5 0.2 0.2\n3 0.5 0.5 0.2 0.2\n");
    let out = temp.path().join("out");

    bin("label-transform")
        .args(["--input-mode", "folder", "-i"])
        .arg(&data)
        .arg("-o")
        .arg(&out)
        .args(["--class-mapping", "0:1", "--delete-classes", "3"])
        .args(["--progress-every", "0"])
        .assert()
        .success();

    assert_eq!(class_ids(&out.join("labels/img.txt")), vec![1]);
    assert!(out.join("result_summary.txt").is_file());
}

// json-to-yolo

#[test]
fn json_to_yolo_converts_directory() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("json");
    let output = temp.path().join("yolo");
    write_file(
        &input.join("a.json"),
        r#"{"Raw Data Info": {"resolution": [1000, 500]},
            "Learning Data Info": {"annotation": [{"class_id": "car", "coord": [100, 50, 200, 100]}]}}"#,
    );

    bin("json-to-yolo")
        .arg(&input)
        .arg(&output)
        .args(["--progress-every", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Converted 1 of 1 JSON file(s)"));

    assert_eq!(
        read_lines(&output.join("a.txt")),
        vec!["0 0.200000 0.200000 0.200000 0.200000".to_string()]
    );
    assert_eq!(read_lines(&output.join("classes.txt")), vec!["car"]);
}

#[test]
fn json_to_yolo_missing_default_mapping_exits_one() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("json");
    fs::create_dir_all(&input).expect("create input dir");

    bin("json-to-yolo")
        .arg(&input)
        .arg(temp.path().join("out"))
        .arg("--default-mapping")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("class_mapping.json"));
}
