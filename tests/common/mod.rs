#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub fn write_file(path: &Path, content: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, content).expect("write file");
}

/// A stand-in image; only its existence matters.
pub fn write_image(path: &Path) {
    write_file(path, [0xFF, 0xD8, 0xFF, 0xD9]);
}

/// `<root>/<split>/JPEGImages/<name>.jpg`, created on disk.
pub fn image_at(root: &Path, split: &str, name: &str) -> PathBuf {
    let path = image_path(root, split, name);
    write_image(&path);
    path
}

/// `<root>/<split>/JPEGImages/<name>.jpg`, not created.
pub fn image_path(root: &Path, split: &str, name: &str) -> PathBuf {
    root.join(split)
        .join("JPEGImages")
        .join(format!("{name}.jpg"))
}

/// `<root>/<split>/labels/<name>.txt` with the given rows.
pub fn label_at(root: &Path, split: &str, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
    let path = root.join(split).join("labels").join(format!("{name}.txt"));
    write_file(&path, content);
    path
}

/// Write an image list with one path per line.
pub fn write_list(path: &Path, images: &[PathBuf]) {
    let mut text = String::new();
    for image in images {
        text.push_str(&image.to_string_lossy());
        text.push('\n');
    }
    write_file(path, text);
}

/// Non-empty lines of a text file, or an empty vec when it is missing.
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|text| {
            text.lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Class ids of every row in a label file.
pub fn class_ids(path: &Path) -> Vec<u32> {
    read_lines(path)
        .iter()
        .map(|line| {
            line.split_whitespace()
                .next()
                .expect("class token")
                .parse()
                .expect("numeric class id")
        })
        .collect()
}
