fn main() {
    if let Err(err) = labelops::cli::run_json_to_yolo() {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}
