fn main() {
    if let Err(err) = labelops::cli::run_label_transform() {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}
