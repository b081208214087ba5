fn main() {
    if let Err(err) = labelops::cli::run_dataset_check() {
        eprintln!("error: {err}");
        std::process::exit(err.exit_code());
    }
}
