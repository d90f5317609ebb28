fn main() {
    if let Err(e) = medivision_lib::run() {
        eprintln!("medivision: {e}");
        std::process::exit(1);
    }
}
