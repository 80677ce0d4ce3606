fn main() {
    if let Err(err) = cedit::run() {
        eprintln!("cedit: {err}");
        std::process::exit(1);
    }
}
