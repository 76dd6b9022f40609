fn main() {
    if let Err(err) = table_unify::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
