fn main() {
    if let Err(err) = perk_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
