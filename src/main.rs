fn main() {
    if let Err(e) = markview_lib::run() {
        eprintln!("markview: {e}");
        std::process::exit(1);
    }
}
