fn main() {
    if let Err(e) = subscription_tracker_lib::run() {
        eprintln!("{}", e.details());
        std::process::exit(1);
    }
}
