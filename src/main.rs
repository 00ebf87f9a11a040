fn main() -> std::process::ExitCode {
    eventbnb_lib::run()
}
