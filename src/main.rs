use std::process::ExitCode;

fn main() -> ExitCode {
    restack::logging::init();
    ExitCode::from(restack::cli::run(std::env::args_os()))
}
