use std::process::ExitCode;

fn main() -> ExitCode {
    match issue2hugo::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
