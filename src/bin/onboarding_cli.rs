use receptionist_onboarding::{cli::run_cli, init};

fn main() {
    init();

    match run_cli(std::env::args().skip(1)) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}
