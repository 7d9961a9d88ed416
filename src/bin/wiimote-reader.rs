use std::process::ExitCode;

use wiimote_reader::prelude::*;

fn main() -> ExitCode {
    env_logger::init_from_env("LOG");

    println!("Wii Remote Input Reader");
    println!("Make sure your Wii remote is in discoverable mode");
    println!("(Press and hold the 1 and 2 buttons simultaneously)");

    let stop = match StopSignal::ctrl_c() {
        Ok(stop) => stop,
        Err(error) => {
            eprintln!("{error}");
            return ExitCode::FAILURE;
        }
    };

    let mut driver = HidDriver::new(stop.clone());
    let mut poller = Poller::new(PollerConfig::reader(), std::io::stdout(), stop);

    match poller.run(&mut driver) {
        Ok(_) => ExitCode::SUCCESS,
        Err(SessionError::ConnectionFailed(error)) => {
            println!("Failed to connect: {error}");
            println!("Make sure your Wii remote is in discoverable mode (press 1+2)");
            println!("Could not connect to Wii remote");
            ExitCode::SUCCESS
        }
        Err(error @ SessionError::ReadFailure(_)) => {
            println!("{error}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
