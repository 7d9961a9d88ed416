use wiimote_reader::prelude::*;

fn main() -> SessionResult<()> {
    env_logger::init_from_env("LOG");

    println!("Simple Wii Remote Example");

    let stop = StopSignal::ctrl_c().map_err(SessionError::ConnectionFailed)?;
    let mut driver = HidDriver::new(stop.clone());
    let mut poller = Poller::new(PollerConfig::simple(), std::io::stdout(), stop);

    match poller.run(&mut driver) {
        Err(SessionError::ConnectionFailed(error)) => {
            println!("Failed to connect. Make sure your Wii remote is in discoverable mode.");
            Err(SessionError::ConnectionFailed(error))
        }
        result => result.map(|_end| ()),
    }
}
