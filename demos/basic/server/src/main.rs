use std::{net::SocketAddr, process};

use log::{error, info, LevelFilter};

mod app;
use app::App;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:9000";

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    info!("Basic Simcircuit Server Demo started");

    let argument = std::env::args().nth(1);
    let bind_address = argument.as_deref().unwrap_or(DEFAULT_BIND_ADDRESS);
    let bind_address: SocketAddr = match bind_address.parse() {
        Ok(address) => address,
        Err(err) => {
            error!("invalid bind address {}: {}", bind_address, err);
            process::exit(2);
        }
    };

    let app = match App::new(bind_address) {
        Ok(app) => app,
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    };
    app.run();
}
