//! fixpace demo: a fixed-point software-rendered cube on a paced frame loop
//!
//! Configuration comes from `fixpace.ron` (or the file named by
//! `FIXPACE_CONFIG`); logging is controlled with `FIXPACE_LOG`.

use fixpace::config::EngineConfig;
use fixpace::{app, logging};

fn main() {
    logging::init(&logging::LogConfig::from_env());

    let config = match EngineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    };

    app::run(config);
}
