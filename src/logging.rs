// src/logging.rs
//
// Logger setup for the binary. Library code only uses the `log` facade.

use std::sync::Once;

use log::info;

static INIT: Once = Once::new();

/// Initialize the logging system.
/// Safe to call more than once; only the first call installs the logger.
pub fn init_logger() {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();
        builder
            .filter_level(log::LevelFilter::Info)
            .filter_module("animestele", log::LevelFilter::Debug)
            .filter_module("reqwest", log::LevelFilter::Warn)
            .filter_module("hyper", log::LevelFilter::Warn)
            .filter_module("html5ever", log::LevelFilter::Warn)
            .format_timestamp_secs()
            .format_module_path(false);

        // RUST_LOG, when set, overrides the defaults above
        if let Ok(filters) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filters);
        }

        // A logger installed by the host process wins
        if builder.try_init().is_ok() {
            info!("Logging system initialized");
        }
    });
}
