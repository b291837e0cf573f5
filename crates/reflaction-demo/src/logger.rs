//! Console logging using env_logger
//!
//! `RUST_LOG` wins when set; otherwise the level comes from the demo config.

use crate::config::DemoConfig;

pub fn init(config: &DemoConfig) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(config.log_filter())
        .parse_default_env()
        .format_timestamp_millis();

    if let Err(e) = builder.try_init() {
        eprintln!("Failed to initialize logger: {}", e);
    }
}
