pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use frameworks::config::SessionSettings;
pub use frameworks::server::{EventLog, SessionReport, run, run_with_config};
