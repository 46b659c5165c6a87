pub mod args;
pub mod config;
pub mod coverage;
pub mod diagnostics_trace;
pub mod error;
pub mod format;
pub mod help;
pub mod run;
pub mod watch;

#[cfg(test)]
mod config_test;
#[cfg(test)]
mod run_test;

pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
