//! Command-line support for the `r2js` binary.

pub mod args;
pub mod config;
pub mod driver;
pub mod tracing_config;

#[cfg(test)]
#[path = "tests/args_tests.rs"]
mod args_tests;
#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod config_tests;
#[cfg(test)]
#[path = "tests/tracing_config_tests.rs"]
mod tracing_config_tests;
