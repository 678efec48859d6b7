//! Input/Config/Sinks (spec.md §6): operator input parsing, the
//! operator-facing [`config::ScannerConfig`], and a minimal [`sink::Sink`]
//! implementation. The binary entrypoint (`main.rs`) wires these together
//! with every other crate in the workspace.

pub mod config;
pub mod error;
pub mod input;
pub mod sink;

pub use config::ScannerConfig;
pub use error::InputError;
pub use input::{parse_confirmation, parse_open_request, Confirmation, OpenRequest};
pub use sink::LoggingSink;
