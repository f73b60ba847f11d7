//! oscmd: build, log, run and pipe external commands across POSIX and Windows shells.

pub mod error;
pub mod platform;
pub mod render;
pub mod tmpl;
pub mod cmd;
pub mod exec;
pub mod config;
pub mod os;
pub mod prelude;
pub mod macros;

pub use error::{CmdError, Result};
