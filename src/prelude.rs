//! oscmd::prelude - grab-and-go imports for running commands

pub use crate::cmd::{CmdBuilder, CmdObj};
pub use crate::config::OsConfig;
pub use crate::error::{CmdError, Result};
pub use crate::exec::{CommandLogger, Executor, Runner};
pub use crate::os::OsCommand;
pub use crate::platform::{OsFamily, Platform};
pub use crate::render::QuotePolicy;
pub use crate::tmpl::{resolve_placeholders, Template, UnusedPolicy};
