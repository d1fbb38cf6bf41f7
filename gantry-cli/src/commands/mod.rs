//! CLI command implementations.

pub mod add;
pub mod common;
pub mod init;
pub mod install;
pub mod output;

pub use add::AddArgs;
pub use common::{GlobalArgs, Session, Settings};
pub use init::InitArgs;
pub use output::ConsoleOutput;
