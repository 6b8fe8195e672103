pub mod script;
pub mod types;

use anyhow::Result;
use tokio::process::Command;

pub use script::ScriptEngine;
pub use types::EngineDiag;

/// Builds the external pipeline invocation for one domain.
pub trait Engine: Send + Sync {
    /// The command for one run; the caller wires stdout and stderr.
    fn command(&self, domain: &str) -> Command;
    fn doctor(&self) -> Result<EngineDiag>;
}
