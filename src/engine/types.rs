use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDiag {
    pub interpreter: Option<String>,
    pub interpreter_version: Option<String>,
    pub script: String,
    pub script_exists: bool,
    pub work_root: String,
    pub work_root_exists: bool,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}
