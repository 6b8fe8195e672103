use super::{Engine, types::EngineDiag};
use crate::config::Config;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs `<interpreter> <script> <domain>` inside the work root.
pub struct ScriptEngine {
    interpreter: Option<PathBuf>,
    script: PathBuf,
    work_root: PathBuf,
    env: BTreeMap<String, String>,
}

impl ScriptEngine {
    pub fn new(cfg: &Config) -> Result<Self> {
        let cwd = std::env::current_dir().with_context(|| "current_dir")?;
        let script = absolutize(&cwd, Path::new(&cfg.pipeline.script));
        let work_root = absolutize(&cwd, Path::new(&cfg.paths.work_root));
        if !script.exists() {
            // Not fatal: each job will fail with the spawn error instead.
            warn!("pipeline script not found: {}", script.display());
        }
        Ok(Self {
            interpreter: resolve_interpreter(&cfg.pipeline.interpreter),
            script,
            work_root,
            env: cfg.pipeline.env.clone(),
        })
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }
}

fn absolutize(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn resolve_interpreter(raw: &str) -> Option<PathBuf> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.eq_ignore_ascii_case("auto") {
        if let Ok(env_val) = std::env::var("RECON_SHELL") {
            if !env_val.trim().is_empty() {
                return Some(PathBuf::from(env_val.trim()));
            }
        }
        return Some(PathBuf::from("bash"));
    }
    Some(PathBuf::from(raw))
}

impl Engine for ScriptEngine {
    fn command(&self, domain: &str) -> Command {
        let mut cmd = match &self.interpreter {
            Some(interp) => {
                let mut cmd = Command::new(interp);
                cmd.arg(&self.script);
                cmd
            }
            None => Command::new(&self.script),
        };
        cmd.arg(domain);
        cmd.current_dir(&self.work_root);
        cmd.stdin(Stdio::null());
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        debug!(
            "pipeline command interpreter={:?} script={} domain={domain}",
            self.interpreter,
            self.script.display()
        );
        cmd
    }

    fn doctor(&self) -> Result<EngineDiag> {
        let script_exists = self.script.is_file();
        let work_root_exists = self.work_root.is_dir();

        let mut error = None;
        let interpreter_version = match &self.interpreter {
            Some(interp) => match std::process::Command::new(interp)
                .arg("--version")
                .stdin(Stdio::null())
                .output()
            {
                Ok(out) => String::from_utf8_lossy(&out.stdout)
                    .lines()
                    .next()
                    .map(|l| l.trim().to_string()),
                Err(err) => {
                    error = Some(format!("interpreter {}: {err}", interp.display()));
                    None
                }
            },
            None => None,
        };

        if error.is_none() && !script_exists {
            error = Some(format!("missing script: {}", self.script.display()));
        }
        if error.is_none() && !work_root_exists {
            error = Some(format!("missing work_root: {}", self.work_root.display()));
        }

        Ok(EngineDiag {
            interpreter: self.interpreter.as_ref().map(|p| p.display().to_string()),
            interpreter_version,
            script: self.script.display().to_string(),
            script_exists,
            work_root: self.work_root.display().to_string(),
            work_root_exists,
            ok: error.is_none(),
            error,
        })
    }
}
