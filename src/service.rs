use crate::{
    config::Config,
    engine::{Engine, ScriptEngine},
    error::ServiceError,
    job::{JobId, JobSummary, PollSnapshot},
    registry::JobRegistry,
    supervisor::Supervisor,
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use unicode_normalization::UnicodeNormalization;

pub const REPORT_PATH: &str = "reports/recon_report.md";

/// Per-run artifact lists clients can fetch line by line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Subdomains,
    Critical,
    Alive,
    Js,
    Wayback,
    Api,
    Takeovers,
    Cves,
    Exposures,
}

impl DataType {
    pub const ALL: [DataType; 9] = [
        DataType::Subdomains,
        DataType::Critical,
        DataType::Alive,
        DataType::Js,
        DataType::Wayback,
        DataType::Api,
        DataType::Takeovers,
        DataType::Cves,
        DataType::Exposures,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Subdomains => "subdomains",
            DataType::Critical => "critical",
            DataType::Alive => "alive",
            DataType::Js => "js",
            DataType::Wayback => "wayback",
            DataType::Api => "api",
            DataType::Takeovers => "takeovers",
            DataType::Cves => "cves",
            DataType::Exposures => "exposures",
        }
    }

    /// Artifact location relative to the run's work directory.
    pub fn relative_path(self) -> &'static str {
        match self {
            DataType::Subdomains => "subdomains/all_subdomains.txt",
            DataType::Critical => "subdomains/critical_subs.txt",
            DataType::Alive => "alive/alive_hosts.txt",
            DataType::Js => "js/js_files.txt",
            DataType::Wayback => "endpoints/wayback_all.txt",
            DataType::Api => "endpoints/api_endpoints.txt",
            DataType::Takeovers => "vulnerabilities/takeovers.txt",
            DataType::Cves => "vulnerabilities/cves.txt",
            DataType::Exposures => "vulnerabilities/exposures.txt",
        }
    }
}

impl FromStr for DataType {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|dt| dt.as_str() == s)
            .ok_or_else(|| ServiceError::InvalidDataType(s.to_string()))
    }
}

/// Normalizes and checks a user-supplied domain.
///
/// Accepts hostname-shaped input: at least two dot-separated labels of
/// `[a-z0-9-]` (no leading or trailing hyphen, at most 63 chars each) and an
/// alphabetic top-level label of two or more characters.
pub fn validate_domain(raw: &str) -> Result<String, ServiceError> {
    let domain: String = raw.trim().nfkc().collect::<String>().to_ascii_lowercase();
    if domain.is_empty() {
        return Err(ServiceError::DomainRequired);
    }
    let invalid = || ServiceError::InvalidDomain(domain.clone());

    if domain.len() > 253 {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(invalid());
    }
    for label in &labels {
        let ok = !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
        if !ok {
            return Err(invalid());
        }
    }
    let tld = labels[labels.len() - 1];
    if tld.len() < 2 || !tld.bytes().all(|b| b.is_ascii_lowercase()) {
        return Err(invalid());
    }
    Ok(domain)
}

#[derive(Debug, Clone)]
pub struct Submitted {
    pub job_id: JobId,
    pub domain: String,
}

/// Request-facing operations over the job registry.
#[derive(Clone)]
pub struct ReconService {
    registry: Arc<JobRegistry>,
}

impl ReconService {
    pub fn new(registry: Arc<JobRegistry>) -> Self {
        Self { registry }
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let engine = ScriptEngine::new(cfg)?;
        let work_root = engine.work_root().to_path_buf();
        let engine: Arc<dyn Engine> = Arc::new(engine);
        let supervisor = Supervisor::new(engine, work_root, cfg.limits.channel_capacity);
        let registry = JobRegistry::new(supervisor, cfg.limits.log_history);
        Ok(Self::new(Arc::new(registry)))
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn submit(&self, raw_domain: &str) -> Result<Submitted, ServiceError> {
        let domain = validate_domain(raw_domain)?;
        let job_id = self.registry.create(&domain);
        info!("submitted job {job_id} domain={domain}");
        Ok(Submitted { job_id, domain })
    }

    /// Drains pending logs, or with `since` reads retained logs after that
    /// cursor without draining.
    pub fn poll(&self, id: &JobId, since: Option<u64>) -> Result<PollSnapshot, ServiceError> {
        let job = self
            .registry
            .get(id)
            .ok_or_else(|| ServiceError::JobNotFound(id.clone()))?;
        Ok(match since {
            Some(cursor) => job.read_since(cursor),
            None => job.drain(),
        })
    }

    fn workdir(&self, id: &JobId) -> Result<PathBuf, ServiceError> {
        let job = self
            .registry
            .get(id)
            .ok_or_else(|| ServiceError::JobNotFound(id.clone()))?;
        job.workdir().ok_or(ServiceError::DataNotAvailable)
    }

    /// Non-empty trimmed lines of one artifact list. A missing file reads as
    /// an empty list.
    pub async fn detail(&self, id: &JobId, data_type: &str) -> Result<Vec<String>, ServiceError> {
        let workdir = self.workdir(id)?;
        let data_type: DataType = data_type.parse()?;
        let path = workdir.join(data_type.relative_path());
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = read_artifact(&path).await?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub async fn report(&self, id: &JobId) -> Result<String, ServiceError> {
        let workdir = self.workdir(id).map_err(|err| match err {
            ServiceError::DataNotAvailable => ServiceError::ReportNotFound,
            other => other,
        })?;
        let path = workdir.join(REPORT_PATH);
        if !path.is_file() {
            return Err(ServiceError::ReportNotFound);
        }
        read_artifact(&path).await
    }

    pub fn jobs(&self) -> Vec<JobSummary> {
        self.registry.list()
    }
}

async fn read_artifact(path: &Path) -> Result<String, ServiceError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| ServiceError::ReadArtifact {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
