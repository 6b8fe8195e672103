use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;

/// Location of the summary artifact inside a run's work directory.
pub const SUMMARY_PATH: &str = "reports/summary.txt";

const COUNTERS: [(&str, &str); 9] = [
    ("total_subs", "Total Subdomains"),
    ("critical_subs", "Critical Subdomains"),
    ("alive_hosts", "Alive Hosts"),
    ("js_files", "JavaScript Files"),
    ("wayback_urls", "Wayback URLs"),
    ("api_endpoints", "API Endpoints"),
    ("takeovers", "Subdomain Takeovers"),
    ("exposures", "Exposures"),
    ("cves", "CVEs"),
];

static COUNTER_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    COUNTERS
        .iter()
        .map(|(_, label)| {
            Regex::new(&format!(r"{}:\s*(\d+)", regex::escape(label)))
                .expect("valid summary pattern")
        })
        .collect()
});

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub total_subs: u64,
    pub critical_subs: u64,
    pub alive_hosts: u64,
    pub js_files: u64,
    pub wayback_urls: u64,
    pub api_endpoints: u64,
    pub takeovers: u64,
    pub exposures: u64,
    pub cves: u64,
    pub workdir: String,
}

impl ResultRecord {
    fn counter_mut(&mut self, key: &str) -> Option<&mut u64> {
        match key {
            "total_subs" => Some(&mut self.total_subs),
            "critical_subs" => Some(&mut self.critical_subs),
            "alive_hosts" => Some(&mut self.alive_hosts),
            "js_files" => Some(&mut self.js_files),
            "wayback_urls" => Some(&mut self.wayback_urls),
            "api_endpoints" => Some(&mut self.api_endpoints),
            "takeovers" => Some(&mut self.takeovers),
            "exposures" => Some(&mut self.exposures),
            "cves" => Some(&mut self.cves),
            _ => None,
        }
    }
}

/// Extracts the fixed counters from summary text. Missing labels read as 0.
pub fn parse_summary(content: &str, workdir: &Path) -> ResultRecord {
    let mut record = ResultRecord {
        workdir: workdir.display().to_string(),
        ..Default::default()
    };

    for ((key, label), re) in COUNTERS.iter().zip(COUNTER_PATTERNS.iter()) {
        let Some(caps) = re.captures(content) else {
            continue;
        };
        let value = match caps[1].parse::<u64>() {
            Ok(v) => v,
            Err(err) => {
                warn!("summary counter {label:?} out of range: {err}");
                0
            }
        };
        if let Some(slot) = record.counter_mut(key) {
            *slot = value;
        }
    }

    record
}

/// Reads `reports/summary.txt` under `workdir`.
///
/// `Ok(None)` means the artifact does not exist; an existing but empty
/// file yields all-zero counters.
pub fn load_summary(workdir: &Path) -> Result<Option<ResultRecord>> {
    let path = workdir.join(SUMMARY_PATH);
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("reading summary: {}", path.display()))?;
    Ok(Some(parse_summary(&content, workdir)))
}
