#![allow(dead_code)]

use recon_hub::{config::Config, service::ReconService};
use std::path::Path;

pub const SUCCESS_SCRIPT: &str = r#"
d="$1"
echo "========== PHASE 1: SUBDOMAIN ENUMERATION =========="
printf '\033[1;32m[+]\033[0m Found 3 subdomains\n'
echo "[*] probing hosts"
echo "[!] nuclei templates missing" >&2
echo "noise that should be dropped"
echo "========== PHASE 6: REPORT GENERATION =========="
dir="${d}_recon_20260101_120000"
mkdir -p "$dir/reports" "$dir/subdomains"
printf 'Total Subdomains:   3\nAlive Hosts: 2\n' > "$dir/reports/summary.txt"
printf 'a.%s\n\n   b.%s  \n' "$d" "$d" > "$dir/subdomains/all_subdomains.txt"
printf '# Recon report for %s\n' "$d" > "$dir/reports/recon_report.md"
exit 0
"#;

pub const FAILING_SCRIPT: &str = r#"
echo "[*] starting"
exit 3
"#;

pub const NO_SUMMARY_SCRIPT: &str = r#"
mkdir -p "$1_recon_20260101_000000/alive"
echo "[+] done without summary"
"#;

pub const SLOW_SCRIPT: &str = r#"
echo "[*] warming up"
sleep 1
mkdir -p "$1_recon_20260101_000000/subdomains"
echo "sub.$1" > "$1_recon_20260101_000000/subdomains/all_subdomains.txt"
"#;

pub fn config_for(dir: &Path, script_body: &str) -> Config {
    let script = dir.join("pipeline.sh");
    std::fs::write(&script, script_body).expect("write script");
    let mut cfg = Config::default();
    cfg.pipeline.interpreter = "sh".into();
    cfg.pipeline.script = script.display().to_string();
    cfg.paths.work_root = dir.display().to_string();
    cfg
}

pub fn service_for(dir: &Path, script_body: &str) -> ReconService {
    ReconService::from_config(&config_for(dir, script_body)).expect("build service")
}
