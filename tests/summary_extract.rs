use recon_hub::extract::{ResultRecord, SUMMARY_PATH, load_summary, parse_summary};
use std::path::Path;

#[test]
fn listed_counters_are_read_and_rest_default_to_zero() {
    let record = parse_summary(
        "Total Subdomains:   42\nCritical Subdomains: 3\n",
        Path::new("example.com_recon_1"),
    );
    assert_eq!(
        record,
        ResultRecord {
            total_subs: 42,
            critical_subs: 3,
            workdir: "example.com_recon_1".into(),
            ..Default::default()
        }
    );
}

#[test]
fn full_summary() {
    let text = "\
RECON SUMMARY
=============
Total Subdomains:      120
Critical Subdomains:   4
Alive Hosts:           57
JavaScript Files:      310
Wayback URLs:          9001
API Endpoints:         12
Subdomain Takeovers:   1
Exposures:             6
CVEs:                  2
";
    let r = parse_summary(text, Path::new("w"));
    assert_eq!(r.total_subs, 120);
    assert_eq!(r.critical_subs, 4);
    assert_eq!(r.alive_hosts, 57);
    assert_eq!(r.js_files, 310);
    assert_eq!(r.wayback_urls, 9001);
    assert_eq!(r.api_endpoints, 12);
    assert_eq!(r.takeovers, 1);
    assert_eq!(r.exposures, 6);
    assert_eq!(r.cves, 2);
}

#[test]
fn missing_artifact_is_distinct_from_empty_artifact() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(load_summary(dir.path()).expect("load").is_none());

    let reports = dir.path().join("reports");
    std::fs::create_dir_all(&reports).expect("mkdir");
    std::fs::write(dir.path().join(SUMMARY_PATH), "").expect("write");

    let record = load_summary(dir.path()).expect("load").expect("present");
    assert_eq!(record.total_subs, 0);
    assert_eq!(record.cves, 0);
    assert_eq!(record.workdir, dir.path().display().to_string());
}
