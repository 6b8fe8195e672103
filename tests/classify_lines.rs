use recon_hub::{
    classify::{LineEvent, PHASE_MARKERS, classify_line},
    job::LogKind,
    util::strip_ansi,
};

fn log(kind: LogKind, message: &str) -> LineEvent {
    LineEvent::Log {
        kind,
        message: message.to_string(),
    }
}

#[test]
fn success_marker_yields_trimmed_message() {
    assert_eq!(
        classify_line("[+] Found 42 subdomains   "),
        vec![log(LogKind::Success, "Found 42 subdomains")]
    );
}

#[test]
fn success_takes_priority_over_error_and_info() {
    let events = classify_line("[*] retry [+] recovered [!] earlier failure");
    assert_eq!(events, vec![log(LogKind::Success, "recovered [!] earlier failure")]);
}

#[test]
fn error_markers_take_priority_over_info() {
    assert_eq!(
        classify_line("[*] step [!] subfinder crashed"),
        vec![log(LogKind::Error, "subfinder crashed")]
    );
    assert_eq!(
        classify_line("[*] httpx Error: connection refused"),
        vec![log(LogKind::Error, "connection refused")]
    );
}

#[test]
fn info_marker() {
    assert_eq!(
        classify_line("[*] Running amass"),
        vec![log(LogKind::Info, "Running amass")]
    );
}

#[test]
fn unmarked_lines_are_dropped() {
    for line in ["", "plain output", "https://a.example.com", "error: lowercase"] {
        assert!(classify_line(line).is_empty(), "line {line:?}");
    }
}

#[test]
fn every_phase_header_sets_phase_and_logs_once() {
    for (phase, marker, announcement) in PHASE_MARKERS {
        let line = format!("========== {marker} ==========");
        let events = classify_line(&line);
        assert_eq!(
            events,
            vec![
                LineEvent::Phase { phase },
                log(LogKind::Info, announcement),
            ],
            "marker {marker}"
        );
    }
}

#[test]
fn phase_header_with_marker_emits_both() {
    let events = classify_line("[*] PHASE 2: LIVE HOST DETECTION");
    assert_eq!(
        events,
        vec![
            LineEvent::Phase { phase: 2 },
            log(LogKind::Info, "Phase 2: Live Host Detection started"),
            log(LogKind::Info, "PHASE 2: LIVE HOST DETECTION"),
        ]
    );
}

#[test]
fn phase_marker_is_case_sensitive() {
    assert!(classify_line("phase 1: subdomain enumeration").is_empty());
}

#[test]
fn ansi_sequences_are_removed_before_classification() {
    let raw = "\x1b[1;32m[+]\x1b[0m Alive hosts: 7\x1b[K";
    let clean = strip_ansi(raw);
    assert_eq!(clean, "[+] Alive hosts: 7");
    assert_eq!(
        classify_line(&clean),
        vec![log(LogKind::Success, "Alive hosts: 7")]
    );
}
