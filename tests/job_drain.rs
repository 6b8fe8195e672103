use recon_hub::{
    classify::LineEvent,
    extract::ResultRecord,
    job::{Job, JobId, JobStatus, LogKind},
};
use std::sync::Arc;

fn job() -> Job {
    Job::new(JobId::new("job-1"), "example.com", 0, 100)
}

#[test]
fn second_poll_without_output_is_empty() {
    let job = job();
    job.push_log(LogKind::Info, "one");
    job.push_log(LogKind::Success, "two");

    let first = job.drain();
    assert_eq!(first.logs.len(), 2);
    assert_eq!(first.logs[0].message, "one");
    assert_eq!(first.logs[1].kind, LogKind::Success);

    let second = job.drain();
    assert!(second.logs.is_empty());
    assert_eq!(second.status, first.status);
    assert_eq!(second.phase, first.phase);
    assert_eq!(second.cursor, 2);
}

#[test]
fn drain_is_complete_and_ordered_under_concurrent_production() {
    const N: u64 = 5_000;
    let job = Arc::new(job());

    let producer = {
        let job = job.clone();
        std::thread::spawn(move || {
            for i in 0..N {
                job.push_log(LogKind::Info, format!("line {i}"));
            }
        })
    };

    let mut seen = Vec::new();
    while !producer.is_finished() {
        seen.extend(job.drain().logs);
    }
    producer.join().expect("producer thread");
    seen.extend(job.drain().logs);

    assert_eq!(seen.len() as u64, N);
    for (i, entry) in seen.iter().enumerate() {
        assert_eq!(entry.seq, i as u64 + 1);
        assert_eq!(entry.message, format!("line {i}"));
    }
}

#[test]
fn cursor_reads_do_not_consume_the_drain_queue() {
    let job = job();
    job.push_log(LogKind::Info, "a");
    job.push_log(LogKind::Info, "b");
    job.push_log(LogKind::Info, "c");

    let tail = job.read_since(1);
    assert_eq!(
        tail.logs.iter().map(|e| e.message.as_str()).collect::<Vec<_>>(),
        vec!["b", "c"]
    );
    assert_eq!(tail.cursor, 3);
    assert!(job.read_since(3).logs.is_empty());

    assert_eq!(job.drain().logs.len(), 3);
    assert_eq!(job.read_since(0).logs.len(), 3);
}

#[test]
fn history_is_bounded() {
    let job = Job::new(JobId::new("j"), "example.com", 0, 2);
    for m in ["a", "b", "c"] {
        job.push_log(LogKind::Info, m);
    }
    let all = job.read_since(0);
    assert_eq!(
        all.logs.iter().map(|e| e.seq).collect::<Vec<_>>(),
        vec![2, 3]
    );
    assert_eq!(job.drain().logs.len(), 3);
}

#[test]
fn phase_events_update_phase_and_log() {
    let job = job();
    job.apply(vec![
        LineEvent::Phase { phase: 3 },
        LineEvent::Log {
            kind: LogKind::Info,
            message: "Phase 3: JavaScript Extraction started".into(),
        },
    ]);
    let snap = job.drain();
    assert_eq!(snap.phase, 3);
    assert_eq!(snap.logs.len(), 1);
}

#[test]
fn terminal_status_is_final_and_results_only_on_success() {
    let job = job();
    let record = ResultRecord {
        total_subs: 5,
        ..Default::default()
    };
    job.finish(true, Some(record.clone()), "done");
    job.fail("late failure");

    let snap = job.drain();
    assert_eq!(snap.status, JobStatus::Completed);
    assert_eq!(snap.results, Some(record));
    assert_eq!(snap.logs.len(), 1);
    assert_eq!(snap.logs[0].kind, LogKind::Success);

    let failed = Job::new(JobId::new("f"), "example.com", 1, 10);
    failed.finish(false, Some(ResultRecord::default()), "Script exited with code 2");
    let snap = failed.drain();
    assert_eq!(snap.status, JobStatus::Failed);
    assert!(snap.results.is_none());
    assert!(failed.results().is_none());
}

#[test]
fn results_hidden_while_running() {
    let job = job();
    assert_eq!(job.status(), JobStatus::Running);
    assert!(job.drain().results.is_none());
}
