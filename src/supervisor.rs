use crate::{
    classify::classify_line,
    engine::Engine,
    extract,
    job::{Job, LogKind},
    util::{decode_line, strip_ansi},
    workdir,
};
use anyhow::{Context, Result, anyhow};
use std::io::{BufRead, BufReader, PipeReader};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Drives one pipeline run from spawn to terminal status.
pub struct Supervisor {
    engine: Arc<dyn Engine>,
    work_root: PathBuf,
    channel_capacity: usize,
}

impl Supervisor {
    pub fn new(engine: Arc<dyn Engine>, work_root: PathBuf, channel_capacity: usize) -> Self {
        Self {
            engine,
            work_root,
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Runs the job to completion. Never returns an error: every fault ends
    /// up as a `failed` status with a log entry on the job.
    pub async fn run(&self, job: Arc<Job>) {
        info!("job {} started domain={}", job.id(), job.domain());
        match self.drive(&job).await {
            Ok(()) => info!("job {} finished status={:?}", job.id(), job.status()),
            Err(err) => {
                error!("job {} supervisor error: {err:#}", job.id());
                job.fail(format!("Error running script: {err:#}"));
            }
        }
    }

    async fn drive(&self, job: &Job) -> Result<()> {
        let before = workdir::matching_dirs(&self.work_root, job.domain())?;

        // stdout and stderr share one pipe so lines arrive in the order the
        // child wrote them.
        let (output, writer) = std::io::pipe().with_context(|| "creating output pipe")?;
        let mut cmd = self.engine.command(job.domain());
        cmd.stdout(Stdio::from(
            writer.try_clone().with_context(|| "cloning output pipe")?,
        ));
        cmd.stderr(Stdio::from(writer));
        let spawned = cmd.spawn();
        // The command holds the parent's copies of the write end; the reader
        // only sees end-of-stream once they are gone.
        drop(cmd);
        let mut child = spawned.with_context(|| "spawning pipeline")?;

        let (tx, mut rx) = mpsc::channel::<String>(self.channel_capacity);
        let reader = tokio::task::spawn_blocking(move || forward_lines(output, tx));

        while let Some(raw) = rx.recv().await {
            let line = strip_ansi(&raw);
            let line = line.trim();
            let events = classify_line(line);
            if !events.is_empty() {
                debug!("job {} line={line:?} events={}", job.id(), events.len());
            }
            job.apply(events);
        }

        reader
            .await
            .map_err(|e| anyhow!("output reader task failed: {e}"))?
            .with_context(|| "reading pipeline output")?;

        let status = child.wait().await.with_context(|| "waiting for pipeline")?;

        let results = match workdir::resolve(&self.work_root, job.domain(), &before)? {
            Some(dir) => {
                info!("job {} workdir={}", job.id(), dir.display());
                job.set_workdir(&dir);
                match extract::load_summary(&dir) {
                    Ok(found) => {
                        if found.is_none() {
                            debug!("job {} has no summary artifact", job.id());
                        }
                        found
                    }
                    Err(err) => {
                        warn!("job {} summary unreadable: {err:#}", job.id());
                        job.push_log(LogKind::Error, format!("Failed to parse results: {err:#}"));
                        None
                    }
                }
            }
            None => {
                warn!("job {} left no work directory", job.id());
                None
            }
        };

        finish(job, status, results);
        Ok(())
    }
}

fn finish(job: &Job, status: ExitStatus, results: Option<extract::ResultRecord>) {
    if status.success() {
        job.finish(true, results, "Reconnaissance completed successfully!");
        return;
    }
    match status.code() {
        Some(code) => job.fail(format!("Script exited with code {code}")),
        None => job.fail("Script terminated by signal"),
    }
}

fn forward_lines(output: PipeReader, tx: mpsc::Sender<String>) -> Result<()> {
    let mut reader = BufReader::new(output);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(());
        }
        if tx.blocking_send(decode_line(&buf)).is_err() {
            return Ok(());
        }
    }
}
