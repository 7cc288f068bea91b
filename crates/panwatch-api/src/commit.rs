// Commit endpoint and job polling
//
// `type=commit` enqueues a job and returns its id. A synchronous commit
// then polls `show jobs id N` until the job reports `FIN`.

use tokio::time::Instant;

use tracing::{debug, info};

use crate::client::XmlApiClient;
use crate::error::Error;
use crate::models::{XmlResponse, child, child_text, collect_text};

/// Result of a commit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The candidate configuration matched the running one.
    NoChanges,
    /// Job enqueued; the caller did not ask to wait.
    Queued { job_id: u64 },
    /// Job finished with result `OK`.
    Completed { job_id: u64, details: String },
}

/// Snapshot of a commit job's state from `show jobs id N`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct JobStatus {
    status: String,
    result: String,
    details: String,
}

impl XmlApiClient {
    /// Commit the candidate configuration.
    ///
    /// `POST /api/` with `type=commit&cmd=<commit></commit>`. With
    /// `synchronous` set, blocks until the job finishes; a job result other
    /// than `OK` is returned as [`Error::CommitFailed`].
    pub async fn commit(&self, synchronous: bool) -> Result<CommitOutcome, Error> {
        debug!(synchronous, "requesting commit");
        let resp = self
            .request(&[("type", "commit"), ("cmd", "<commit></commit>")])
            .await?;

        let Some(job_id) = parse_job_id(&resp)? else {
            info!("commit skipped: no pending changes");
            return Ok(CommitOutcome::NoChanges);
        };

        if !synchronous {
            return Ok(CommitOutcome::Queued { job_id });
        }

        info!(job_id, "commit enqueued, waiting for completion");
        self.wait_for_job(job_id).await
    }

    async fn wait_for_job(&self, job_id: u64) -> Result<CommitOutcome, Error> {
        let started = Instant::now();
        loop {
            let resp = self.show_job(job_id).await?;
            let job = parse_job_status(&resp)?;
            debug!(job_id, status = %job.status, result = %job.result, "commit job polled");

            if job.status.eq_ignore_ascii_case("FIN") {
                return if job.result.eq_ignore_ascii_case("OK") {
                    info!(job_id, "commit completed");
                    Ok(CommitOutcome::Completed {
                        job_id,
                        details: job.details,
                    })
                } else {
                    Err(Error::CommitFailed {
                        job_id,
                        details: if job.details.is_empty() {
                            format!("job result {}", job.result)
                        } else {
                            job.details
                        },
                    })
                };
            }

            if started.elapsed() >= self.commit_timeout {
                return Err(Error::Timeout {
                    timeout_secs: self.commit_timeout.as_secs(),
                });
            }
            tokio::time::sleep(self.commit_poll_interval).await;
        }
    }
}

/// Extract `<result><job>N</job></result>` from a commit reply.
///
/// `None` means the device had nothing to commit.
fn parse_job_id(resp: &XmlResponse) -> Result<Option<u64>, Error> {
    let doc = resp.document()?;
    let Some(job) = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "job")
    else {
        return Ok(None);
    };
    let text = job.text().map(str::trim).unwrap_or_default();
    text.parse().map(Some).map_err(|_| Error::Xml {
        message: format!("invalid commit job id {text:?}"),
        body: resp.body().to_owned(),
    })
}

fn parse_job_status(resp: &XmlResponse) -> Result<JobStatus, Error> {
    let doc = resp.document()?;
    let job = doc
        .descendants()
        .find(|n| n.is_element() && n.tag_name().name() == "job")
        .ok_or_else(|| Error::Xml {
            message: "job status response has no <job> element".into(),
            body: resp.body().to_owned(),
        })?;

    Ok(JobStatus {
        status: child_text(job, "status").unwrap_or_default(),
        result: child_text(job, "result").unwrap_or_default(),
        details: child(job, "details").map(collect_text).unwrap_or_default(),
    })
}
