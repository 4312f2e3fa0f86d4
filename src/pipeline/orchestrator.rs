// 全ジョブ実行

use tracing::{info, warn};

use crate::pipeline::job_runner::{JobConfig, JobResult, run_job};

/// Run multiple jobs, collecting results.
/// One job failure does NOT prevent other jobs from running.
pub fn run_all_jobs(jobs: &[JobConfig]) -> Vec<crate::error::Result<JobResult>> {
    let results: Vec<_> = jobs.iter().map(run_job).collect();
    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        warn!(total = jobs.len(), failed, "jobs_finished_with_errors");
    } else {
        info!(total = jobs.len(), "jobs_finished");
    }
    results
}
