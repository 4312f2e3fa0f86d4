pub mod committer;
pub mod job_runner;
pub mod orchestrator;
