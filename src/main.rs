use std::path::Path;
use std::process::ExitCode;

use pdf_redaction::config::job::JobFile;
use pdf_redaction::config::{self};
use pdf_redaction::pipeline::job_runner::JobConfig;
use pdf_redaction::pipeline::orchestrator::run_all_jobs;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: pdf_redaction <jobs.yaml>...");
        eprintln!("  Redact, merge, and split PDF files according to job specifications.");
        return if args.is_empty() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        };
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        eprintln!("pdf_redaction {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    init_tracing();

    let mut job_configs: Vec<JobConfig> = Vec::new();
    let mut has_error = false;

    for job_file_arg in &args {
        let job_file_path = Path::new(job_file_arg);

        // Load settings from the same directory as the job file.
        let settings = match config::load_settings_for_job(job_file_path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("ERROR: Failed to load settings for {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        let job_file = match JobFile::from_file(job_file_path) {
            Ok(jf) => jf,
            Err(e) => {
                eprintln!("ERROR: Failed to read job file {job_file_arg}: {e}");
                return ExitCode::FAILURE;
            }
        };

        // Resolve job file directory for relative paths.
        let job_dir = job_file_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        for (i, job) in job_file.jobs.iter().enumerate() {
            match JobConfig::from_job(job, &settings, &job_dir) {
                Ok(cfg) => job_configs.push(cfg),
                Err(e) => {
                    eprintln!("ERROR: {job_file_arg} job {} ({}): {e}", i + 1, job.kind());
                    has_error = true;
                }
            }
        }
    }

    let results = run_all_jobs(&job_configs);

    for (job, result) in job_configs.iter().zip(&results) {
        match result {
            Ok(job_result) => {
                let outputs: Vec<String> = job_result
                    .output_paths
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                eprintln!(
                    "OK: {} {} -> {} ({} pages)",
                    job_result.kind,
                    job_result.input_label,
                    outputs.join(", "),
                    job_result.pages_processed
                );
            }
            Err(e) => {
                eprintln!("ERROR: {} {}: {e}", job.kind(), job.input_label());
                has_error = true;
            }
        }
    }

    if has_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
