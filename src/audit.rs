//! The audit pipeline: clone, load specs, extract events, scan, clean up.

use crate::config::AuditConfig;
use crate::error::Result;
use crate::events::collect_events;
use crate::repo::ClonedRepo;
use crate::report;
use crate::scan::{ScanReport, find_unused_events};
use crate::spec::{collect_spec_paths, parse_documents, spec_dir, spec_file_names};

/// Outcome of a completed run.
#[derive(Debug, Default)]
pub struct AuditReport {
    /// Spec files parsed.
    pub documents: usize,
    /// Event names extracted, duplicates included.
    pub events: usize,
    pub scan: ScanReport,
}

impl AuditReport {
    /// Events with a confirmed zero-match search, in extraction order.
    pub fn unused(&self) -> &[String] {
        &self.scan.unused
    }
}

/// Run the whole audit described by `config`.
///
/// The clone is removed before this returns, whether it succeeds or fails,
/// unless `config.keep_clone` is set.
pub async fn run_audit(config: &AuditConfig) -> Result<AuditReport> {
    let progress = |msg: &str| {
        if !config.quiet {
            eprintln!("{msg}");
        }
    };

    progress("Cloning repository...");
    let repo = ClonedRepo::fetch(&config.git, &config.work_dir)
        .await?
        .keep(config.keep_clone);

    let spec_dir = spec_dir(repo.path(), &config.spec);
    let names = spec_file_names(&spec_dir).await?;
    let paths = collect_spec_paths(&names, &spec_dir);

    progress("Analyzing specification...");
    let documents = parse_documents(&paths).await?;

    progress("Collecting unused events...");
    let events = collect_events(&documents)?;
    if !config.quiet {
        eprintln!(
            "Found {} events in {} spec files",
            events.len(),
            documents.len()
        );
    }
    let scan = find_unused_events(&events, &config.app_dir, &config.scan).await?;

    progress("Cleaning up temporary files...");
    repo.cleanup().await?;

    if !config.quiet {
        report::print_done();
    }
    Ok(AuditReport {
        documents: documents.len(),
        events: events.len(),
        scan,
    })
}
