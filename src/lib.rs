//! Find OpenAPI event schemas that an application never references.
//!
//! `event-audit` clones the repository holding an OpenAPI specification,
//! parses every spec file in a chosen directory, and collects the schema
//! names that follow the event convention (the name contains a `.`, e.g.
//! `Order.Created`). Each event name is then searched as a literal whole word
//! across an application source tree, and the names with no occurrence are
//! reported.
//!
//! # Features
//!
//! - Fresh clone per run, removed on every exit path
//! - YAML and JSON spec files, with `$ref` resolution checked per document
//! - All-or-nothing parsing: one invalid file fails the run
//! - Bounded parallel search with a per-search timeout
//! - `grep` or in-process search engine, both literal and whole-word
//! - Failed searches are reported separately, never as "unused"
//!
//! # Usage
//!
//! ```no_run
//! use event_audit::{audit, config::AuditConfig};
//!
//! # async fn demo() -> event_audit::error::Result<()> {
//! let config = AuditConfig::new(
//!     "https://github.com/acme/events-api.git",
//!     "openapi",
//!     "../webapp/src",
//!     std::env::temp_dir(),
//! );
//! let report = audit::run_audit(&config).await?;
//! event_audit::report::print_events(report.unused());
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod events;
pub mod repo;
pub mod report;
pub mod scan;
pub mod spec;
