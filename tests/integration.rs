//! End-to-end tests for event-audit.
//!
//! Each test builds a local git repository holding spec files, clones it
//! through the real pipeline and scans a scratch application tree. They need
//! `git` and `grep` on `PATH`.

use std::path::{Path, PathBuf};
use std::process::Command;

use event_audit::audit::run_audit;
use event_audit::config::AuditConfig;
use event_audit::error::Error;
use event_audit::report::format_events;
use event_audit::scan::SearchEngine;

const ORIGIN_NAME: &str = "events-api";

const USERS_SPEC: &str = r#"
openapi: 3.0.3
info:
  title: Users
  version: 1.0.0
paths: {}
components:
  schemas:
    User:
      type: object
      properties:
        id:
          type: string
    User.Created:
      type: object
      properties:
        user:
          $ref: '#/components/schemas/User'
"#;

const DELETIONS_SPEC: &str = r#"
openapi: 3.0.3
info:
  title: Deletions
  version: 1.0.0
paths: {}
components:
  schemas:
    User.Deleted:
      type: object
      properties:
        id:
          type: string
"#;

const PLAIN_SPEC: &str = r#"
openapi: 3.0.3
info:
  title: Plain
  version: 1.0.0
paths: {}
components:
  schemas:
    Order:
      type: object
"#;

struct Fixture {
    _root: tempfile::TempDir,
    origin: PathBuf,
    work_dir: PathBuf,
    app_dir: PathBuf,
}

impl Fixture {
    /// A git repository whose `api/` directory holds `files`, plus an empty
    /// work dir and an application tree holding `app_source`.
    fn new(files: &[(&str, &str)], app_source: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        let origin = root.path().join(ORIGIN_NAME);
        let work_dir = root.path().join("work");
        let app_dir = root.path().join("app");

        std::fs::create_dir_all(origin.join("api")).unwrap();
        std::fs::create_dir_all(&work_dir).unwrap();
        std::fs::create_dir_all(app_dir.join("src")).unwrap();

        std::fs::write(origin.join("README.md"), "events\n").unwrap();
        for (name, content) in files {
            std::fs::write(origin.join("api").join(name), content).unwrap();
        }
        std::fs::write(app_dir.join("src/main.ts"), app_source).unwrap();

        git(&origin, &["init", "-q"]);
        git(&origin, &["add", "."]);
        git(
            &origin,
            &[
                "-c",
                "user.name=test",
                "-c",
                "user.email=test@example.com",
                "commit",
                "-q",
                "-m",
                "specs",
            ],
        );

        Self {
            _root: root,
            origin,
            work_dir,
            app_dir,
        }
    }

    fn config(&self) -> AuditConfig {
        AuditConfig::new(
            self.origin.to_string_lossy(),
            "api",
            &self.app_dir,
            &self.work_dir,
        )
    }

    fn clone_dir(&self) -> PathBuf {
        self.work_dir.join(ORIGIN_NAME)
    }
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .expect("git should be installed");
    assert!(status.success(), "git {args:?} failed");
}

#[tokio::test]
async fn reports_only_unreferenced_events() {
    let fixture = Fixture::new(
        &[("users.yaml", USERS_SPEC), ("deletions.yml", DELETIONS_SPEC)],
        "bus.publish('User.Created', user);\n",
    );

    let report = run_audit(&fixture.config()).await.expect("audit should succeed");

    assert_eq!(report.documents, 2);
    assert_eq!(report.events, 2);
    assert_eq!(report.unused(), ["User.Deleted"]);
    assert_eq!(report.scan.used, 1);
    assert!(report.scan.unchecked.is_empty());
    assert!(!fixture.clone_dir().exists());
}

#[tokio::test]
async fn builtin_engine_agrees_with_grep() {
    let fixture = Fixture::new(
        &[("users.yaml", USERS_SPEC), ("deletions.yml", DELETIONS_SPEC)],
        "bus.publish('User.Created', user);\n",
    );
    let mut config = fixture.config();
    config.scan.engine = SearchEngine::Builtin;

    let report = run_audit(&config).await.unwrap();
    assert_eq!(report.unused(), ["User.Deleted"]);
}

#[tokio::test]
async fn no_events_prints_only_header() {
    let fixture = Fixture::new(&[("plain.yaml", PLAIN_SPEC)], "");

    let report = run_audit(&fixture.config()).await.unwrap();

    assert_eq!(report.documents, 1);
    assert_eq!(report.events, 0);
    assert!(report.unused().is_empty());
    assert_eq!(format_events(report.unused()), "Unused events:\n");
}

#[tokio::test]
async fn json_only_spec_dir_yields_nothing() {
    let fixture = Fixture::new(
        &[("users.json", "{}"), ("old.json.bak", "not a spec")],
        "",
    );

    let report = run_audit(&fixture.config()).await.unwrap();

    assert_eq!(report.documents, 0);
    assert_eq!(report.events, 0);
    assert!(report.unused().is_empty());
    assert!(!fixture.clone_dir().exists());
}

#[tokio::test]
async fn invalid_spec_fails_and_removes_clone() {
    let fixture = Fixture::new(
        &[("users.yaml", USERS_SPEC), ("broken.yaml", "openapi: 3.0.3\npaths: {}\n")],
        "",
    );

    let err = run_audit(&fixture.config()).await.unwrap_err();

    assert!(matches!(err, Error::InvalidSpec { .. }), "{err}");
    assert!(!fixture.clone_dir().exists());
}

#[tokio::test]
async fn document_without_schemas_fails_and_removes_clone() {
    let fixture = Fixture::new(
        &[(
            "bare.yaml",
            "openapi: 3.0.3\ninfo:\n  title: Bare\n  version: '1'\npaths: {}\n",
        )],
        "",
    );

    let err = run_audit(&fixture.config()).await.unwrap_err();

    assert!(matches!(err, Error::MissingSchemas { .. }), "{err}");
    assert!(!fixture.clone_dir().exists());
}

#[tokio::test]
async fn missing_spec_dir_fails_and_removes_clone() {
    let fixture = Fixture::new(&[("users.yaml", USERS_SPEC)], "");
    let mut config = fixture.config();
    config.spec = "does/not/exist".to_string();

    let err = run_audit(&config).await.unwrap_err();

    assert!(matches!(err, Error::Read { .. }), "{err}");
    assert!(!fixture.clone_dir().exists());
}

#[tokio::test]
async fn bad_url_is_clone_error() {
    let fixture = Fixture::new(&[("users.yaml", USERS_SPEC)], "");
    let mut config = fixture.config();
    config.git = fixture.work_dir.join("missing.git").to_string_lossy().into_owned();

    let err = run_audit(&config).await.unwrap_err();

    assert!(matches!(err, Error::Clone { .. }), "{err}");
    assert!(!fixture.work_dir.join("missing").exists());
}

#[tokio::test]
async fn stale_clone_is_replaced_and_kept_on_request() {
    let fixture = Fixture::new(&[("users.yaml", USERS_SPEC)], "User.Created\n");
    std::fs::create_dir_all(fixture.clone_dir()).unwrap();
    std::fs::write(fixture.clone_dir().join("stale.txt"), "old").unwrap();

    let mut config = fixture.config();
    config.keep_clone = true;
    let report = run_audit(&config).await.unwrap();

    assert!(report.unused().is_empty());
    assert!(fixture.clone_dir().join("api/users.yaml").exists());
    assert!(!fixture.clone_dir().join("stale.txt").exists());
}

#[tokio::test]
async fn unreadable_app_dir_marks_events_unchecked() {
    let fixture = Fixture::new(&[("deletions.yml", DELETIONS_SPEC)], "");
    let mut config = fixture.config();
    config.app_dir = fixture.work_dir.join("no-app-here");

    let report = run_audit(&config).await.unwrap();

    assert!(report.unused().is_empty());
    assert_eq!(report.scan.unchecked.len(), 1);
    assert_eq!(report.scan.unchecked[0].name, "User.Deleted");
}
