//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;

use chrono::{DateTime, Local, TimeZone};
use git2::{Oid, Repository, Signature, Time};

use workscribe::{DateRange, ReportKind, ReportQuery};

/// Local timestamp helper.
pub fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Local> {
    Local
        .with_ymd_and_hms(y, m, d, h, min, 0)
        .single()
        .expect("Ambiguous or invalid local time in test")
}

/// Query spanning whole local days from `start` to `end`.
pub fn days_query(start: (i32, u32, u32), end: (i32, u32, u32)) -> ReportQuery {
    let range = DateRange::new(
        local(start.0, start.1, start.2, 0, 0),
        Local
            .with_ymd_and_hms(end.0, end.1, end.2, 23, 59, 59)
            .single()
            .expect("Invalid end time in test"),
    );
    ReportQuery::new(ReportKind::Custom, range)
}

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").expect("Failed to set user.name");
            config
                .set_str("user.email", "test@example.com")
                .expect("Failed to set user.email");
        }
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file into the working tree without staging it.
    pub fn write(&self, file: &str, content: &str) {
        let full = self.dir.path().join(file);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(full, content).expect("Failed to write test file");
    }

    /// Stage a file already present in the working tree.
    pub fn stage(&self, file: &str) {
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(file)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Commit `files` as author `author` at `when`. Returns the commit OID.
    pub fn commit_as(
        &self,
        author: &str,
        when: DateTime<Local>,
        message: &str,
        files: &[(&str, &str)],
    ) -> Oid {
        for (file, content) in files {
            self.write(file, content);
            self.stage(file);
        }

        let email = format!("{}@example.com", author.to_lowercase().replace(' ', "."));
        let time = Time::new(when.timestamp(), when.offset().local_minus_utc() / 60);
        let sig = Signature::new(author, &email, &time).expect("Failed to create signature");

        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        // Get parent commit if exists
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Commit one file as "Test User" at `when`.
    pub fn commit_at(&self, when: DateTime<Local>, message: &str) -> Oid {
        let file = format!("{}.txt", message.replace(|c: char| !c.is_ascii_alphanumeric(), "_"));
        self.commit_as("Test User", when, message, &[(&file, message)])
    }
}

/// First 8 characters of an OID, matching the provider's commit ids.
pub fn short(oid: Oid) -> String {
    oid.to_string()[..8].to_string()
}
