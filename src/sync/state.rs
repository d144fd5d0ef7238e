//! Per-filename retry bookkeeping for the folder watcher.

use std::collections::HashMap;

/// Default number of failed attempts before a file is abandoned.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Why the last attempt on a file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file could not be read.
    Read,
    /// The content replacement failed or timed out.
    Upload,
    /// The file could not be moved after a successful upload.
    Relocate,
}

/// Retry record for one filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileJob {
    pub attempts: u32,
    pub last_error: Option<ErrorKind>,
}

/// What to do with an eligible file on this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Attempt,
    Abandon,
}

/// Owned retry records, keyed by filename.
#[derive(Debug, Clone)]
pub struct JobTable {
    jobs: HashMap<String, FileJob>,
    max_attempts: u32,
}

impl Default for JobTable {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl JobTable {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            jobs: HashMap::new(),
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn get(&self, name: &str) -> Option<&FileJob> {
        self.jobs.get(name)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Abandon once the attempt cap has been reached.
    pub fn disposition(&self, name: &str) -> Disposition {
        match self.jobs.get(name) {
            Some(job) if job.attempts >= self.max_attempts => Disposition::Abandon,
            _ => Disposition::Attempt,
        }
    }

    /// Record a failed attempt; returns the new attempt count.
    pub fn record_failure(&mut self, name: &str, kind: ErrorKind) -> u32 {
        let job = self.jobs.entry(name.to_string()).or_default();
        job.attempts += 1;
        job.last_error = Some(kind);
        job.attempts
    }

    /// The file was relocated to the success folder; forget it.
    pub fn record_success(&mut self, name: &str) {
        self.jobs.remove(name);
    }

    /// The file was moved to the error folder; forget it.
    pub fn record_abandoned(&mut self, name: &str) -> Option<FileJob> {
        self.jobs.remove(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abandon_after_cap() {
        let mut jobs = JobTable::default();
        assert_eq!(jobs.disposition("a.pdf"), Disposition::Attempt);

        assert_eq!(jobs.record_failure("a.pdf", ErrorKind::Upload), 1);
        assert_eq!(jobs.record_failure("a.pdf", ErrorKind::Upload), 2);
        assert_eq!(jobs.disposition("a.pdf"), Disposition::Attempt);
        assert_eq!(jobs.record_failure("a.pdf", ErrorKind::Read), 3);
        assert_eq!(jobs.disposition("a.pdf"), Disposition::Abandon);
        assert_eq!(jobs.get("a.pdf").unwrap().last_error, Some(ErrorKind::Read));

        let job = jobs.record_abandoned("a.pdf").unwrap();
        assert_eq!(job.attempts, 3);
        assert!(jobs.is_empty());
        assert_eq!(jobs.disposition("a.pdf"), Disposition::Attempt);
    }

    #[test]
    fn test_success_clears_record() {
        let mut jobs = JobTable::new(2);
        jobs.record_failure("b.pdf", ErrorKind::Upload);
        jobs.record_success("b.pdf");
        assert!(jobs.get("b.pdf").is_none());
    }
}
