use std::fmt::Write;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUrl {
    pub url: String,
    pub reason: String,
}

/// Run counters. Owned by one orchestration call and handed back to the caller.
#[derive(Debug, Clone)]
pub struct CrawlStats {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub failures: Vec<FailedUrl>,
    pub interrupted: bool,
    started_at: Instant,
    finished_at: Option<Instant>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            total: 0,
            successful: 0,
            failed: 0,
            failures: Vec::new(),
            interrupted: false,
            started_at: Instant::now(),
            finished_at: None,
        }
    }

    pub fn with_total(total: usize) -> Self {
        Self {
            total,
            ..Self::new()
        }
    }

    pub fn record_success(&mut self) {
        self.successful += 1;
    }

    pub fn record_failure(&mut self, url: impl Into<String>, reason: impl Into<String>) {
        self.failed += 1;
        self.failures.push(FailedUrl {
            url: url.into(),
            reason: reason.into(),
        });
    }

    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    pub fn finish(&mut self) {
        if self.finished_at.is_none() {
            self.finished_at = Some(Instant::now());
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Elapsed time until `finish`, or until now for a run still in progress.
    pub fn duration(&self) -> Duration {
        let end = self.finished_at.unwrap_or_else(Instant::now);
        end.duration_since(self.started_at)
    }

    pub fn report(&self) -> String {
        let rule = "=".repeat(60);
        let mut out = String::new();
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Final statistics");
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "Succeeded: {}/{}", self.successful, self.total);
        let _ = writeln!(out, "Failed:    {}/{}", self.failed, self.total);
        let _ = writeln!(out, "Duration:  {:.1}s", self.duration().as_secs_f64());
        if self.interrupted {
            let _ = writeln!(out, "Run interrupted before completion");
        }
        for failure in &self.failures {
            let _ = writeln!(out, "  failed {}: {}", failure.url, failure.reason);
        }
        let _ = write!(out, "{rule}");
        out
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}
