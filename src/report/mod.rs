pub mod summary;
pub mod tap;

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use serde::Deserialize;

pub use summary::SummaryReporter;
pub use tap::TapReporter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Tap,
    Summary,
}

/// Assertion totals across every test case of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub tests: usize,
    pub pass: usize,
    pub fail: usize,
}

impl Summary {
    pub fn is_ok(&self) -> bool {
        self.fail == 0
    }
}

/// Test-reporting sink. A run is a sequence of named test cases; each case
/// may declare a plan, and a case whose assertion count differs from its
/// plan fails with a `plan != count` assertion when it ends.
pub trait Reporter: Send {
    fn begin_test(&mut self, name: &str);
    fn plan(&mut self, count: usize);
    fn assert(&mut self, ok: bool, message: &str);
    fn comment(&mut self, message: &str);
    fn end_test(&mut self);
    /// Write the footer and return the totals.
    fn finish(&mut self) -> Summary;
}

pub fn create_reporter(
    format: ReportFormat,
    out: Box<dyn Write + Send>,
) -> Box<dyn Reporter> {
    match format {
        ReportFormat::Tap => Box::new(TapReporter::new(out)),
        ReportFormat::Summary => Box::new(SummaryReporter::new(out)),
    }
}

/// Counting shared by the reporters.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    pub summary: Summary,
    planned: Option<usize>,
    in_test: usize,
}

impl Tally {
    pub fn begin(&mut self) {
        self.planned = None;
        self.in_test = 0;
    }

    pub fn plan(&mut self, count: usize) {
        self.planned = Some(count);
    }

    /// Record one assertion and return its 1-based id.
    pub fn record(&mut self, ok: bool) -> usize {
        self.summary.tests += 1;
        self.in_test += 1;
        if ok {
            self.summary.pass += 1;
        } else {
            self.summary.fail += 1;
        }
        self.summary.tests
    }

    /// Close the current test case. Returns `(planned, actual)` on mismatch.
    pub fn end(&mut self) -> Option<(usize, usize)> {
        let actual = std::mem::take(&mut self.in_test);
        self.planned
            .take()
            .filter(|&planned| planned != actual)
            .map(|planned| (planned, actual))
    }
}

/// A reporter shared between worker threads. Every event is written under
/// the lock, so lines from different projects never interleave.
pub struct SharedReporter<'a> {
    inner: Mutex<&'a mut dyn Reporter>,
}

impl<'a> SharedReporter<'a> {
    pub fn new(reporter: &'a mut dyn Reporter) -> Self {
        Self {
            inner: Mutex::new(reporter),
        }
    }

    pub fn assert(&self, ok: bool, message: &str) {
        self.lock().assert(ok, message);
    }

    pub fn pass(&self, message: &str) {
        self.assert(true, message);
    }

    pub fn fail(&self, message: &str) {
        self.assert(false, message);
    }

    pub fn comment(&self, message: &str) {
        self.lock().comment(message);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, &'a mut dyn Reporter> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
