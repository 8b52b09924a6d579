use std::io::Write;

use crate::report::{Reporter, Summary, Tally};

/// Terse output: only failing assertions (with their test case) and a
/// closing count line.
pub struct SummaryReporter<W: Write + Send> {
    out: W,
    tally: Tally,
    current: String,
}

impl<W: Write + Send> SummaryReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            tally: Tally::default(),
            current: String::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> Reporter for SummaryReporter<W> {
    fn begin_test(&mut self, name: &str) {
        self.tally.begin();
        self.current = name.to_string();
    }

    fn plan(&mut self, count: usize) {
        self.tally.plan(count);
    }

    fn assert(&mut self, ok: bool, message: &str) {
        self.tally.record(ok);
        if !ok {
            let _ = writeln!(self.out, "FAIL [{}] {message}", self.current);
            let _ = self.out.flush();
        }
    }

    fn comment(&mut self, _message: &str) {}

    fn end_test(&mut self) {
        if let Some((planned, actual)) = self.tally.end() {
            self.assert(
                false,
                &format!("plan != count (expected {planned}, got {actual})"),
            );
        }
    }

    fn finish(&mut self) -> Summary {
        let summary = self.tally.summary;
        let test_word = if summary.tests == 1 { "test" } else { "tests" };
        let _ = writeln!(
            self.out,
            "{} {test_word}, {} passed, {} failed",
            summary.tests, summary.pass, summary.fail
        );
        let _ = self.out.flush();
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_failures_are_printed() {
        let mut reporter = SummaryReporter::new(Vec::new());
        reporter.begin_test("repos");
        reporter.plan(2);
        reporter.assert(true, "a (u1)");
        reporter.comment("Attempting --fix on b (u2)");
        reporter.assert(false, "b (u2) with --fix");
        reporter.end_test();
        let summary = reporter.finish();
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(
            out,
            "FAIL [repos] b (u2) with --fix\n2 tests, 1 passed, 1 failed\n"
        );
        assert!(!summary.is_ok());
    }

    #[test]
    fn plan_mismatch_is_a_failure() {
        let mut reporter = SummaryReporter::new(Vec::new());
        reporter.begin_test("repos");
        reporter.plan(2);
        reporter.end_test();
        let summary = reporter.finish();
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert!(out.contains("FAIL [repos] plan != count (expected 2, got 0)"));
        assert_eq!(summary.fail, 1);
    }

    #[test]
    fn singular_test_word() {
        let mut reporter = SummaryReporter::new(Vec::new());
        reporter.begin_test("repos");
        reporter.assert(true, "a");
        reporter.end_test();
        reporter.finish();
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(out, "1 test, 1 passed, 0 failed\n");
    }
}
