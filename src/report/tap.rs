use std::io::Write;

use crate::report::{Reporter, Summary, Tally};

/// TAP version 13 output, one line per event, flushed as it is written.
pub struct TapReporter<W: Write + Send> {
    out: W,
    tally: Tally,
    started: bool,
}

impl<W: Write + Send> TapReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            tally: Tally::default(),
            started: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn header(&mut self) {
        if !self.started {
            self.started = true;
            let _ = writeln!(self.out, "TAP version 13");
        }
    }
}

impl<W: Write + Send> Reporter for TapReporter<W> {
    fn begin_test(&mut self, name: &str) {
        self.header();
        self.tally.begin();
        let _ = writeln!(self.out, "# {name}");
        let _ = self.out.flush();
    }

    fn plan(&mut self, count: usize) {
        self.tally.plan(count);
    }

    fn assert(&mut self, ok: bool, message: &str) {
        self.header();
        let id = self.tally.record(ok);
        let status = if ok { "ok" } else { "not ok" };
        let _ = writeln!(self.out, "{status} {id} {message}");
        let _ = self.out.flush();
    }

    fn comment(&mut self, message: &str) {
        self.header();
        for line in message.lines() {
            let _ = writeln!(self.out, "# {line}");
        }
        let _ = self.out.flush();
    }

    fn end_test(&mut self) {
        if let Some((planned, actual)) = self.tally.end() {
            self.assert(false, "plan != count");
            let _ = writeln!(self.out, "  ---");
            let _ = writeln!(self.out, "    operator: fail");
            let _ = writeln!(self.out, "    expected: {planned}");
            let _ = writeln!(self.out, "    actual:   {actual}");
            let _ = writeln!(self.out, "  ...");
            let _ = self.out.flush();
        }
    }

    fn finish(&mut self) -> Summary {
        self.header();
        let summary = self.tally.summary;
        let _ = writeln!(self.out);
        let _ = writeln!(self.out, "1..{}", summary.tests);
        let _ = writeln!(self.out, "# tests {}", summary.tests);
        let _ = writeln!(self.out, "# pass  {}", summary.pass);
        if summary.fail > 0 {
            let _ = writeln!(self.out, "# fail  {}", summary.fail);
        } else {
            let _ = writeln!(self.out);
            let _ = writeln!(self.out, "# ok");
        }
        let _ = self.out.flush();
        summary
    }
}
