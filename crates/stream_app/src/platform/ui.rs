use std::io::{self, Write};

use stream_core::PagingViewModel;

/// Incremental terminal renderer: rows go to `out`, everything else to `err`.
pub struct TerminalUi<O: Write, E: Write> {
    out: O,
    err: E,
    printed_rows: usize,
    last_status: Option<String>,
    empty_shown: bool,
}

impl<O: Write, E: Write> TerminalUi<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            printed_rows: 0,
            last_status: None,
            empty_shown: false,
        }
    }

    pub fn render(&mut self, view: &PagingViewModel) -> io::Result<()> {
        let status = match view.found {
            Some(found) => format!("{} | Found: {}", view.status_text, found),
            None => view.status_text.clone(),
        };
        if self.last_status.as_deref() != Some(status.as_str()) {
            writeln!(self.err, "{status}")?;
            self.last_status = Some(status);
        }

        for row in view.rows.iter().skip(self.printed_rows) {
            writeln!(self.out, "{row}")?;
        }
        self.printed_rows = self.printed_rows.max(view.rows.len());

        if view.settled && !self.empty_shown {
            if let Some(message) = view.empty_message {
                writeln!(self.err, "{message}")?;
                self.empty_shown = true;
            }
        }

        self.out.flush()?;
        self.err.flush()
    }

    pub fn alert(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.err, "error: {message}")?;
        self.err.flush()
    }

    /// Hint shown while more rows are available on request.
    pub fn prompt_more(&mut self, loaded: u64, total: u64) -> io::Result<()> {
        writeln!(self.err, "-- {loaded} of {total} loaded, Enter for more --")?;
        self.err.flush()
    }

    #[cfg(test)]
    fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}
