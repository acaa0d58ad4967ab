use std::io::{self, Write};

use super::UiCommand;

/// Prints the surface to a terminal.
///
/// A line announces each query when it starts; the full marker table is
/// printed when it settles or an error appears.
pub struct TerminalSurface<W: Write> {
    out: W,
    heading: String,
    markers: Vec<(String, bool)>,
    error: Option<String>,
    busy: bool,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            heading: String::new(),
            markers: Vec::new(),
            error: None,
            busy: false,
        }
    }

    pub fn apply(&mut self, commands: Vec<UiCommand>) -> io::Result<()> {
        let was_busy = self.busy;
        let previous_error = self.error.clone();

        for command in commands {
            match command {
                UiCommand::SetHeading(text) => self.heading = text,
                UiCommand::SetMarker {
                    index,
                    label,
                    checked,
                } => {
                    if self.markers.len() <= index {
                        self.markers.resize(index + 1, (String::new(), false));
                    }
                    self.markers[index] = (label, checked);
                }
                UiCommand::SetError(error) => self.error = error,
                UiCommand::SetBusy(busy) => self.busy = busy,
            }
        }

        if self.busy && !was_busy {
            writeln!(self.out, "{} ... checking", self.heading)?;
        }
        let settled = was_busy && !self.busy;
        let new_error = self.error.is_some() && self.error != previous_error;
        if settled || new_error {
            self.print_table()?;
        }
        self.out.flush()
    }

    fn print_table(&mut self) -> io::Result<()> {
        writeln!(self.out, "{}", self.heading)?;
        for (label, checked) in &self.markers {
            let mark = if *checked { "x" } else { " " };
            writeln!(self.out, "  [{mark}] {label}")?;
        }
        if let Some(error) = &self.error {
            writeln!(self.out, "  {error}")?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
