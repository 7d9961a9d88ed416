use std::io::{self, Write};

/// Clears the screen and moves the cursor to the top left corner.
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Writes frames of text lines to a terminal.
pub struct Renderer<W: Write> {
    out: W,
    clear_screen: bool,
}

impl<W: Write> Renderer<W> {
    pub const fn new(out: W, clear_screen: bool) -> Self {
        Self { out, clear_screen }
    }

    /// Writes one frame, replacing the previous one when clearing is enabled.
    ///
    /// # Errors
    ///
    /// This function will return an error if writing to the output failed.
    pub fn render(&mut self, lines: &[String]) -> io::Result<()> {
        if self.clear_screen {
            self.out.write_all(CLEAR_SCREEN.as_bytes())?;
        }
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()
    }

    /// Writes a single line outside of any frame.
    ///
    /// # Errors
    ///
    /// This function will return an error if writing to the output failed.
    pub fn message(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
