use std::fmt::Display;
use std::io::{self, Write};

const RULE_WIDTH: usize = 60;

/// Human-readable progress lines (`[OK]`, `[ERROR]`, `[DONE]`).
pub struct Console<W: Write> {
    out: W,
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn banner(&mut self, title: &str) -> io::Result<()> {
        self.rule('=')?;
        writeln!(self.out, "{title}")?;
        self.rule('=')?;
        writeln!(self.out)
    }

    pub fn rule(&mut self, ch: char) -> io::Result<()> {
        writeln!(self.out, "{}", ch.to_string().repeat(RULE_WIDTH))
    }

    pub fn ok(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(self.out, "[OK] {message}")
    }

    pub fn error(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(self.out, "[ERROR] {message}")
    }

    pub fn done(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(self.out, "[DONE] {message}")
    }

    /// Indented follow-up line under the previous status line.
    pub fn detail(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(self.out, "    {message}")
    }

    pub fn line(&mut self, message: impl Display) -> io::Result<()> {
        writeln!(self.out, "{message}")
    }

    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.out)
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}
