//! Operator-facing narration.
//!
//! Coloured progress output with verbose and quiet modes. Fatal diagnostics
//! are written even in quiet mode.

use std::{
    fmt,
    io::{self, IsTerminal, Write},
    sync::{Arc, Mutex},
};
use termcolor::{Color, ColorChoice, ColorSpec, NoColor, StandardStream, WriteColor};

/// Writes stage-by-stage progress to a shared sink.
#[derive(Clone)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    sink: Arc<Mutex<Box<dyn WriteColor + Send>>>,
}

impl fmt::Debug for OutputManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputManager")
            .field("verbose", &self.verbose)
            .field("quiet", &self.quiet)
            .finish_non_exhaustive()
    }
}

fn spec(color: Color, bold: bool) -> ColorSpec {
    let mut spec = ColorSpec::new();
    spec.set_fg(Some(color)).set_bold(bold);
    spec
}

impl OutputManager {
    /// Output manager writing to stdout, coloured when stdout is a terminal.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        let choice = if io::stdout().is_terminal() {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self::with_color_writer(verbose, quiet, StandardStream::stdout(choice))
    }

    /// Output manager writing plain text to `writer`.
    pub fn with_writer(verbose: bool, quiet: bool, writer: impl Write + Send + 'static) -> Self {
        Self::with_color_writer(verbose, quiet, NoColor::new(writer))
    }

    /// Output manager writing to a colour-capable `writer`.
    pub fn with_color_writer(
        verbose: bool,
        quiet: bool,
        writer: impl WriteColor + Send + 'static,
    ) -> Self {
        Self {
            verbose,
            quiet,
            sink: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Whether verbose lines are printed.
    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    fn line(&self, style: Option<ColorSpec>, text: &str) {
        // Narration must never abort a release.
        if let Ok(mut sink) = self.sink.lock() {
            let _ = write_line(&mut **sink, style.as_ref(), text);
        }
    }

    /// Section header.
    pub fn section(&self, title: &str) {
        if !self.quiet {
            let rule = "=".repeat(title.chars().count());
            self.line(Some(spec(Color::Cyan, true)), &format!("\n{title}\n{rule}"));
        }
    }

    /// Start of a unit of work.
    pub fn progress(&self, message: &str) {
        if !self.quiet {
            self.line(Some(spec(Color::Yellow, false)), &format!("--- {message}"));
        }
    }

    /// Detail line, verbose mode only.
    pub fn verbose(&self, message: &str) {
        if self.is_verbose() {
            self.line(None, &format!("    {message}"));
        }
    }

    /// Indented detail line.
    pub fn indent(&self, message: &str) {
        if !self.quiet {
            self.line(None, &format!("    {message}"));
        }
    }

    /// Success line.
    pub fn success(&self, message: &str) {
        if !self.quiet {
            self.line(Some(spec(Color::Green, true)), &format!("✓ {message}"));
        }
    }

    /// Warning line.
    pub fn warn(&self, message: &str) {
        if !self.quiet {
            self.line(Some(spec(Color::Yellow, true)), &format!("⚠ {message}"));
        }
    }

    /// Fatal diagnostic, always printed.
    pub fn error(&self, message: &str) {
        self.line(Some(spec(Color::Red, true)), &format!("✗ {message}"));
    }
}

fn write_line(sink: &mut dyn WriteColor, style: Option<&ColorSpec>, text: &str) -> io::Result<()> {
    match style {
        Some(style) => {
            sink.set_color(style)?;
            write!(sink, "{text}")?;
            sink.reset()?;
            writeln!(sink)?;
        }
        None => writeln!(sink, "{text}")?,
    }
    sink.flush()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// In-memory sink readable after the manager is done with it.
    #[derive(Clone, Default)]
    pub(crate) struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        pub(crate) fn text(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn quiet_mode_keeps_only_errors() {
        let captured = Captured::default();
        let out = OutputManager::with_writer(true, true, captured.clone());
        out.section("Packaging");
        out.progress("Cleaning release tree...");
        out.verbose("3 excluded entries removed");
        out.error("clean failed");
        assert_eq!(captured.text(), "✗ clean failed\n");
    }

    #[test]
    fn verbose_lines_need_verbose_mode() {
        let captured = Captured::default();
        let out = OutputManager::with_writer(false, false, captured.clone());
        out.verbose("hidden");
        out.success("done");
        assert_eq!(captured.text(), "✓ done\n");
    }

    #[test]
    fn colour_sink_gets_styled_lines() {
        let captured = Captured::default();
        let out =
            OutputManager::with_color_writer(false, false, termcolor::Ansi::new(captured.clone()));
        out.progress("Staging source tree...");
        out.success("Release 8.1.0 created");
        out.indent("plain");
        let text = captured.text();
        assert!(text.contains("\x1b[33m--- Staging source tree...\x1b[0m\n"), "{text:?}");
        assert!(text.contains("\x1b[32m✓ Release 8.1.0 created\x1b[0m\n"), "{text:?}");
        assert!(text.ends_with("    plain\n"), "{text:?}");
    }
}
