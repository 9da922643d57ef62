//! Training log shown in the console

/// Prefix of every line echoed from the stream
pub const LINE_PREFIX: &str = "> ";

/// Presentation of a terminal line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Plain,
    /// Placeholder with a blinking cursor
    Cursor,
    /// Connection problems
    Warning,
    /// Separator before the final line
    Banner,
    Success,
}

impl Tone {
    /// CSS classes of the line element
    pub fn class_name(&self) -> &'static str {
        match self {
            Tone::Cursor => "terminal-line blinking-cursor",
            _ => "terminal-line",
        }
    }

    /// Inline text color, if any
    pub fn color(&self) -> Option<&'static str> {
        match self {
            Tone::Warning => Some("#ff4444"),
            Tone::Banner => Some("#fff"),
            Tone::Success => Some("#00ff00"),
            Tone::Plain | Tone::Cursor => None,
        }
    }

    pub fn bold(&self) -> bool {
        matches!(self, Tone::Banner)
    }
}

/// A single rendered line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalLine {
    pub text: String,
    pub tone: Tone,
}

impl TerminalLine {
    pub fn new(text: impl Into<String>, tone: Tone) -> Self {
        Self {
            text: text.into(),
            tone,
        }
    }

    /// Line echoing a stream payload
    pub fn echo(data: &str) -> Self {
        Self::new(format!("{}{}", LINE_PREFIX, data), Tone::Plain)
    }
}

/// Ordered log lines, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Terminal {
    lines: Vec<TerminalLine>,
}

impl Terminal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole log with a single line
    pub fn reset(&mut self, line: TerminalLine) {
        self.lines.clear();
        self.lines.push(line);
    }

    pub fn push(&mut self, line: TerminalLine) {
        self.lines.push(line);
    }

    pub fn last(&self) -> Option<&TerminalLine> {
        self.lines.last()
    }

    pub fn lines(&self) -> &[TerminalLine] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether the last line contains `marker`
    pub fn ends_with_marker(&self, marker: &str) -> bool {
        self.last().is_some_and(|line| line.text.contains(marker))
    }

    /// Plain text of the log, one line per entry
    pub fn to_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_presentation() {
        assert_eq!(Tone::Cursor.class_name(), "terminal-line blinking-cursor");
        assert_eq!(Tone::Plain.class_name(), "terminal-line");
        assert_eq!(Tone::Warning.color(), Some("#ff4444"));
        assert_eq!(Tone::Success.color(), Some("#00ff00"));
        assert!(Tone::Banner.bold());
        assert!(!Tone::Success.bold());
    }

    #[test]
    fn test_echo_prefix() {
        assert_eq!(TerminalLine::echo("epoch 1").text, "> epoch 1");
    }

    #[test]
    fn test_reset_and_marker() {
        let mut terminal = Terminal::new();
        terminal.push(TerminalLine::echo("a"));
        terminal.push(TerminalLine::echo("done here"));
        assert!(terminal.ends_with_marker("done"));

        terminal.reset(TerminalLine::new("start", Tone::Cursor));
        assert_eq!(terminal.len(), 1);
        assert!(!terminal.ends_with_marker("done"));
        assert_eq!(terminal.to_text(), "start");
    }

    #[test]
    fn test_empty_terminal_has_no_marker() {
        assert!(!Terminal::new().ends_with_marker(""));
    }
}
