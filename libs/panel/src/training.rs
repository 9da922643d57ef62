//! Training console driven by a server-sent event stream
//!
//! [`TrainingSession`] holds no I/O. Each handler updates the session and
//! returns the [`ConsoleEffect`]s the driver must apply, in order: render a
//! line, close the stream, POST the completion callback, and so on. The
//! driver feeds stream events and the callback outcome back in.

use crate::config::ConsoleConfig;
use crate::terminal::{Terminal, TerminalLine, Tone, LINE_PREFIX};

/// Where a run currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    /// Stream requested, nothing received yet
    Connecting,
    Streaming,
    /// A success marker arrived; the stream stays open until it ends
    Succeeded,
    /// Stream ended unexpectedly; a new run may be started
    Lost,
    /// Completion lines written, callback in flight
    AwaitingAck,
    /// Server answered the completion callback
    Completed,
    /// Completion callback never reached the server
    AckFailed,
}

impl SessionState {
    /// Whether stream events are still expected
    pub fn is_live(&self) -> bool {
        matches!(
            self,
            SessionState::Connecting | SessionState::Streaming | SessionState::Succeeded
        )
    }
}

/// `readyState` of the event stream when an error fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Connecting,
    Open,
    Closed,
}

impl ReadyState {
    /// Map the numeric `EventSource.readyState`
    pub fn from_code(code: u16) -> Self {
        match code {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            _ => ReadyState::Closed,
        }
    }
}

/// Appearance of the train button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainButton {
    /// Disabled and dimmed while a run is in progress
    Busy,
    /// Enabled again after a lost connection
    Retry,
    /// Relabelled once the server acknowledged completion
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

/// Work requested from the driver
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEffect {
    TrainButton(TrainButton),
    /// Reveal the terminal container and output
    ShowTerminal,
    /// Clear the log and render this line alone
    ResetLog(TerminalLine),
    AppendLine(TerminalLine),
    ScrollToBottom,
    OpenStream(String),
    CloseStream,
    /// POST to this URL and report back with the outcome
    PostCompletion(String),
    RevealFinish,
    /// Developer console message
    DevLog(LogLevel, String),
}

/// Numbers the runs of a console so events from a replaced stream, or the
/// answer to an earlier completion request, can be told apart and dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounter {
    current: Option<u64>,
}

impl RunCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run; earlier runs stop being accepted
    pub fn begin(&mut self) -> u64 {
        let run = self.current.map_or(1, |run| run + 1);
        self.current = Some(run);
        run
    }

    /// The active run, starting the first one if none exists yet
    pub fn current_or_begin(&mut self) -> u64 {
        match self.current {
            Some(run) => run,
            None => self.begin(),
        }
    }

    pub fn current(&self) -> Option<u64> {
        self.current
    }

    /// Whether an event tagged with `run` belongs to the active run
    pub fn accepts(&self, run: u64) -> bool {
        self.current == Some(run)
    }
}

/// State of one training console
#[derive(Debug, Clone)]
pub struct TrainingSession {
    config: ConsoleConfig,
    state: SessionState,
    succeeded: bool,
    terminal: Terminal,
    completion_requests: usize,
}

impl TrainingSession {
    pub fn new(config: ConsoleConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            succeeded: false,
            terminal: Terminal::new(),
            completion_requests: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a success marker was seen in the current run
    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Completion callbacks requested since the session was created
    pub fn completion_requests(&self) -> usize {
        self.completion_requests
    }

    /// Begin a run, discarding whatever the previous run left behind
    pub fn start(&mut self) -> Vec<ConsoleEffect> {
        self.state = SessionState::Connecting;
        self.succeeded = false;

        let placeholder = TerminalLine::new(self.config.labels.connecting.clone(), Tone::Cursor);
        self.terminal.reset(placeholder.clone());

        vec![
            ConsoleEffect::TrainButton(TrainButton::Busy),
            ConsoleEffect::ShowTerminal,
            ConsoleEffect::ResetLog(placeholder),
            ConsoleEffect::OpenStream(self.config.stream_url.clone()),
        ]
    }

    /// The stream connection opened
    pub fn on_open(&mut self) -> Vec<ConsoleEffect> {
        if self.state == SessionState::Connecting {
            self.state = SessionState::Streaming;
        }
        Vec::new()
    }

    /// A message arrived on the stream
    pub fn on_message(&mut self, data: &str) -> Vec<ConsoleEffect> {
        if !self.state.is_live() {
            return Vec::new();
        }

        if self.config.rules.is_close(data) {
            let mut effects = vec![ConsoleEffect::CloseStream];
            effects.extend(self.finish());
            return effects;
        }

        if self.config.rules.is_success(data) {
            self.succeeded = true;
            self.state = SessionState::Succeeded;
        } else if self.state == SessionState::Connecting {
            self.state = SessionState::Streaming;
        }

        let line = TerminalLine::echo(data);
        self.terminal.push(line.clone());
        vec![ConsoleEffect::AppendLine(line), ConsoleEffect::ScrollToBottom]
    }

    /// The stream reported a transport error
    pub fn on_error(&mut self, ready_state: ReadyState) -> Vec<ConsoleEffect> {
        if !self.state.is_live() {
            return Vec::new();
        }

        if self.succeeded {
            let mut effects = vec![
                ConsoleEffect::DevLog(LogLevel::Info, self.config.labels.expected_close.clone()),
                ConsoleEffect::CloseStream,
            ];
            effects.extend(self.finish());
            return effects;
        }

        let mut effects = vec![ConsoleEffect::DevLog(
            LogLevel::Error,
            self.config.labels.stream_error.clone(),
        )];

        if ready_state == ReadyState::Closed {
            effects.push(ConsoleEffect::CloseStream);
            effects.extend(self.finish());
            return effects;
        }

        self.state = SessionState::Lost;
        let warning = TerminalLine::new(
            format!("{}{}", LINE_PREFIX, self.config.labels.connection_lost),
            Tone::Warning,
        );
        self.terminal.push(warning.clone());

        effects.extend([
            ConsoleEffect::AppendLine(warning),
            ConsoleEffect::CloseStream,
            ConsoleEffect::TrainButton(TrainButton::Retry),
        ]);
        effects
    }

    /// Write the completion lines and request the completion callback.
    /// Does nothing when the log already ends with the completion line.
    pub fn finish(&mut self) -> Vec<ConsoleEffect> {
        if self.terminal.ends_with_marker(&self.config.labels.all_done) {
            return Vec::new();
        }

        let separator = TerminalLine::new(self.config.labels.separator.clone(), Tone::Banner);
        let done = TerminalLine::new(
            format!("{}✅ {}.", LINE_PREFIX, self.config.labels.all_done),
            Tone::Success,
        );
        self.terminal.push(separator.clone());
        self.terminal.push(done.clone());

        self.state = SessionState::AwaitingAck;
        self.completion_requests += 1;

        vec![
            ConsoleEffect::AppendLine(separator),
            ConsoleEffect::AppendLine(done),
            ConsoleEffect::ScrollToBottom,
            ConsoleEffect::PostCompletion(self.config.complete_url.clone()),
        ]
    }

    /// The completion callback got an HTTP response. The status is not
    /// inspected: any answer counts as acknowledged.
    pub fn on_completion_response(&mut self, _status: u16) -> Vec<ConsoleEffect> {
        self.state = SessionState::Completed;
        vec![
            ConsoleEffect::RevealFinish,
            ConsoleEffect::TrainButton(TrainButton::Completed),
        ]
    }

    /// The completion callback failed before reaching the server
    pub fn on_completion_failed(&mut self, reason: &str) -> Vec<ConsoleEffect> {
        self.state = SessionState::AckFailed;
        vec![ConsoleEffect::DevLog(
            LogLevel::Error,
            format!("{}: {}", self.config.labels.ack_error, reason),
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> TrainingSession {
        TrainingSession::new(ConsoleConfig::new("/stream", "/complete"))
    }

    fn posts(effects: &[ConsoleEffect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, ConsoleEffect::PostCompletion(_)))
            .count()
    }

    #[test]
    fn test_start_effects() {
        let mut s = session();
        let effects = s.start();

        assert_eq!(effects[0], ConsoleEffect::TrainButton(TrainButton::Busy));
        assert_eq!(effects[1], ConsoleEffect::ShowTerminal);
        assert!(matches!(&effects[2], ConsoleEffect::ResetLog(l) if l.tone == Tone::Cursor));
        assert_eq!(effects[3], ConsoleEffect::OpenStream("/stream".to_string()));
        assert_eq!(s.state(), SessionState::Connecting);
        assert_eq!(s.terminal().to_text(), "Iniciando conexión...");
    }

    #[test]
    fn test_message_appends_prefixed_line() {
        let mut s = session();
        s.start();
        let effects = s.on_message("epoch 1/3");

        assert_eq!(
            effects,
            vec![
                ConsoleEffect::AppendLine(TerminalLine::echo("epoch 1/3")),
                ConsoleEffect::ScrollToBottom,
            ]
        );
        assert_eq!(s.state(), SessionState::Streaming);
    }

    #[test]
    fn test_success_marker_keeps_stream_open() {
        let mut s = session();
        s.start();
        s.on_open();
        let effects = s.on_message("FINALIZADO");

        assert!(s.succeeded());
        assert_eq!(s.state(), SessionState::Succeeded);
        assert!(!effects.contains(&ConsoleEffect::CloseStream));
    }

    #[test]
    fn test_close_sentinel_finishes() {
        let mut s = session();
        s.start();
        let effects = s.on_message("close");

        assert_eq!(effects[0], ConsoleEffect::CloseStream);
        assert_eq!(posts(&effects), 1);
        assert_eq!(s.state(), SessionState::AwaitingAck);
        // The sentinel itself is never echoed
        assert!(!s.terminal().to_text().contains("> close"));
    }

    #[test]
    fn test_error_after_success_is_expected() {
        let mut s = session();
        s.start();
        s.on_message("Entrenamiento exitoso");
        let effects = s.on_error(ReadyState::Connecting);

        assert!(matches!(&effects[0], ConsoleEffect::DevLog(LogLevel::Info, _)));
        assert_eq!(effects[1], ConsoleEffect::CloseStream);
        assert_eq!(posts(&effects), 1);
        assert!(!effects.contains(&ConsoleEffect::TrainButton(TrainButton::Retry)));
    }

    #[test]
    fn test_error_when_closed_finishes() {
        let mut s = session();
        s.start();
        s.on_message("loading");
        let effects = s.on_error(ReadyState::Closed);

        assert_eq!(posts(&effects), 1);
        assert_eq!(s.state(), SessionState::AwaitingAck);
    }

    #[test]
    fn test_genuine_error_loses_connection() {
        let mut s = session();
        s.start();
        s.on_message("loading");
        let effects = s.on_error(ReadyState::Connecting);

        assert_eq!(s.state(), SessionState::Lost);
        assert_eq!(posts(&effects), 0);
        assert!(effects.contains(&ConsoleEffect::CloseStream));
        assert_eq!(
            effects.last(),
            Some(&ConsoleEffect::TrainButton(TrainButton::Retry))
        );
        let last = s.terminal().last().unwrap();
        assert_eq!(last.tone, Tone::Warning);
        assert!(last.text.starts_with("> ⚠️"));
    }

    #[test]
    fn test_events_after_lost_are_ignored() {
        let mut s = session();
        s.start();
        s.on_error(ReadyState::Open);

        assert!(s.on_message("late").is_empty());
        assert!(s.on_error(ReadyState::Closed).is_empty());
    }

    #[test]
    fn test_restart_resets_state() {
        let mut s = session();
        s.start();
        s.on_message("Entrenamiento exitoso");
        s.on_error(ReadyState::Open);
        assert_eq!(s.state(), SessionState::AwaitingAck);

        s.start();
        assert!(!s.succeeded());
        assert_eq!(s.terminal().len(), 1);
        assert_eq!(s.state(), SessionState::Connecting);
    }

    #[test]
    fn test_finish_is_idempotent() {
        let mut s = session();
        s.start();
        let first = s.finish();
        let second = s.finish();

        assert_eq!(posts(&first), 1);
        assert!(second.is_empty());
        assert_eq!(s.completion_requests(), 1);
    }

    #[test]
    fn test_completion_response_reveals_finish() {
        let mut s = session();
        s.start();
        s.finish();
        let effects = s.on_completion_response(500);

        assert_eq!(
            effects,
            vec![
                ConsoleEffect::RevealFinish,
                ConsoleEffect::TrainButton(TrainButton::Completed),
            ]
        );
        assert_eq!(s.state(), SessionState::Completed);
    }

    #[test]
    fn test_completion_failure_only_logs() {
        let mut s = session();
        s.start();
        s.finish();
        let effects = s.on_completion_failed("network down");

        assert_eq!(effects.len(), 1);
        assert!(matches!(&effects[0], ConsoleEffect::DevLog(LogLevel::Error, m) if m.contains("network down")));
        assert_eq!(s.state(), SessionState::AckFailed);
    }

    #[test]
    fn test_run_counter_drops_older_runs() {
        let mut runs = RunCounter::new();
        assert!(!runs.accepts(1));

        let first = runs.begin();
        assert!(runs.accepts(first));

        let second = runs.begin();
        assert_eq!(second, first + 1);
        assert!(runs.accepts(second));
        // Late stream events and acks of the replaced run
        assert!(!runs.accepts(first));
    }

    #[test]
    fn test_run_counter_current_or_begin() {
        let mut runs = RunCounter::new();
        assert_eq!(runs.current(), None);

        let run = runs.current_or_begin();
        assert_eq!(run, 1);
        assert_eq!(runs.current_or_begin(), run);
        assert_eq!(runs.current(), Some(1));
    }

    #[test]
    fn test_ready_state_codes() {
        assert_eq!(ReadyState::from_code(0), ReadyState::Connecting);
        assert_eq!(ReadyState::from_code(1), ReadyState::Open);
        assert_eq!(ReadyState::from_code(2), ReadyState::Closed);
    }
}
