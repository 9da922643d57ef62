//! Scripted training stream in `text/event-stream` framing

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Lines replayed when no script file is given
pub const DEMO_SCRIPT: &[&str] = &[
    "Cargando documentos PDF...",
    "Procesando 12 documentos",
    "Generando embeddings (lote 1/3)",
    "Generando embeddings (lote 2/3)",
    "Generando embeddings (lote 3/3)",
    "Entrenamiento exitoso",
    "FINALIZADO",
];

/// Payload that tells the console the stream is over
pub const CLOSE_SENTINEL: &str = "close";

/// Final frame, sent as a named `close` event like the training backend does
pub fn close_frame() -> String {
    format!("event: {0}\ndata: {0}\n\n", CLOSE_SENTINEL)
}

/// Read a script file, one message per non-empty line
pub fn load_script(path: Option<&Path>) -> io::Result<Vec<String>> {
    let Some(path) = path else {
        return Ok(DEMO_SCRIPT.iter().map(|l| l.to_string()).collect());
    };

    let text = fs::read_to_string(path)?;
    Ok(text
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Encode one message as an event-stream frame
pub fn event_frame(data: &str) -> String {
    let mut frame = String::with_capacity(data.len() + 8);
    for line in data.split('\n') {
        frame.push_str("data: ");
        frame.push_str(line);
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

/// Frames for `lines` followed by the close sentinel. With `drop_after`,
/// only that many lines are framed and the sentinel is left out, the way a
/// crashed backend would end the stream.
pub fn script_frames(lines: &[String], drop_after: Option<usize>) -> Vec<String> {
    let count = drop_after.unwrap_or(lines.len()).min(lines.len());
    let mut frames: Vec<String> = lines[..count].iter().map(|l| event_frame(l)).collect();

    if drop_after.is_none() {
        frames.push(close_frame());
    }
    frames
}

/// Write `frames` one at a time, flushing each and pausing `delay` between
/// them. Returns the number of frames written.
pub fn write_frames<W: Write>(
    writer: &mut W,
    frames: &[String],
    delay: Duration,
) -> io::Result<usize> {
    for (i, frame) in frames.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            thread::sleep(delay);
        }
        writer.write_all(frame.as_bytes())?;
        writer.flush()?;
    }
    Ok(frames.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn replay(lines: &[&str], drop_after: Option<usize>) -> String {
        let lines: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        let frames = script_frames(&lines, drop_after);

        let mut out = Vec::new();
        let written = write_frames(&mut out, &frames, Duration::ZERO).unwrap();
        assert_eq!(written, frames.len());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_event_frame() {
        assert_eq!(event_frame("hola"), "data: hola\n\n");
        assert_eq!(event_frame("a\nb"), "data: a\ndata: b\n\n");
    }

    #[test]
    fn test_replay_ends_with_close() {
        assert_eq!(
            replay(&["uno", "dos"], None),
            "data: uno\n\ndata: dos\n\nevent: close\ndata: close\n\n"
        );
    }

    #[test]
    fn test_drop_after_skips_sentinel() {
        assert_eq!(replay(&["uno", "dos", "tres"], Some(1)), "data: uno\n\n");
    }

    #[test]
    fn test_drop_after_beyond_script() {
        assert_eq!(replay(&["uno"], Some(5)), "data: uno\n\n");
    }

    #[test]
    fn test_load_demo_script() {
        let lines = load_script(None).unwrap();
        assert_eq!(lines.len(), DEMO_SCRIPT.len());
        assert!(lines.iter().any(|l| l.contains("Entrenamiento exitoso")));
    }

    #[test]
    fn test_load_script_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "primera").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "segunda   ").unwrap();

        let lines = load_script(Some(file.path())).unwrap();
        assert_eq!(lines, vec!["primera".to_string(), "segunda".to_string()]);
    }
}
