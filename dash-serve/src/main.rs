//! Development server for the admin dashboard
//!
//! Serves the built bundle with correct MIME types (WASM included) and
//! stands in for the training backend: a scripted event stream and the
//! completion callback.

mod replay;

use clap::Parser;
use mime_guess::MimeGuess;
use replay::{load_script, script_frames, write_frames};
use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

#[derive(Parser, Debug)]
#[command(name = "dash-serve")]
#[command(about = "Development server for the admin dashboard")]
struct Args {
    /// Directory to serve files from
    #[arg(default_value = ".")]
    directory: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// File whose lines are replayed on the training stream (built-in demo if omitted)
    #[arg(long)]
    script: Option<PathBuf>,

    /// Milliseconds between replayed lines
    #[arg(long, default_value_t = 400)]
    delay_ms: u64,

    /// Path of the training event stream
    #[arg(long, default_value = "/training/stream")]
    stream_path: String,

    /// Path accepting the training-complete POST
    #[arg(long, default_value = "/training/complete")]
    complete_path: String,

    /// End the stream after this many lines without the close sentinel
    #[arg(long)]
    drop_after: Option<usize>,
}

/// Scripted stream settings shared with streaming threads
struct StreamPlan {
    lines: Vec<String>,
    delay: Duration,
    drop_after: Option<usize>,
}

fn main() {
    let args = Args::parse();

    let root_dir = args.directory.canonicalize().unwrap_or_else(|_| {
        eprintln!("Error: Directory '{}' not found", args.directory.display());
        std::process::exit(1);
    });

    let lines = load_script(args.script.as_deref()).unwrap_or_else(|e| {
        eprintln!("Error reading script: {}", e);
        std::process::exit(1);
    });
    let plan = Arc::new(StreamPlan {
        lines,
        delay: Duration::from_millis(args.delay_ms),
        drop_after: args.drop_after,
    });

    let addr = format!("{}:{}", args.host, args.port);
    let server = Server::http(&addr).unwrap_or_else(|e| {
        eprintln!("Error starting server: {}", e);
        std::process::exit(1);
    });

    println!("Serving '{}' at http://{}", root_dir.display(), addr);
    println!(
        "Training stream at {} ({} lines), completion at {}",
        args.stream_path,
        plan.lines.len(),
        args.complete_path
    );
    println!("Press Ctrl+C to stop");

    for request in server.incoming_requests() {
        let url_path = request.url().to_string();
        let url_path = url_path.split('?').next().unwrap_or(&url_path).to_string();

        let method = request.method().clone();
        match (&method, url_path.as_str()) {
            (Method::Get, path) if path == args.stream_path => {
                println!("GET {} -> 200 (event stream)", url_path);
                let plan = Arc::clone(&plan);
                // The stream holds its connection open; keep serving meanwhile
                thread::spawn(move || match stream_events(request, &plan) {
                    Ok(frames) => println!("Event stream finished after {} frames", frames),
                    Err(e) => eprintln!("Event stream aborted: {}", e),
                });
            }
            (Method::Post, path) if path == args.complete_path => {
                println!("POST {} -> 204 (training acknowledged)", url_path);
                let _ = request.respond(acknowledged());
            }
            _ => serve_static(request, &root_dir, &url_path),
        }
    }
}

fn serve_static(request: Request, root_dir: &Path, url_path: &str) {
    // Decode URL-encoded characters
    let decoded_path = urlencoded_decode(url_path);

    // Determine file path
    let relative_path = decoded_path.trim_start_matches('/');
    let file_path = if relative_path.is_empty() {
        root_dir.join("index.html")
    } else {
        root_dir.join(relative_path)
    };

    // Security: prevent directory traversal
    let canonical = match file_path.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            let _ = request.respond(not_found());
            return;
        }
    };

    if !canonical.starts_with(root_dir) {
        let _ = request.respond(forbidden());
        return;
    }

    // If directory, try index.html
    let final_path = if canonical.is_dir() {
        canonical.join("index.html")
    } else {
        canonical
    };

    match serve_file(&final_path) {
        Ok(response) => {
            println!("{} {} -> 200", request.method(), url_path);
            let _ = request.respond(response);
        }
        Err(_) => {
            println!("{} {} -> 404", request.method(), url_path);
            let _ = request.respond(not_found());
        }
    }
}

fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name, value).expect("header names and values are ASCII literals")
}

/// Response head of the event stream. Written by hand so every frame can be
/// flushed as it is produced.
const STREAM_HEAD: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: text/event-stream\r\n\
Cache-Control: no-cache\r\n\
Access-Control-Allow-Origin: *\r\n\
Connection: close\r\n\r\n";

fn stream_events(request: Request, plan: &StreamPlan) -> io::Result<usize> {
    let mut writer = request.into_writer();
    writer.write_all(STREAM_HEAD.as_bytes())?;
    writer.flush()?;

    let frames = script_frames(&plan.lines, plan.drop_after);
    write_frames(&mut writer, &frames, plan.delay)
}

fn acknowledged() -> Response<std::io::Empty> {
    Response::empty(StatusCode(204)).with_header(header("Access-Control-Allow-Origin", "*"))
}

fn serve_file(path: &Path) -> Result<Response<Cursor<Vec<u8>>>, std::io::Error> {
    let mut file = fs::File::open(path)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;

    let mime = get_mime_type(path);

    // Special headers for SharedArrayBuffer support (needed by some WASM apps)
    Ok(Response::from_data(contents)
        .with_header(header("Content-Type", mime))
        .with_header(header("Access-Control-Allow-Origin", "*"))
        .with_header(header("Cross-Origin-Opener-Policy", "same-origin"))
        .with_header(header("Cross-Origin-Embedder-Policy", "require-corp")))
}

fn get_mime_type(path: &Path) -> &'static str {
    // Handle WASM specially since mime_guess might not have it
    if let Some(ext) = path.extension() {
        match ext.to_str() {
            Some("wasm") => return "application/wasm",
            Some("js") | Some("mjs") => return "application/javascript",
            _ => {}
        }
    }

    MimeGuess::from_path(path)
        .first_raw()
        .unwrap_or("application/octet-stream")
}

fn not_found() -> Response<Cursor<Vec<u8>>> {
    Response::from_string("404 Not Found").with_status_code(StatusCode(404))
}

fn forbidden() -> Response<Cursor<Vec<u8>>> {
    Response::from_string("403 Forbidden").with_status_code(StatusCode(403))
}

fn urlencoded_decode(s: &str) -> String {
    let mut bytes = Vec::with_capacity(s.len());
    let mut iter = s.bytes();

    while let Some(b) = iter.next() {
        match b {
            b'%' => {
                let hex: Vec<u8> = iter.by_ref().take(2).collect();
                let decoded = std::str::from_utf8(&hex)
                    .ok()
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match decoded {
                    Some(byte) if hex.len() == 2 => bytes.push(byte),
                    _ => {
                        bytes.push(b'%');
                        bytes.extend_from_slice(&hex);
                    }
                }
            }
            b'+' => bytes.push(b' '),
            _ => bytes.push(b),
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_get_mime_type_wasm() {
        assert_eq!(get_mime_type(Path::new("admin_dashboard_bg.wasm")), "application/wasm");
    }

    #[test]
    fn test_get_mime_type_js() {
        assert_eq!(get_mime_type(Path::new("admin_dashboard.js")), "application/javascript");
        assert_eq!(get_mime_type(Path::new("loader.mjs")), "application/javascript");
    }

    #[test]
    fn test_get_mime_type_html_and_css() {
        assert_eq!(get_mime_type(Path::new("index.html")), "text/html");
        assert_eq!(get_mime_type(Path::new("dashboard.css")), "text/css");
    }

    #[test]
    fn test_urlencoded_decode() {
        assert_eq!(urlencoded_decode("hello%20world"), "hello world");
        assert_eq!(urlencoded_decode("foo+bar"), "foo bar");
        assert_eq!(urlencoded_decode("test%2Fpath"), "test/path");
        assert_eq!(urlencoded_decode("normal"), "normal");
    }

    #[test]
    fn test_urlencoded_decode_utf8() {
        assert_eq!(urlencoded_decode("reglamento%C3%B1.pdf"), "reglamentoñ.pdf");
        assert_eq!(urlencoded_decode("bad%zz"), "bad%zz");
        assert_eq!(urlencoded_decode("tail%4"), "tail%4");
    }

    #[test]
    fn test_serve_file() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("index.html");

        let mut file = File::create(&file_path).unwrap();
        file.write_all(b"<html>dashboard</html>").unwrap();

        let response = serve_file(&file_path).unwrap();
        assert_eq!(response.status_code().0, 200);
    }

    #[test]
    fn test_serve_file_not_found() {
        assert!(serve_file(Path::new("/nonexistent/file.txt")).is_err());
    }

    #[test]
    fn test_acknowledged_is_no_content() {
        assert_eq!(acknowledged().status_code().0, 204);
    }

    #[test]
    fn test_stream_head_is_event_stream() {
        assert!(STREAM_HEAD.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(STREAM_HEAD.contains("Content-Type: text/event-stream\r\n"));
        assert!(STREAM_HEAD.ends_with("\r\n\r\n"));
    }
}
