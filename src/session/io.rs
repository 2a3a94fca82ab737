//! The idle-timeout prompt reader. A dedicated thread owns the child's raw
//! stdout and pushes byte chunks across an `mpsc::channel`, so the caller
//! can apply a timeout to a blocking read without touching the underlying
//! fd. GDB driven non-interactively emits its prompt with no trailing
//! newline (it is waiting for the next command on the same line), so
//! replies cannot be framed as newline-terminated lines; instead the
//! accumulated buffer is checked, after every chunk, for a *suffix* match
//! against the prompt, the same pexpect-style matching a line-oriented
//! debugger REPL requires. The channel also carries read errors and
//! end-of-stream so the main thread learns about a dead debugger promptly.
use std::io::Read;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

pub enum ChunkEvent {
    Bytes(Vec<u8>),
    Eof,
    Error(String),
}

pub struct LineReader {
    receiver: Receiver<ChunkEvent>,
}

impl LineReader {
    pub fn spawn<R: Read + Send + 'static>(mut input: R) -> Self {
        let (sender, receiver) = mpsc::channel();

        thread::spawn(move || {
            let mut buf = [0u8; 4096];
            loop {
                match input.read(&mut buf) {
                    Ok(0) => {
                        let _ = sender.send(ChunkEvent::Eof);
                        break;
                    }
                    Ok(n) => {
                        if sender.send(ChunkEvent::Bytes(buf[..n].to_vec())).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = sender.send(ChunkEvent::Error(e.to_string()));
                        break;
                    }
                }
            }
        });

        LineReader { receiver }
    }

    /// Accumulates bytes until the buffer ends with `prompt`, or the idle
    /// timeout elapses first. On success, returns the text preceding the
    /// prompt split into lines (trailing empty line from the newline just
    /// before the prompt dropped, each line's trailing `\r` stripped).
    ///
    /// Returns `Ok(lines)` on success, `Err(None)` on timeout, `Err(Some(_))`
    /// on a read error or unexpected end of stream.
    pub fn read_until_prompt(
        &self,
        prompt: &str,
        idle_timeout: Duration,
    ) -> Result<Vec<String>, Option<String>> {
        let mut buf: Vec<u8> = Vec::new();
        loop {
            match self.receiver.recv_timeout(idle_timeout) {
                Ok(ChunkEvent::Bytes(chunk)) => {
                    buf.extend_from_slice(&chunk);
                    let text = String::from_utf8_lossy(&buf);
                    if text.ends_with(prompt) {
                        let body = &text[..text.len() - prompt.len()];
                        return Ok(split_reply_lines(body));
                    }
                }
                Ok(ChunkEvent::Eof) => return Err(Some("debugger closed its output".to_string())),
                Ok(ChunkEvent::Error(e)) => return Err(Some(e)),
                Err(RecvTimeoutError::Timeout) => return Err(None),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Some("reader thread terminated".to_string()))
                }
            }
        }
    }
}

/// Splits the text preceding a matched prompt into lines, dropping the
/// single trailing empty segment produced when the body ends with the
/// newline that immediately preceded the prompt.
fn split_reply_lines(body: &str) -> Vec<String> {
    let mut lines: Vec<&str> = body.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
        .into_iter()
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect()
}
