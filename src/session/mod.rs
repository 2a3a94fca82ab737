//! Spawns and drives the external debugger as a child process, exposing
//! the small set of synchronous primitives the rest of the engine needs.
//! Every debugger-specific text pattern is isolated in [`gdb_dialect`]; the
//! line-oriented, prompt-terminated dialogue itself is isolated in [`io`].

pub mod gdb_dialect;
mod io;

use std::io::Write;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use crate::error::Error;
use io::LineReader;

/// The primitives a search driver needs from a debugger session. Extracted
/// as a trait so tests can drive `SearchDriver`/`FrameTracer` against a
/// scripted `FakeSession` without spawning a real debugger.
pub trait Session {
    fn run_to_entry(&mut self) -> Result<(), Error>;
    fn query_pid(&mut self) -> Result<u32, Error>;
    fn backtrace(&mut self) -> Result<Vec<String>, Error>;
    fn current_frame_address(&mut self) -> Result<Option<String>, Error>;
    fn step_one_source_line(&mut self) -> Result<String, Error>;
    fn step_into(&mut self) -> Result<(), Error>;
    fn quit(&mut self);
}

/// Drives a real GDB subprocess over its stdin/stdout pipes.
pub struct GdbSession {
    child: Child,
    reader: LineReader,
    idle_timeout: Duration,
    entry_symbol: String,
}

impl GdbSession {
    /// Spawns `debugger_command` (run through a shell, matching the CLI's
    /// "shell-quoted command" contract) and consumes its startup prompt.
    pub fn start(
        debugger_command: &str,
        entry_symbol: &str,
        idle_timeout: Duration,
    ) -> Result<Self, Error> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(debugger_command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(Error::SpawnFailed)?;

        let stdout = child.stdout.take().expect("bug: stdout was piped");
        let reader = LineReader::spawn(stdout);

        let mut session = GdbSession {
            child,
            reader,
            idle_timeout,
            entry_symbol: entry_symbol.to_string(),
        };

        // consume the initial prompt before issuing any command
        session.read_reply()?;
        Ok(session)
    }

    fn send_command(&mut self, command: &str) -> Result<(), Error> {
        let stdin = self.child.stdin.as_mut().expect("bug: stdin was piped");
        writeln!(stdin, "{}", command)?;
        stdin.flush()?;
        Ok(())
    }

    fn read_reply(&self) -> Result<Vec<String>, Error> {
        self.reader
            .read_until_prompt(gdb_dialect::PROMPT, self.idle_timeout)
            .map_err(|_| Error::NoPrompt)
    }

    fn issue(&mut self, command: &str) -> Result<Vec<String>, Error> {
        self.send_command(command)?;
        self.read_reply()
    }

    /// Returns the last non-empty line of a reply, the convention GDB uses
    /// for the line of source text printed after a step.
    fn last_nonempty_line(lines: &[String]) -> String {
        lines
            .iter()
            .rev()
            .find(|l| !l.trim().is_empty())
            .cloned()
            .unwrap_or_default()
    }
}

impl Session for GdbSession {
    fn run_to_entry(&mut self) -> Result<(), Error> {
        let break_reply = self.issue(&gdb_dialect::break_command(&self.entry_symbol.clone()))?;
        if !gdb_dialect::confirms_breakpoint(&break_reply) {
            return Err(Error::EntryBreakpointFailed(break_reply.join("\n")));
        }
        self.issue(gdb_dialect::RUN_COMMAND)?;
        Ok(())
    }

    fn query_pid(&mut self) -> Result<u32, Error> {
        let reply = self.issue(gdb_dialect::INFO_PROC_COMMAND)?;
        gdb_dialect::parse_pid(&reply).ok_or_else(|| Error::PidUnparseable(reply.join("\n")))
    }

    fn backtrace(&mut self) -> Result<Vec<String>, Error> {
        let reply = self.issue(gdb_dialect::BACKTRACE_COMMAND)?;
        Ok(gdb_dialect::frame_lines(&reply)
            .into_iter()
            .map(String::from)
            .collect())
    }

    fn current_frame_address(&mut self) -> Result<Option<String>, Error> {
        let reply = self.issue(gdb_dialect::INFO_FRAME_COMMAND)?;
        Ok(reply.into_iter().find(|l| l.trim_start().starts_with("Stack level")))
    }

    fn step_one_source_line(&mut self) -> Result<String, Error> {
        let depth0 = self.backtrace()?.len();
        let mut reply = self.issue(gdb_dialect::STEP_COMMAND)?;

        while self.backtrace()?.len() > depth0 {
            reply = self.issue(gdb_dialect::FINISH_COMMAND)?;
        }

        Ok(Self::last_nonempty_line(&reply))
    }

    fn step_into(&mut self) -> Result<(), Error> {
        self.issue(gdb_dialect::STEP_COMMAND)?;
        Ok(())
    }

    fn quit(&mut self) {
        let _ = self.send_command(gdb_dialect::QUIT_COMMAND);
        let _ = self.child.wait();
    }
}

impl Drop for GdbSession {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn last_nonempty_line_skips_trailing_blanks() {
        let lines = vec!["10\tint x = 1;".to_string(), "".to_string()];
        assert_eq!(GdbSession::last_nonempty_line(&lines), "10\tint x = 1;");
    }

    #[test]
    fn last_nonempty_line_of_all_blank_is_empty() {
        let lines = vec!["".to_string(), "  ".to_string()];
        assert_eq!(GdbSession::last_nonempty_line(&lines), "");
    }
}
