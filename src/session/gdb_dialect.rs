//! Every GDB-specific text pattern lives here: the prompt marker, the
//! breakpoint-confirmation prefix, the `info frame`/`info proc` reply
//! shapes, and the `" at FILE:LINE"` frame-top suffix. Targeting a
//! different debugger, or GDB's machine-interface mode, is a local change
//! confined to this module.

/// The line GDB emits to signal readiness for the next command.
pub const PROMPT: &str = "(gdb) ";

/// `break` at the program entry function. The caller supplies the entry
/// symbol name (commonly `main`).
pub fn break_command(entry_symbol: &str) -> String {
    format!("break {}", entry_symbol)
}

pub const RUN_COMMAND: &str = "run";
pub const BACKTRACE_COMMAND: &str = "backtrace";
pub const INFO_FRAME_COMMAND: &str = "info frame";
pub const INFO_PROC_COMMAND: &str = "info proc";
pub const STEP_COMMAND: &str = "step";
pub const FINISH_COMMAND: &str = "finish";
pub const QUIT_COMMAND: &str = "quit";

/// A reply confirms the entry breakpoint iff one of its lines starts with
/// this prefix.
pub fn confirms_breakpoint(reply_lines: &[String]) -> bool {
    reply_lines
        .iter()
        .any(|line| line.trim_start().starts_with("Breakpoint "))
}

/// Parses a target pid out of an `info proc` reply, whose first relevant
/// line reads `process <pid>`.
pub fn parse_pid(reply_lines: &[String]) -> Option<u32> {
    reply_lines.iter().find_map(|line| {
        let line = line.trim();
        line.strip_prefix("process ")
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|tok| tok.parse::<u32>().ok())
    })
}

/// Counts the frame lines in a `backtrace` reply: lines beginning with
/// `#<digits>`.
pub fn frame_lines(reply_lines: &[String]) -> Vec<&str> {
    reply_lines
        .iter()
        .map(String::as_str)
        .filter(|line| {
            line.trim_start()
                .chars()
                .next()
                .map(|c| c == '#')
                .unwrap_or(false)
        })
        .collect()
}

/// Extracts the `(file, line)` pair from a frame-top string's trailing
/// `" at FILE:LINE"` form, as required by the finding-parse-round-trip
/// property.
pub fn parse_frame_location(frame_top: &str) -> Option<(String, u32)> {
    let idx = frame_top.rfind(" at ")?;
    let location = &frame_top[idx + 4..];
    let colon = location.rfind(':')?;
    let file = &location[..colon];
    let line_number = location[colon + 1..].trim().parse::<u32>().ok()?;
    Some((file.to_string(), line_number))
}

/// The prefix of a frame-top string up to (not including) the first colon,
/// used to detect that a step-into failed to descend or that a frame was
/// replaced by a tail-call-like transition.
pub fn frame_identity_prefix(frame_top: &str) -> &str {
    match frame_top.find(':') {
        Some(idx) => &frame_top[..idx],
        None => frame_top,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn confirms_breakpoint_detects_prefix() {
        let lines = vec!["Breakpoint 1 at 0x1234: file main.c, line 10.".to_string()];
        assert!(confirms_breakpoint(&lines));
        let lines = vec!["No symbol table loaded.".to_string()];
        assert!(!confirms_breakpoint(&lines));
    }

    #[test]
    fn parse_pid_from_info_proc() {
        let lines = vec!["process 4242".to_string(), "cmdline = '/bin/x'".to_string()];
        assert_eq!(parse_pid(&lines), Some(4242));
    }

    #[test]
    fn frame_lines_filters_non_frame_lines() {
        let lines = vec![
            "#0  main () at main.c:10".to_string(),
            "#1  0x0000 in _start ()".to_string(),
            "(gdb) ".to_string(),
        ];
        assert_eq!(frame_lines(&lines).len(), 2);
    }

    #[test]
    fn parse_frame_location_valid() {
        let top = "#0  foo (x=1) at lib.c:42";
        assert_eq!(
            parse_frame_location(top),
            Some(("lib.c".to_string(), 42))
        );
    }

    #[test]
    fn parse_frame_location_missing_suffix() {
        assert_eq!(parse_frame_location("#0  foo () in ??"), None);
    }

    #[test]
    fn frame_identity_prefix_is_colon_prefix() {
        assert_eq!(
            frame_identity_prefix("#0  foo () at lib.c:42"),
            "#0  foo () at lib.c"
        );
    }

    #[test]
    fn frame_identity_prefix_ignores_line_number_within_same_function() {
        let a = frame_identity_prefix("#0  foo (x=1) at lib.c:10");
        let b = frame_identity_prefix("#0  foo (x=1) at lib.c:20");
        assert_eq!(a, b);
    }
}
