use std::io;

use thiserror::Error;

/// The crate-wide error type.
///
/// Every fallible operation in this crate returns one of these variants so
/// that the CLI can map them onto the exit codes and recovery policy
/// described by the error-handling design: `Configuration` aborts the
/// whole process, `FrameParse`/`SourceUnresolved` are recovered locally by
/// the caller, and everything else aborts the current call path only.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to spawn debugger: {0}")]
    SpawnFailed(io::Error),

    #[error("debugger did not confirm the entry breakpoint: {0}")]
    EntryBreakpointFailed(String),

    #[error("could not parse target pid from debugger reply: {0}")]
    PidUnparseable(String),

    #[error("no prompt observed before the idle timeout")]
    NoPrompt,

    #[error("backtrace frame did not contain a recognizable \" at FILE:LINE\" suffix: {0}")]
    FrameParse(String),

    #[error("source file could not be resolved: {0}")]
    SourceUnresolved(String),

    #[error("step-into did not change frame identity")]
    DescentFailed,

    #[error("metric probe unavailable: {0}")]
    ProbeUnavailable(String),

    #[error("invalid predicate expression: {0}")]
    InvalidPredicate(String),
}

pub type Result<T> = std::result::Result<T, Error>;
