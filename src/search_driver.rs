//! Owns the work queue of call paths still to be explored, restarts the
//! debugger for each path, walks to the target frame, invokes
//! `FrameTracer`, applies the delta predicate to adjacent samples, and
//! enqueues new paths.

use std::collections::VecDeque;
use std::path::PathBuf;

use log::{info, warn};

use crate::call_path::CallPath;
use crate::error::Error;
use crate::finding::ReportStore;
use crate::frame_tracer::FrameTracer;
use crate::predicate::Predicate;
use crate::probe::Probe;
use crate::session::gdb_dialect::{frame_identity_prefix, parse_frame_location};
use crate::session::Session;
use crate::source_resolver::SourceResolver;

/// Process-wide state that survives the whole search, passed by `&mut`
/// reference into the driver rather than held as global state.
pub struct SearchContext {
    pub report_store: ReportStore,
    pub source_resolver: SourceResolver,
}

impl SearchContext {
    pub fn new(source_resolver: SourceResolver) -> Self {
        SearchContext {
            report_store: ReportStore::new(),
            source_resolver,
        }
    }
}

/// A single path's outcome, used only for logging/testing visibility; the
/// driver itself never surfaces this to the caller, per spec: a path that
/// aborts simply stops contributing findings and the search continues.
#[derive(Debug)]
pub enum PathOutcome {
    Completed,
    Aborted(Error),
}

pub struct SearchDriver<'a, F>
where
    F: FnMut() -> Result<Box<dyn Session>, Error>,
{
    queue: VecDeque<CallPath>,
    session_factory: F,
    predicate: &'a Predicate,
    probe: &'a dyn Probe,
}

impl<'a, F> SearchDriver<'a, F>
where
    F: FnMut() -> Result<Box<dyn Session>, Error>,
{
    pub fn new(initial_paths: Vec<CallPath>, session_factory: F, predicate: &'a Predicate, probe: &'a dyn Probe) -> Self {
        SearchDriver {
            queue: VecDeque::from(initial_paths),
            session_factory,
            predicate,
            probe,
        }
    }

    /// Drains the queue, recording findings and enqueuing children into
    /// `ctx.report_store` / this driver's own queue until it is empty.
    pub fn run(&mut self, ctx: &mut SearchContext) -> Result<(), Error> {
        while let Some(path) = self.queue.pop_front() {
            match self.process_path(&path, ctx) {
                Ok(PathOutcome::Completed) => info!("path {} completed", path),
                Ok(PathOutcome::Aborted(reason)) => {
                    warn!("path {} aborted: {}", path, reason)
                }
                Err(e) => warn!("path {} aborted: {}", path, e),
            }
        }
        Ok(())
    }

    fn process_path(&mut self, path: &CallPath, ctx: &mut SearchContext) -> Result<PathOutcome, Error> {
        let mut session = (self.session_factory)()?;
        session.run_to_entry()?;
        let pid = session.query_pid()?;

        if let Some(outcome) = self.walk_to_frame(session.as_mut(), path)? {
            session.quit();
            return Ok(outcome);
        }

        let samples = FrameTracer::trace(session.as_mut(), pid, self.probe)?;
        session.quit();

        for (step_index, window) in samples.windows(2).enumerate() {
            let (prev, curr) = (&window[0], &window[1]);
            let step_index = step_index as u32;

            if !self.predicate.eval(curr.metric, prev.metric) {
                continue;
            }

            let location = match parse_frame_location(&curr.frame_top) {
                Some(loc) => loc,
                None => {
                    warn!("{}", Error::FrameParse(curr.frame_top.clone()));
                    continue;
                }
            };
            let (bare_file, line_number) = location;

            // a finding is recorded regardless of whether its source file
            // resolves; resolution only gates whether the callee reached
            // from this line is worth descending into (S4).
            let resolved = ctx.source_resolver.resolve(&bare_file).is_some();
            if !resolved {
                warn!("{}", Error::SourceUnresolved(bare_file.clone()));
            }

            ctx.report_store.record(
                PathBuf::from(bare_file),
                line_number,
                prev.metric,
                curr.metric,
                path.clone(),
                step_index,
            );

            if resolved {
                self.queue.push_back(path.child(step_index));
            }
        }

        Ok(PathOutcome::Completed)
    }

    /// Walks to the target frame along `path`: for each index, issues that
    /// many line-steps then one step-into, verifying that the step-into
    /// actually descended (the frame-identity prefix changed). Returns
    /// `Some(Aborted)` on a failed descent, `None` on success.
    fn walk_to_frame(
        &mut self,
        session: &mut dyn Session,
        path: &CallPath,
    ) -> Result<Option<PathOutcome>, Error> {
        for &step_index in path.steps() {
            for _ in 0..step_index {
                session.step_one_source_line()?;
            }

            let before = session.backtrace()?;
            let before_top = before.first().map(String::as_str).unwrap_or("");
            let before_prefix = frame_identity_prefix(before_top).to_string();

            session.step_into()?;

            let after = session.backtrace()?;
            let after_top = after.first().map(String::as_str).unwrap_or("");
            let after_prefix = frame_identity_prefix(after_top);

            if after_prefix == before_prefix {
                return Ok(Some(PathOutcome::Aborted(Error::DescentFailed)));
            }
        }
        Ok(None)
    }
}
