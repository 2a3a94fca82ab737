//! Given a freshly-positioned debugger at the entry of a function,
//! single-steps through the function, sampling the metric probe before and
//! after each line, stopping as soon as the frame is exited either by
//! return (depth decrease) or by a tail-call-like frame replacement (same
//! depth, different frame identity).

use crate::error::Error;
use crate::probe::Probe;
use crate::session::Session;
use crate::Scalar;

/// One measurement taken at a particular point in a frame's execution. The
/// first sample of a frame carries an empty `source_line`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSample {
    pub frame_top: String,
    pub metric: Scalar,
    pub source_line: String,
}

pub struct FrameTracer;

impl FrameTracer {
    /// Traces the current frame until it is exited, returning the sequence
    /// of samples taken along the way. Requires the session to already be
    /// positioned at the first source line of the function under study.
    pub fn trace(
        session: &mut dyn Session,
        pid: u32,
        probe: &dyn Probe,
    ) -> Result<Vec<FrameSample>, Error> {
        let bt0 = session.backtrace()?;
        let depth0 = bt0.len();
        let frame0 = session.current_frame_address()?;

        let mut samples = Vec::new();
        let initial_metric = probe.sample(pid)?;
        samples.push(FrameSample {
            frame_top: bt0.first().cloned().unwrap_or_default(),
            metric: initial_metric,
            source_line: String::new(),
        });

        loop {
            let line = session.step_one_source_line()?;
            let bt = session.backtrace()?;

            if bt.len() != depth0 || session.current_frame_address()? != frame0 || bt.is_empty() {
                break;
            }

            let metric = probe.sample(pid)?;
            samples.push(FrameSample {
                frame_top: bt[0].clone(),
                metric,
                source_line: line,
            });
        }

        Ok(samples)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_support::FakeSession;

    struct ConstProbe(Scalar);
    impl Probe for ConstProbe {
        fn sample(&self, _pid: u32) -> Result<Scalar, Error> {
            Ok(self.0)
        }
    }

    struct SeqProbe(std::cell::RefCell<std::vec::IntoIter<Scalar>>);
    impl SeqProbe {
        fn new(values: Vec<Scalar>) -> Self {
            SeqProbe(std::cell::RefCell::new(values.into_iter()))
        }
    }
    impl Probe for SeqProbe {
        fn sample(&self, _pid: u32) -> Result<Scalar, Error> {
            Ok(self.0.borrow_mut().next().unwrap_or(0))
        }
    }

    #[test]
    fn one_line_function_yields_single_sample() {
        let mut session = FakeSession::single_line_function();
        let samples = FrameTracer::trace(&mut session, 1, &ConstProbe(0)).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].source_line, "");
    }

    #[test]
    fn multi_line_function_samples_each_line_until_exit() {
        let mut session = FakeSession::three_line_function();
        let probe = SeqProbe::new(vec![0, 50, 250]);
        let samples = FrameTracer::trace(&mut session, 1, &probe).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].metric, 0);
        assert_eq!(samples[1].metric, 50);
        assert_eq!(samples[2].metric, 250);
    }

    #[test]
    fn never_emits_a_sample_from_a_different_function() {
        use crate::session::gdb_dialect::frame_identity_prefix;

        let mut session = FakeSession::three_line_function();
        let probe = ConstProbe(0);
        let samples = FrameTracer::trace(&mut session, 1, &probe).unwrap();
        let identity = frame_identity_prefix(&samples[0].frame_top).to_string();
        for sample in &samples {
            assert_eq!(frame_identity_prefix(&sample.frame_top), identity);
        }
    }
}
