//! A scripted, in-memory stand-in for a real debugger, used to exercise
//! `FrameTracer` and `SearchDriver` end to end without spawning GDB or a
//! target binary, the same way the protocol layer below is tested against
//! in-memory fixtures rather than a live peer.
#![doc(hidden)]

use std::collections::HashMap;

use std::cell::RefCell;

use crate::call_path::CallPath;
use crate::error::Error;
use crate::probe::Probe;
use crate::session::Session;
use crate::Scalar;

/// A probe that returns successive values from a fixed script, wrapping
/// around if sampled more times than it has values. Used to drive
/// `FrameTracer`/`SearchDriver` tests deterministically, since the real
/// `/proc`-based probes have nothing to read for a fake pid.
pub struct ScriptedProbe(RefCell<(Vec<Scalar>, usize)>);

impl ScriptedProbe {
    pub fn new(values: Vec<Scalar>) -> Self {
        ScriptedProbe(RefCell::new((values, 0)))
    }
}

impl Probe for ScriptedProbe {
    fn sample(&self, _pid: u32) -> Result<Scalar, Error> {
        let mut state = self.0.borrow_mut();
        let index = state.1;
        let value = state
            .0
            .get(index)
            .copied()
            .unwrap_or_else(|| *state.0.last().unwrap_or(&0));
        state.1 += 1;
        Ok(value)
    }
}

#[derive(Debug, Clone)]
pub struct FakeStep {
    pub frame_top: String,
    pub source_line: String,
}

/// A whole fake call tree: one step sequence per call path. `functions[&CallPath::root()]`
/// is the entry function; `functions[&parent.child(k)]` is the function reached by a
/// step-into taken at step index `k` of `parent`.
#[derive(Default)]
pub struct FakeWorld {
    pub functions: HashMap<CallPath, Vec<FakeStep>>,
    pub pid: u32,
}

pub struct FakeSession {
    world: FakeWorld,
    current_path: CallPath,
    current_index: usize,
    exited: bool,
}

impl FakeSession {
    pub fn new(world: FakeWorld) -> Self {
        FakeSession {
            world,
            current_path: CallPath::root(),
            current_index: 0,
            exited: false,
        }
    }

    fn steps(&self) -> &[FakeStep] {
        self.world
            .functions
            .get(&self.current_path)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// A single function with one step: the smallest possible function,
    /// whose first step already exits the frame (S4.4 edge case).
    pub fn single_line_function() -> Self {
        let mut functions = HashMap::new();
        functions.insert(
            CallPath::root(),
            vec![FakeStep {
                frame_top: "#0  main () at main.c:1".to_string(),
                source_line: String::new(),
            }],
        );
        FakeSession::new(FakeWorld { functions, pid: 100 })
    }

    /// A three-line function with no descendants, used to exercise plain
    /// sampling without any call descent.
    pub fn three_line_function() -> Self {
        let mut functions = HashMap::new();
        functions.insert(
            CallPath::root(),
            vec![
                FakeStep {
                    frame_top: "#0  main () at main.c:1".to_string(),
                    source_line: String::new(),
                },
                FakeStep {
                    frame_top: "#0  main () at main.c:2".to_string(),
                    source_line: "2\tint x = compute();".to_string(),
                },
                FakeStep {
                    frame_top: "#0  main () at main.c:3".to_string(),
                    source_line: "3\treturn x;".to_string(),
                },
            ],
        );
        FakeSession::new(FakeWorld { functions, pid: 100 })
    }

    /// The S2 scenario: entry calls one library routine whose single line
    /// increases the metric from 0 to 100.
    pub fn single_hit_world() -> FakeWorld {
        let mut functions = HashMap::new();
        functions.insert(
            CallPath::root(),
            vec![
                FakeStep {
                    frame_top: "#0  main () at main.c:1".to_string(),
                    source_line: String::new(),
                },
                FakeStep {
                    frame_top: "#0  main () at main.c:2".to_string(),
                    source_line: "2\tdo_alloc();".to_string(),
                },
            ],
        );
        functions.insert(
            CallPath::root().child(0),
            vec![
                FakeStep {
                    frame_top: "#0  do_alloc () at lib.c:10".to_string(),
                    source_line: String::new(),
                },
                FakeStep {
                    frame_top: "#0  do_alloc () at lib.c:11".to_string(),
                    source_line: "11\tmalloc(4096);".to_string(),
                },
            ],
        );
        FakeWorld { functions, pid: 4242 }
    }
}

impl Session for FakeSession {
    fn run_to_entry(&mut self) -> Result<(), Error> {
        self.current_path = CallPath::root();
        self.current_index = 0;
        self.exited = false;
        Ok(())
    }

    fn query_pid(&mut self) -> Result<u32, Error> {
        Ok(self.world.pid)
    }

    fn backtrace(&mut self) -> Result<Vec<String>, Error> {
        if self.exited || self.steps().is_empty() {
            return Ok(Vec::new());
        }
        let depth = self.current_path.depth() + 1;
        let mut frames = vec![self.steps()[self.current_index].frame_top.clone()];
        for i in 1..depth {
            frames.push(format!("#{}  <caller frame>", i));
        }
        Ok(frames)
    }

    fn current_frame_address(&mut self) -> Result<Option<String>, Error> {
        if self.exited {
            return Ok(None);
        }
        Ok(Some(format!("frame@{}", self.current_path.encode())))
    }

    fn step_one_source_line(&mut self) -> Result<String, Error> {
        if self.exited {
            return Ok(String::new());
        }
        self.current_index += 1;
        if self.current_index >= self.steps().len() {
            self.exited = true;
            return Ok(String::new());
        }
        Ok(self.steps()[self.current_index].source_line.clone())
    }

    fn step_into(&mut self) -> Result<(), Error> {
        let child_path = self.current_path.child(self.current_index as u32);
        if self.world.functions.contains_key(&child_path) {
            self.current_path = child_path;
            self.current_index = 0;
        }
        // if there is no such child function in the world, this simulates a
        // step-into that fails to descend: current_path/current_index are
        // left unchanged, so the caller's frame-identity check will see the
        // same prefix before and after and report DescentFailed.
        Ok(())
    }

    fn quit(&mut self) {}
}
