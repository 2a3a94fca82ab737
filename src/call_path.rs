use std::fmt;

use serde::{Deserialize, Serialize};

/// An ordered sequence of non-negative integers addressing a function frame
/// reached by alternating line-steps and step-intos from the program entry.
///
/// Two paths are equal iff their element sequences are equal; the empty
/// path denotes the program entry function.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallPath(Vec<u32>);

impl CallPath {
    pub fn root() -> Self {
        CallPath(Vec::new())
    }

    pub fn from_steps(steps: Vec<u32>) -> Self {
        CallPath(steps)
    }

    pub fn steps(&self) -> &[u32] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the path obtained by appending one more step index, the path
    /// enqueued for the callee reached from a finding at that step.
    pub fn child(&self, step_index: u32) -> CallPath {
        let mut steps = self.0.clone();
        steps.push(step_index);
        CallPath(steps)
    }

    /// Encodes the path for use in an HTML page filename: elements joined by
    /// `-`, stripped of brackets and whitespace. Nested subpaths (not
    /// produced by this crate's flat `CallPath`, but part of the naming
    /// contract) would be joined with `.`; a flat path never contains one.
    pub fn encode(&self) -> String {
        self.0
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// Parses the literal CLI encoding of a list of call paths: paths
    /// separated by `.`, each path's steps separated by `-`, brackets and
    /// whitespace stripped. `[[]]` (the default) yields one root path.
    pub fn parse_initial_paths(raw: &str) -> Result<Vec<CallPath>, String> {
        let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let cleaned = cleaned.trim_start_matches('[').trim_end_matches(']');
        if cleaned.is_empty() {
            return Ok(vec![CallPath::root()]);
        }

        cleaned
            .split(',')
            .map(|segment| {
                let segment = segment.trim_matches(|c| c == '[' || c == ']');
                if segment.is_empty() {
                    return Ok(CallPath::root());
                }
                segment
                    .split('-')
                    .map(|part| {
                        part.parse::<u32>()
                            .map_err(|_| format!("invalid call path element: {}", part))
                    })
                    .collect::<Result<Vec<u32>, String>>()
                    .map(CallPath::from_steps)
            })
            .collect()
    }
}

impl fmt::Display for CallPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.encode())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn root_is_empty_and_encodes_to_empty_string() {
        let root = CallPath::root();
        assert!(root.is_root());
        assert_eq!(root.encode(), "");
    }

    #[test]
    fn child_appends_one_step() {
        let root = CallPath::root();
        let child = root.child(3);
        assert_eq!(child.steps(), &[3]);
        assert_eq!(child.depth(), 1);

        let grandchild = child.child(7);
        assert_eq!(grandchild.steps(), &[3, 7]);
        assert_eq!(grandchild.encode(), "3-7");
    }

    #[test]
    fn distinct_paths_encode_distinctly() {
        let a = CallPath::from_steps(vec![1, 2]);
        let b = CallPath::from_steps(vec![12]);
        assert_ne!(a.encode(), b.encode());
    }

    #[test]
    fn parse_initial_paths_default() {
        let paths = CallPath::parse_initial_paths("[[]]").unwrap();
        assert_eq!(paths, vec![CallPath::root()]);
    }

    #[test]
    fn parse_initial_paths_multiple() {
        let paths = CallPath::parse_initial_paths("[[1-2], [3]]").unwrap();
        assert_eq!(
            paths,
            vec![
                CallPath::from_steps(vec![1, 2]),
                CallPath::from_steps(vec![3])
            ]
        );
    }
}
