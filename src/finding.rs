use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::call_path::CallPath;
use crate::Scalar;

/// One recorded delta: a line whose metric changed between two adjacent
/// samples in a way the delta predicate accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub finding_id: u64,
    pub source_file: PathBuf,
    pub line_number: u32,
    pub prev_metric: Scalar,
    pub new_metric: Scalar,
    pub parent_call_path: CallPath,
    pub step_index: u32,
}

impl Finding {
    /// `parentCallPath ⧺ [stepIndex]`, the path enqueued for the callee
    /// reached from this line.
    pub fn child_call_path(&self) -> CallPath {
        self.parent_call_path.child(self.step_index)
    }

    pub fn delta(&self) -> Scalar {
        self.new_metric - self.prev_metric
    }
}

/// Findings keyed by source file, plus the depth-ordered view the renderer
/// walks to produce one page per (sourceFile, parentCallPath).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FindingIndex {
    by_file: BTreeMap<PathBuf, Vec<Finding>>,
}

impl FindingIndex {
    pub fn new() -> Self {
        FindingIndex::default()
    }

    pub fn insert(&mut self, finding: Finding) {
        self.by_file
            .entry(finding.source_file.clone())
            .or_insert_with(Vec::new)
            .push(finding);
    }

    pub fn is_empty(&self) -> bool {
        self.by_file.values().all(Vec::is_empty)
    }

    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.by_file.keys()
    }

    pub fn findings_for_file(&self, file: &PathBuf) -> &[Finding] {
        self.by_file
            .get(file)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All findings, ordered by `(depth, parentCallPath, sourceFile,
    /// lineNumber)`, the order the renderer walks in.
    pub fn depth_ordered(&self) -> Vec<&Finding> {
        let mut all: Vec<&Finding> = self.by_file.values().flatten().collect();
        all.sort_by(|a, b| {
            let depth_a = a.parent_call_path.depth();
            let depth_b = b.parent_call_path.depth();
            depth_a
                .cmp(&depth_b)
                .then_with(|| a.parent_call_path.cmp(&b.parent_call_path))
                .then_with(|| a.source_file.cmp(&b.source_file))
                .then_with(|| a.line_number.cmp(&b.line_number))
        });
        all
    }

    /// Every distinct `(sourceFile, parentCallPath)` pair that needs a page,
    /// in the same depth-first order as `depth_ordered`.
    pub fn pages(&self) -> Vec<(PathBuf, CallPath)> {
        let mut seen = Vec::new();
        for finding in self.depth_ordered() {
            let key = (finding.source_file.clone(), finding.parent_call_path.clone());
            if !seen.contains(&key) {
                seen.push(key);
            }
        }
        seen
    }
}

/// Accepts findings and assigns each a stable, deterministic id so HTML
/// anchors do not depend on hash-map iteration order.
#[derive(Default)]
pub struct ReportStore {
    next_id: u64,
    index: FindingIndex,
}

impl ReportStore {
    pub fn new() -> Self {
        ReportStore::default()
    }

    pub fn record(
        &mut self,
        source_file: PathBuf,
        line_number: u32,
        prev_metric: Scalar,
        new_metric: Scalar,
        parent_call_path: CallPath,
        step_index: u32,
    ) -> &Finding {
        let finding_id = self.next_id;
        self.next_id += 1;
        let finding = Finding {
            finding_id,
            source_file: source_file.clone(),
            line_number,
            prev_metric,
            new_metric,
            parent_call_path,
            step_index,
        };
        self.index.insert(finding);
        self.index
            .by_file
            .get(&source_file)
            .and_then(|v| v.last())
            .expect("bug: just inserted a finding")
    }

    pub fn index(&self) -> &FindingIndex {
        &self.index
    }

    pub fn into_index(self) -> FindingIndex {
        self.index
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample_finding(id: u64, file: &str, line: u32, path: Vec<u32>, step: u32) -> Finding {
        Finding {
            finding_id: id,
            source_file: PathBuf::from(file),
            line_number: line,
            prev_metric: 0,
            new_metric: 100,
            parent_call_path: CallPath::from_steps(path),
            step_index: step,
        }
    }

    #[test]
    fn child_call_path_appends_step_index() {
        let finding = sample_finding(0, "a.c", 10, vec![1], 2);
        assert_eq!(finding.child_call_path(), CallPath::from_steps(vec![1, 2]));
    }

    #[test]
    fn depth_ordered_sorts_by_depth_then_path_then_file_then_line() {
        let mut index = FindingIndex::new();
        index.insert(sample_finding(0, "b.c", 5, vec![0], 1));
        index.insert(sample_finding(1, "a.c", 1, vec![], 0));
        index.insert(sample_finding(2, "a.c", 2, vec![], 3));

        let ordered = index.depth_ordered();
        let ids: Vec<u64> = ordered.iter().map(|f| f.finding_id).collect();
        assert_eq!(ids, vec![1, 2, 0]);
    }

    #[test]
    fn pages_deduplicates_by_file_and_parent_path() {
        let mut index = FindingIndex::new();
        index.insert(sample_finding(0, "a.c", 1, vec![], 0));
        index.insert(sample_finding(1, "a.c", 2, vec![], 1));

        assert_eq!(index.pages().len(), 1);
    }

    #[test]
    fn report_store_assigns_monotonic_ids() {
        let mut store = ReportStore::new();
        let id0 = store
            .record(PathBuf::from("a.c"), 1, 0, 10, CallPath::root(), 0)
            .finding_id;
        let id1 = store
            .record(PathBuf::from("a.c"), 2, 0, 20, CallPath::root(), 1)
            .finding_id;
        assert_eq!((id0, id1), (0, 1));
    }
}
