//! The raw-data file format used by `-d` (dump findings without rendering)
//! and `-l` (load a previously-saved file and render HTML without running
//! the debugger). The format is unspecified beyond "round-trips through
//! `-d`/`-l`", so this crate reuses the `serde_json` it already pulls in
//! for error conversions.

use std::fs;
use std::path::Path;

use crate::error::Error;
use crate::finding::FindingIndex;

pub fn dump(index: &FindingIndex, path: &Path) -> Result<(), Error> {
    let json = serde_json::to_string_pretty(index)?;
    fs::write(path, json)?;
    Ok(())
}

pub fn load(path: &Path) -> Result<FindingIndex, Error> {
    let contents = fs::read_to_string(path)?;
    let index = serde_json::from_str(&contents)?;
    Ok(index)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn dump_then_load_round_trips_depth_ordered_findings() {
        let mut index = FindingIndex::new();
        index.insert(crate::finding::Finding {
            finding_id: 0,
            source_file: PathBuf::from("a.c"),
            line_number: 1,
            prev_metric: 0,
            new_metric: 100,
            parent_call_path: crate::call_path::CallPath::root(),
            step_index: 0,
        });

        let path = std::env::temp_dir().join(format!("gdbsearch-raw-{}.json", std::process::id()));
        dump(&index, &path).unwrap();
        let loaded = load(&path).unwrap();

        let before: Vec<_> = index.depth_ordered().into_iter().cloned().collect();
        let after: Vec<_> = loaded.depth_ordered().into_iter().cloned().collect();
        assert_eq!(before, after);

        std::fs::remove_file(&path).ok();
    }
}
