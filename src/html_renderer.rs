//! Renders one HTML page per `(sourceFile, parentCallPath)` pair: every
//! source line, a score bar proportional to the line's share of the page's
//! total recorded delta, and per-finding hyperlinks to the callee's page.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::call_path::CallPath;
use crate::error::Error;
use crate::finding::{Finding, FindingIndex};
use crate::source_resolver::SourceResolver;
use crate::Scalar;

const BAR_RESOLUTION: u32 = 40;

/// `gdbsearch<encoded-path>.html`, where the encoded path joins the path's
/// elements with `-` and strips brackets/whitespace; the root page is
/// `gdbsearch.html`.
pub fn page_filename(path: &CallPath) -> String {
    format!("gdbsearch{}.html", path.encode())
}

pub struct HtmlRenderer;

impl HtmlRenderer {
    pub fn render_all(
        index: &FindingIndex,
        resolver: &mut SourceResolver,
        out_dir: &Path,
    ) -> Result<(), Error> {
        fs::create_dir_all(out_dir)?;

        for (file, parent_path) in index.pages() {
            let findings_on_page: Vec<&Finding> = index
                .findings_for_file(&file)
                .iter()
                .filter(|f| f.parent_call_path == parent_path)
                .collect();

            let source_lines = Self::read_source_lines(&file, resolver);
            let html = render_page(&file, &parent_path, &findings_on_page, source_lines.as_deref());

            let out_path = out_dir.join(page_filename(&parent_path));
            fs::write(out_path, html)?;
        }

        // Ensure the root page always exists, even if every non-root path
        // aborted and left no root-level findings: an empty page with no
        // annotated lines is still a valid result (S1).
        let root_path = out_dir.join(page_filename(&CallPath::root()));
        if !root_path.exists() {
            fs::write(root_path, render_empty_root_page())?;
        }

        Ok(())
    }

    fn read_source_lines(bare_name: &Path, resolver: &mut SourceResolver) -> Option<Vec<String>> {
        let bare_name = bare_name.to_str()?;
        let resolved = resolver.resolve(bare_name)?.to_path_buf();
        fs::read_to_string(&resolved)
            .ok()
            .map(|contents| contents.lines().map(str::to_string).collect())
    }
}

fn render_empty_root_page() -> String {
    render_page(&PathBuf::new(), &CallPath::root(), &[], None)
}

fn render_page(
    file: &Path,
    parent_path: &CallPath,
    findings: &[&Finding],
    source_lines: Option<&[String]>,
) -> String {
    let total: Scalar = findings.iter().map(|f| f.delta()).sum();

    let mut findings_by_line: std::collections::BTreeMap<u32, Vec<&Finding>> = Default::default();
    for finding in findings {
        findings_by_line
            .entry(finding.line_number)
            .or_insert_with(Vec::new)
            .push(finding);
    }

    let mut body = String::new();
    let _ = writeln!(body, "<table class=\"source\">");

    // A finding can be recorded against a file whose source text never
    // resolved (S4): it still needs a row on this page, so the iteration
    // bound also covers the highest line number any finding references.
    let line_count = source_lines.map(Vec::len).unwrap_or(0).max(
        findings_by_line.keys().copied().last().unwrap_or(0) as usize,
    );
    let mut anchor_seq = 0u32;

    for line_no in 1..=line_count {
        let line_no = line_no as u32;
        let text = source_lines
            .and_then(|lines| lines.get(line_no as usize - 1))
            .cloned()
            .unwrap_or_else(|| "(source unavailable)".to_string());

        match findings_by_line.get(&line_no) {
            None => {
                let _ = writeln!(
                    body,
                    "<tr><td class=\"lineno\">{}</td><td class=\"bar\"></td><td class=\"text\">{}</td></tr>",
                    line_no,
                    html_escape(&text)
                );
            }
            Some(line_findings) => {
                anchor_seq += 1;
                let line_total: Scalar = line_findings.iter().map(|f| f.delta()).sum();
                let bar_width = if total > 0 {
                    ((line_total as f64 / total as f64) * BAR_RESOLUTION as f64).round() as u32
                } else {
                    0
                };
                let bar = "#".repeat(bar_width as usize);

                let mut links = String::new();
                let tooltip: Vec<String> = line_findings
                    .iter()
                    .map(|f| format!("frame {}: {} -> {}", f.step_index, f.prev_metric, f.new_metric))
                    .collect();

                for (frame_ordinal, finding) in line_findings.iter().enumerate() {
                    let child_path = finding.child_call_path();
                    let _ = write!(
                        links,
                        "<a href=\"{}\" title=\"{}\">[{}]</a> ",
                        page_filename(&child_path),
                        html_escape(&tooltip.join("; ")),
                        frame_ordinal
                    );
                }

                let _ = writeln!(
                    body,
                    "<tr id=\"f{}\"><td class=\"lineno\"><a href=\"#f{}\">&uarr;</a><a href=\"#f{}\">&darr;</a> {}</td><td class=\"bar\">{}</td><td class=\"text\">{} {}</td></tr>",
                    anchor_seq,
                    anchor_seq.saturating_sub(1),
                    anchor_seq + 1,
                    line_no,
                    bar,
                    html_escape(&text),
                    links
                );
            }
        }
    }

    let _ = writeln!(body, "</table>");

    format!(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{} {}</title></head><body><h1>{} &mdash; {}</h1>{}</body></html>",
        html_escape(&file.to_string_lossy()),
        parent_path,
        html_escape(&file.to_string_lossy()),
        parent_path,
        body
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::call_path::CallPath;

    fn finding(id: u64, line: u32, prev: Scalar, new: Scalar, parent: Vec<u32>, step: u32) -> Finding {
        Finding {
            finding_id: id,
            source_file: PathBuf::from("a.c"),
            line_number: line,
            prev_metric: prev,
            new_metric: new,
            parent_call_path: CallPath::from_steps(parent),
            step_index: step,
        }
    }

    #[test]
    fn page_filename_root_is_bare_name() {
        assert_eq!(page_filename(&CallPath::root()), "gdbsearch.html");
    }

    #[test]
    fn page_filename_encodes_path_with_dashes() {
        let path = CallPath::from_steps(vec![1, 2]);
        assert_eq!(page_filename(&path), "gdbsearch1-2.html");
    }

    #[test]
    fn distinct_paths_yield_distinct_filenames() {
        let a = CallPath::from_steps(vec![1, 2]);
        let b = CallPath::from_steps(vec![12]);
        assert_ne!(page_filename(&a), page_filename(&b));
    }

    #[test]
    fn score_bar_sums_to_total_within_rounding() {
        let f1 = finding(0, 1, 0, 50, vec![], 0);
        let f2 = finding(1, 2, 0, 50, vec![], 1);
        let findings = vec![&f1, &f2];
        let source = vec!["line one".to_string(), "line two".to_string()];

        let html = render_page(Path::new("a.c"), &CallPath::root(), &findings, Some(&source));
        // Both lines have equal deltas (50/100 = 50%), so each bar should be
        // half of BAR_RESOLUTION within one unit of rounding.
        let hashes: usize = html.matches('#').count();
        assert!((hashes as i64 - BAR_RESOLUTION as i64).abs() <= 2);
    }

    #[test]
    fn unannotated_lines_render_an_empty_bar() {
        let findings: Vec<&Finding> = vec![];
        let source = vec!["only line".to_string()];
        let html = render_page(Path::new("a.c"), &CallPath::root(), &findings, Some(&source));
        assert!(html.contains("class=\"bar\"></td>"));
    }
}
