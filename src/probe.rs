//! Metric probes: pure, non-perturbing functions `(pid) -> Scalar`, keyed by
//! name in a registry populated once at startup. The registry mirrors the
//! way the debug-adapter protocol dispatches requests by a string
//! discriminant onto a specialized handler, except here the discriminant is
//! chosen once on the command line rather than per message.

#[cfg(not(target_os = "linux"))]
compile_error!(
    "the reference metric probes read Linux-specific /proc files; build on \
     Linux, or supply a custom Probe implementation for this platform"
);

use std::collections::HashMap;
use std::fs;

use crate::error::Error;
use crate::Scalar;

/// A probe reads some characteristic of the running target without
/// perturbing it. Implementations must not write to the target's memory or
/// otherwise change its observable state.
///
/// The engine is single-threaded and cooperatively serial (one debugger
/// subprocess at a time), so probes need not be `Send`/`Sync`.
pub trait Probe {
    fn sample(&self, pid: u32) -> Result<Scalar, Error>;
}

pub struct ProbeRegistry {
    probes: HashMap<&'static str, Box<dyn Probe>>,
}

impl ProbeRegistry {
    /// Builds the registry of reference probes. Call once at startup.
    #[cfg(target_os = "linux")]
    pub fn with_reference_probes() -> Self {
        let mut probes: HashMap<&'static str, Box<dyn Probe>> = HashMap::new();
        probes.insert("private-dirty", Box::new(PrivateDirtyProbe));
        probes.insert("private", Box::new(PrivateProbe));
        probes.insert("read-bytes", Box::new(ReadBytesProbe));
        probes.insert("write-bytes", Box::new(WriteBytesProbe));
        probes.insert("open-fds", Box::new(OpenFdsProbe));
        ProbeRegistry { probes }
    }

    /// The default probe name used when the CLI is not given one.
    pub const DEFAULT_NAME: &'static str = "private";

    pub fn get(&self, name: &str) -> Result<&dyn Probe, Error> {
        self.probes
            .get(name)
            .map(|b| b.as_ref())
            .ok_or_else(|| Error::ProbeUnavailable(name.to_string()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.probes.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// Sums every integer field in `/proc/<pid>/smaps` whose name starts with
/// `prefix` (e.g. `Private_Dirty:` or `Private_`).
#[cfg(target_os = "linux")]
fn sum_smaps_fields(pid: u32, prefix: &str) -> Result<Scalar, Error> {
    let path = format!("/proc/{}/smaps", pid);
    let contents = fs::read_to_string(&path)
        .map_err(|e| Error::ProbeUnavailable(format!("{}: {}", path, e)))?;

    let mut total: Scalar = 0;
    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix(prefix) {
            if let Some(value) = parse_kb_field(rest) {
                total += value;
            }
        }
    }
    Ok(total)
}

/// Parses a `smaps`/`io`-style field value: the first whitespace-delimited
/// token after the field name, e.g. `"    1234 kB"` -> `1234`.
fn parse_kb_field(rest: &str) -> Option<Scalar> {
    rest.split_whitespace().next()?.parse::<Scalar>().ok()
}

#[cfg(target_os = "linux")]
fn read_io_field(pid: u32, field: &str) -> Result<Scalar, Error> {
    let path = format!("/proc/{}/io", pid);
    let contents = fs::read_to_string(&path)
        .map_err(|e| Error::ProbeUnavailable(format!("{}: {}", path, e)))?;

    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix(field) {
            if let Some(value) = parse_kb_field(rest) {
                return Ok(value);
            }
        }
    }
    Err(Error::ProbeUnavailable(format!(
        "field {} not found in {}",
        field, path
    )))
}

#[cfg(target_os = "linux")]
struct PrivateDirtyProbe;
#[cfg(target_os = "linux")]
impl Probe for PrivateDirtyProbe {
    fn sample(&self, pid: u32) -> Result<Scalar, Error> {
        sum_smaps_fields(pid, "Private_Dirty:")
    }
}

#[cfg(target_os = "linux")]
struct PrivateProbe;
#[cfg(target_os = "linux")]
impl Probe for PrivateProbe {
    fn sample(&self, pid: u32) -> Result<Scalar, Error> {
        sum_smaps_fields(pid, "Private_")
    }
}

#[cfg(target_os = "linux")]
struct ReadBytesProbe;
#[cfg(target_os = "linux")]
impl Probe for ReadBytesProbe {
    fn sample(&self, pid: u32) -> Result<Scalar, Error> {
        read_io_field(pid, "rchar:")
    }
}

#[cfg(target_os = "linux")]
struct WriteBytesProbe;
#[cfg(target_os = "linux")]
impl Probe for WriteBytesProbe {
    fn sample(&self, pid: u32) -> Result<Scalar, Error> {
        read_io_field(pid, "wchar:")
    }
}

#[cfg(target_os = "linux")]
struct OpenFdsProbe;
#[cfg(target_os = "linux")]
impl Probe for OpenFdsProbe {
    fn sample(&self, pid: u32) -> Result<Scalar, Error> {
        let path = format!("/proc/{}/fd", pid);
        let count = fs::read_dir(&path)
            .map_err(|e| Error::ProbeUnavailable(format!("{}: {}", path, e)))?
            .count();
        Ok(count as Scalar)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn registry_contains_reference_probes() {
        let registry = ProbeRegistry::with_reference_probes();
        assert_eq!(
            registry.names(),
            vec![
                "open-fds",
                "private",
                "private-dirty",
                "read-bytes",
                "write-bytes",
            ]
        );
    }

    #[test]
    fn unknown_probe_name_is_an_error() {
        let registry = ProbeRegistry::with_reference_probes();
        assert!(registry.get("does-not-exist").is_err());
    }

    #[test]
    fn parses_smaps_style_kb_fields() {
        assert_eq!(parse_kb_field("  1234 kB"), Some(1234));
        assert_eq!(parse_kb_field(""), None);
        assert_eq!(parse_kb_field("not-a-number kB"), None);
    }

    #[test]
    fn sum_smaps_fields_sums_matching_prefixed_lines() {
        // Exercised indirectly through the parse helper since reading a real
        // /proc/<pid>/smaps file is not reproducible in a unit test; the
        // prefix-matching and summation logic is covered by constructing the
        // field parser directly above.
        assert_eq!(
            "Private_Dirty:        12 kB\nPrivate_Clean:         4 kB"
                .lines()
                .filter_map(|l| l.strip_prefix("Private_").and_then(parse_kb_field))
                .sum::<Scalar>(),
            16
        );
    }
}
