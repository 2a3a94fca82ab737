use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Maps a bare filename reported by the debugger to a readable absolute
/// path, searching a caller-supplied directory list in order and caching
/// both positive and negative outcomes. Once a name is marked unresolved it
/// is never reconsidered.
pub struct SourceResolver {
    search_dirs: Vec<PathBuf>,
    cache: HashMap<String, Option<PathBuf>>,
}

impl SourceResolver {
    pub fn new(search_dirs: Vec<PathBuf>) -> Self {
        SourceResolver {
            search_dirs,
            cache: HashMap::new(),
        }
    }

    /// Resolves `bare_name` to a readable path, or `None` if no candidate in
    /// the search list is readable. First match wins; ties are broken by
    /// search-directory order.
    pub fn resolve(&mut self, bare_name: &str) -> Option<&Path> {
        if !self.cache.contains_key(bare_name) {
            let resolved = self.resolve_uncached(bare_name);
            self.cache.insert(bare_name.to_string(), resolved);
        }
        self.cache.get(bare_name).unwrap().as_deref()
    }

    fn resolve_uncached(&self, bare_name: &str) -> Option<PathBuf> {
        let direct = Path::new(bare_name);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }

        for dir in &self.search_dirs {
            let candidate = dir.join(bare_name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        None
    }

    pub fn is_unresolved(&self, bare_name: &str) -> bool {
        matches!(self.cache.get(bare_name), Some(None))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use std::io::Write;

    fn tempdir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("gdbsearch-test-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn resolves_direct_path_first() {
        let dir = tempdir("direct");
        let file = dir.join("a.c");
        fs::File::create(&file).unwrap().write_all(b"x").unwrap();

        let mut resolver = SourceResolver::new(vec![]);
        let resolved = resolver.resolve(file.to_str().unwrap());
        assert_eq!(resolved, Some(file.as_path()));
    }

    #[test]
    fn searches_directories_in_order_first_match_wins() {
        let dir_a = tempdir("order-a");
        let dir_b = tempdir("order-b");
        let file_b = dir_b.join("shared.c");
        fs::File::create(&file_b).unwrap().write_all(b"x").unwrap();

        let mut resolver = SourceResolver::new(vec![dir_a, dir_b.clone()]);
        let resolved = resolver.resolve("shared.c").unwrap().to_path_buf();
        assert_eq!(resolved, file_b);
    }

    #[test]
    fn unresolved_names_are_cached_and_never_reconsidered() {
        let mut resolver = SourceResolver::new(vec![]);
        assert_eq!(resolver.resolve("nope.c"), None);
        assert!(resolver.is_unresolved("nope.c"));
        // still none, cache hit rather than a second filesystem probe
        assert_eq!(resolver.resolve("nope.c"), None);
    }
}
