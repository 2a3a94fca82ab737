//! Harvests source search directories from a debugger init file
//! (`.gdbinit`-style `directory <dir>[:<dir>]*` lines). This is the one
//! concrete external collaborator the search engine needs in order to be
//! runnable end to end; `SourceResolver` itself stays agnostic of where its
//! search list came from.

use std::path::PathBuf;

pub fn search_dirs_from_contents(contents: &str) -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    for line in contents.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("directory ") {
            for part in rest.split(':') {
                let part = part.trim();
                if !part.is_empty() {
                    dirs.push(PathBuf::from(part));
                }
            }
        }
    }
    dirs
}

pub fn search_dirs_from_file(path: &std::path::Path) -> std::io::Result<Vec<PathBuf>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(search_dirs_from_contents(&contents))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_single_directory_line() {
        let dirs = search_dirs_from_contents("directory /home/user/src\n");
        assert_eq!(dirs, vec![PathBuf::from("/home/user/src")]);
    }

    #[test]
    fn parses_colon_separated_directories() {
        let dirs = search_dirs_from_contents("directory /a:/b:/c\n");
        assert_eq!(
            dirs,
            vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")]
        );
    }

    #[test]
    fn ignores_unrelated_lines() {
        let dirs = search_dirs_from_contents("break main\ndirectory /x\nrun\n");
        assert_eq!(dirs, vec![PathBuf::from("/x")]);
    }
}
