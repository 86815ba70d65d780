use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use memchr::memmem::Finder;
use std::fs;
use std::path::Path;
use tracing::instrument;
use whence_index::{Index, format};

/// Packages in `index` that ship `command`, in ascending name order.
///
/// The query is lowercased; stored binary names are compared as-is.
pub fn search(index: &Index, command: &str) -> Vec<String> {
    let command = command.to_lowercase();
    index.iter().filter(|(_, entry)| entry.provides(&command)).map(|(name, _)| name.to_string()).collect()
}

/// Like [`search()`], but over unparsed index text.
///
/// Only lines containing the query as a substring are parsed; each one must
/// still list the command as a whole binary name to count. Package names are
/// returned without their version, sorted and de-duplicated.
pub fn search_text(text: &str, command: &str) -> Vec<String> {
    let command = command.to_lowercase();
    if command.is_empty() {
        return Vec::new();
    }
    let finder = Finder::new(command.as_bytes());
    let mut packages: Vec<String> = text
        .lines()
        .filter(|line| finder.find(line.as_bytes()).is_some())
        .filter_map(format::parse_line)
        .filter(|(_, entry)| entry.provides(&command))
        .map(|(name, _)| name)
        .collect();
    packages.sort_unstable();
    packages.dedup();
    packages
}

/// Search the index file at `path` without loading it into an [`Index`].
///
/// A missing file has no matches.
#[instrument(skip_all, fields(path = %path.as_ref().display(), command = %command))]
pub fn search_file(path: impl AsRef<Path>, command: &str) -> Result<Vec<String>> {
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("Index file does not exist");
            return Ok(Vec::new());
        },
        Err(e) => return Err(ErrorKind::Io(e)).or_raise(|| ErrorKind::ReadIndex(path.to_path_buf())),
    };
    let packages = search_text(&String::from_utf8_lossy(&bytes), command);
    tracing::debug!(matches = packages.len(), "Searched index");
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use whence_index::IndexEntry;

    const INDEX: &str = "\
curl(8.5.0):curl curl-config
git(2.43.0):git git-shell scalar
jq:jq
netcat(0.7.1):nc netcat
openbsd-netcat:nc
wget2(2.1.0):wget2 wget2_noinstall
";

    #[rstest]
    #[case("git", &["git"])]
    #[case("GiT", &["git"])]
    #[case("nc", &["netcat", "openbsd-netcat"])]
    #[case("wget", &[])]
    #[case("curl-", &[])]
    #[case("scalar", &["git"])]
    #[case("", &[])]
    fn test_search_text(#[case] command: &str, #[case] expected: &[&str]) {
        assert_eq!(search_text(INDEX, command), expected);
    }

    #[rstest]
    #[case("git")]
    #[case("NC")]
    #[case("wget")]
    #[case("curl-config")]
    fn test_search_index_agrees_with_text(#[case] command: &str) {
        assert_eq!(search(&Index::parse(INDEX), command), search_text(INDEX, command));
    }

    #[test]
    fn test_stored_names_are_case_sensitive() {
        let index = Index::parse("xquartz:Xquartz xterm\n");
        assert!(search(&index, "Xquartz").is_empty());
        assert_eq!(search(&index, "XTERM"), ["xquartz"]);
    }

    #[test]
    fn test_substring_on_package_name_is_not_a_match() {
        // "curl" appears in the line, but only as the package name.
        assert!(search_text("curl(8.5.0):curlie\n", "curl").is_empty());
    }

    #[test]
    fn test_duplicate_lines_reported_once() {
        assert_eq!(search_text("jq:jq\njq(1.7):jq\n", "jq"), ["jq"]);
    }

    #[test]
    fn test_search_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("executables.txt");
        fs::write(&path, INDEX).unwrap();
        assert_eq!(search_file(&path, "nc").unwrap(), ["netcat", "openbsd-netcat"]);
    }

    #[test]
    fn test_every_saved_binary_is_found_after_reload() {
        let mut index = Index::new();
        index.insert("gcc", IndexEntry::new(Some("14.1.0".into()), ["c++", "c++-14", "gcc", "gcc-14"]));
        index.insert("jq", IndexEntry::new(None::<String>, ["jq"]));
        index.insert("netcat", IndexEntry::new(Some("0.7.1".into()), ["nc", "netcat"]));
        index.insert("openbsd-netcat", IndexEntry::new(None::<String>, ["nc"]));
        index.insert("python@3.12", IndexEntry::new(Some("3.12.4_1".into()), ["python3", "python3.12"]));
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("executables.txt");
        index.save(&path).unwrap();
        let reloaded = Index::load(&path).unwrap();
        assert_eq!(reloaded, index);

        for (name, entry) in index.iter() {
            for binary in &entry.binaries {
                assert!(search(&reloaded, binary).iter().any(|found| found == name), "{binary} in {name}");
                let from_file = search_file(&path, binary).unwrap();
                assert!(from_file.iter().any(|found| found == name), "{binary} in {name} on disk");
            }
        }
    }

    #[test]
    fn test_search_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(search_file(temp_dir.path().join("absent.txt"), "git").unwrap().is_empty());
    }

    #[test]
    fn test_search_unreadable_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = search_file(temp_dir.path(), "git").unwrap_err();
        assert!(matches!(&*err, ErrorKind::ReadIndex(_)));
    }
}
