use std::collections::HashSet;
use std::path::Path;

use crate::error::{EnumError, Result};

/// Reads one label per line; blank lines and `#`-comments are skipped.
/// Deduplicated, order-insensitive.
pub fn load(path: &Path) -> Result<HashSet<String>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| EnumError::DictUnreadable(path.display().to_string(), e))?;
    Ok(parse(&text))
}

fn parse(text: &str) -> HashSet<String> {
    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|l| l.to_lowercase())
        .collect()
}

/// Every dot-separated label of `host` that sits above `apex`, e.g. for
/// `host = "m.cn.qq.com"` and `apex = "qq.com"` this yields `["m", "cn"]`.
/// This is the mechanism by which deep recursive discoveries widen the
/// dictionary, not just the leftmost label of a one-level-deep host.
pub fn labels_above(host: &str, apex: &str) -> Vec<String> {
    let Some(prefix) = host.strip_suffix(&format!(".{apex}")) else {
        return Vec::new();
    };
    if prefix.is_empty() {
        return Vec::new();
    }
    prefix.split('.').map(|s| s.to_string()).collect()
}

/// Overwrites `path` with the union of its previous contents (if any) and
/// `new_labels`, deduplicated and lexicographically sorted. Idempotent:
/// running this twice with the same `new_labels` leaves the file
/// byte-identical on the second run.
pub fn feedback(path: &Path, new_labels: &HashSet<String>) -> std::io::Result<()> {
    let mut all: HashSet<String> = match std::fs::read_to_string(path) {
        Ok(text) => parse(&text),
        Err(_) => HashSet::new(),
    };
    all.extend(new_labels.iter().cloned());

    let mut sorted: Vec<&String> = all.iter().collect();
    sorted.sort();

    let body = sorted
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let body = if body.is_empty() {
        body
    } else {
        format!("{body}\n")
    };
    std::fs::write(path, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blanks_and_comments() {
        let parsed = parse("www\n\n# comment\nmail\n");
        assert_eq!(
            parsed,
            ["www", "mail"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn labels_above_extracts_every_level() {
        assert_eq!(
            labels_above("m.cn.qq.com", "qq.com"),
            vec!["m".to_string(), "cn".to_string()]
        );
        assert_eq!(labels_above("qq.com", "qq.com"), Vec::<String>::new());
    }

    #[test]
    fn feedback_is_idempotent() {
        let dir = std::env::temp_dir().join(format!("subrecur-dict-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("dict.txt");
        let _ = std::fs::remove_file(&path);

        let labels: HashSet<String> = ["www", "mail"].iter().map(|s| s.to_string()).collect();
        feedback(&path, &labels).unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        feedback(&path, &labels).unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);

        std::fs::remove_file(&path).unwrap();
    }
}
