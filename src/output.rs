use std::collections::{HashMap, HashSet};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::model::HostRecord;

/// `<apex-or-file><YYYYMMDDHHMMSS>.txt`, used when `-o` is omitted.
pub fn default_output_path(label: &str) -> PathBuf {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    PathBuf::from(format!("{label}{timestamp}.txt"))
}

/// One line per host, UTF-8, Unix newlines:
/// `<host> , <title> , <ip1> , <ip2> , ...`
fn format_line(record: &HostRecord) -> String {
    let mut fields = vec![record.name.clone(), record.title.clone()];
    fields.extend(record.ips.iter().map(|ip| ip.to_string()));
    fields.join(" , ")
}

/// The first comma-separated field of each existing line — the set of
/// hosts already persisted, so a rerun appends only what is new.
pub fn read_hosts(path: &Path) -> std::io::Result<HashSet<String>> {
    if !path.exists() {
        return Ok(HashSet::new());
    }
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let mut hosts = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        if let Some(name) = line.split(',').next() {
            hosts.insert(name.trim().to_string());
        }
    }
    Ok(hosts)
}

/// Appends records not already present in the file; existing hosts are
/// never rewritten.
pub fn write_results(path: &Path, results: &HashMap<String, HostRecord>) -> std::io::Result<()> {
    let existing = read_hosts(path)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut names: Vec<&String> = results.keys().collect();
    names.sort();
    for name in names {
        if existing.contains(name) {
            continue;
        }
        let record = &results[name];
        writeln!(file, "{}", format_line(record))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;

    #[test]
    fn round_trips_host_name() {
        let dir = std::env::temp_dir().join(format!("subrecur-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.txt");
        let _ = std::fs::remove_file(&path);

        let mut results = HashMap::new();
        let mut record = HostRecord::new("www.example.com");
        record.add_ips(vec!["1.2.3.4".parse::<IpAddr>().unwrap()]);
        record.title = "Example".to_string();
        results.insert(record.name.clone(), record);

        write_results(&path, &results).unwrap();
        let hosts = read_hosts(&path).unwrap();
        assert!(hosts.contains("www.example.com"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn does_not_rewrite_existing_hosts() {
        let dir = std::env::temp_dir().join(format!("subrecur-test2-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("out.txt");
        let _ = std::fs::remove_file(&path);

        let mut first = HashMap::new();
        first.insert("a.example.com".to_string(), HostRecord::new("a.example.com"));
        write_results(&path, &first).unwrap();

        let mut second = HashMap::new();
        second.insert("a.example.com".to_string(), HostRecord::new("a.example.com"));
        second.insert("b.example.com".to_string(), HostRecord::new("b.example.com"));
        write_results(&path, &second).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);

        std::fs::remove_file(&path).unwrap();
    }
}
