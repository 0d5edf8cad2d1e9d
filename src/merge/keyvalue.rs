//! Flat `key=value` settings merge.
//!
//! The merge is line-oriented. The target's line order, comments, and blank
//! lines are authoritative; fragment values overwrite matching keys in
//! place, and keys the target has never heard of are appended at the end.
//!
//! A line is recognized by a permissive pattern with a separate group for a
//! leading run of `#` markers. The lookup key is the part after the
//! markers, so a fully commented-out `key=value` line still defines `key`:
//! when a fragment also sets that key, the line is rewritten live
//! (uncommented). Boot-time uncommenting of default-disabled settings
//! depends on this.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use regex_lite::Regex;

use super::{MergeEngine, MergeError};

/// Merge engine for flat `key=value` settings files.
pub struct KeyValueMerge;

impl MergeEngine for KeyValueMerge {
    fn merge(&self, source: &Path, target: &Path) -> Result<(), MergeError> {
        let pattern = line_pattern();
        let target_text = read(target)?;
        let source_text = read(source)?;

        // Layered mapping: target entries first, fragment entries on top.
        // Insertion order is preserved, so keys new to the target keep the
        // fragment's order when appended below.
        let mut combined: IndexMap<String, String> = IndexMap::new();
        collect_live_entries(&pattern, &target_text, &mut combined);
        collect_live_entries(&pattern, &source_text, &mut combined);

        let mut seen: HashSet<String> = HashSet::new();
        let mut lines: Vec<String> = Vec::new();

        for line in target_text.lines() {
            match pattern.captures(line) {
                Some(caps) => {
                    let key = &caps[2];
                    if let Some(value) = combined.get(key) {
                        lines.push(format!("{}={}", key, value));
                        seen.insert(key.to_string());
                    } else {
                        lines.push(line.to_string());
                    }
                }
                None => lines.push(line.to_string()),
            }
        }

        for (key, value) in &combined {
            if !seen.contains(key.as_str()) {
                lines.push(format!("{}={}", key, value));
            }
        }

        write_lines(target, &lines)
    }
}

/// Settings-line shape: optional `#` run, key token, `=`, rest of the line.
///
/// The key charset deliberately excludes whitespace and `=` so oddly
/// formatted lines fall through unmodified instead of being normalized.
fn line_pattern() -> Regex {
    Regex::new(r"^(#*)([A-Za-z0-9_.,:/\-]+)=(.*)$").unwrap()
}

/// Add every live (uncommented) `key=value` line of `text` to `entries`.
/// Later occurrences of a key overwrite earlier ones.
fn collect_live_entries(pattern: &Regex, text: &str, entries: &mut IndexMap<String, String>) {
    for line in text.lines() {
        if let Some(caps) = pattern.captures(line) {
            if caps[1].is_empty() {
                entries.insert(caps[2].to_string(), caps[3].to_string());
            }
        }
    }
}

fn read(path: &Path) -> Result<String, MergeError> {
    fs::read_to_string(path).map_err(|e| MergeError::Io(format!("{}: {}", path.display(), e)))
}

fn write_lines(path: &Path, lines: &[String]) -> Result<(), MergeError> {
    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    fs::write(path, text).map_err(|e| MergeError::Io(format!("{}: {}", path.display(), e)))
}
