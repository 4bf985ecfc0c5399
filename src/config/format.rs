// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pcaflow contributors

//! Line-oriented configuration format
//!
//! One `key value` pair per line. Values may be wrapped in double quotes and
//! may contain spaces. Blank lines and lines starting with `#` are ignored.
//! This is the format the pipeline's R scripts read.

use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::{PipelineError, PipelineResult};

/// Parse configuration text into sorted entries
pub fn parse_entries(content: &str, path: &Path) -> PipelineResult<BTreeMap<String, String>> {
    let mut entries = BTreeMap::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let error = |reason: String| PipelineError::ConfigLoad {
            path: path.to_path_buf(),
            line: idx + 1,
            reason,
        };

        let (key, rest) = match line.split_once(char::is_whitespace) {
            Some((key, rest)) => (key, rest.trim()),
            None => (line, ""),
        };

        if rest.is_empty() {
            return Err(error(format!("missing value for key '{}'", key)));
        }

        let value = if let Some(quoted) = rest.strip_prefix('"') {
            quoted
                .strip_suffix('"')
                .ok_or_else(|| error(format!("unterminated quote in value for '{}'", key)))?
        } else {
            rest
        };

        if entries.insert(key.to_string(), value.to_string()).is_some() {
            return Err(error(format!("duplicate key '{}'", key)));
        }
    }

    Ok(entries)
}

/// Render entries as configuration text, one quoted value per line
pub fn render_entries(entries: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in entries {
        out.push_str(&format!("{} \"{}\"\n", key, value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> PipelineResult<BTreeMap<String, String>> {
        parse_entries(content, Path::new("test.config"))
    }

    #[test]
    fn test_parse_quoted_and_bare_values() {
        let entries = parse(
            r#"
# study configuration
out_prefix "study1"
gds_file   data/study1_chr .gds
n_pcs 32
"#,
        )
        .unwrap();

        assert_eq!(entries["out_prefix"], "study1");
        assert_eq!(entries["gds_file"], "data/study1_chr .gds");
        assert_eq!(entries["n_pcs"], "32");
    }

    #[test]
    fn test_quoted_value_keeps_inner_spaces() {
        let entries = parse("in_file \"a_chr .RData\"\n").unwrap();
        assert_eq!(entries["in_file"], "a_chr .RData");
    }

    #[test]
    fn test_missing_value_reports_line() {
        let err = parse("a 1\nb\n").unwrap_err();
        match err {
            PipelineError::ConfigLoad { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("'b'"));
            }
            _ => panic!("Expected ConfigLoad error"),
        }
    }

    #[test]
    fn test_unterminated_quote() {
        let err = parse("a \"open\n").unwrap_err();
        assert!(matches!(err, PipelineError::ConfigLoad { line: 1, .. }));
    }

    #[test]
    fn test_duplicate_key() {
        let err = parse("a 1\na 2\n").unwrap_err();
        assert!(matches!(err, PipelineError::ConfigLoad { line: 2, .. }));
    }

    #[test]
    fn test_render_is_sorted_and_parseable() {
        let mut entries = BTreeMap::new();
        entries.insert("out_file".to_string(), "data/x_chr .gds".to_string());
        entries.insert("chromosomes".to_string(), "1 2 3".to_string());

        let text = render_entries(&entries);
        assert_eq!(text, "chromosomes \"1 2 3\"\nout_file \"data/x_chr .gds\"\n");
        assert_eq!(parse(&text).unwrap(), entries);
    }
}
