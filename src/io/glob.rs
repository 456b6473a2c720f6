//! Input location expansion.
//!
//! A dataset names its inputs either as plain file paths or as glob patterns
//! (`runs/2024-*/events.parquet`). Patterns expand to every matching file in
//! sorted order, so the logical row space of a dataset is deterministic across
//! runs.

use anyhow::{Context, Result, bail};
use glob::glob;
use std::path::{Path, PathBuf};

/// Expand a glob pattern into a sorted vector of matching file paths.
///
/// Directories are skipped. Zero matches is not an error here; see
/// [`expand_inputs`] for the strict variant.
///
/// # Errors
///
/// Returns an error if the pattern is invalid or a matched entry cannot be read.
pub fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path =
            entry.with_context(|| format!("error reading glob entry for pattern: {pattern}"))?;
        if path.is_file() {
            result.push(path);
        }
    }

    result.sort();
    Ok(result)
}

fn is_pattern(location: &str) -> bool {
    location.contains(['*', '?', '['])
}

/// Resolve dataset input locations into concrete files, preserving the order of
/// `locations` (each pattern contributes its matches sorted).
///
/// # Errors
///
/// Fails if a plain path does not name an existing file, or a pattern matches
/// nothing.
pub fn expand_inputs<S: AsRef<str>>(locations: &[S]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for location in locations {
        let location = location.as_ref();
        if is_pattern(location) {
            let matched = expand_glob(location)?;
            if matched.is_empty() {
                bail!("no files found matching pattern: {location}");
            }
            files.extend(matched);
        } else {
            let path = Path::new(location);
            if !path.is_file() {
                bail!("input file does not exist: {location}");
            }
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn patterns_expand_sorted_and_plain_paths_pass_through() -> Result<()> {
        let dir = tempfile::tempdir()?;
        for name in ["b.parquet", "a.parquet", "c.txt"] {
            File::create(dir.path().join(name))?;
        }
        let pattern = format!("{}/*.parquet", dir.path().display());
        let plain = dir.path().join("c.txt").display().to_string();

        let files = expand_inputs(&[plain.as_str(), pattern.as_str()])?;
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name()?.to_str())
            .collect();
        assert_eq!(names, vec!["c.txt", "a.parquet", "b.parquet"]);
        Ok(())
    }

    #[test]
    fn missing_inputs_are_errors() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let pattern = format!("{}/*.parquet", dir.path().display());
        assert!(expand_inputs(&[pattern]).is_err());
        let plain = dir.path().join("nope.parquet").display().to_string();
        assert!(expand_inputs(&[plain]).is_err());
        Ok(())
    }
}
