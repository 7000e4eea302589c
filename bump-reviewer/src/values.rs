//! Custom values overlays: enumeration, filtering, naming.

use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::errors::BumpResult;

/// Lists custom override files matching the `values-*.yaml` convention in a
/// chart directory, sorted by name. Enumerated fresh at each use; nothing is
/// cached between stages.
pub fn list_values_files(chart_dir: &Path) -> BumpResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(chart_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("values-") && name.ends_with(".yaml") && entry.path().is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Extracts the sub-tree named after the dependency from a values overlay.
///
/// Only that sub-tree is relevant to the bump; returns `None` when the file
/// has no such top-level key, so the prompt can mark the file as irrelevant
/// explicitly instead of omitting it.
pub fn filter_subtree(values_file: &Path, dependency: &str) -> BumpResult<Option<String>> {
    let raw = std::fs::read_to_string(values_file)?;
    let doc: Value = serde_yaml::from_str(&raw)?;

    if !doc.is_mapping() {
        return Ok(None);
    }
    let Some(subtree) = doc.get(dependency) else {
        return Ok(None);
    };

    let mut wrapped = serde_yaml::Mapping::new();
    wrapped.insert(Value::String(dependency.to_string()), subtree.clone());
    Ok(Some(serde_yaml::to_string(&Value::Mapping(wrapped))?))
}

/// Output-key-safe slug of a values file name (`values-prod.yaml` → `values_prod`).
pub fn slug(values_file: &Path) -> String {
    let stem = values_file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn enumerates_only_conventional_overlays() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["values-prod.yaml", "values-dev.yaml", "values.yaml", "notes.txt"] {
            std::fs::File::create(tmp.path().join(name)).unwrap();
        }

        let files = list_values_files(tmp.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["values-dev.yaml", "values-prod.yaml"]);
    }

    #[test]
    fn subtree_filtering_keeps_only_the_dependency() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("values-prod.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "redis:\n  replicas: 3\npostgres:\n  storage: 10Gi").unwrap();

        let filtered = filter_subtree(&path, "redis").unwrap().unwrap();
        assert!(filtered.contains("replicas: 3"));
        assert!(!filtered.contains("postgres"));
        assert!(filter_subtree(&path, "kafka").unwrap().is_none());
    }

    #[test]
    fn slugs_are_output_key_safe() {
        assert_eq!(slug(Path::new("values-prod.yaml")), "values_prod");
        assert_eq!(slug(Path::new("values-eu-west.yaml")), "values_eu_west");
        // Dots and other punctuation in the stem must slug the same way for
        // artifact names and CI output keys.
        assert_eq!(slug(Path::new("values-v1.2.yaml")), "values_v1_2");
    }
}
