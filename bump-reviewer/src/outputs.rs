//! CI output emission.
//!
//! Key=value pairs for later pipeline stages, appended to the file named by
//! `GITHUB_OUTPUT`. Falls back to stdout for local runs so the values stay
//! visible either way.

use std::io::Write;

use crate::errors::BumpResult;

/// Accumulates outputs during the run; written once at the end.
#[derive(Debug, Default)]
pub struct CiOutputs {
    entries: Vec<(String, String)>,
}

impl CiOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, if value { "true" } else { "false" });
    }

    /// Appends all entries to `$GITHUB_OUTPUT`, or prints them when unset.
    pub fn write(&self) -> BumpResult<()> {
        match std::env::var("GITHUB_OUTPUT") {
            Ok(path) if !path.trim().is_empty() => {
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                for (k, v) in &self.entries {
                    writeln!(file, "{k}={v}")?;
                }
            }
            _ => {
                for (k, v) in &self.entries {
                    println!("{k}={v}");
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_serialize_as_lowercase_booleans() {
        let mut out = CiOutputs::new();
        out.set("chart", "app");
        out.set_flag("skip_ai", true);
        out.set_flag("breaking_changes", false);

        assert_eq!(
            out.entries(),
            &[
                ("chart".to_string(), "app".to_string()),
                ("skip_ai".to_string(), "true".to_string()),
                ("breaking_changes".to_string(), "false".to_string()),
            ]
        );
    }
}
