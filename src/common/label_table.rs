use std::collections::HashMap;
use std::path::Path;

use regex::Regex;

use crate::error::DetectError;
use crate::utils;

/// Read-only mapping from a model's integer class ids to category names.
///
/// Injected at detector construction; detections whose raw class id is absent
/// from the table are dropped during decoding, never errored.
#[derive(Debug, Clone, Default)]
pub struct ClassLabelTable {
    names: HashMap<i64, String>,
}

impl ClassLabelTable {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (i64, S)>,
        S: Into<String>,
    {
        Self {
            names: pairs.into_iter().map(|(id, n)| (id, n.into())).collect(),
        }
    }

    /// Loads a plain-text labels file, one name per line. Ids are assigned
    /// from 1 upward, matching the frozen-graph label-map convention where
    /// class 0 is reserved for background.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectError> {
        let lines = utils::file_to_vec(path.as_ref())
            .map_err(|e| DetectError::Configuration(format!("labels file unreadable: {e}")))?;
        Ok(Self {
            names: lines
                .into_iter()
                .enumerate()
                .map(|(i, name)| (i as i64 + 1, name))
                .collect(),
        })
    }

    /// Loads a JSON object of `"id": "name"` entries.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, DetectError> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DetectError::Configuration(format!("labels file unreadable: {e}")))?;
        let parsed: HashMap<String, String> = serde_json::from_str(&raw)
            .map_err(|e| DetectError::Configuration(format!("labels file not valid JSON: {e}")))?;
        let mut names = HashMap::with_capacity(parsed.len());
        for (id, name) in parsed {
            let id = id.parse::<i64>().map_err(|_| {
                DetectError::Configuration(format!("non-integer class id in labels file: {id:?}"))
            })?;
            names.insert(id, name);
        }
        Ok(Self { names })
    }

    /// Parses a class dictionary embedded in model metadata.
    /// String format: `{0: 'person', 1: 'bicycle', ..., 27: "traffic light"}`
    pub fn from_metadata_names(names: &str) -> Self {
        let re = Regex::new(r#"(\d+)\s*:\s*['"]([^'"]+)['"]"#).unwrap();
        let names = re
            .captures_iter(names)
            .filter_map(|cap| {
                let id = cap[1].parse::<i64>().ok()?;
                Some((id, cap[2].to_string()))
            })
            .collect();
        Self { names }
    }

    pub fn name(&self, class_id: i64) -> Option<&str> {
        self.names.get(&class_id).map(String::as_str)
    }

    pub fn contains(&self, class_id: i64) -> bool {
        self.names.contains_key(&class_id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
