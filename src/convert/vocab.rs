//! Class vocabulary: the bijection between class names and YOLO ids.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::encoding;
use crate::error::LabelOpsError;

pub const CLASSES_FILE_NAME: &str = "classes.txt";
pub const MAPPING_FILE_NAME: &str = "class_mapping.json";

/// A bijective `name → id` mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassVocabulary {
    by_name: BTreeMap<String, u32>,
}

impl ClassVocabulary {
    /// Assign ids by lexicographic rank of the distinct names.
    pub fn from_names<I>(names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let distinct: BTreeSet<String> = names.into_iter().collect();
        let by_name = distinct
            .into_iter()
            .enumerate()
            .map(|(idx, name)| (name, idx as u32))
            .collect();
        Self { by_name }
    }

    /// Use an explicit mapping. Two names may not share an id.
    pub fn from_mapping(by_name: BTreeMap<String, u32>) -> Result<Self, LabelOpsError> {
        let mut owners: BTreeMap<u32, &str> = BTreeMap::new();
        for (name, id) in &by_name {
            if let Some(existing) = owners.insert(*id, name) {
                return Err(LabelOpsError::InvalidVocabulary {
                    message: format!("'{existing}' and '{name}' both map to id {id}"),
                });
            }
        }
        Ok(Self { by_name })
    }

    /// Load a mapping file: `*.json` (`{"name": id}`), `*.yaml`/`*.yml`
    /// (Ultralytics `names:` list or map), or a `classes.txt`-style list.
    pub fn load(path: &Path) -> Result<Self, LabelOpsError> {
        if !path.is_file() {
            return Err(LabelOpsError::MappingNotFound {
                path: path.to_path_buf(),
            });
        }

        let text = encoding::read_text(path)?.text;
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let by_name = match ext.as_deref() {
            Some("json") => serde_json::from_str::<BTreeMap<String, u32>>(&text).map_err(
                |source| LabelOpsError::MappingParse {
                    path: path.to_path_buf(),
                    message: source.to_string(),
                },
            )?,
            Some("yaml") | Some("yml") => names_to_mapping(read_data_yaml_names(path, &text)?),
            _ => names_to_mapping(read_classes_txt(path, &text)?),
        };

        Self::from_mapping(by_name)
    }

    pub fn id(&self, name: &str) -> Option<u32> {
        self.by_name.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, u32> {
        &self.by_name
    }

    /// Names ordered by id.
    pub fn names_by_id(&self) -> Vec<&str> {
        let mut pairs: Vec<(u32, &str)> = self
            .by_name
            .iter()
            .map(|(name, id)| (*id, name.as_str()))
            .collect();
        pairs.sort();
        pairs.into_iter().map(|(_, name)| name).collect()
    }

    /// Write `classes.txt` and `class_mapping.json` into `dir`.
    pub fn write_files(&self, dir: &Path) -> Result<(), LabelOpsError> {
        let mut classes = String::new();
        for name in self.names_by_id() {
            classes.push_str(name);
            classes.push('\n');
        }
        let classes_path = dir.join(CLASSES_FILE_NAME);
        fs::write(&classes_path, classes).map_err(|source| LabelOpsError::Write {
            path: classes_path.clone(),
            source,
        })?;

        let mapping_path = dir.join(MAPPING_FILE_NAME);
        let json = serde_json::to_string_pretty(&self.by_name).map_err(|source| {
            LabelOpsError::JsonWrite {
                path: mapping_path.clone(),
                source,
            }
        })?;
        fs::write(&mapping_path, json + "\n").map_err(|source| LabelOpsError::Write {
            path: mapping_path.clone(),
            source,
        })
    }
}

fn names_to_mapping(names: Vec<String>) -> BTreeMap<String, u32> {
    names
        .into_iter()
        .enumerate()
        .map(|(idx, name)| (name, idx as u32))
        .collect()
}

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: DataYamlNames,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DataYamlNames {
    Sequence(Vec<String>),
    Mapping(BTreeMap<usize, String>),
}

fn read_data_yaml_names(path: &Path, text: &str) -> Result<Vec<String>, LabelOpsError> {
    let parsed: DataYaml =
        serde_yaml::from_str(text).map_err(|source| LabelOpsError::MappingParse {
            path: path.to_path_buf(),
            message: source.to_string(),
        })?;

    let names = match parsed.names {
        DataYamlNames::Sequence(names) => names,
        DataYamlNames::Mapping(mapping) => {
            let Some(max_index) = mapping.keys().max().copied() else {
                return Ok(Vec::new());
            };
            let mut names = vec![String::new(); max_index + 1];
            for (index, name) in mapping {
                names[index] = name;
            }
            for (index, name) in names.iter_mut().enumerate() {
                if name.trim().is_empty() {
                    *name = format!("class_{}", index);
                }
            }
            names
        }
    };

    Ok(names)
}

fn read_classes_txt(path: &Path, text: &str) -> Result<Vec<String>, LabelOpsError> {
    let mut names = Vec::new();

    for (line_idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(LabelOpsError::MappingParse {
                path: path.to_path_buf(),
                message: format!("line {} is empty", line_idx + 1),
            });
        }
        names.push(trimmed.to_string());
    }

    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_names_ranks_lexicographically() {
        let vocab = ClassVocabulary::from_names(
            ["b", "a", "b", "c"].into_iter().map(String::from),
        );
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.id("a"), Some(0));
        assert_eq!(vocab.id("b"), Some(1));
        assert_eq!(vocab.id("c"), Some(2));
        assert_eq!(vocab.id("d"), None);
    }

    #[test]
    fn from_mapping_rejects_shared_ids() {
        let mapping = BTreeMap::from([("car".to_string(), 0), ("bus".to_string(), 0)]);
        let err = ClassVocabulary::from_mapping(mapping).unwrap_err();
        assert!(matches!(err, LabelOpsError::InvalidVocabulary { .. }));
    }

    #[test]
    fn load_json_yaml_and_txt() {
        let temp = tempfile::tempdir().expect("create temp dir");

        let json = temp.path().join("map.json");
        fs::write(&json, r#"{"car-01": 0, "bus": 4}"#).expect("write json");
        let vocab = ClassVocabulary::load(&json).expect("load json");
        assert_eq!(vocab.id("bus"), Some(4));

        let yaml = temp.path().join("data.yaml");
        fs::write(&yaml, "names:\n  0: person\n  2: bicycle\n").expect("write yaml");
        let vocab = ClassVocabulary::load(&yaml).expect("load yaml");
        assert_eq!(vocab.names_by_id(), vec!["person", "class_1", "bicycle"]);

        let txt = temp.path().join("classes.txt");
        fs::write(&txt, "dog\ncat\n").expect("write txt");
        let vocab = ClassVocabulary::load(&txt).expect("load txt");
        assert_eq!(vocab.id("dog"), Some(0));
        assert_eq!(vocab.id("cat"), Some(1));
    }

    #[test]
    fn load_missing_and_malformed() {
        let err = ClassVocabulary::load(Path::new("/no/such/map.json")).unwrap_err();
        assert!(matches!(err, LabelOpsError::MappingNotFound { .. }));

        let temp = tempfile::tempdir().expect("create temp dir");
        let bad = temp.path().join("bad.json");
        fs::write(&bad, r#"{"car": -1}"#).expect("write json");
        let err = ClassVocabulary::load(&bad).unwrap_err();
        assert!(matches!(err, LabelOpsError::MappingParse { .. }));
    }

    #[test]
    fn write_files_orders_classes_by_id() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mapping = BTreeMap::from([("zebra".to_string(), 0), ("ant".to_string(), 1)]);
        let vocab = ClassVocabulary::from_mapping(mapping).expect("valid mapping");
        vocab.write_files(temp.path()).expect("write files");

        let classes = fs::read_to_string(temp.path().join(CLASSES_FILE_NAME)).expect("read");
        assert_eq!(classes, "zebra\nant\n");

        let json = fs::read_to_string(temp.path().join(MAPPING_FILE_NAME)).expect("read");
        let parsed: BTreeMap<String, u32> = serde_json::from_str(&json).expect("parse json");
        assert_eq!(parsed, *vocab.as_map());
    }
}
