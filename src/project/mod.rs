use std::fs;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use self::{
    form::ProcessorForm,
    processor::{OutputProcessor, ProcessorType},
};

pub mod form;
pub mod processor;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
/// The document exchanged with the configuration endpoint (and stored on disk):
/// `{ "outputProcessors": [ ... ] }`. Entries are kept as raw JSON until decoded,
/// so one odd record does not spoil the whole list.
pub struct ProcessorDocument {
    #[serde(default)]
    pub output_processors: Vec<Value>,
}

/// A list entry as received: a record we understand, a known type with fields
/// that need fixing, or something we can only show and refuse to save.
#[derive(Clone, Debug, PartialEq)]
pub enum StoredProcessor {
    Known(OutputProcessor),
    Invalid {
        active: bool,
        description: String,
        form: ProcessorForm,
    },
    Unrecognised { type_name: String, raw: Value },
}

impl StoredProcessor {
    pub fn decode(raw: Value) -> StoredProcessor {
        match serde_json::from_value::<OutputProcessor>(raw.clone()) {
            Ok(processor) => StoredProcessor::Known(processor),
            Err(e) => {
                let type_name = raw
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("(none)")
                    .to_string();
                match ProcessorType::from_tag(&type_name) {
                    Some(processor_type) => {
                        warn!("Could not decode \"{}\" output processor: {}", type_name, e);
                        StoredProcessor::Invalid {
                            active: raw_active(&raw),
                            description: raw_description(&raw),
                            form: ProcessorForm::from_raw(processor_type, &raw),
                        }
                    }
                    None => {
                        warn!("Unknown output processor type \"{}\"", type_name);
                        StoredProcessor::Unrecognised { type_name, raw }
                    }
                }
            }
        }
    }
}

/// `active` of a record that did not decode; a boolean or any non-zero number
pub fn raw_active(raw: &Value) -> bool {
    raw.get("active")
        .map(|a| a.as_bool().unwrap_or(a.as_i64().unwrap_or(0) != 0))
        .unwrap_or(false)
}

pub fn raw_description(raw: &Value) -> String {
    raw.get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

impl ProcessorDocument {
    pub fn from_processors(processors: &[OutputProcessor]) -> anyhow::Result<ProcessorDocument> {
        let output_processors = processors
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProcessorDocument { output_processors })
    }

    pub fn entries(&self) -> Vec<StoredProcessor> {
        self.output_processors
            .iter()
            .cloned()
            .map(StoredProcessor::decode)
            .collect()
    }

    pub fn load(path: &str) -> anyhow::Result<ProcessorDocument> {
        let text = fs::read_to_string(path);
        match text {
            Ok(d) => {
                info!("Found processor list {}; parsing...", &path);
                let document = serde_json::from_str::<ProcessorDocument>(&d)?;
                info!(
                    "... loaded {} output processors OK",
                    document.output_processors.len()
                );
                Ok(document)
            }
            Err(e) => {
                warn!("Failed to load output processors from disk: {:?}", e);
                Err(e.into())
            }
        }
    }

    pub fn save(path: &str, document: &ProcessorDocument) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(document)?;
        debug!("{}", json);

        fs::write(path, json)?;

        info!("Saved output processors JSON to \"{}\" OK", &path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::processor::ProcessorKind;
    use super::*;

    #[test]
    fn unknown_and_malformed_entries_are_kept() {
        let document: ProcessorDocument = serde_json::from_value(json!({
            "outputProcessors": [
                {"type": "Hold Value", "active": 1, "description": "", "start": 11, "count": 5},
                {"type": "Fold", "active": 1, "description": "new in firmware"},
                {"type": "Set Value", "active": 1, "description": "", "start": 1}
            ]
        }))
        .unwrap();

        let entries = document.entries();
        assert_eq!(entries.len(), 3);
        assert!(matches!(
            &entries[0],
            StoredProcessor::Known(OutputProcessor {
                kind: ProcessorKind::HoldValue { start: 11, count: 5 },
                ..
            })
        ));
        assert!(matches!(
            &entries[1],
            StoredProcessor::Unrecognised { type_name, .. } if type_name == "Fold"
        ));
        assert_eq!(
            entries[2],
            StoredProcessor::Invalid {
                active: true,
                description: String::new(),
                form: ProcessorForm::SetValue {
                    start: String::from("1"),
                    count: String::new(),
                    value: String::new(),
                },
            }
        );
    }

    #[test]
    fn known_type_with_bad_field_keeps_its_form() {
        let entry = StoredProcessor::decode(json!({
            "type": "Brightness", "active": false, "description": "house",
            "start": 1, "count": 512, "brightness": null, "gamma": 2.2
        }));
        assert_eq!(
            entry,
            StoredProcessor::Invalid {
                active: false,
                description: String::from("house"),
                form: ProcessorForm::Brightness {
                    start: String::from("1"),
                    count: String::from("512"),
                    brightness: String::new(),
                    gamma: String::from("2.2"),
                },
            }
        );
    }

    #[test]
    fn missing_list_is_empty() {
        let document: ProcessorDocument = serde_json::from_str("{}").unwrap();
        assert!(document.entries().is_empty());
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outputprocessors.json");
        let path = path.to_str().unwrap();

        let processors = vec![OutputProcessor {
            active: true,
            description: String::from("front wash"),
            kind: ProcessorKind::SetValue {
                start: 1,
                count: 10,
                value: 255,
            },
        }];
        let document = ProcessorDocument::from_processors(&processors).unwrap();
        ProcessorDocument::save(path, &document).unwrap();

        let loaded = ProcessorDocument::load(path).unwrap();
        assert_eq!(loaded, document);
        assert_eq!(
            loaded.entries(),
            vec![StoredProcessor::Known(processors[0].clone())]
        );
    }
}
