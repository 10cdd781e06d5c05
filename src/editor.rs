use std::fmt;

use log::debug;
use serde_json::Value;

use crate::project::{
    form::{check_description, ProcessorForm, RowError},
    processor::{OutputProcessor, ProcessorType},
    raw_active, raw_description, StoredProcessor,
};

/// What the configuration cell of a row currently holds
#[derive(Clone, Debug, PartialEq)]
pub enum RowConfig {
    /// Newly added; the type selection is still showing
    Unselected,
    Configured(ProcessorForm),
    /// Came from the store with a type this editor does not know
    Unrecognised { type_name: String, raw: Value },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProcessorRow {
    /// Zero-based position; kept contiguous by every structural edit
    pub id: usize,
    pub active: bool,
    pub description: String,
    pub config: RowConfig,
}

impl ProcessorRow {
    /// Build the record for this row, or every reason it cannot be saved
    pub fn to_processor(&self) -> Result<OutputProcessor, Vec<RowError>> {
        let row = self.id + 1;
        let form = match &self.config {
            RowConfig::Unselected => return Err(vec![RowError::TypeNotSelected { row }]),
            RowConfig::Unrecognised { type_name, .. } => {
                return Err(vec![RowError::UnknownType {
                    row,
                    type_name: type_name.clone(),
                }])
            }
            RowConfig::Configured(form) => form,
        };

        let mut errors = Vec::new();
        if let Err(e) = check_description(row, &self.description) {
            errors.push(e);
        }
        match form.parse(row) {
            Ok(kind) if errors.is_empty() => Ok(OutputProcessor {
                active: self.active,
                description: self.description.clone(),
                kind,
            }),
            Ok(_) => Err(errors),
            Err(mut field_errors) => {
                errors.append(&mut field_errors);
                Err(errors)
            }
        }
    }
}

/// Every reason the table cannot be saved, in row order
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport(pub Vec<RowError>);

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

/// The ordered list of output processors being edited, plus the single row
/// selection used by Delete.
#[derive(Clone, Debug, Default)]
pub struct ProcessorTable {
    rows: Vec<ProcessorRow>,
    selected: Option<usize>,
}

impl ProcessorTable {
    pub fn new() -> ProcessorTable {
        ProcessorTable::default()
    }

    pub fn from_entries(entries: Vec<StoredProcessor>) -> ProcessorTable {
        let rows = entries
            .into_iter()
            .enumerate()
            .map(|(id, entry)| match entry {
                StoredProcessor::Known(processor) => ProcessorRow {
                    id,
                    active: processor.active,
                    config: RowConfig::Configured(ProcessorForm::from(&processor.kind)),
                    description: processor.description,
                },
                StoredProcessor::Invalid {
                    active,
                    description,
                    form,
                } => ProcessorRow {
                    id,
                    active,
                    description,
                    config: RowConfig::Configured(form),
                },
                StoredProcessor::Unrecognised { type_name, raw } => ProcessorRow {
                    id,
                    active: raw_active(&raw),
                    description: raw_description(&raw),
                    config: RowConfig::Unrecognised { type_name, raw },
                },
            })
            .collect();

        ProcessorTable {
            rows,
            selected: None,
        }
    }

    pub fn rows(&self) -> &[ProcessorRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [ProcessorRow] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|i| *i < self.rows.len());
    }

    /// Append a row with no type chosen yet; returns its index
    pub fn add_row(&mut self) -> usize {
        let id = self.rows.len();
        self.rows.push(ProcessorRow {
            id,
            active: true,
            description: String::new(),
            config: RowConfig::Unselected,
        });
        debug!("Added processor row #{}", id + 1);
        id
    }

    /// Swap the row's configuration for the default form of the chosen type
    pub fn set_type(&mut self, index: usize, processor_type: ProcessorType) {
        if let Some(row) = self.rows.get_mut(index) {
            debug!("Row #{} set to type {}", index + 1, processor_type);
            row.config = RowConfig::Configured(ProcessorForm::with_defaults(processor_type));
        }
    }

    /// Remove the selected row, if any, and clear the selection
    pub fn delete_selected(&mut self) -> Option<ProcessorRow> {
        let index = self.selected.take()?;
        if index >= self.rows.len() {
            return None;
        }
        let removed = self.rows.remove(index);
        debug!("Deleted processor row #{}", index + 1);
        self.renumber();
        Some(removed)
    }

    /// Move the row at `from` so that it ends up at position `to`
    pub fn move_row(&mut self, from: usize, to: usize) {
        if from >= self.rows.len() || to >= self.rows.len() || from == to {
            return;
        }
        let row = self.rows.remove(from);
        self.rows.insert(to, row);
        self.selected = self.selected.map(|s| {
            if s == from {
                to
            } else if from < s && s <= to {
                s - 1
            } else if to <= s && s < from {
                s + 1
            } else {
                s
            }
        });
        self.renumber();
    }

    fn renumber(&mut self) {
        for (id, row) in self.rows.iter_mut().enumerate() {
            row.id = id;
        }
    }

    /// Validate every row and build the list to submit. Nothing is returned
    /// unless all rows are valid.
    pub fn collect(&self) -> Result<Vec<OutputProcessor>, ValidationReport> {
        let mut processors = Vec::with_capacity(self.rows.len());
        let mut errors = Vec::new();

        for row in &self.rows {
            match row.to_processor() {
                Ok(p) => processors.push(p),
                Err(mut e) => errors.append(&mut e),
            }
        }

        if errors.is_empty() {
            Ok(processors)
        } else {
            Err(ValidationReport(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::project::processor::ProcessorKind;

    fn set_value_and_hold() -> Vec<StoredProcessor> {
        vec![
            StoredProcessor::Known(OutputProcessor {
                active: true,
                description: String::new(),
                kind: ProcessorKind::SetValue {
                    start: 1,
                    count: 10,
                    value: 255,
                },
            }),
            StoredProcessor::Known(OutputProcessor {
                active: true,
                description: String::new(),
                kind: ProcessorKind::HoldValue {
                    start: 11,
                    count: 5,
                },
            }),
        ]
    }

    fn hold(start: u32) -> StoredProcessor {
        StoredProcessor::Known(OutputProcessor {
            active: true,
            description: format!("hold {}", start),
            kind: ProcessorKind::HoldValue { start, count: 1 },
        })
    }

    fn starts(processors: &[OutputProcessor]) -> Vec<u32> {
        processors
            .iter()
            .map(|p| match p.kind {
                ProcessorKind::HoldValue { start, .. } => start,
                _ => 0,
            })
            .collect()
    }

    #[test]
    fn loaded_rows_show_record_values() {
        let table = ProcessorTable::from_entries(set_value_and_hold());
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.rows()[0].config,
            RowConfig::Configured(ProcessorForm::SetValue {
                start: "1".into(),
                count: "10".into(),
                value: "255".into()
            })
        );
        assert_eq!(
            table.rows()[1].config,
            RowConfig::Configured(ProcessorForm::HoldValue {
                start: "11".into(),
                count: "5".into()
            })
        );
    }

    #[test]
    fn unedited_table_collects_same_records() {
        let entries = set_value_and_hold();
        let table = ProcessorTable::from_entries(entries.clone());
        let collected = table.collect().unwrap();
        let expected: Vec<StoredProcessor> =
            collected.into_iter().map(StoredProcessor::Known).collect();
        assert_eq!(expected, entries);
    }

    #[test]
    fn new_row_starts_unselected_and_blocks_save() {
        let mut table = ProcessorTable::from_entries(set_value_and_hold());
        let index = table.add_row();
        assert_eq!(index, 2);
        assert!(table.rows()[2].active);
        assert_eq!(table.rows()[2].config, RowConfig::Unselected);

        let report = table.collect().unwrap_err();
        assert_eq!(report.0, vec![RowError::TypeNotSelected { row: 3 }]);
        assert_eq!(
            report.to_string(),
            "Output Processor type must be selected on row 3"
        );
    }

    #[test]
    fn choosing_a_type_fills_defaults() {
        let mut table = ProcessorTable::new();
        let index = table.add_row();
        table.set_type(index, ProcessorType::Remap);
        assert!(matches!(
            &table.rows()[0].config,
            RowConfig::Configured(form) if form.processor_type() == ProcessorType::Remap
        ));

        let processors = table.collect().unwrap();
        assert_eq!(
            processors[0].kind,
            ProcessorKind::Remap {
                source: 1,
                destination: 1,
                count: 1,
                loops: 1,
                reverse: Default::default()
            }
        );
    }

    #[test]
    fn all_violations_are_reported() {
        let mut table = ProcessorTable::from_entries(set_value_and_hold());
        table.add_row();
        if let RowConfig::Configured(ProcessorForm::SetValue { count, .. }) =
            &mut table.rows_mut()[0].config
        {
            *count = String::from("0");
        }

        let report = table.collect().unwrap_err();
        let rows: Vec<usize> = report.0.iter().map(RowError::row).collect();
        assert_eq!(rows, vec![1, 3]);
    }

    #[test]
    fn delete_renumbers_contiguously() {
        let mut table = ProcessorTable::from_entries((1..=4).map(hold).collect());
        assert!(table.delete_selected().is_none());

        table.select(Some(1));
        let removed = table.delete_selected().unwrap();
        assert_eq!(removed.description, "hold 2");
        assert_eq!(table.selected(), None);

        let ids: Vec<usize> = table.rows().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(starts(&table.collect().unwrap()), vec![1, 3, 4]);
    }

    #[test]
    fn reorder_is_kept_in_collected_list() {
        let mut table = ProcessorTable::from_entries((1..=4).map(hold).collect());
        table.select(Some(0));
        table.move_row(2, 0);

        let ids: Vec<usize> = table.rows().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(table.selected(), Some(1));
        assert_eq!(starts(&table.collect().unwrap()), vec![3, 1, 2, 4]);

        table.move_row(0, 3);
        assert_eq!(table.selected(), Some(0));
        assert_eq!(starts(&table.collect().unwrap()), vec![1, 2, 4, 3]);
    }

    #[test]
    fn out_of_range_edits_are_ignored() {
        let mut table = ProcessorTable::from_entries((1..=2).map(hold).collect());
        table.move_row(0, 5);
        table.select(Some(9));
        assert_eq!(table.selected(), None);
        assert_eq!(starts(&table.collect().unwrap()), vec![1, 2]);
    }

    #[test]
    fn unrecognised_rows_cannot_be_saved() {
        let raw = json!({"type": "Fold", "active": 1, "description": "later firmware"});
        let table = ProcessorTable::from_entries(vec![StoredProcessor::decode(raw)]);
        assert!(table.rows()[0].active);
        assert_eq!(table.rows()[0].description, "later firmware");

        let report = table.collect().unwrap_err();
        assert!(matches!(
            &report.0[0],
            RowError::UnknownType { row: 1, type_name } if type_name == "Fold"
        ));
    }

    #[test]
    fn known_type_with_out_of_range_value_stays_editable() {
        let raw = json!({
            "type": "Set Value", "active": 1, "description": "",
            "start": 1, "count": 10, "value": 300
        });
        let mut table = ProcessorTable::from_entries(vec![StoredProcessor::decode(raw)]);
        assert!(matches!(
            &table.rows()[0].config,
            RowConfig::Configured(ProcessorForm::SetValue { value, .. }) if value == "300"
        ));

        let report = table.collect().unwrap_err();
        assert_eq!(report.0.len(), 1);
        assert!(matches!(
            &report.0[0],
            RowError::InvalidField { row: 1, kind: ProcessorType::SetValue, field: "value", .. }
        ));

        if let RowConfig::Configured(ProcessorForm::SetValue { value, .. }) =
            &mut table.rows_mut()[0].config
        {
            *value = String::from("200");
        }
        assert_eq!(
            table.collect().unwrap()[0].kind,
            ProcessorKind::SetValue {
                start: 1,
                count: 10,
                value: 200
            }
        );
    }
}
