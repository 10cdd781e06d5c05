use std::ops::RangeInclusive;

use serde_json::Value;
use thiserror::Error;

use crate::settings::DESCRIPTION_MAX_CHARS;

use super::processor::{
    Choice, ColorOrder, ProcessorKind, ProcessorType, Reverse, WhiteAlgorithm, WhiteOrder,
};

const BRIGHTNESS_RANGE: RangeInclusive<i64> = 0..=100;
const VALUE_RANGE: RangeInclusive<i64> = 0..=255;
const GAMMA_RANGE: RangeInclusive<f64> = 0.1..=5.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("Output Processor type must be selected on row {row}")]
    TypeNotSelected { row: usize },
    #[error("Unknown Output Processor type \"{type_name}\" on row {row}; delete the row before saving")]
    UnknownType { row: usize, type_name: String },
    #[error("{kind} settings of row {row} are not valid: {field} '{value}' {reason}")]
    InvalidField {
        row: usize,
        kind: ProcessorType,
        field: &'static str,
        value: String,
        reason: String,
    },
    #[error("Description of row {row} is longer than {max} characters", max = DESCRIPTION_MAX_CHARS)]
    DescriptionTooLong { row: usize },
}

impl RowError {
    /// One-based row number the error refers to
    pub fn row(&self) -> usize {
        match self {
            RowError::TypeNotSelected { row }
            | RowError::UnknownType { row, .. }
            | RowError::InvalidField { row, .. }
            | RowError::DescriptionTooLong { row } => *row,
        }
    }
}

/// The editable configuration of a row whose type has been chosen. Numeric
/// fields hold the text as typed; selections always hold a valid code.
#[derive(Clone, Debug, PartialEq)]
pub enum ProcessorForm {
    Remap {
        source: String,
        destination: String,
        count: String,
        loops: String,
        reverse: Reverse,
    },
    Brightness {
        start: String,
        count: String,
        brightness: String,
        gamma: String,
    },
    SetValue {
        start: String,
        count: String,
        value: String,
    },
    HoldValue {
        start: String,
        count: String,
    },
    ReorderColors {
        start: String,
        count: String,
        color_order: ColorOrder,
    },
    ThreeToFour {
        start: String,
        count: String,
        color_order: WhiteOrder,
        algorithm: WhiteAlgorithm,
    },
}

impl ProcessorForm {
    /// The form shown right after a type is picked for a new row
    pub fn with_defaults(processor_type: ProcessorType) -> ProcessorForm {
        let kind = match processor_type {
            ProcessorType::Remap => ProcessorKind::Remap {
                source: 1,
                destination: 1,
                count: 1,
                loops: 1,
                reverse: Reverse::default(),
            },
            ProcessorType::Brightness => ProcessorKind::Brightness {
                start: 1,
                count: 1,
                brightness: 100,
                gamma: 1.0,
            },
            ProcessorType::SetValue => ProcessorKind::SetValue {
                start: 1,
                count: 1,
                value: 255,
            },
            ProcessorType::HoldValue => ProcessorKind::HoldValue { start: 1, count: 1 },
            ProcessorType::ReorderColors => ProcessorKind::ReorderColors {
                start: 1,
                count: 1,
                color_order: ColorOrder::default(),
            },
            ProcessorType::ThreeToFour => ProcessorKind::ThreeToFour {
                start: 1,
                count: 1,
                color_order: WhiteOrder::default(),
                algorithm: WhiteAlgorithm::default(),
            },
        };
        ProcessorForm::from(&kind)
    }

    /// Fill the form of a known type from a stored record that failed to decode,
    /// so the bad fields show up (and get reported on save) instead of the whole
    /// row being lost. Missing fields come up blank; unknown codes fall back to
    /// the first option.
    pub fn from_raw(processor_type: ProcessorType, raw: &Value) -> ProcessorForm {
        let text = |field: &str| raw_text(raw, field);
        match processor_type {
            ProcessorType::Remap => ProcessorForm::Remap {
                source: text("source"),
                destination: text("destination"),
                count: text("count"),
                loops: text("loops"),
                reverse: raw_choice(raw, "reverse"),
            },
            ProcessorType::Brightness => ProcessorForm::Brightness {
                start: text("start"),
                count: text("count"),
                brightness: text("brightness"),
                gamma: text("gamma"),
            },
            ProcessorType::SetValue => ProcessorForm::SetValue {
                start: text("start"),
                count: text("count"),
                value: text("value"),
            },
            ProcessorType::HoldValue => ProcessorForm::HoldValue {
                start: text("start"),
                count: text("count"),
            },
            ProcessorType::ReorderColors => ProcessorForm::ReorderColors {
                start: text("start"),
                count: text("count"),
                color_order: raw_choice(raw, "colorOrder"),
            },
            ProcessorType::ThreeToFour => ProcessorForm::ThreeToFour {
                start: text("start"),
                count: text("count"),
                color_order: raw_choice(raw, "colorOrder"),
                algorithm: raw_choice(raw, "algorithm"),
            },
        }
    }

    pub fn processor_type(&self) -> ProcessorType {
        match self {
            ProcessorForm::Remap { .. } => ProcessorType::Remap,
            ProcessorForm::Brightness { .. } => ProcessorType::Brightness,
            ProcessorForm::SetValue { .. } => ProcessorType::SetValue,
            ProcessorForm::HoldValue { .. } => ProcessorType::HoldValue,
            ProcessorForm::ReorderColors { .. } => ProcessorType::ReorderColors,
            ProcessorForm::ThreeToFour { .. } => ProcessorType::ThreeToFour,
        }
    }

    /// Parse and check every field; `row` is one-based and only used for the
    /// error messages. All failing fields are reported, not just the first.
    pub fn parse(&self, row: usize) -> Result<ProcessorKind, Vec<RowError>> {
        let mut check = FieldCheck::new(row, self.processor_type());

        let kind = match self {
            ProcessorForm::Remap {
                source,
                destination,
                count,
                loops,
                reverse,
            } => ProcessorKind::Remap {
                source: check.channel("source", source),
                destination: check.channel("destination", destination),
                count: check.channel("count", count),
                loops: check.channel("loops", loops),
                reverse: *reverse,
            },
            ProcessorForm::Brightness {
                start,
                count,
                brightness,
                gamma,
            } => ProcessorKind::Brightness {
                start: check.channel("start", start),
                count: check.channel("count", count),
                brightness: check.level("brightness", brightness, BRIGHTNESS_RANGE),
                gamma: check.gamma(gamma),
            },
            ProcessorForm::SetValue {
                start,
                count,
                value,
            } => ProcessorKind::SetValue {
                start: check.channel("start", start),
                count: check.channel("count", count),
                value: check.level("value", value, VALUE_RANGE),
            },
            ProcessorForm::HoldValue { start, count } => ProcessorKind::HoldValue {
                start: check.channel("start", start),
                count: check.channel("count", count),
            },
            ProcessorForm::ReorderColors {
                start,
                count,
                color_order,
            } => ProcessorKind::ReorderColors {
                start: check.channel("start", start),
                count: check.channel("count", count),
                color_order: *color_order,
            },
            ProcessorForm::ThreeToFour {
                start,
                count,
                color_order,
                algorithm,
            } => ProcessorKind::ThreeToFour {
                start: check.channel("start", start),
                count: check.channel("count", count),
                color_order: *color_order,
                algorithm: *algorithm,
            },
        };

        check.finish(kind)
    }
}

impl From<&ProcessorKind> for ProcessorForm {
    fn from(kind: &ProcessorKind) -> Self {
        match *kind {
            ProcessorKind::Remap {
                source,
                destination,
                count,
                loops,
                reverse,
            } => ProcessorForm::Remap {
                source: source.to_string(),
                destination: destination.to_string(),
                count: count.to_string(),
                loops: loops.to_string(),
                reverse,
            },
            ProcessorKind::Brightness {
                start,
                count,
                brightness,
                gamma,
            } => ProcessorForm::Brightness {
                start: start.to_string(),
                count: count.to_string(),
                brightness: brightness.to_string(),
                gamma: gamma.to_string(),
            },
            ProcessorKind::SetValue {
                start,
                count,
                value,
            } => ProcessorForm::SetValue {
                start: start.to_string(),
                count: count.to_string(),
                value: value.to_string(),
            },
            ProcessorKind::HoldValue { start, count } => ProcessorForm::HoldValue {
                start: start.to_string(),
                count: count.to_string(),
            },
            ProcessorKind::ReorderColors {
                start,
                count,
                color_order,
            } => ProcessorForm::ReorderColors {
                start: start.to_string(),
                count: count.to_string(),
                color_order,
            },
            ProcessorKind::ThreeToFour {
                start,
                count,
                color_order,
                algorithm,
            } => ProcessorForm::ThreeToFour {
                start: start.to_string(),
                count: count.to_string(),
                color_order,
                algorithm,
            },
        }
    }
}

fn raw_text(raw: &Value, field: &str) -> String {
    match raw.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn raw_choice<C: Choice + Default>(raw: &Value, field: &str) -> C {
    raw.get(field)
        .and_then(Value::as_u64)
        .and_then(|code| u32::try_from(code).ok())
        .and_then(C::from_code)
        .unwrap_or_default()
}

/// Check a free-text description against the length limit
pub fn check_description(row: usize, description: &str) -> Result<(), RowError> {
    if description.chars().count() > DESCRIPTION_MAX_CHARS {
        Err(RowError::DescriptionTooLong { row })
    } else {
        Ok(())
    }
}

/// Collects field failures for one row while its record is being built. Failed
/// fields yield a placeholder value; the record is discarded by `finish` if
/// anything failed.
struct FieldCheck {
    row: usize,
    kind: ProcessorType,
    errors: Vec<RowError>,
}

impl FieldCheck {
    fn new(row: usize, kind: ProcessorType) -> Self {
        FieldCheck {
            row,
            kind,
            errors: Vec::new(),
        }
    }

    fn fail(&mut self, field: &'static str, value: &str, reason: String) {
        self.errors.push(RowError::InvalidField {
            row: self.row,
            kind: self.kind,
            field,
            value: value.to_string(),
            reason,
        });
    }

    /// Channel numbers, counts and loops: must be greater than zero
    fn channel(&mut self, field: &'static str, text: &str) -> u32 {
        match leading_int(text).and_then(|v| u32::try_from(v).ok()) {
            Some(v) if v > 0 => v,
            _ => {
                self.fail(field, text, String::from("must be a number greater than 0"));
                0
            }
        }
    }

    fn level(&mut self, field: &'static str, text: &str, range: RangeInclusive<i64>) -> u8 {
        match leading_int(text) {
            Some(v) if range.contains(&v) => v as u8,
            _ => {
                self.fail(
                    field,
                    text,
                    format!(
                        "must be a number from {} to {}",
                        range.start(),
                        range.end()
                    ),
                );
                0
            }
        }
    }

    fn gamma(&mut self, text: &str) -> f64 {
        match leading_float(text) {
            Some(v) if GAMMA_RANGE.contains(&v) => v,
            _ => {
                self.fail(
                    "gamma",
                    text,
                    format!(
                        "must be a number from {} to {}",
                        GAMMA_RANGE.start(),
                        GAMMA_RANGE.end()
                    ),
                );
                0.0
            }
        }
    }

    fn finish(self, kind: ProcessorKind) -> Result<ProcessorKind, Vec<RowError>> {
        if self.errors.is_empty() {
            Ok(kind)
        } else {
            Err(self.errors)
        }
    }
}

/// Reads the leading integer of a text field, ignoring surrounding whitespace and
/// anything after the digits. Returns `None` when the text does not start with a
/// number.
pub fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end].parse::<i64>().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Reads the leading decimal number of a text field, e.g. "2.2x" gives 2.2 and
/// ".5" gives 0.5. Returns `None` when no digits lead the text or the number is
/// not finite.
pub fn leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .map_or(bytes.len(), |n| start + n)
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_end = digits_from(end);
    let mut digits = int_end - end;
    end = int_end;
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        digits += frac_end - end - 1;
        end = frac_end;
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_start = end + 1;
        if matches!(bytes.get(exp_start), Some(b'+' | b'-')) {
            exp_start += 1;
        }
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}
