use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
/// A single post-processing rule applied to the channel output stream, as stored
/// in the `outputProcessors` list.
pub struct OutputProcessor {
    #[serde(with = "active_flag", default)]
    pub active: bool,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub kind: ProcessorKind,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ProcessorKind {
    Remap {
        source: u32,
        destination: u32,
        count: u32,
        loops: u32,
        reverse: Reverse,
    },
    Brightness {
        start: u32,
        count: u32,
        brightness: u8,
        gamma: f64,
    },
    #[serde(rename = "Set Value")]
    SetValue { start: u32, count: u32, value: u8 },
    #[serde(rename = "Hold Value")]
    HoldValue { start: u32, count: u32 },
    #[serde(rename = "Reorder Colors")]
    ReorderColors {
        start: u32,
        count: u32,
        #[serde(rename = "colorOrder")]
        color_order: ColorOrder,
    },
    #[serde(rename = "Three to Four")]
    ThreeToFour {
        start: u32,
        count: u32,
        #[serde(rename = "colorOrder")]
        color_order: WhiteOrder,
        algorithm: WhiteAlgorithm,
    },
}

impl ProcessorKind {
    pub fn processor_type(&self) -> ProcessorType {
        match self {
            ProcessorKind::Remap { .. } => ProcessorType::Remap,
            ProcessorKind::Brightness { .. } => ProcessorType::Brightness,
            ProcessorKind::SetValue { .. } => ProcessorType::SetValue,
            ProcessorKind::HoldValue { .. } => ProcessorType::HoldValue,
            ProcessorKind::ReorderColors { .. } => ProcessorType::ReorderColors,
            ProcessorKind::ThreeToFour { .. } => ProcessorType::ThreeToFour,
        }
    }
}

/// One-line summary, used when listing processors without the GUI
impl fmt::Display for OutputProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.active { "on " } else { "off" };
        write!(f, "[{}] {}: ", state, self.kind.processor_type())?;
        match &self.kind {
            ProcessorKind::Remap {
                source,
                destination,
                count,
                loops,
                reverse,
            } => write!(
                f,
                "{} channel(s) from {} to {}, {} loop(s), reverse {}",
                count,
                source,
                destination,
                loops,
                reverse.label()
            )?,
            ProcessorKind::Brightness {
                start,
                count,
                brightness,
                gamma,
            } => write!(
                f,
                "{} channel(s) from {} at {}% (gamma {})",
                count, start, brightness, gamma
            )?,
            ProcessorKind::SetValue {
                start,
                count,
                value,
            } => write!(f, "{} channel(s) from {} set to {}", count, start, value)?,
            ProcessorKind::HoldValue { start, count } => {
                write!(f, "{} channel(s) from {} held", count, start)?
            }
            ProcessorKind::ReorderColors {
                start,
                count,
                color_order,
            } => write!(
                f,
                "{} node(s) from {} reordered as {}",
                count,
                start,
                color_order.label()
            )?,
            ProcessorKind::ThreeToFour {
                start,
                count,
                color_order,
                algorithm,
            } => write!(
                f,
                "{} node(s) from {} as {} using {}",
                count,
                start,
                color_order.label(),
                algorithm.label()
            )?,
        }
        if !self.description.is_empty() {
            write!(f, " \"{}\"", self.description)?;
        }
        Ok(())
    }
}

/// The six known processor tags, in the order they are offered when adding a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProcessorType {
    Remap,
    Brightness,
    HoldValue,
    SetValue,
    ReorderColors,
    ThreeToFour,
}

impl ProcessorType {
    pub const ALL: [ProcessorType; 6] = [
        ProcessorType::Remap,
        ProcessorType::Brightness,
        ProcessorType::HoldValue,
        ProcessorType::SetValue,
        ProcessorType::ReorderColors,
        ProcessorType::ThreeToFour,
    ];

    /// The tag as it appears in the `type` field
    pub fn tag(self) -> &'static str {
        match self {
            ProcessorType::Remap => "Remap",
            ProcessorType::Brightness => "Brightness",
            ProcessorType::HoldValue => "Hold Value",
            ProcessorType::SetValue => "Set Value",
            ProcessorType::ReorderColors => "Reorder Colors",
            ProcessorType::ThreeToFour => "Three to Four",
        }
    }

    pub fn from_tag(tag: &str) -> Option<ProcessorType> {
        ProcessorType::ALL.into_iter().find(|t| t.tag() == tag)
    }
}

impl fmt::Display for ProcessorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// An enum-valued field stored as an integer code and edited through a
/// selection control.
pub trait Choice: Copy + PartialEq + 'static {
    const ALL: &'static [Self];

    fn code(self) -> u32;

    fn label(self) -> &'static str;

    fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }
}

macro_rules! choice_codes {
    ($name:ident) => {
        impl TryFrom<u32> for $name {
            type Error = String;

            fn try_from(code: u32) -> Result<Self, Self::Error> {
                <$name as Choice>::from_code(code)
                    .ok_or_else(|| format!("{} is not a valid {} code", code, stringify!($name)))
            }
        }

        impl From<$name> for u32 {
            fn from(value: $name) -> u32 {
                value.code()
            }
        }
    };
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(try_from = "u32", into = "u32")]
pub enum Reverse {
    #[default]
    None,
    ByChannel,
    RgbPixels,
    RgbwPixels,
}

impl Choice for Reverse {
    const ALL: &'static [Self] = &[
        Reverse::None,
        Reverse::ByChannel,
        Reverse::RgbPixels,
        Reverse::RgbwPixels,
    ];

    fn code(self) -> u32 {
        match self {
            Reverse::None => 0,
            Reverse::ByChannel => 1,
            Reverse::RgbPixels => 2,
            Reverse::RgbwPixels => 3,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Reverse::None => "None",
            Reverse::ByChannel => "By Channel",
            Reverse::RgbPixels => "RGB Pixels",
            Reverse::RgbwPixels => "RGBW Pixels",
        }
    }
}
choice_codes!(Reverse);

/// Permutation of the three colour channels of each node; the code lists which
/// input channel lands in each output position.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(try_from = "u32", into = "u32")]
pub enum ColorOrder {
    #[default]
    Order132,
    Order213,
    Order231,
    Order312,
    Order321,
}

impl Choice for ColorOrder {
    const ALL: &'static [Self] = &[
        ColorOrder::Order132,
        ColorOrder::Order213,
        ColorOrder::Order231,
        ColorOrder::Order312,
        ColorOrder::Order321,
    ];

    fn code(self) -> u32 {
        match self {
            ColorOrder::Order132 => 132,
            ColorOrder::Order213 => 213,
            ColorOrder::Order231 => 231,
            ColorOrder::Order312 => 312,
            ColorOrder::Order321 => 321,
        }
    }

    fn label(self) -> &'static str {
        match self {
            ColorOrder::Order132 => "132",
            ColorOrder::Order213 => "213",
            ColorOrder::Order231 => "231",
            ColorOrder::Order312 => "312",
            ColorOrder::Order321 => "321",
        }
    }
}
choice_codes!(ColorOrder);

/// Where the generated white channel goes in a three-to-four expansion
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(try_from = "u32", into = "u32")]
pub enum WhiteOrder {
    #[default]
    Rgbw,
    Wrgb,
}

impl Choice for WhiteOrder {
    const ALL: &'static [Self] = &[WhiteOrder::Rgbw, WhiteOrder::Wrgb];

    fn code(self) -> u32 {
        match self {
            WhiteOrder::Rgbw => 1234,
            WhiteOrder::Wrgb => 4123,
        }
    }

    fn label(self) -> &'static str {
        match self {
            WhiteOrder::Rgbw => "RGBW",
            WhiteOrder::Wrgb => "WRGB",
        }
    }
}
choice_codes!(WhiteOrder);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(try_from = "u32", into = "u32")]
pub enum WhiteAlgorithm {
    NoWhite,
    #[default]
    EqualRgb,
    Advanced,
}

impl Choice for WhiteAlgorithm {
    const ALL: &'static [Self] = &[
        WhiteAlgorithm::NoWhite,
        WhiteAlgorithm::EqualRgb,
        WhiteAlgorithm::Advanced,
    ];

    fn code(self) -> u32 {
        match self {
            WhiteAlgorithm::NoWhite => 0,
            WhiteAlgorithm::EqualRgb => 1,
            WhiteAlgorithm::Advanced => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            WhiteAlgorithm::NoWhite => "No White",
            WhiteAlgorithm::EqualRgb => "R=G=B->W",
            WhiteAlgorithm::Advanced => "Advanced",
        }
    }
}
choice_codes!(WhiteAlgorithm);

/// `active` goes out as `1`/`0`; the controller may hand back either that or a
/// JSON boolean.
mod active_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(active: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*active))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Flag {
            Bool(bool),
            Int(i64),
        }

        Ok(match Flag::deserialize(deserializer)? {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        })
    }
}
