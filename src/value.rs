use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Represents the value of a user context attribute.
///
/// # Examples
///
/// ```rust
/// use featurit::AttributeValue;
///
/// let plan = AttributeValue::from("premium");
/// let age = AttributeValue::from(42);
///
/// assert_eq!(plan.as_str(), Some("premium"));
/// assert_eq!(age.as_number(), Some(42.0));
/// ```
#[derive(PartialEq, Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A text attribute value.
    String(String),
    /// A numeric attribute value.
    Number(f64),
}

impl AttributeValue {
    /// Reads the value as `&str`. Returns [`None`] if it's not an [`AttributeValue::String`].
    pub fn as_str(&self) -> Option<&str> {
        if let AttributeValue::String(val) = self {
            return Some(val.as_str());
        }
        None
    }

    /// Reads the value as `f64`.
    ///
    /// Text values are accepted when they hold a valid decimal number.
    /// Returns [`None`] otherwise.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use featurit::AttributeValue;
    ///
    /// assert_eq!(AttributeValue::from(" 4.5 ").as_number(), Some(4.5));
    /// assert_eq!(AttributeValue::from("four").as_number(), None);
    /// ```
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(val) => Some(*val),
            AttributeValue::String(val) => val.trim().parse::<f64>().ok(),
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::String(val) => f.write_str(val),
            AttributeValue::Number(val) => write!(f, "{val}"),
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

from_val_to_enum!(AttributeValue String String);
from_val_to_enum!(AttributeValue Number f64);
from_val_to_enum_into!(AttributeValue Number f32 u8 u16 u32 i8 i16 i32);
from_val_to_enum_into!(AttributeValue String &str);
