//! Signal definitions: a single bit-packed field inside a command's response payload.
//!
//! Bits are addressed from the start of the payload: bit 0 lives in byte 0,
//! bit 8 in byte 1, and so on.

use std::ops::RangeInclusive;

use serde_json::{Number, Value};

use crate::{errors::BitFieldError, keys};

/// Highest bit a signal may reach (`bix + len`): a 64 KiB payload.
pub const MAX_BIT: usize = 64 * 1024 * 8;

/// Value of one entry in a signal's [Format].
///
/// The document carries values that were never set, values that are set, and
/// numeric values that came out of an edit as NaN. Only [FormatValue::Present]
/// entries reach the serialized text.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatValue {
    /// The entry exists but holds nothing (JSON `null`).
    Absent,
    /// A numeric value that is NaN or infinite and has no JSON form.
    Invalid,
    /// Any JSON value other than `null`. Zero and the empty string are present values.
    Present(Value),
}

impl FormatValue {
    /// Wraps a JSON value, mapping `null` to [FormatValue::Absent].
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => FormatValue::Absent,
            value => FormatValue::Present(value),
        }
    }

    /// Wraps a float, mapping NaN and infinities to [FormatValue::Invalid].
    pub fn number(value: f64) -> Self {
        match Number::from_f64(value) {
            Some(n) => FormatValue::Present(Value::Number(n)),
            None => FormatValue::Invalid,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            FormatValue::Present(value) => Some(value),
            FormatValue::Absent | FormatValue::Invalid => None,
        }
    }

}

impl From<Value> for FormatValue {
    fn from(value: Value) -> Self {
        FormatValue::from_json(value)
    }
}

impl From<f64> for FormatValue {
    fn from(value: f64) -> Self {
        FormatValue::number(value)
    }
}

impl From<u64> for FormatValue {
    fn from(value: u64) -> Self {
        FormatValue::Present(Value::from(value))
    }
}

impl From<i64> for FormatValue {
    fn from(value: i64) -> Self {
        FormatValue::Present(Value::from(value))
    }
}

impl From<&str> for FormatValue {
    fn from(value: &str) -> Self {
        FormatValue::Present(Value::from(value))
    }
}

impl From<String> for FormatValue {
    fn from(value: String) -> Self {
        FormatValue::Present(Value::from(value))
    }
}

/// Formatting and scaling parameters of a signal, in insertion order.
///
/// `bix` and `len` entries that are present are always non-negative integers
/// whose sum stays within [MAX_BIT]; [Format::insert] refuses anything else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Format {
    entries: Vec<(String, FormatValue)>,
}

impl Format {
    pub fn new() -> Self {
        Self::default()
    }

    /// A format holding only a bit offset and a bit length.
    pub fn bits(offset: usize, length: usize) -> Result<Self, BitFieldError> {
        let mut format = Format::new();
        format.insert(keys::BIT_OFFSET, offset as u64)?;
        format.insert(keys::BIT_LENGTH, length as u64)?;
        Ok(format)
    }

    /// Sets `key`, keeping its position if it already exists. Returns the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<FormatValue>,
    ) -> Result<Option<FormatValue>, BitFieldError> {
        let key = key.into();
        let value = value.into();
        self.check_bit_field(&key, &value)?;

        if let Some((_, slot)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            return Ok(Some(std::mem::replace(slot, value)));
        }

        self.entries.push((key, value));
        Ok(None)
    }

    pub fn remove(&mut self, key: &str) -> Option<FormatValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn get(&self, key: &str) -> Option<&FormatValue> {
        self.entries
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// All entries, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormatValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries that survive serialization, in insertion order.
    pub fn present(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.iter()
            .filter_map(|(k, v)| v.as_value().map(|value| (k, value)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bit index of the first bit, 0 when unset.
    pub fn bit_offset(&self) -> usize {
        self.bit_field(keys::BIT_OFFSET)
    }

    /// Number of bits occupied, 0 when unset.
    pub fn bit_length(&self) -> usize {
        self.bit_field(keys::BIT_LENGTH)
    }

    pub fn unit(&self) -> Option<&str> {
        self.value(keys::UNIT).and_then(Value::as_str)
    }

    pub fn minimum(&self) -> Option<f64> {
        self.value(keys::MINIMUM).and_then(Value::as_f64)
    }

    pub fn maximum(&self) -> Option<f64> {
        self.value(keys::MAXIMUM).and_then(Value::as_f64)
    }

    pub fn additive_offset(&self) -> Option<f64> {
        self.value(keys::ADDITIVE_OFFSET).and_then(Value::as_f64)
    }

    pub fn multiplier(&self) -> Option<f64> {
        self.value(keys::MULTIPLIER).and_then(Value::as_f64)
    }

    pub fn divisor(&self) -> Option<f64> {
        self.value(keys::DIVISOR).and_then(Value::as_f64)
    }

    fn value(&self, key: &str) -> Option<&Value> {
        self.get(key).and_then(FormatValue::as_value)
    }

    fn bit_field(&self, key: &str) -> usize {
        self.value(key)
            .and_then(non_negative_integer)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0)
    }

    /// Checks a `bix`/`len` value against the entry it would pair with.
    fn check_bit_field(&self, key: &str, value: &FormatValue) -> Result<(), BitFieldError> {
        let partner = match key {
            keys::BIT_OFFSET => keys::BIT_LENGTH,
            keys::BIT_LENGTH => keys::BIT_OFFSET,
            _ => return Ok(()),
        };

        let FormatValue::Present(v) = value else {
            return Ok(());
        };

        let n = non_negative_integer(v).ok_or_else(|| BitFieldError::NotAnInteger {
            key: key.to_string(),
            value: v.to_string(),
        })?;

        let end = n.saturating_add(self.bit_field(partner) as u64);
        if end > MAX_BIT as u64 {
            return Err(BitFieldError::OutOfRange {
                key: key.to_string(),
                end,
                max: MAX_BIT,
            });
        }

        Ok(())
    }
}

/// Integers and integral floats at or above zero. Floats past `u64::MAX` saturate.
fn non_negative_integer(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}

/// One signal of a command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signal {
    /// Identifier, intended to be unique within its command.
    pub id: Option<String>,
    /// Human-readable label.
    pub name: Option<String>,
    /// Destination path for the decoded value; may be empty.
    pub path: Option<String>,
    pub suggested_metric: Option<String>,
    /// Formatting parameters (`fmt` on the wire). Signals without one take no room in the payload.
    pub format: Option<Format>,
}

impl Signal {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Signal {
            id: Some(id.into()),
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    /// One past the last bit this signal covers, or `None` without a format.
    ///
    /// Never exceeds [MAX_BIT].
    pub fn bit_end(&self) -> Option<usize> {
        self.format
            .as_ref()
            .map(|f| f.bit_offset() + f.bit_length())
    }

    /// Inclusive range of byte indices the signal occupies.
    ///
    /// `None` when the signal has no format or a zero bit length.
    pub fn byte_span(&self) -> Option<RangeInclusive<usize>> {
        let format = self.format.as_ref()?;
        let offset = format.bit_offset();
        let length = format.bit_length();

        if length == 0 {
            return None;
        }

        let last_bit = offset + length - 1;
        Some(offset / 8..=last_bit / 8)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_byte_span_single_byte() {
        let signal = Signal::default().with_format(Format::bits(0, 8).unwrap());
        assert_eq!(signal.byte_span(), Some(0..=0));
    }

    #[test]
    fn test_byte_span_crosses_bytes() {
        let signal = Signal::default().with_format(Format::bits(8, 16).unwrap());
        assert_eq!(signal.byte_span(), Some(1..=2));

        let signal = Signal::default().with_format(Format::bits(6, 4).unwrap());
        assert_eq!(signal.byte_span(), Some(0..=1));
    }

    #[test]
    fn test_byte_span_zero_length() {
        let signal = Signal::default().with_format(Format::bits(16, 0).unwrap());
        assert_eq!(signal.byte_span(), None);
        assert_eq!(signal.bit_end(), Some(16));
    }

    #[test]
    fn test_byte_span_without_format() {
        assert_eq!(Signal::default().byte_span(), None);
        assert_eq!(Signal::default().bit_end(), None);
    }

    #[test]
    fn test_missing_bit_fields_default_to_zero() {
        let mut format = Format::new();
        format.insert(keys::UNIT, "rpm").unwrap();
        assert_eq!(format.bit_offset(), 0);
        assert_eq!(format.bit_length(), 0);
    }

    #[test]
    fn test_insert_keeps_position() {
        let mut format = Format::new();
        format.insert(keys::BIT_LENGTH, 8u64).unwrap();
        format.insert(keys::UNIT, "scalar").unwrap();

        let previous = format.insert(keys::BIT_LENGTH, 16u64).unwrap();

        assert_eq!(previous, Some(FormatValue::from(8u64)));
        let order: Vec<&str> = format.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["len", "unit"]);
        assert_eq!(format.bit_length(), 16);
    }

    #[test]
    fn test_insert_rejects_negative_bit_offset() {
        let mut format = Format::new();
        let err = format.insert(keys::BIT_OFFSET, -1i64).unwrap_err();
        assert_eq!(
            err,
            BitFieldError::NotAnInteger {
                key: "bix".to_string(),
                value: "-1".to_string(),
            }
        );
        assert!(format.is_empty());
    }

    #[test]
    fn test_insert_rejects_fractional_bit_length() {
        let mut format = Format::new();
        assert!(format.insert(keys::BIT_LENGTH, 1.5).is_err());
        assert!(format.insert(keys::BIT_LENGTH, "8").is_err());
    }

    #[test]
    fn test_insert_rejects_offset_past_max_bit() {
        let mut format = Format::new();
        format.insert(keys::BIT_LENGTH, 8u64).unwrap();

        let err = format
            .insert(keys::BIT_OFFSET, 9_007_199_254_740_000u64)
            .unwrap_err();
        assert!(matches!(err, BitFieldError::OutOfRange { ref key, .. } if key == "bix"));
        assert_eq!(format.bit_offset(), 0);

        assert!(format.insert(keys::BIT_OFFSET, 1e300).is_err());
        assert!(format.insert(keys::BIT_LENGTH, u64::MAX).is_err());
    }

    #[test]
    fn test_insert_checks_offset_and_length_together() {
        let mut format = Format::new();
        format.insert(keys::BIT_OFFSET, (MAX_BIT - 8) as u64).unwrap();
        format.insert(keys::BIT_LENGTH, 8u64).unwrap();

        let err = format.insert(keys::BIT_LENGTH, 9u64).unwrap_err();
        assert_eq!(
            err,
            BitFieldError::OutOfRange {
                key: "len".to_string(),
                end: MAX_BIT as u64 + 1,
                max: MAX_BIT,
            }
        );
        assert_eq!(format.bit_length(), 8);

        let signal = Signal::default().with_format(format);
        assert_eq!(signal.bit_end(), Some(MAX_BIT));
        assert_eq!(signal.byte_span(), Some(MAX_BIT / 8 - 1..=MAX_BIT / 8 - 1));
    }

    #[test]
    fn test_bits_rejects_out_of_range() {
        assert!(Format::bits(MAX_BIT, 1).is_err());
        assert!(Format::bits(usize::MAX, 0).is_err());
        assert!(Format::bits(0, MAX_BIT).is_ok());
    }

    #[test]
    fn test_insert_accepts_integral_float_and_unset_bit_fields() {
        let mut format = Format::new();
        format.insert(keys::BIT_LENGTH, 8.0).unwrap();
        format.insert(keys::BIT_OFFSET, FormatValue::Absent).unwrap();
        assert_eq!(format.bit_length(), 8);
        assert_eq!(format.bit_offset(), 0);

        format.insert(keys::BIT_OFFSET, f64::NAN).unwrap();
        assert_eq!(format.get(keys::BIT_OFFSET), Some(&FormatValue::Invalid));
    }

    #[test]
    fn test_present_skips_absent_and_invalid() {
        let mut format = Format::new();
        format.insert(keys::MINIMUM, 0u64).unwrap();
        format.insert(keys::MAXIMUM, Value::Null).unwrap();
        format.insert(keys::MULTIPLIER, f64::NAN).unwrap();
        format.insert(keys::UNIT, "").unwrap();

        let present: Vec<(&str, &Value)> = format.present().collect();
        assert_eq!(present, vec![("min", &json!(0)), ("unit", &json!(""))]);
    }

    #[test]
    fn test_scaling_accessors() {
        let mut format = Format::bits(0, 8).unwrap();
        format.insert(keys::UNIT, "kmph").unwrap();
        format.insert(keys::MULTIPLIER, 0.5).unwrap();
        format.insert(keys::DIVISOR, 4u64).unwrap();
        format.insert(keys::ADDITIVE_OFFSET, -40i64).unwrap();

        assert_eq!(format.unit(), Some("kmph"));
        assert_eq!(format.multiplier(), Some(0.5));
        assert_eq!(format.divisor(), Some(4.0));
        assert_eq!(format.additive_offset(), Some(-40.0));
        assert_eq!(format.minimum(), None);
    }

    #[test]
    fn test_remove() {
        let mut format = Format::bits(4, 4).unwrap();
        assert_eq!(format.remove(keys::BIT_OFFSET), Some(FormatValue::from(4u64)));
        assert_eq!(format.remove(keys::BIT_OFFSET), None);
        assert_eq!(format.len(), 1);
    }
}
