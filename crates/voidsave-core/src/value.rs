//! Dynamic value tree for decoded save data
//!
//! Every record goes through this tree on its way to and from the wire text.
//! It mirrors the shapes the text format can carry, plus one extra variant for
//! arbitrary-precision integers so bitfields never pass through a lossy
//! numeric type.

use crate::bitfield::Bitfield;
use indexmap::IndexMap;
use num_bigint::BigUint;

/// A dynamic value that can represent any save data
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// No value / null
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Bounded integer (counters, ids, enum codes)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// Arbitrary-precision unsigned integer (bitfield accumulators)
    BigInt(BigUint),
    /// String value
    String(String),
    /// List of values
    List(Vec<Value>),
    /// Map of string keys to values
    Map(ValueMap),
}

/// A map of string keys to dynamic values
///
/// Uses IndexMap so encoded output keeps the order fields were written in.
/// Equality ignores order.
pub type ValueMap = IndexMap<String, Value>;

impl Value {
    /// Create an empty map value
    pub fn empty_map() -> Self {
        Value::Map(ValueMap::new())
    }

    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Try to get this value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Try to get this value as a signed integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Value::BigInt(n) => i64::try_from(n).ok(),
            _ => None,
        }
    }

    /// Try to get this value as an unsigned integer
    ///
    /// Integral floats are accepted because older writers emitted counters
    /// through a floating point type.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Int(i) => u64::try_from(*i).ok(),
            Value::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64 => {
                Some(*f as u64)
            }
            Value::BigInt(n) => u64::try_from(n).ok(),
            _ => None,
        }
    }

    /// Try to get this value as a `u32`
    pub fn as_u32(&self) -> Option<u32> {
        self.as_u64().and_then(|v| u32::try_from(v).ok())
    }

    /// Try to get this value as an arbitrary-precision integer
    pub fn as_bigint(&self) -> Option<&BigUint> {
        match self {
            Value::BigInt(n) => Some(n),
            _ => None,
        }
    }

    /// Try to get this value as a string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a list
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    /// Try to get this value as a map
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Try to get this value as a mutable map
    pub fn as_map_mut(&mut self) -> Option<&mut ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this value is a map
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::BigInt(_) => "bigint",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

/// Conversion of a typed record into the value tree
///
/// Decoding goes the other way through the migrator, which is the only place
/// allowed to turn raw trees back into typed records.
pub trait ToValue {
    /// Lower this record into a value tree
    fn to_value(&self) -> Value;
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::List(self.iter().map(ToValue::to_value).collect())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        match i64::try_from(i) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::BigInt(BigUint::from(i)),
        }
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<BigUint> for Value {
    fn from(n: BigUint) -> Self {
        Value::BigInt(n)
    }
}

impl From<&Bitfield> for Value {
    fn from(bits: &Bitfield) -> Self {
        Value::BigInt(bits.as_biguint().clone())
    }
}

impl From<ValueMap> for Value {
    fn from(map: ValueMap) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(vec: Vec<T>) -> Self {
        Value::List(vec.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_types() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(42).as_int(), Some(42));
        assert_eq!(Value::String("hello".into()).as_str(), Some("hello"));
        assert_eq!(Value::BigInt(BigUint::from(7u32)).as_u64(), Some(7));
    }

    #[test]
    fn test_unsigned_accessors() {
        assert_eq!(Value::Int(-1).as_u64(), None);
        assert_eq!(Value::Float(12.0).as_u32(), Some(12));
        assert_eq!(Value::Float(12.5).as_u32(), None);
        assert_eq!(Value::Int(i64::from(u32::MAX) + 1).as_u32(), None);
    }

    #[test]
    fn test_large_u64_becomes_bigint() {
        let v: Value = u64::MAX.into();
        assert_eq!(v.type_name(), "bigint");
        assert_eq!(v.as_u64(), Some(u64::MAX));
    }

    #[test]
    fn test_map_equality_ignores_order() {
        let mut a = ValueMap::new();
        a.insert("x".into(), Value::Int(1));
        a.insert("y".into(), Value::Int(2));
        let mut b = ValueMap::new();
        b.insert("y".into(), Value::Int(2));
        b.insert("x".into(), Value::Int(1));
        assert_eq!(Value::Map(a), Value::Map(b));
    }
}
