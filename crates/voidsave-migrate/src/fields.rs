//! Typed lookups over decoded maps
//!
//! Every dynamic key access in the migrator goes through these helpers so the
//! default for a missing or mistyped field is stated in one place: counters
//! fall back to `None` (the caller picks the default), bitfields under known
//! keys are strict.

use voidsave_core::{Bitfield, CodecError, Value, ValueMap};

/// Location of a field, for error messages
pub(crate) fn at(path: &str, key: &str) -> String {
    format!("{}.{}", path, key)
}

/// Non-null field
pub(crate) fn present<'a>(map: &'a ValueMap, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

pub(crate) fn u32_field(map: &ValueMap, key: &str) -> Option<u32> {
    present(map, key).and_then(Value::as_u32)
}

pub(crate) fn u64_field(map: &ValueMap, key: &str) -> Option<u64> {
    present(map, key).and_then(Value::as_u64)
}

pub(crate) fn i64_field(map: &ValueMap, key: &str) -> Option<i64> {
    present(map, key).and_then(Value::as_int)
}

pub(crate) fn bool_field(map: &ValueMap, key: &str) -> Option<bool> {
    present(map, key).and_then(Value::as_bool)
}

pub(crate) fn string_field(map: &ValueMap, key: &str) -> Option<String> {
    present(map, key).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn map_field<'a>(map: &'a ValueMap, key: &str) -> Option<&'a ValueMap> {
    present(map, key).and_then(Value::as_map)
}

pub(crate) fn list_field<'a>(map: &'a ValueMap, key: &str) -> Option<&'a [Value]> {
    present(map, key).and_then(Value::as_list)
}

/// List of unsigned integers; entries of any other type are dropped
pub(crate) fn u32_list(map: &ValueMap, key: &str) -> Option<Vec<u32>> {
    list_field(map, key).map(|items| items.iter().filter_map(Value::as_u32).collect())
}

pub(crate) fn string_list(map: &ValueMap, key: &str) -> Option<Vec<String>> {
    list_field(map, key).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

/// Bitfield under a known key
///
/// Accepts the marker form, a plain digit string, or a non-negative integral
/// number written by releases that predate the marker. Anything else is a
/// shape error naming the field.
pub(crate) fn bitfield_field(
    map: &ValueMap,
    key: &str,
    path: &str,
) -> Result<Option<Bitfield>, CodecError> {
    let Some(value) = present(map, key) else {
        return Ok(None);
    };
    let bits = match value {
        Value::BigInt(n) => Some(Bitfield::from_biguint(n.clone())),
        Value::String(s) => s.parse::<Bitfield>().ok(),
        other => other.as_u64().map(Bitfield::from_u64),
    };
    bits.map(Some)
        .ok_or_else(|| CodecError::shape(at(path, key), "bitfield", value.type_name()))
}

/// Species-keyed map; keys that are not species ids are skipped
pub(crate) fn species_keyed(map: &ValueMap) -> impl Iterator<Item = (u32, &Value)> {
    map.iter()
        .filter_map(|(k, v)| k.parse::<u32>().ok().map(|id| (id, v)))
}
