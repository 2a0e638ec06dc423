//! BigValue codec
//!
//! Lowers a [`Value`] tree to JSON text and back. JSON has no integer type
//! wider than a double, so arbitrary-precision integers travel as a digit
//! string followed by a single `n` marker (`"1099511627781n"`).
//!
//! Recognition is by value shape. Every string in the tree is inspected on
//! decode regardless of the key it sits under, so bitfields nested in
//! dynamically keyed maps (dex entries keyed by species id) are never
//! truncated.
//!
//! A genuine string that happens to look like a marker is escaped on encode
//! with one leading `'` and unescaped on decode, which keeps the codec a
//! bijection over `Value`.

use crate::error::CodecError;
use crate::value::{Value, ValueMap};
use num_bigint::BigUint;
use serde_json::{Map as JsonMap, Number, Value as Json};
use std::fmt::Write;

/// Terminal character marking an arbitrary-precision integer
pub const BIGINT_MARKER: char = 'n';

const ESCAPE: char = '\'';

/// Encode a value tree into save text
pub fn encode(value: &Value) -> Result<String, CodecError> {
    let mut path = Path::root();
    let json = lower(value, &mut path)?;
    serde_json::to_string(&json).map_err(|e| CodecError::Syntax(e.to_string()))
}

/// Decode save text into a value tree
pub fn decode(text: &str) -> Result<Value, CodecError> {
    let json: Json = serde_json::from_str(text).map_err(|e| CodecError::Syntax(e.to_string()))?;
    let mut path = Path::root();
    raise(json, &mut path)
}

/// Decode raw bytes, rejecting anything that is not UTF-8
pub fn decode_bytes(bytes: &[u8]) -> Result<Value, CodecError> {
    let text = std::str::from_utf8(bytes).map_err(|_| CodecError::Utf8)?;
    decode(text)
}

/// Render an integer in marker form
pub fn marker_text(n: &BigUint) -> String {
    format!("{}{}", n, BIGINT_MARKER)
}

/// Parse a pure marker string (`digits` + `n`)
///
/// Returns `None` for anything else, including marker-like strings with a
/// sign, decimal point or exponent.
pub fn parse_marker(s: &str) -> Option<BigUint> {
    let digits = s.strip_suffix(BIGINT_MARKER)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), 10)
}

/// True when `s` has the outline of a marker: a numeric-looking body
/// followed by `n`. Pure markers are a subset of these.
fn looks_like_marker(s: &str) -> bool {
    let Some(body) = s.strip_suffix(BIGINT_MARKER) else {
        return false;
    };
    let unsigned = body.strip_prefix('-').unwrap_or(body);
    match unsigned.bytes().next() {
        Some(b) if b.is_ascii_digit() => {}
        _ => return false,
    }
    body.bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
}

fn needs_escape(s: &str) -> bool {
    looks_like_marker(s.trim_start_matches(ESCAPE))
}

fn lower(value: &Value, path: &mut Path) -> Result<Json, CodecError> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::Number(Number::from(*i)),
        Value::Float(f) => Number::from_f64(*f)
            .map(Json::Number)
            .ok_or_else(|| CodecError::NonFinite {
                path: path.to_string(),
            })?,
        Value::BigInt(n) => Json::String(marker_text(n)),
        Value::String(s) if needs_escape(s) => Json::String(format!("{}{}", ESCAPE, s)),
        Value::String(s) => Json::String(s.clone()),
        Value::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let mark = path.enter_index(i);
                out.push(lower(item, path)?);
                path.leave(mark);
            }
            Json::Array(out)
        }
        Value::Map(map) => {
            let mut out = JsonMap::new();
            for (key, item) in map {
                let mark = path.enter_key(key);
                out.insert(key.clone(), lower(item, path)?);
                path.leave(mark);
            }
            Json::Object(out)
        }
    })
}

fn raise(json: Json, path: &mut Path) -> Result<Value, CodecError> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                Value::BigInt(BigUint::from(u))
            } else {
                // serde_json only yields None here for arbitrary-precision builds
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => raise_string(s, path)?,
        Json::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                let mark = path.enter_index(i);
                out.push(raise(item, path)?);
                path.leave(mark);
            }
            Value::List(out)
        }
        Json::Object(map) => {
            let mut out = ValueMap::with_capacity(map.len());
            for (key, item) in map {
                let mark = path.enter_key(&key);
                let value = raise(item, path)?;
                path.leave(mark);
                out.insert(key, value);
            }
            Value::Map(out)
        }
    })
}

fn raise_string(s: String, path: &Path) -> Result<Value, CodecError> {
    if s.starts_with(ESCAPE) && needs_escape(&s) {
        return Ok(Value::String(s[ESCAPE.len_utf8()..].to_string()));
    }
    if !looks_like_marker(&s) {
        return Ok(Value::String(s));
    }
    match parse_marker(&s) {
        Some(n) => Ok(Value::BigInt(n)),
        None => Err(CodecError::MalformedBigInt {
            path: path.to_string(),
            found: s,
        }),
    }
}

/// JSONPath-like cursor used for error reporting
pub(crate) struct Path {
    buf: String,
}

impl Path {
    pub(crate) fn root() -> Self {
        Self {
            buf: String::from("$"),
        }
    }

    pub(crate) fn enter_key(&mut self, key: &str) -> usize {
        let mark = self.buf.len();
        self.buf.push('.');
        self.buf.push_str(key);
        mark
    }

    pub(crate) fn enter_index(&mut self, index: usize) -> usize {
        let mark = self.buf.len();
        let _ = write!(self.buf, "[{}]", index);
        mark
    }

    pub(crate) fn leave(&mut self, mark: usize) {
        self.buf.truncate(mark);
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn map(pairs: Vec<(&str, Value)>) -> Value {
        Value::Map(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    #[test]
    fn test_wide_caught_attr_survives() {
        let caught = BigUint::from((1u64 << 40) + 5);
        let record = map(vec![(
            "dexData",
            map(vec![("25", map(vec![("caughtAttr", Value::BigInt(caught.clone()))]))]),
        )]);

        let text = encode(&record).unwrap();
        assert!(text.contains("\"1099511627781n\""));

        let back = decode(&text).unwrap();
        assert_eq!(back, record);
        let got = back
            .get("dexData")
            .and_then(|d| d.get("25"))
            .and_then(|e| e.get("caughtAttr"))
            .and_then(Value::as_bigint);
        assert_eq!(got, Some(&caught));
    }

    #[test]
    fn test_marker_found_under_unknown_keys() {
        let text = r#"{"whatever":[{"x":"340282366920938463463374607431768211456n"}],"top":"7n"}"#;
        let value = decode(text).unwrap();
        let deep = value.get("whatever").and_then(Value::as_list).unwrap()[0]
            .get("x")
            .and_then(Value::as_bigint)
            .unwrap();
        assert_eq!(deep.bits(), 129);
        assert_eq!(value.get("top"), Some(&Value::BigInt(BigUint::from(7u8))));
    }

    #[test]
    fn test_malformed_marker_names_path() {
        let text = r#"{"dexData":{"25":{"caughtAttr":"12.5n"}}}"#;
        match decode(text) {
            Err(CodecError::MalformedBigInt { path, found }) => {
                assert_eq!(path, "$.dexData.25.caughtAttr");
                assert_eq!(found, "12.5n");
            }
            other => panic!("expected malformed marker, got {:?}", other),
        }

        let err = decode(r#"{"a":[1,"-4n"]}"#).unwrap_err();
        assert!(matches!(err, CodecError::MalformedBigInt { ref path, .. } if path == "$.a[1]"));
    }

    #[test]
    fn test_ordinary_strings_pass_through() {
        for s in ["n", "won", "abc123n", "", "12", "'quoted"] {
            let v = Value::String(s.to_string());
            assert_eq!(decode(&encode(&v).unwrap()).unwrap(), v);
        }
        assert_eq!(encode(&Value::from("won")).unwrap(), "\"won\"");
    }

    #[test]
    fn test_marker_shaped_strings_are_escaped() {
        let v = Value::String("42n".into());
        let text = encode(&v).unwrap();
        assert_eq!(text, "\"'42n\"");
        assert_eq!(decode(&text).unwrap(), v);

        let v = Value::String("''1e5n".into());
        assert_eq!(decode(&encode(&v).unwrap()).unwrap(), v);
    }

    #[test]
    fn test_non_finite_rejected() {
        let v = map(vec![("playTime", Value::Float(f64::INFINITY))]);
        assert_eq!(
            encode(&v),
            Err(CodecError::NonFinite {
                path: "$.playTime".into()
            })
        );
    }

    #[test]
    fn test_huge_plain_number_becomes_bigint() {
        let v = decode("18446744073709551615").unwrap();
        assert_eq!(v, Value::BigInt(BigUint::from(u64::MAX)));
    }

    #[test]
    fn test_syntax_and_utf8_errors() {
        assert!(matches!(decode("{\"a\":"), Err(CodecError::Syntax(_))));
        assert_eq!(decode_bytes(&[0xff, 0xfe]), Err(CodecError::Utf8));
    }

    fn arb_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Int),
            any::<f64>()
                .prop_filter("finite", |f| f.is_finite())
                .prop_map(Value::Float),
            proptest::collection::vec(any::<u32>(), 0..6)
                .prop_map(|digits| Value::BigInt(BigUint::new(digits))),
            ".*".prop_map(Value::String),
            "'*-?[0-9][0-9.e]{0,4}n".prop_map(Value::String),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                proptest::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
                proptest::collection::vec(("[a-z0-9$]{0,6}", inner), 0..6)
                    .prop_map(|pairs| Value::Map(pairs.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn test_round_trip_any_tree(value in arb_value()) {
            let text = encode(&value).unwrap();
            prop_assert_eq!(decode(&text).unwrap(), value);
        }
    }
}
