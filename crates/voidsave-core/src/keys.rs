//! Short field keys
//!
//! Older profiles wrote dex and starter fields under `$`-prefixed short keys
//! to keep the save text small. Decoding expands them to the current names;
//! the single-profile export writes the short form again.

use crate::value::{Value, ValueMap};

/// Short key → current key
pub const SHORT_KEYS: &[(&str, &str)] = &[
    ("$sa", "seenAttr"),
    ("$ca", "caughtAttr"),
    ("$na", "natureAttr"),
    ("$s", "seenCount"),
    ("$c", "caughtCount"),
    ("$hc", "hatchedCount"),
    ("$i", "ivs"),
    ("$m", "moveset"),
    ("$fm", "fusionMovesets"),
    ("$of", "obtainedFusions"),
    ("$em", "eggMoves"),
    ("$x", "candyCount"),
    ("$f", "friendship"),
    ("$a", "abilityAttr"),
    ("$pa", "passiveAttr"),
    ("$vr", "valueReduction"),
    ("$wc", "classicWinCount"),
];

/// Misspelled short keys written by a few releases, read but never written
const SHORT_KEY_ALIASES: &[(&str, &str)] = &[("$pAttr", "passiveAttr")];

/// Profile fields whose values are maps of per-species entries
pub const ENTRY_TABLES: &[&str] = &["dexData", "starterData"];

/// Current name for a short key
pub fn expand_key(key: &str) -> Option<&'static str> {
    SHORT_KEYS
        .iter()
        .chain(SHORT_KEY_ALIASES)
        .find(|(short, _)| *short == key)
        .map(|(_, long)| *long)
}

/// Short name for a current key
pub fn shorten_key(key: &str) -> Option<&'static str> {
    SHORT_KEYS
        .iter()
        .find(|(_, long)| *long == key)
        .map(|(short, _)| *short)
}

/// Rename short keys of one entry to their current names
///
/// When both spellings are present the current one wins and the short one is
/// dropped.
pub fn expand_entry(entry: &mut ValueMap) {
    let shorts: Vec<String> = entry
        .keys()
        .filter(|k| expand_key(k).is_some())
        .cloned()
        .collect();
    for short in shorts {
        let Some(long) = expand_key(&short) else {
            continue;
        };
        if let Some(value) = entry.shift_remove(&short) {
            if !entry.contains_key(long) {
                entry.insert(long.to_string(), value);
            }
        }
    }
}

/// Rename current keys of one entry to their short form
pub fn shorten_entry(entry: &mut ValueMap) {
    let old = std::mem::take(entry);
    for (key, value) in old {
        let key = shorten_key(&key).map(str::to_string).unwrap_or(key);
        entry.insert(key, value);
    }
}

fn for_each_entry(profile: &mut Value, f: fn(&mut ValueMap)) {
    let Some(root) = profile.as_map_mut() else {
        return;
    };
    for table in ENTRY_TABLES {
        if let Some(Value::Map(entries)) = root.get_mut(*table) {
            for entry in entries.values_mut() {
                if let Value::Map(fields) = entry {
                    f(fields);
                }
            }
        }
    }
}

/// Expand short keys in every dex and starter entry of a raw profile tree
pub fn expand_profile(profile: &mut Value) {
    for_each_entry(profile, expand_entry);
}

/// Shorten keys in every dex and starter entry of a profile tree
pub fn shorten_profile(profile: &mut Value) {
    for_each_entry(profile, shorten_entry);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pairs: &[(&str, i64)]) -> ValueMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::Int(*v)))
            .collect()
    }

    #[test]
    fn test_expand_entry() {
        let mut e = entry(&[("$s", 3), ("$c", 1), ("$pAttr", 2)]);
        expand_entry(&mut e);
        assert_eq!(e.get("seenCount"), Some(&Value::Int(3)));
        assert_eq!(e.get("caughtCount"), Some(&Value::Int(1)));
        assert_eq!(e.get("passiveAttr"), Some(&Value::Int(2)));
        assert!(!e.contains_key("$s"));
    }

    #[test]
    fn test_current_key_wins() {
        let mut e = entry(&[("$x", 1), ("candyCount", 9)]);
        expand_entry(&mut e);
        assert_eq!(e.len(), 1);
        assert_eq!(e.get("candyCount"), Some(&Value::Int(9)));
    }

    #[test]
    fn test_profile_shorten_then_expand() {
        let mut starters = ValueMap::new();
        starters.insert("1".into(), Value::Map(entry(&[("candyCount", 4), ("friendship", 70)])));
        let mut root = ValueMap::new();
        root.insert("starterData".into(), Value::Map(starters));
        root.insert("candyCount".into(), Value::Int(1));
        let original = Value::Map(root);

        let mut short = original.clone();
        shorten_profile(&mut short);
        let first = short.get("starterData").and_then(|s| s.get("1")).unwrap();
        assert_eq!(first.get("$x"), Some(&Value::Int(4)));
        // top-level fields are left alone
        assert_eq!(short.get("candyCount"), Some(&Value::Int(1)));

        expand_profile(&mut short);
        assert_eq!(short, original);
    }
}
