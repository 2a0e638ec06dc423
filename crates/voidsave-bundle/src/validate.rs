//! Acceptance checks run on decoded trees before anything is normalized
//!
//! Checks look at the raw tree, not at the normalized record: normalizing
//! fills the dex from the catalog and would hide an empty one.

use std::fmt;
use voidsave_core::Value;

/// One failed acceptance check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    /// Profile has no dex entries
    EmptyDex,
    /// Profile was never saved
    ZeroProfileTimestamp,
    SessionZeroTimestamp { slot: usize },
    /// Neither the player nor the opposing party has a member
    SessionEmptyParties { slot: usize },
    /// Root of a record is not a map
    NotAMap { record: String },
    RunBadKey { key: String },
    RunMissingField { key: String, field: &'static str },
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationFailure::EmptyDex => write!(f, "profile dex is empty"),
            ValidationFailure::ZeroProfileTimestamp => write!(f, "profile timestamp is zero"),
            ValidationFailure::SessionZeroTimestamp { slot } => {
                write!(f, "session {slot} timestamp is zero")
            }
            ValidationFailure::SessionEmptyParties { slot } => {
                write!(f, "session {slot} has no party members on either side")
            }
            ValidationFailure::NotAMap { record } => write!(f, "{record} is not a map"),
            ValidationFailure::RunBadKey { key } => {
                write!(f, "run history key {key:?} is not a timestamp")
            }
            ValidationFailure::RunMissingField { key, field } => {
                write!(f, "run history entry {key} is missing {field}")
            }
        }
    }
}

/// Every check an import failed, in check order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn contains(&self, failure: &ValidationFailure) -> bool {
        self.failures.contains(failure)
    }

    fn fail(&mut self, failure: ValidationFailure) {
        self.failures.push(failure);
    }

    /// `Ok` when nothing failed, the report itself otherwise
    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "import rejected: ")?;
        for (i, failure) in self.failures.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

fn int_field(value: &Value, key: &str) -> i64 {
    value.get(key).and_then(Value::as_int).unwrap_or(0)
}

fn non_empty_list(value: &Value, key: &str) -> bool {
    value
        .get(key)
        .and_then(Value::as_list)
        .is_some_and(|items| !items.is_empty())
}

/// Profile must hold a non-empty dex and a non-zero timestamp
pub fn check_profile(profile: &Value, report: &mut ValidationReport) {
    if profile.as_map().is_none() {
        report.fail(ValidationFailure::NotAMap {
            record: "profile".into(),
        });
        return;
    }
    let dex_filled = profile
        .get("dexData")
        .and_then(Value::as_map)
        .is_some_and(|dex| !dex.is_empty());
    if !dex_filled {
        report.fail(ValidationFailure::EmptyDex);
    }
    if int_field(profile, "timestamp") == 0 {
        report.fail(ValidationFailure::ZeroProfileTimestamp);
    }
}

/// Session must have a non-zero timestamp and at least one party member
pub fn check_session(slot: usize, session: &Value, report: &mut ValidationReport) {
    if session.as_map().is_none() {
        report.fail(ValidationFailure::NotAMap {
            record: format!("session {slot}"),
        });
        return;
    }
    if int_field(session, "timestamp") == 0 {
        report.fail(ValidationFailure::SessionZeroTimestamp { slot });
    }
    if !non_empty_list(session, "party") && !non_empty_list(session, "enemyParty") {
        report.fail(ValidationFailure::SessionEmptyParties { slot });
    }
}

/// Every run must carry a snapshot plus its victory and favorite flags
pub fn check_run_history(history: &Value, report: &mut ValidationReport) {
    let Some(runs) = history.as_map() else {
        report.fail(ValidationFailure::NotAMap {
            record: "run history".into(),
        });
        return;
    };
    for (key, run) in runs {
        if key.parse::<i64>().is_err() {
            report.fail(ValidationFailure::RunBadKey { key: key.clone() });
            continue;
        }
        if run.get("entry").and_then(Value::as_map).is_none() {
            report.fail(ValidationFailure::RunMissingField {
                key: key.clone(),
                field: "entry",
            });
        }
        for field in ["isVictory", "isFavorite"] {
            if run.get(field).and_then(Value::as_bool).is_none() {
                report.fail(ValidationFailure::RunMissingField {
                    key: key.clone(),
                    field,
                });
            }
        }
    }
}

/// Whether a session would pass [`check_session`]
pub fn session_acceptable(session: &Value) -> bool {
    let mut report = ValidationReport::default();
    check_session(0, session, &mut report);
    report.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use voidsave_core::ValueMap;

    fn map(pairs: &[(&str, Value)]) -> Value {
        Value::Map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<ValueMap>(),
        )
    }

    #[test]
    fn test_profile_lists_every_failure() {
        let mut report = ValidationReport::default();
        check_profile(&map(&[("dexData", Value::empty_map())]), &mut report);
        assert_eq!(
            report.failures,
            vec![
                ValidationFailure::EmptyDex,
                ValidationFailure::ZeroProfileTimestamp
            ]
        );
        assert_eq!(
            report.to_string(),
            "import rejected: profile dex is empty; profile timestamp is zero"
        );
    }

    #[test]
    fn test_profile_accepted() {
        let dex = map(&[("1", Value::empty_map())]);
        let profile = map(&[("dexData", dex), ("timestamp", Value::Int(9))]);
        let mut report = ValidationReport::default();
        check_profile(&profile, &mut report);
        assert!(report.is_ok());
    }

    #[test]
    fn test_session_either_party() {
        let member = Value::List(vec![Value::empty_map()]);
        let enemy_only = map(&[
            ("timestamp", Value::Int(5)),
            ("party", Value::List(vec![])),
            ("enemyParty", member),
        ]);
        assert!(session_acceptable(&enemy_only));

        let mut report = ValidationReport::default();
        check_session(3, &map(&[("party", Value::Null)]), &mut report);
        assert_eq!(
            report.failures,
            vec![
                ValidationFailure::SessionZeroTimestamp { slot: 3 },
                ValidationFailure::SessionEmptyParties { slot: 3 }
            ]
        );
    }

    #[test]
    fn test_run_history_flags() {
        let good = map(&[
            ("entry", Value::empty_map()),
            ("isVictory", Value::Bool(true)),
            ("isFavorite", Value::Bool(false)),
        ]);
        let bad = map(&[("entry", Value::empty_map()), ("isVictory", Value::Bool(true))]);
        let history = map(&[("10", good), ("20", bad), ("soon", Value::empty_map())]);

        let mut report = ValidationReport::default();
        check_run_history(&history, &mut report);
        assert_eq!(
            report.failures,
            vec![
                ValidationFailure::RunMissingField {
                    key: "20".into(),
                    field: "isFavorite"
                },
                ValidationFailure::RunBadKey { key: "soon".into() }
            ]
        );
    }
}
