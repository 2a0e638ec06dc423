//! Persisted modifier snapshots

use crate::value::{ToValue, Value, ValueMap};

/// A held item or permanent upgrade as written to a save
///
/// The engine never interprets `args`; it only guarantees they survive a
/// round trip.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifierData {
    pub class_name: String,
    pub type_id: String,
    pub player: bool,
    pub stack_count: u32,
    pub args: Vec<Value>,
    pub type_pregen_args: Option<Vec<Value>>,
    pub console_code: Option<String>,
    /// Fields this release does not know about
    pub extra: ValueMap,
}

impl ModifierData {
    pub fn new(class_name: impl Into<String>, type_id: impl Into<String>, player: bool) -> Self {
        Self {
            class_name: class_name.into(),
            type_id: type_id.into(),
            player,
            stack_count: 1,
            ..Self::default()
        }
    }
}

impl ToValue for ModifierData {
    fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert("className".into(), self.class_name.as_str().into());
        map.insert("typeId".into(), self.type_id.as_str().into());
        map.insert("player".into(), self.player.into());
        map.insert("stackCount".into(), self.stack_count.into());
        map.insert("args".into(), Value::List(self.args.clone()));
        if let Some(pregen) = &self.type_pregen_args {
            map.insert("typePregenArgs".into(), Value::List(pregen.clone()));
        }
        if let Some(code) = &self.console_code {
            map.insert("consoleCode".into(), code.as_str().into());
        }
        for (key, value) in &self.extra {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Map(map)
    }
}
