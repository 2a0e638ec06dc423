//! Per-species dex entries

use crate::bitfield::Bitfield;
use crate::value::{ToValue, Value, ValueMap};
use std::collections::BTreeMap;

/// Species identifier
pub type SpeciesId = u32;

/// Bit positions inside `seenAttr` / `caughtAttr`
pub struct DexAttr;

impl DexAttr {
    pub const NON_SHINY: u64 = 1;
    pub const SHINY: u64 = 2;
    pub const MALE: u64 = 4;
    pub const FEMALE: u64 = 8;
    pub const DEFAULT_VARIANT: u64 = 16;
    pub const VARIANT_2: u64 = 32;
    pub const VARIANT_3: u64 = 64;
    pub const DEFAULT_FORM: u64 = 128;

    /// Bit index flagging form `index` (form 0 is `DEFAULT_FORM`)
    pub const fn form_bit(index: u32) -> u64 {
        7 + index as u64
    }

    /// All variant tier bits
    pub const VARIANTS: u64 = Self::DEFAULT_VARIANT | Self::VARIANT_2 | Self::VARIANT_3;
}

/// Number of individual value slots tracked per species
pub const IV_COUNT: usize = 6;

/// What the player has seen and caught of one species
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexEntry {
    pub seen_attr: Bitfield,
    pub caught_attr: Bitfield,
    pub nature_attr: Bitfield,
    pub seen_count: u32,
    pub caught_count: u32,
    pub hatched_count: u32,
    pub ivs: Vec<u32>,
}

impl Default for DexEntry {
    fn default() -> Self {
        Self {
            seen_attr: Bitfield::new(),
            caught_attr: Bitfield::new(),
            nature_attr: Bitfield::new(),
            seen_count: 0,
            caught_count: 0,
            hatched_count: 0,
            ivs: vec![0; IV_COUNT],
        }
    }
}

impl DexEntry {
    /// A zeroed entry whose nature bitfield starts at the species default
    pub fn with_nature(nature_attr: Bitfield) -> Self {
        Self {
            nature_attr,
            ..Self::default()
        }
    }

    /// True once any attribute of the species has been caught
    pub fn is_caught(&self) -> bool {
        !self.caught_attr.is_empty()
    }

    /// Record a sighting with the given attribute bits
    pub fn record_seen(&mut self, attr: &Bitfield) {
        self.seen_attr.union_with(attr);
        self.seen_count = self.seen_count.saturating_add(1);
    }

    /// Record a catch; a caught attribute is also a seen one
    pub fn record_caught(&mut self, attr: &Bitfield, hatched: bool) {
        self.seen_attr.union_with(attr);
        self.caught_attr.union_with(attr);
        self.caught_count = self.caught_count.saturating_add(1);
        if hatched {
            self.hatched_count = self.hatched_count.saturating_add(1);
        }
    }

    /// Keep the best IV seen per slot
    pub fn record_ivs(&mut self, ivs: &[u32]) {
        if self.ivs.len() < ivs.len() {
            self.ivs.resize(ivs.len(), 0);
        }
        for (slot, iv) in self.ivs.iter_mut().zip(ivs) {
            *slot = (*slot).max(*iv);
        }
    }

    /// Fold another entry into this one without losing anything either knows
    pub fn merge(&mut self, other: &DexEntry) {
        self.seen_attr.union_with(&other.seen_attr);
        self.caught_attr.union_with(&other.caught_attr);
        self.nature_attr.union_with(&other.nature_attr);
        self.seen_count = self.seen_count.max(other.seen_count);
        self.caught_count = self.caught_count.max(other.caught_count);
        self.hatched_count = self.hatched_count.max(other.hatched_count);
        self.record_ivs(&other.ivs);
    }

    /// True when this entry has everything `earlier` had
    ///
    /// Dex progress only grows, so a write that fails this check against the
    /// last persisted entry would lose data.
    pub fn covers(&self, earlier: &DexEntry) -> bool {
        self.seen_attr.is_superset_of(&earlier.seen_attr)
            && self.caught_attr.is_superset_of(&earlier.caught_attr)
            && self.seen_count >= earlier.seen_count
            && self.caught_count >= earlier.caught_count
            && self.hatched_count >= earlier.hatched_count
    }
}

impl ToValue for DexEntry {
    fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert("seenAttr".into(), (&self.seen_attr).into());
        map.insert("caughtAttr".into(), (&self.caught_attr).into());
        map.insert("natureAttr".into(), (&self.nature_attr).into());
        map.insert("seenCount".into(), self.seen_count.into());
        map.insert("caughtCount".into(), self.caught_count.into());
        map.insert("hatchedCount".into(), self.hatched_count.into());
        map.insert("ivs".into(), self.ivs.clone().into());
        Value::Map(map)
    }
}

/// Species id → dex entry
pub type SpeciesDex = BTreeMap<SpeciesId, DexEntry>;

/// Species ids whose entry in `next` lost progress relative to `prev`
pub fn regressions(prev: &SpeciesDex, next: &SpeciesDex) -> Vec<SpeciesId> {
    prev.iter()
        .filter(|(id, old)| match next.get(*id) {
            Some(new) => !new.covers(old),
            None => **old != DexEntry::default(),
        })
        .map(|(id, _)| *id)
        .collect()
}

impl ToValue for SpeciesDex {
    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(id, entry)| (id.to_string(), entry.to_value()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_caught_sets_seen() {
        let mut entry = DexEntry::default();
        let attr = Bitfield::from_u64(DexAttr::SHINY | DexAttr::MALE | DexAttr::DEFAULT_VARIANT);
        entry.record_caught(&attr, true);
        assert!(entry.is_caught());
        assert!(entry.seen_attr.is_superset_of(&attr));
        assert_eq!((entry.caught_count, entry.hatched_count), (1, 1));
    }

    #[test]
    fn test_form_bits() {
        assert_eq!(1u64 << DexAttr::form_bit(0), DexAttr::DEFAULT_FORM);
        let mut entry = DexEntry::default();
        let mut attr = Bitfield::new();
        attr.set_bit(DexAttr::form_bit(60));
        entry.record_seen(&attr);
        assert!(entry.seen_attr.has_bit(67));
    }

    #[test]
    fn test_merge_never_loses_progress() {
        let mut a = DexEntry::default();
        a.record_caught(&Bitfield::from_u64(DexAttr::FEMALE), false);
        let mut b = DexEntry::default();
        b.record_seen(&Bitfield::from_u64(DexAttr::SHINY));
        b.record_seen(&Bitfield::from_u64(DexAttr::SHINY));
        b.record_ivs(&[31, 0, 0, 0, 0, 4]);

        let before = a.clone();
        a.merge(&b);
        assert!(a.covers(&before));
        assert!(a.covers(&b));
        assert_eq!(a.ivs[0], 31);
    }

    #[test]
    fn test_regressions() {
        let mut prev = SpeciesDex::new();
        let mut caught = DexEntry::default();
        caught.record_caught(&Bitfield::from_u64(DexAttr::NON_SHINY), false);
        prev.insert(1, caught);
        prev.insert(4, DexEntry::default());

        let mut next = SpeciesDex::new();
        next.insert(1, DexEntry::default());
        assert_eq!(regressions(&prev, &next), vec![1]);

        next.insert(1, prev[&1].clone());
        assert!(regressions(&prev, &next).is_empty());
    }
}
