//! Quest and unlock progress
//!
//! A sparse map from quest id to progress. A quest missing from the map is
//! locked. Stored states only move forward: Unlocked → Active → Completed.

use crate::dex::SpeciesId;
use crate::error::QuestError;
use crate::value::{ToValue, Value, ValueMap};
use std::collections::BTreeMap;

/// Quest identifier
pub type QuestId = u32;

/// Stored quest state; absence from the store means locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QuestState {
    Unlocked,
    Active,
    Completed,
}

impl QuestState {
    pub fn code(self) -> i64 {
        match self {
            QuestState::Unlocked => 0,
            QuestState::Active => 1,
            QuestState::Completed => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(QuestState::Unlocked),
            1 => Some(QuestState::Active),
            2 => Some(QuestState::Completed),
            _ => None,
        }
    }
}

/// Kind of content a quest hands out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewardKind {
    GlitchFormA,
    Modifier,
    GameMode,
    Unlockable,
    GlitchFormB,
    GlitchFormC,
    GlitchFormD,
    GlitchFormE,
    SmittyForm,
    SmittyFormB,
    PermaModifier,
    PermaMoney,
    PermaMoneyAndModifier,
    NewMovesForSpecies,
    /// A code written by a newer release
    Other(u32),
}

impl RewardKind {
    const KNOWN: [RewardKind; 14] = [
        RewardKind::GlitchFormA,
        RewardKind::Modifier,
        RewardKind::GameMode,
        RewardKind::Unlockable,
        RewardKind::GlitchFormB,
        RewardKind::GlitchFormC,
        RewardKind::GlitchFormD,
        RewardKind::GlitchFormE,
        RewardKind::SmittyForm,
        RewardKind::SmittyFormB,
        RewardKind::PermaModifier,
        RewardKind::PermaMoney,
        RewardKind::PermaMoneyAndModifier,
        RewardKind::NewMovesForSpecies,
    ];

    pub fn code(self) -> u32 {
        match self {
            RewardKind::Other(code) => code,
            known => Self::KNOWN
                .iter()
                .position(|k| *k == known)
                .map(|i| i as u32)
                .unwrap_or_default(),
        }
    }

    pub fn from_code(code: u32) -> Self {
        Self::KNOWN
            .get(code as usize)
            .copied()
            .unwrap_or(RewardKind::Other(code))
    }

    /// Glitch form rewards count toward `glitchFormsUnlocked`
    pub fn is_glitch_form(self) -> bool {
        matches!(
            self,
            RewardKind::GlitchFormA
                | RewardKind::GlitchFormB
                | RewardKind::GlitchFormC
                | RewardKind::GlitchFormD
                | RewardKind::GlitchFormE
        )
    }
}

/// What a reward points at
#[derive(Debug, Clone, PartialEq)]
pub enum RewardTarget {
    /// A species, game mode or quest id
    Id(u32),
    /// Several species
    Ids(Vec<u32>),
    /// A named modifier
    Name(String),
}

impl RewardTarget {
    pub fn includes_species(&self, species: SpeciesId) -> bool {
        match self {
            RewardTarget::Id(id) => *id == species,
            RewardTarget::Ids(ids) => ids.contains(&species),
            RewardTarget::Name(_) => false,
        }
    }
}

impl ToValue for RewardTarget {
    fn to_value(&self) -> Value {
        match self {
            RewardTarget::Id(id) => (*id).into(),
            RewardTarget::Ids(ids) => ids.clone().into(),
            RewardTarget::Name(name) => name.as_str().into(),
        }
    }
}

/// Reward attached to a quest
#[derive(Debug, Clone, PartialEq)]
pub struct RewardDescriptor {
    pub kind: RewardKind,
    pub target: RewardTarget,
    pub amount: Option<u64>,
    pub quest_id: QuestId,
    pub text: Option<String>,
    /// Presentation fields carried through untouched
    pub extra: ValueMap,
}

impl RewardDescriptor {
    pub fn new(kind: RewardKind, target: RewardTarget, quest_id: QuestId) -> Self {
        Self {
            kind,
            target,
            amount: None,
            quest_id,
            text: None,
            extra: ValueMap::new(),
        }
    }
}

impl ToValue for RewardDescriptor {
    fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert("rewardType".into(), self.kind.code().into());
        map.insert("rewardId".into(), self.target.to_value());
        if let Some(amount) = self.amount {
            map.insert("rewardAmount".into(), amount.into());
        }
        map.insert("questId".into(), self.quest_id.into());
        if let Some(text) = &self.text {
            map.insert("rewardText".into(), text.as_str().into());
        }
        for (key, value) in &self.extra {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Map(map)
    }
}

/// Progress of one quest
#[derive(Debug, Clone, PartialEq)]
pub struct QuestProgress {
    pub state: QuestState,
    pub stage_index: Option<u32>,
    pub progress_count: Option<u32>,
    pub reward: Option<RewardDescriptor>,
}

impl QuestProgress {
    pub fn new(state: QuestState) -> Self {
        Self {
            state,
            stage_index: None,
            progress_count: None,
            reward: None,
        }
    }
}

impl ToValue for QuestProgress {
    fn to_value(&self) -> Value {
        let mut map = ValueMap::new();
        map.insert("state".into(), self.state.code().into());
        if let Some(count) = self.progress_count {
            map.insert("currentCount".into(), count.into());
        }
        if let Some(stage) = self.stage_index {
            map.insert("currentStage".into(), stage.into());
        }
        if let Some(reward) = &self.reward {
            map.insert("questUnlockData".into(), reward.to_value());
        }
        Value::Map(map)
    }
}

/// Outcome of [`QuestStore::set_state`]
#[derive(Debug, Clone, PartialEq)]
pub struct QuestTransition {
    pub previous: Option<QuestState>,
    pub current: QuestState,
    /// The quest entered Completed carrying this reward
    pub rewarded: Option<RewardDescriptor>,
}

/// Quest id → progress
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuestStore {
    quests: BTreeMap<QuestId, QuestProgress>,
}

impl QuestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Locked → Unlocked. Returns false when the quest was already known.
    pub fn unlock(&mut self, id: QuestId) -> bool {
        if self.quests.contains_key(&id) {
            return false;
        }
        self.quests.insert(id, QuestProgress::new(QuestState::Unlocked));
        true
    }

    /// Overwrite the state and reward of a quest
    ///
    /// Stage and count are reset. Moving to an earlier state than the stored
    /// one is rejected. The transition carries the reward only when the quest
    /// enters Completed from another state with a reward attached, so callers
    /// can apply reward side effects exactly once.
    pub fn set_state(
        &mut self,
        id: QuestId,
        state: QuestState,
        reward: Option<RewardDescriptor>,
    ) -> Result<QuestTransition, QuestError> {
        let previous = self.state_of(id);
        if let Some(from) = previous {
            if state < from {
                return Err(QuestError::Regression {
                    quest: id,
                    from,
                    to: state,
                });
            }
        }

        let rewarded = match (&reward, previous) {
            (Some(r), prev) if state == QuestState::Completed && prev != Some(state) => {
                Some(r.clone())
            }
            _ => None,
        };

        self.quests.insert(
            id,
            QuestProgress {
                state,
                stage_index: None,
                progress_count: None,
                reward,
            },
        );

        Ok(QuestTransition {
            previous,
            current: state,
            rewarded,
        })
    }

    /// Record reaching a stage, keeping the stored state
    ///
    /// An unknown quest becomes Unlocked. The progress count restarts at zero.
    pub fn advance_stage(&mut self, id: QuestId, stage_index: u32, reward: RewardDescriptor) {
        let state = self.state_of(id).unwrap_or(QuestState::Unlocked);
        self.quests.insert(
            id,
            QuestProgress {
                state,
                stage_index: Some(stage_index),
                progress_count: Some(0),
                reward: Some(reward),
            },
        );
    }

    /// Update the in-stage counter of a known quest
    pub fn set_progress_count(&mut self, id: QuestId, count: u32) -> bool {
        match self.quests.get_mut(&id) {
            Some(progress) => {
                progress.progress_count = Some(count);
                true
            }
            None => false,
        }
    }

    pub fn state_of(&self, id: QuestId) -> Option<QuestState> {
        self.quests.get(&id).map(|p| p.state)
    }

    pub fn check_state(&self, id: QuestId, state: QuestState) -> bool {
        self.state_of(id) == Some(state)
    }

    /// Current stage, zero when unset
    pub fn stage_of(&self, id: QuestId) -> u32 {
        self.quests
            .get(&id)
            .and_then(|p| p.stage_index)
            .unwrap_or(0)
    }

    pub fn reward_of(&self, id: QuestId) -> Option<&RewardDescriptor> {
        self.quests.get(&id).and_then(|p| p.reward.as_ref())
    }

    pub fn get(&self, id: QuestId) -> Option<&QuestProgress> {
        self.quests.get(&id)
    }

    /// True when some completed quest rewards `kind` for `species`
    pub fn is_completed_with_reward(&self, species: SpeciesId, kind: RewardKind) -> bool {
        self.quests.values().any(|p| {
            p.state == QuestState::Completed
                && p.reward
                    .as_ref()
                    .is_some_and(|r| r.kind == kind && r.target.includes_species(species))
        })
    }

    pub fn completed_quests(&self) -> impl Iterator<Item = QuestId> + '_ {
        self.quests
            .iter()
            .filter(|(_, p)| p.state == QuestState::Completed)
            .map(|(id, _)| *id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestId, &QuestProgress)> {
        self.quests.iter().map(|(id, p)| (*id, p))
    }

    pub fn len(&self) -> usize {
        self.quests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
    }

    /// Insert decoded progress as-is; used when rebuilding a store from disk
    pub fn restore(&mut self, id: QuestId, progress: QuestProgress) {
        self.quests.insert(id, progress);
    }
}

impl ToValue for QuestStore {
    fn to_value(&self) -> Value {
        Value::Map(
            self.quests
                .iter()
                .map(|(id, p)| (id.to_string(), p.to_value()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glitch_reward(species: SpeciesId, quest: QuestId) -> RewardDescriptor {
        RewardDescriptor::new(RewardKind::GlitchFormA, RewardTarget::Id(species), quest)
    }

    #[test]
    fn test_unlock_only_when_absent() {
        let mut store = QuestStore::new();
        assert!(store.unlock(3));
        store.set_state(3, QuestState::Active, None).unwrap();
        assert!(!store.unlock(3));
        assert_eq!(store.state_of(3), Some(QuestState::Active));
        assert_eq!(store.state_of(4), None);
    }

    #[test]
    fn test_reward_fires_once() {
        let mut store = QuestStore::new();
        let t = store
            .set_state(1, QuestState::Completed, Some(glitch_reward(25, 1)))
            .unwrap();
        assert!(t.rewarded.is_some());

        let again = store
            .set_state(1, QuestState::Completed, Some(glitch_reward(25, 1)))
            .unwrap();
        assert!(again.rewarded.is_none());
    }

    #[test]
    fn test_no_reward_without_descriptor() {
        let mut store = QuestStore::new();
        let t = store.set_state(1, QuestState::Completed, None).unwrap();
        assert_eq!(t.previous, None);
        assert!(t.rewarded.is_none());
    }

    #[test]
    fn test_backward_transition_rejected() {
        let mut store = QuestStore::new();
        store.set_state(9, QuestState::Completed, None).unwrap();
        let err = store.set_state(9, QuestState::Active, None).unwrap_err();
        assert_eq!(
            err,
            QuestError::Regression {
                quest: 9,
                from: QuestState::Completed,
                to: QuestState::Active
            }
        );
        assert!(store.check_state(9, QuestState::Completed));
    }

    #[test]
    fn test_advance_stage_keeps_state() {
        let mut store = QuestStore::new();
        store.set_state(2, QuestState::Active, None).unwrap();
        store.set_progress_count(2, 5);
        store.advance_stage(2, 3, glitch_reward(4, 2));
        let p = store.get(2).unwrap();
        assert_eq!(p.state, QuestState::Active);
        assert_eq!(p.stage_index, Some(3));
        assert_eq!(p.progress_count, Some(0));
        assert_eq!(store.stage_of(2), 3);
        assert_eq!(store.stage_of(99), 0);

        store.advance_stage(7, 1, glitch_reward(4, 7));
        assert_eq!(store.state_of(7), Some(QuestState::Unlocked));
    }

    #[test]
    fn test_completed_with_reward_lookup() {
        let mut store = QuestStore::new();
        let list = RewardDescriptor::new(
            RewardKind::NewMovesForSpecies,
            RewardTarget::Ids(vec![1, 4, 7]),
            5,
        );
        store.set_state(5, QuestState::Completed, Some(list)).unwrap();
        store.advance_stage(6, 0, glitch_reward(150, 6));

        assert!(store.is_completed_with_reward(4, RewardKind::NewMovesForSpecies));
        assert!(!store.is_completed_with_reward(4, RewardKind::GlitchFormA));
        // quest 6 is not completed
        assert!(!store.is_completed_with_reward(150, RewardKind::GlitchFormA));
        assert_eq!(store.completed_quests().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_reward_codes() {
        assert_eq!(RewardKind::GlitchFormA.code(), 0);
        assert_eq!(RewardKind::GlitchFormE.code(), 7);
        assert_eq!(RewardKind::NewMovesForSpecies.code(), 13);
        assert_eq!(RewardKind::from_code(4), RewardKind::GlitchFormB);
        assert_eq!(RewardKind::from_code(40), RewardKind::Other(40));
        assert!(RewardKind::GlitchFormC.is_glitch_form());
        assert!(!RewardKind::SmittyForm.is_glitch_form());
    }
}
