use bevy::log::debug;
use bevy::prelude::Resource;
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::config::MindConfig;
use crate::perception::{Action, AntId, Perception};
use crate::policy::{selector_for, AntMind};
use crate::selector::SignalSelector;

type MindSlot = Arc<Mutex<AntMind>>;

/// Owns one `AntMind` per ant identity. Minds are created on an ant's first
/// perception and live until `forget` is called.
#[derive(Resource)]
pub struct AntRegistry {
    config: MindConfig,
    selector: SignalSelector,
    minds: RwLock<HashMap<AntId, MindSlot>>,
}

impl AntRegistry {
    pub fn new(config: MindConfig) -> Self {
        let selector = selector_for(&config);
        Self { config, selector, minds: RwLock::new(HashMap::new()) }
    }

    pub fn config(&self) -> &MindConfig {
        &self.config
    }

    /// The action for one ant this tick.
    pub fn decide_action(&self, perception: &Perception) -> Action {
        let slot = self.slot(perception);
        let mut mind = slot.lock().unwrap_or_else(PoisonError::into_inner);
        mind.decide(&self.selector, perception)
    }

    /// Decides for a batch of distinct ants in parallel. Output order matches
    /// input order.
    pub fn decide_all(&self, perceptions: &[Perception]) -> Vec<Action> {
        perceptions.par_iter().map(|p| self.decide_action(p)).collect()
    }

    /// Drops an ant's memory. Returns whether it was known.
    pub fn forget(&self, id: AntId) -> bool {
        let removed = self.minds.write().unwrap_or_else(PoisonError::into_inner).remove(&id).is_some();
        if removed {
            debug!(ant = %id, "forgotten");
        }
        removed
    }

    pub fn contains(&self, id: AntId) -> bool {
        self.minds.read().unwrap_or_else(PoisonError::into_inner).contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.minds.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` against one ant's mind, if the ant is known.
    pub fn with_mind<T>(&self, id: AntId, f: impl FnOnce(&AntMind) -> T) -> Option<T> {
        let slot = self.minds.read().unwrap_or_else(PoisonError::into_inner).get(&id).cloned()?;
        let mind = slot.lock().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mind))
    }

    fn slot(&self, perception: &Perception) -> MindSlot {
        let id = perception.ant_id;
        if let Some(slot) = self.minds.read().unwrap_or_else(PoisonError::into_inner).get(&id) {
            return Arc::clone(slot);
        }
        let mut minds = self.minds.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(minds.entry(id).or_insert_with(|| {
            debug!(ant = %id, heading = ?perception.heading, "registered");
            Arc::new(Mutex::new(AntMind::new(id, perception.heading, &self.config)))
        }))
    }
}

impl Default for AntRegistry {
    fn default() -> Self {
        Self::new(MindConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heading::Heading;
    use crate::terrain::Terrain;
    use bevy::math::IVec2;

    fn perception(id: u32) -> Perception {
        let mut p = Perception::new(AntId(id), Heading::North);
        for y in -1..=1 {
            for x in -1..=1 {
                p.visible_cells.insert(IVec2::new(x, y), Terrain::Empty);
            }
        }
        p
    }

    #[test]
    fn absurd_offsets_do_not_break_a_decision() {
        let registry = AntRegistry::default();
        let mut p = perception(6);
        p.visible_cells.insert(IVec2::new(i32::MAX, 0), Terrain::Empty);
        p.visible_cells.insert(IVec2::new(50_000, 50_000), Terrain::Colony);
        p.has_food = true;
        let action = registry.decide_action(&p);
        assert!(action.is_movement() || action.is_deposit());
        let width = registry.with_mind(AntId(6), |m| m.world().width());
        assert_eq!(width, Some(3));
    }

    #[test]
    fn minds_are_created_lazily_and_forgotten() {
        let registry = AntRegistry::default();
        assert!(registry.is_empty());

        registry.decide_action(&perception(4));
        registry.decide_action(&perception(4));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.with_mind(AntId(4), |m| m.ticks()), Some(2));

        assert!(registry.forget(AntId(4)));
        assert!(!registry.forget(AntId(4)));
        assert!(registry.with_mind(AntId(4), |m| m.ticks()).is_none());
    }

    #[test]
    fn parallel_batch_creates_one_mind_per_ant() {
        let registry = AntRegistry::default();
        let batch: Vec<Perception> = (0..64).map(perception).collect();
        for _ in 0..3 {
            let actions = registry.decide_all(&batch);
            assert_eq!(actions.len(), batch.len());
        }
        assert_eq!(registry.len(), 64);
        for id in 0..64 {
            assert_eq!(registry.with_mind(AntId(id), |m| m.ticks()), Some(3));
        }
    }

    #[test]
    fn batch_results_do_not_depend_on_scheduling() {
        let batch: Vec<Perception> = (0..32).map(perception).collect();
        let run = || {
            let registry = AntRegistry::default();
            (0..10).map(|_| registry.decide_all(&batch)).collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
