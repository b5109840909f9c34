use parking_lot::RwLock;
use std::sync::Arc;

use tracer_mission::clamp_time_factor;

use crate::config::Preferences;

/// UI-side state shared between the render loop and startup/shutdown code.
#[derive(Debug, Clone, Default)]
pub struct State {
    pub preferences: Preferences,
    pub faults: Vec<String>,
}

pub type Blackboard = Arc<RwLock<State>>;

pub fn new_blackboard(preferences: Preferences) -> Blackboard {
    Arc::new(RwLock::new(State {
        preferences,
        faults: Vec::new(),
    }))
}

pub fn snapshot(bb: &Blackboard) -> State {
    (*bb.read()).clone()
}

pub fn raise_fault(bb: &Blackboard, msg: &str) {
    let mut g = bb.write();
    if !g.faults.iter().any(|s| s == msg) {
        g.faults.push(msg.to_string());
    }
}

/// Stores a clamped time factor and returns the stored value.
pub fn set_time_factor(bb: &Blackboard, requested: f64) -> f64 {
    let clamped = clamp_time_factor(requested);
    bb.write().preferences.time_factor = clamped;
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracer_mission::{MAX_TIME_FACTOR, MIN_TIME_FACTOR};

    #[test]
    fn test_faults_are_deduplicated() {
        let bb: Blackboard = Arc::default();
        raise_fault(&bb, "bad arc");
        raise_fault(&bb, "bad arc");
        raise_fault(&bb, "bad line");
        assert_eq!(snapshot(&bb).faults, vec!["bad arc", "bad line"]);
    }

    #[test]
    fn test_time_factor_is_clamped() {
        let bb = new_blackboard(Preferences::default());
        assert_eq!(set_time_factor(&bb, 2.0), 2.0);
        assert_eq!(set_time_factor(&bb, 1e6), MAX_TIME_FACTOR);
        assert_eq!(snapshot(&bb).preferences.time_factor, MAX_TIME_FACTOR);
        assert_eq!(set_time_factor(&bb, 0.0), MIN_TIME_FACTOR);
    }
}
