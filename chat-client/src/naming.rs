//! Client-side naming state shared between the receive and send tasks.

use parking_lot::Mutex;

struct Inner {
    collision_index: i32,
    current_name: String,
}

/// Tracks the name a client is negotiating: the user-supplied `base_name`,
/// and a `current_name` that grows a numeric suffix each time the server
/// reports a collision. `collision_index` starts at -1 (no suffix) and
/// increments on every `NAME_TAKEN:`.
pub struct NamingState {
    base_name: String,
    inner: Mutex<Inner>,
}

impl NamingState {
    pub fn new(base_name: String) -> Self {
        let current_name = base_name.clone();
        NamingState {
            base_name,
            inner: Mutex::new(Inner {
                collision_index: -1,
                current_name,
            }),
        }
    }

    pub fn current_name(&self) -> String {
        self.inner.lock().current_name.clone()
    }

    /// Bumps the collision index and recomputes `current_name` as
    /// `base_name` concatenated with the decimal suffix.
    pub fn record_collision(&self) {
        let mut inner = self.inner.lock();
        inner.collision_index += 1;
        inner.current_name = format!("{}{}", self.base_name, inner.collision_index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_unsuffixed() {
        let state = NamingState::new("Fred".to_string());
        assert_eq!(state.current_name(), "Fred");
    }

    #[test]
    fn collisions_append_increasing_suffixes() {
        let state = NamingState::new("Fred".to_string());
        state.record_collision();
        assert_eq!(state.current_name(), "Fred0");
        state.record_collision();
        assert_eq!(state.current_name(), "Fred1");
    }
}
