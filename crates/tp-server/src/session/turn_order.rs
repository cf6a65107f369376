//! Rotation of player ids through turns

use tp_protocol::PlayerId;

/// Ordered sequence of players still in the game, with a pointer to the one
/// whose turn it is.
///
/// Removal keeps the pointer on the player who should act next: removing an
/// entry before the pointer shifts it down by one, removing at or after it
/// leaves it in place (wrapping to the front if it fell off the end).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnOrder {
    order: Vec<PlayerId>,
    index: usize,
}

impl TurnOrder {
    /// Start a rotation with `order[0]` to act
    pub fn new(order: Vec<PlayerId>) -> Self {
        Self { order, index: 0 }
    }

    /// The player whose turn it is
    pub fn active(&self) -> Option<PlayerId> {
        self.order.get(self.index).copied()
    }

    /// Position of the active player
    pub fn index(&self) -> usize {
        self.index
    }

    /// Players in the order they act
    pub fn as_slice(&self) -> &[PlayerId] {
        &self.order
    }

    /// Whether `id` still holds a slot
    pub fn contains(&self, id: PlayerId) -> bool {
        self.order.contains(&id)
    }

    /// Number of players in the rotation
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the rotation is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop every player and reset the pointer
    pub fn clear(&mut self) {
        self.order.clear();
        self.index = 0;
    }

    /// Take `id` out of the rotation. Returns false if it was not in it.
    pub fn remove(&mut self, id: PlayerId) -> bool {
        let Some(position) = self.order.iter().position(|&p| p == id) else {
            return false;
        };

        self.order.remove(position);
        if position < self.index {
            self.index -= 1;
        }
        self.wrap();
        true
    }

    /// Move `id` to the back of the rotation after it has acted
    pub fn rotate_to_back(&mut self, id: PlayerId) -> bool {
        if !self.remove(id) {
            return false;
        }
        self.order.push(id);
        self.wrap();
        true
    }

    fn wrap(&mut self) {
        if self.order.is_empty() {
            self.index = 0;
        } else {
            self.index %= self.order.len();
        }
    }
}
