//! Movement subscriptions, owned in one table.
//!
//! Each connector endpoint holds at most one subscription to its target's
//! movement. Entries are keyed by `(connector, role)` so disposing is a
//! single lookup; a reverse index answers "who listens to this shape" when
//! the host reports a move.

use kaku_core::{Role, ShapeId};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Handle identifying one live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub target: ShapeId,
    pub token: Token,
}

/// A connector endpoint listening to a target.
pub type Listener = (ShapeId, Role);

#[derive(Debug, Default)]
pub struct SubscriptionTable {
    by_owner: HashMap<Listener, Subscription>,
    /// Listeners per target, in subscription order.
    by_target: HashMap<ShapeId, SmallVec<[Listener; 4]>>,
    next_token: u64,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `(owner, role)` to `target`, disposing any previous
    /// subscription for that endpoint first.
    pub fn subscribe(&mut self, owner: ShapeId, role: Role, target: ShapeId) -> Token {
        self.cancel(owner, role);
        let token = Token(self.next_token);
        self.next_token += 1;
        self.by_owner
            .insert((owner, role), Subscription { target, token });
        self.by_target
            .entry(target)
            .or_default()
            .push((owner, role));
        token
    }

    /// Dispose the subscription of `(owner, role)`, if any.
    pub fn cancel(&mut self, owner: ShapeId, role: Role) -> Option<Subscription> {
        let sub = self.by_owner.remove(&(owner, role))?;
        if let Some(listeners) = self.by_target.get_mut(&sub.target) {
            listeners.retain(|l| *l != (owner, role));
            if listeners.is_empty() {
                self.by_target.remove(&sub.target);
            }
        }
        Some(sub)
    }

    /// Dispose both endpoints of a connector.
    pub fn cancel_all(&mut self, owner: ShapeId) {
        for role in Role::BOTH {
            self.cancel(owner, role);
        }
    }

    pub fn get(&self, owner: ShapeId, role: Role) -> Option<Subscription> {
        self.by_owner.get(&(owner, role)).copied()
    }

    pub fn is_subscribed(&self, owner: ShapeId, role: Role) -> bool {
        self.by_owner.contains_key(&(owner, role))
    }

    /// Everyone to notify when `target` moves.
    pub fn listeners(&self, target: ShapeId) -> SmallVec<[Listener; 4]> {
        self.by_target.get(&target).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_owner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_owner.is_empty()
    }
}
