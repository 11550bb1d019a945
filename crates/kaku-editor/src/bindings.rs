//! Per-connector binding slots.
//!
//! A connector has at most one binding per endpoint. Setting a slot always
//! disposes the previous subscription for that endpoint before creating the
//! new one, so a connector can never listen to a target twice.

use crate::subscriptions::SubscriptionTable;
use crate::surface::Surface;
use kaku_core::{Binding, Role, ShapeId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BindingRegistry {
    start: Option<Binding>,
    end: Option<Binding>,
}

impl BindingRegistry {
    pub fn get(&self, role: Role) -> Option<&Binding> {
        match role {
            Role::Start => self.start.as_ref(),
            Role::End => self.end.as_ref(),
        }
    }

    fn slot(&mut self, role: Role) -> &mut Option<Binding> {
        match role {
            Role::Start => &mut self.start,
            Role::End => &mut self.end,
        }
    }

    /// Store a binding without subscribing (e.g. restored from a record
    /// before the connector is on a surface).
    pub fn restore(&mut self, role: Role, binding: Option<Binding>) {
        *self.slot(role) = binding;
    }

    /// Bind `role` and subscribe `owner` to the target's movement.
    pub fn attach(
        &mut self,
        owner: ShapeId,
        role: Role,
        binding: Binding,
        subscriptions: &mut SubscriptionTable,
    ) {
        subscriptions.subscribe(owner, role, binding.target);
        log::debug!("{owner} {role:?} bound to {}", binding.target);
        *self.slot(role) = Some(binding);
    }

    /// Unbind `role` and dispose its subscription.
    pub fn detach(
        &mut self,
        owner: ShapeId,
        role: Role,
        subscriptions: &mut SubscriptionTable,
    ) -> Option<Binding> {
        subscriptions.cancel(owner, role);
        let old = self.slot(role).take();
        if let Some(b) = &old {
            log::debug!("{owner} {role:?} released {}", b.target);
        }
        old
    }

    /// Drop both bindings and their subscriptions.
    pub fn clear(&mut self, owner: ShapeId, subscriptions: &mut SubscriptionTable) {
        for role in Role::BOTH {
            self.detach(owner, role, subscriptions);
        }
    }

    /// Re-subscribe stored bindings whose target exists on `surface`.
    /// Bindings to missing targets are dropped. Returns how many were dropped.
    pub fn relink(
        &mut self,
        owner: ShapeId,
        surface: &dyn Surface,
        subscriptions: &mut SubscriptionTable,
    ) -> usize {
        let mut dropped = 0;
        for role in Role::BOTH {
            let Some(binding) = *self.slot(role) else {
                continue;
            };
            if surface.contains(binding.target) && !surface.is_connector(binding.target) {
                if subscriptions.get(owner, role).map(|s| s.target) != Some(binding.target) {
                    subscriptions.subscribe(owner, role, binding.target);
                }
            } else {
                log::warn!(
                    "{owner} {role:?} binding target {} not found, dropping binding",
                    binding.target
                );
                self.detach(owner, role, subscriptions);
                dropped += 1;
            }
        }
        dropped
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}
