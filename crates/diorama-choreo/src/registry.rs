use diorama_core::{DioramaError, DioramaResult, Timestamp};

use crate::actor::{Actor, ActorId, ActorKind};

/// Owns every actor for the lifetime of the diorama, in insertion order.
///
/// Schedules refer to actors by [`ActorId`] and borrow the registry only
/// while dispatching.
#[derive(Debug, Clone, Default)]
pub struct ActorRegistry {
    actors: Vec<Actor>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an actor. Ids must be unique.
    pub fn insert(&mut self, actor: impl Into<Actor>) -> DioramaResult<ActorId> {
        let actor = actor.into();
        let id = actor.id().clone();
        if self.get(id.as_str()).is_some() {
            return Err(DioramaError::Config(format!("duplicate actor id '{}'", id)));
        }
        self.actors.push(actor);
        Ok(id)
    }

    pub fn get(&self, id: &str) -> Option<&Actor> {
        self.actors.iter().find(|a| a.id().as_str() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Actor> {
        self.actors.iter_mut().find(|a| a.id().as_str() == id)
    }

    /// Look up an actor, failing with `UnknownActor`.
    pub fn require_mut(&mut self, id: &ActorId) -> DioramaResult<&mut Actor> {
        self.get_mut(id.as_str())
            .ok_or_else(|| DioramaError::UnknownActor(id.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Actor> + '_ {
        self.actors.iter()
    }

    pub fn of_kind(&self, kind: ActorKind) -> impl Iterator<Item = &Actor> + '_ {
        self.actors.iter().filter(move |a| a.kind() == kind)
    }

    pub fn ids_of_kind(&self, kind: ActorKind) -> Vec<ActorId> {
        self.of_kind(kind).map(|a| a.id().clone()).collect()
    }

    /// Advance every actor's tweens to `now`. Returns the number still in flight.
    pub fn tick(&mut self, now: Timestamp) -> usize {
        self.actors.iter_mut().map(|a| a.tick(now)).sum()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}
