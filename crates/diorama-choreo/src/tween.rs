//! Time-based interpolation of numeric fields.
//!
//! A [`Tweener`] drives at most one [`Tween`] per field. Fields are addressed
//! by a key and read/written through a [`FieldStore`], so the owner of the
//! values never hands out long-lived mutable references.

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::Serialize;
use tracing::debug;

use diorama_core::{DioramaError, DioramaResult, Duration, Easing, Timestamp};

/// Read/write access to the numeric fields a [`Tweener`] animates.
pub trait FieldStore<K> {
    fn read(&self, key: K) -> f64;
    fn write(&mut self, key: K, value: f64);
}

/// One interpolation from `from` to `to`, starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tween {
    pub from: f64,
    pub to: f64,
    pub start: Timestamp,
    pub duration: Duration,
    pub easing: Easing,
}

impl Tween {
    /// Normalized linear progress in [0, 1].
    pub fn progress(&self, now: Timestamp) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.elapsed_since(self.start).as_seconds();
        (elapsed / self.duration.as_seconds()).clamp(0.0, 1.0)
    }

    /// Field value at `now`. Exactly `to` once progress reaches 1.
    pub fn value_at(&self, now: Timestamp) -> f64 {
        let progress = self.progress(now);
        if progress >= 1.0 {
            return self.to;
        }
        self.from + (self.to - self.from) * self.easing.apply(progress)
    }

    pub fn is_finished(&self, now: Timestamp) -> bool {
        self.progress(now) >= 1.0
    }

    /// Timestamp at which the tween lands on `to`.
    pub fn end(&self) -> Timestamp {
        self.start + self.duration
    }
}

/// Identifies one `animate` call. Stays valid until the tween finishes or is
/// superseded by a newer tween on the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TweenHandle<K> {
    pub key: K,
    pub generation: u64,
}

#[derive(Debug, Clone)]
struct Slot {
    tween: Tween,
    generation: u64,
}

/// The set of in-flight tweens for one owner, keyed by field.
#[derive(Debug, Clone)]
pub struct Tweener<K> {
    active: BTreeMap<K, Slot>,
    next_generation: u64,
}

impl<K: Ord + Copy + Debug> Tweener<K> {
    pub fn new() -> Self {
        Self {
            active: BTreeMap::new(),
            next_generation: 0,
        }
    }

    /// Start moving `key` towards `to`.
    ///
    /// The tween starts from the field's value at `now`. An unfinished tween
    /// on the same field is sampled at `now`, written back, and discarded, so
    /// the new motion continues from the mid-flight value. A zero duration
    /// writes `to` immediately and leaves nothing in flight.
    ///
    /// Non-finite targets and non-finite durations are rejected before any
    /// field is touched.
    pub fn animate<S: FieldStore<K>>(
        &mut self,
        store: &mut S,
        key: K,
        to: f64,
        duration: Duration,
        easing: Easing,
        now: Timestamp,
    ) -> DioramaResult<TweenHandle<K>> {
        if !to.is_finite() {
            return Err(DioramaError::InvalidTweenParameters(format!(
                "target for {:?} must be finite, got {}",
                key, to
            )));
        }
        if !duration.as_seconds().is_finite() {
            return Err(DioramaError::InvalidTweenParameters(format!(
                "duration for {:?} must be finite",
                key
            )));
        }

        if let Some(previous) = self.active.remove(&key) {
            let current = previous.tween.value_at(now);
            store.write(key, current);
            debug!(
                "superseding tween on {:?} at {:.3} (was heading to {:.3})",
                key, current, previous.tween.to
            );
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        let handle = TweenHandle { key, generation };

        if duration.is_zero() {
            store.write(key, to);
            return Ok(handle);
        }

        let tween = Tween {
            from: store.read(key),
            to,
            start: now,
            duration,
            easing,
        };
        debug!(
            "tween {:?}: {:.3} -> {:.3} over {} ({})",
            key, tween.from, tween.to, duration, easing
        );
        self.active.insert(key, Slot { tween, generation });
        Ok(handle)
    }

    /// Write every in-flight value for `now` and retire finished tweens.
    /// Returns the number still in flight.
    pub fn tick<S: FieldStore<K>>(&mut self, store: &mut S, now: Timestamp) -> usize {
        self.active.retain(|key, slot| {
            store.write(*key, slot.tween.value_at(now));
            !slot.tween.is_finished(now)
        });
        self.active.len()
    }

    /// Drop the tween on `key` without touching the field.
    pub fn cancel(&mut self, key: K) -> Option<Tween> {
        self.active.remove(&key).map(|slot| slot.tween)
    }

    pub fn is_active(&self, handle: &TweenHandle<K>) -> bool {
        self.active
            .get(&handle.key)
            .is_some_and(|slot| slot.generation == handle.generation)
    }

    pub fn get(&self, key: K) -> Option<&Tween> {
        self.active.get(&key).map(|slot| &slot.tween)
    }

    pub fn active_handles(&self) -> Vec<TweenHandle<K>> {
        self.active
            .iter()
            .map(|(key, slot)| TweenHandle {
                key: *key,
                generation: slot.generation,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

impl<K: Ord + Copy + Debug> Default for Tweener<K> {
    fn default() -> Self {
        Self::new()
    }
}
