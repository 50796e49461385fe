use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::CacheConfig;
use crate::utils::lock_rank::{self, LockRank};
use crate::utils::time::{elapsed_ms, now_ms};
use crate::widgets::binding::WidgetBinding;
use crate::widgets::gui::ScreenHandle;

/// Latest undelivered values of one binding.
struct CacheEntry {
    binding: Arc<WidgetBinding>,
    values: Vec<String>,
    timestamp_ms: u64,
}

struct Slots {
    entries: Vec<Option<CacheEntry>>,
    /// Victim slot when every slot is occupied.
    cursor: usize,
}

/// Outcome of one drain pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainStats {
    pub applied: usize,
    pub expired: usize,
}

/// Fixed-capacity store of the newest values per binding, filled while the GUI is busy.
///
/// At most one entry per binding (`Arc` identity). A newer `put` for the same binding replaces
/// the older values; when full, the slot under a rotating cursor is evicted.
pub struct WidgetCache {
    slots: Mutex<Slots>,
    stale_after_ms: u64,
}

impl WidgetCache {
    pub fn new(cfg: &CacheConfig) -> Self {
        let capacity = cfg.capacity.max(1);
        Self {
            slots: Mutex::new(Slots {
                entries: (0..capacity).map(|_| None).collect(),
                cursor: 0,
            }),
            stale_after_ms: cfg.stale_after_ms,
        }
    }

    pub fn capacity(&self) -> usize {
        let _rank = lock_rank::blocking(LockRank::Cache);
        self.slots.lock().entries.len()
    }

    /// Number of valid entries.
    pub fn len(&self) -> usize {
        let _rank = lock_rank::blocking(LockRank::Cache);
        self.slots.lock().entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn put(&self, binding: &Arc<WidgetBinding>, values: Vec<String>) {
        self.put_at(binding, values, now_ms());
    }

    pub(crate) fn put_at(&self, binding: &Arc<WidgetBinding>, values: Vec<String>, now: u64) {
        let _rank = lock_rank::blocking(LockRank::Cache);
        let mut slots = self.slots.lock();

        let existing = slots
            .entries
            .iter()
            .position(|e| e.as_ref().is_some_and(|e| Arc::ptr_eq(&e.binding, binding)));
        let target = match existing {
            Some(i) => i,
            None => match slots.entries.iter().position(Option::is_none) {
                Some(free) => free,
                None => {
                    let victim = slots.cursor;
                    slots.cursor = (victim + 1) % slots.entries.len();
                    tracing::debug!("[WidgetCache] full, evicting slot {}", victim);
                    victim
                }
            },
        };

        // Replacing the Option drops the previous occupant's strings.
        slots.entries[target] = Some(CacheEntry {
            binding: binding.clone(),
            values,
            timestamp_ms: now,
        });
    }

    /// Hands every fresh entry to `apply` and empties the cache; entries older than the
    /// staleness limit are dropped unapplied.
    ///
    /// The caller must already hold the GUI mutex (GUI before cache).
    pub fn drain_with(&self, apply: impl FnMut(&WidgetBinding, &[String])) -> DrainStats {
        self.drain_with_at(now_ms(), apply)
    }

    pub(crate) fn drain_with_at(
        &self,
        now: u64,
        mut apply: impl FnMut(&WidgetBinding, &[String]),
    ) -> DrainStats {
        let _rank = lock_rank::blocking(LockRank::Cache);
        let mut slots = self.slots.lock();
        let mut stats = DrainStats::default();

        for slot in slots.entries.iter_mut() {
            let Some(entry) = slot.take() else {
                continue;
            };
            if elapsed_ms(now, entry.timestamp_ms) > self.stale_after_ms {
                stats.expired += 1;
                continue;
            }
            apply(&entry.binding, &entry.values);
            stats.applied += 1;
        }
        stats
    }

    /// Drops every entry bound to `screen`. Returns how many were dropped.
    pub fn remove_screen(&self, screen: ScreenHandle) -> usize {
        let _rank = lock_rank::blocking(LockRank::Cache);
        let mut slots = self.slots.lock();
        let mut removed = 0;
        for slot in slots.entries.iter_mut() {
            if slot.as_ref().is_some_and(|e| e.binding.screen == screen) {
                *slot = None;
                removed += 1;
            }
        }
        removed
    }

    /// Values currently held for `binding`, if any.
    pub fn peek(&self, binding: &Arc<WidgetBinding>) -> Option<Vec<String>> {
        let _rank = lock_rank::blocking(LockRank::Cache);
        self.slots
            .lock()
            .entries
            .iter()
            .flatten()
            .find(|e| Arc::ptr_eq(&e.binding, binding))
            .map(|e| e.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widgets::binding::{WidgetBinding, WidgetKind};
    use crate::widgets::gui::WidgetHandle;

    fn binding(id: u64) -> Arc<WidgetBinding> {
        on_screen(id, 0)
    }

    fn on_screen(id: u64, screen: u64) -> Arc<WidgetBinding> {
        Arc::new(
            WidgetBinding::new(
                WidgetHandle(id),
                WidgetKind::Label,
                vec!["v".into()],
                ScreenHandle(screen),
            )
            .expect("binding"),
        )
    }

    fn vals(s: &str) -> Vec<String> {
        vec![s.to_string()]
    }

    #[test]
    fn same_binding_is_coalesced() {
        let cache = WidgetCache::new(&CacheConfig::default());
        let b = binding(1);
        for v in ["a", "b", "c"] {
            cache.put_at(&b, vals(v), 100);
        }
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.peek(&b), Some(vals("c")));
    }

    #[test]
    fn equal_but_distinct_bindings_get_separate_slots() {
        let cache = WidgetCache::new(&CacheConfig::default());
        let a = binding(1);
        let b = binding(1);
        cache.put_at(&a, vals("x"), 0);
        cache.put_at(&b, vals("y"), 0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn never_holds_more_than_capacity() {
        let cache = WidgetCache::new(&CacheConfig::default());
        let bindings: Vec<_> = (0..40).map(binding).collect();
        for (i, b) in bindings.iter().enumerate() {
            cache.put_at(b, vals(&i.to_string()), 0);
            assert!(cache.len() <= 32);
        }
        assert_eq!(cache.len(), 32);
        // Overflow evicts slots 0..8 in cursor order.
        for evicted in &bindings[0..8] {
            assert!(cache.peek(evicted).is_none());
        }
        for kept in &bindings[8..40] {
            assert!(cache.peek(kept).is_some());
        }
    }

    #[test]
    fn update_of_cached_binding_does_not_evict_when_full() {
        let cache = WidgetCache::new(&CacheConfig {
            capacity: 2,
            stale_after_ms: 5_000,
        });
        let (a, b) = (binding(1), binding(2));
        cache.put_at(&a, vals("a1"), 0);
        cache.put_at(&b, vals("b1"), 0);
        cache.put_at(&a, vals("a2"), 1);
        assert_eq!(cache.peek(&a), Some(vals("a2")));
        assert_eq!(cache.peek(&b), Some(vals("b1")));
    }

    #[test]
    fn drain_applies_fresh_and_drops_stale() {
        let cache = WidgetCache::new(&CacheConfig::default());
        let (fresh, stale) = (binding(1), binding(2));
        cache.put_at(&stale, vals("old"), 1_000);
        cache.put_at(&fresh, vals("new"), 5_500);

        let mut applied = Vec::new();
        let stats = cache.drain_with_at(6_001, |b, v| applied.push((b.widget, v.to_vec())));

        assert_eq!(stats, DrainStats { applied: 1, expired: 1 });
        assert_eq!(applied, vec![(WidgetHandle(1), vals("new"))]);
        assert!(cache.is_empty());
    }

    #[test]
    fn entry_exactly_at_the_limit_is_still_applied() {
        let cache = WidgetCache::new(&CacheConfig::default());
        let b = binding(1);
        cache.put_at(&b, vals("edge"), 1_000);
        let stats = cache.drain_with_at(6_000, |_, _| {});
        assert_eq!(stats.applied, 1);
    }

    #[test]
    fn freed_slots_are_reused_before_eviction() {
        let cache = WidgetCache::new(&CacheConfig {
            capacity: 2,
            stale_after_ms: 5_000,
        });
        let (a, b, c) = (binding(1), binding(2), binding(3));
        cache.put_at(&a, vals("a"), 0);
        cache.drain_with_at(0, |_, _| {});
        cache.put_at(&b, vals("b"), 0);
        cache.put_at(&c, vals("c"), 0);
        assert_eq!(cache.len(), 2);
        assert!(cache.peek(&b).is_some());
    }

    #[test]
    fn removed_screen_is_never_drained() {
        let cache = WidgetCache::new(&CacheConfig::default());
        let (gone, a2, kept) = (on_screen(1, 7), on_screen(2, 7), on_screen(3, 8));
        cache.put_at(&gone, vals("x"), 100);
        cache.put_at(&a2, vals("y"), 100);
        cache.put_at(&kept, vals("z"), 100);

        assert_eq!(cache.remove_screen(ScreenHandle(7)), 2);
        assert_eq!(cache.remove_screen(ScreenHandle(7)), 0);

        let mut applied = Vec::new();
        let stats = cache.drain_with_at(200, |b, _| applied.push(b.widget));
        assert_eq!(stats, DrainStats { applied: 1, expired: 0 });
        assert_eq!(applied, vec![WidgetHandle(3)]);
    }

    #[test]
    fn cleared_screen_alone_drains_nothing() {
        let cache = WidgetCache::new(&CacheConfig::default());
        cache.put_at(&on_screen(1, 7), vals("late"), 100);
        cache.remove_screen(ScreenHandle(7));
        let stats = cache.drain_with_at(200, |_, _| panic!("nothing to apply"));
        assert_eq!(stats.applied, 0);
    }
}
