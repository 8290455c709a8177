//! Lazily loaded directories with memoized entities.
//!
//! A [`LazyDirectory`] moves between two states:
//!
//! ```text
//! NotLoaded --load--> Loaded { raw, built } --clear--> NotLoaded
//! ```
//!
//! The raw directory is loaded once per generation. Entities are built from
//! raw records on first request and shared afterwards, so the same name
//! yields the same `Arc` until the directory is cleared.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::SchemaResult;
use crate::model::Directory;

enum State<R, B> {
    NotLoaded,
    Loaded {
        raw: Arc<Directory<R>>,
        built: HashMap<String, Arc<B>>,
    },
}

struct Inner<R, B> {
    /// Bumped on every clear so stale snapshots never memoize.
    generation: u64,
    state: State<R, B>,
}

/// Raw directory captured at one generation.
pub struct Snapshot<R> {
    generation: u64,
    raw: Arc<Directory<R>>,
}

impl<R> Snapshot<R> {
    pub fn directory(&self) -> &Directory<R> {
        &self.raw
    }
}

impl<R> Clone for Snapshot<R> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            raw: Arc::clone(&self.raw),
        }
    }
}

pub struct LazyDirectory<R, B> {
    inner: Mutex<Inner<R, B>>,
}

impl<R, B> Default for LazyDirectory<R, B> {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner {
                generation: 0,
                state: State::NotLoaded,
            }),
        }
    }
}

impl<R, B> LazyDirectory<R, B> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.inner.lock().state, State::Loaded { .. })
    }

    /// The raw directory, running `load` if it is not loaded yet.
    ///
    /// The lock is held while loading so concurrent callers wait for one
    /// load instead of issuing their own.
    pub fn snapshot<L>(&self, load: L) -> SchemaResult<Snapshot<R>>
    where
        L: FnOnce() -> SchemaResult<Directory<R>>,
    {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let raw = match &inner.state {
            State::Loaded { raw, .. } => Arc::clone(raw),
            State::NotLoaded => {
                let raw = Arc::new(load()?);
                inner.state = State::Loaded {
                    raw: Arc::clone(&raw),
                    built: HashMap::new(),
                };
                raw
            }
        };
        Ok(Snapshot {
            generation: inner.generation,
            raw,
        })
    }

    /// The entity for `name`, building it from the snapshot on first request.
    ///
    /// Returns `None` when the snapshot has no record for `name`. Entities
    /// built from a snapshot of an older generation are returned but not kept.
    pub fn entity<F>(&self, snapshot: &Snapshot<R>, name: &str, build: F) -> Option<Arc<B>>
    where
        F: FnOnce(&str, &R) -> B,
    {
        let record = snapshot.raw.get(name)?;

        let mut inner = self.inner.lock();
        let current = inner.generation == snapshot.generation;
        if let State::Loaded { built, .. } = &mut inner.state {
            if current {
                let entity = built
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::new(build(name, record)));
                return Some(Arc::clone(entity));
            }
        }
        Some(Arc::new(build(name, record)))
    }

    /// Iterate over every entity of the snapshot, building lazily.
    pub fn entries<F>(&self, snapshot: Snapshot<R>, build: F) -> Entries<'_, R, B, F>
    where
        F: Fn(&str, &R) -> B,
    {
        Entries {
            lazy: self,
            snapshot,
            position: 0,
            build,
        }
    }

    /// Forget the raw directory and every built entity.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.state = State::NotLoaded;
    }
}

/// Lazy `(name, entity)` iterator over one snapshot.
pub struct Entries<'a, R, B, F> {
    lazy: &'a LazyDirectory<R, B>,
    snapshot: Snapshot<R>,
    position: usize,
    build: F,
}

impl<R, B, F> Iterator for Entries<'_, R, B, F>
where
    F: Fn(&str, &R) -> B,
{
    type Item = (String, Arc<B>);

    fn next(&mut self) -> Option<Self::Item> {
        let name = self.snapshot.raw.name_at(self.position)?.to_string();
        self.position += 1;
        let entity = self.lazy.entity(&self.snapshot, &name, &self.build)?;
        Some((name, entity))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.snapshot.raw.len().saturating_sub(self.position);
        (remaining, Some(remaining))
    }
}
