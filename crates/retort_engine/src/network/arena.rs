//! Id-indexed storage for nodes, tokens, memories, and WMEs.
//!
//! Ids are handed out from a per-arena counter and never reused, so a stale
//! id simply misses instead of aliasing a newer entry.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;
use std::ops::{Index, IndexMut};

/// An id usable as an arena key.
pub(crate) trait ArenaId: Copy + Ord + Hash + fmt::Debug {
    fn from_raw(raw: u64) -> Self;
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $vis:vis $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis struct $name(u64);

        impl $name {
            /// Returns the raw index.
            #[must_use]
            #[allow(dead_code)]
            pub const fn index(self) -> u64 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

arena_id!(
    /// Identifies a beta node.
    pub NodeId, "n"
);
arena_id!(
    /// Identifies a token (a partial match).
    pub TokenId, "t"
);
arena_id!(
    /// Identifies an alpha memory.
    pub AlphaMemoryId, "a"
);
arena_id!(pub(crate) WmeId, "w");
arena_id!(pub(crate) JoinResultId, "j");

/// Entries keyed by monotonically assigned ids, iterated in creation order.
#[derive(Clone, Debug)]
pub(crate) struct Arena<I, T> {
    entries: BTreeMap<I, T>,
    next: u64,
}

impl<I: ArenaId, T> Arena<I, T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next: 0,
        }
    }

    /// Claims an id without storing anything under it yet.
    pub(crate) fn reserve(&mut self) -> I {
        let id = I::from_raw(self.next);
        self.next += 1;
        id
    }

    /// Stores a value under an id obtained from [`Arena::reserve`].
    pub(crate) fn fill(&mut self, id: I, value: T) {
        self.entries.insert(id, value);
    }

    pub(crate) fn insert(&mut self, value: T) -> I {
        let id = self.reserve();
        self.entries.insert(id, value);
        id
    }

    pub(crate) fn get(&self, id: I) -> Option<&T> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: I) -> Option<T> {
        self.entries.remove(&id)
    }

    pub(crate) fn contains(&self, id: I) -> bool {
        self.entries.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        self.entries.iter().map(|(id, v)| (*id, v))
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        match self.entries.get(&id) {
            Some(v) => v,
            None => panic!("dangling arena id {id:?}"),
        }
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        match self.entries.get_mut(&id) {
            Some(v) => v,
            None => panic!("dangling arena id {id:?}"),
        }
    }
}
