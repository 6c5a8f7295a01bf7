//! Identifiers handed out by a network instance.
//!
//! Both come from per-network counters and are never reused within one
//! network. Ids from different networks are not comparable in any useful way.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! network_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(u64);

        impl $name {
            /// Wraps a raw counter value.
            #[must_use]
            pub const fn new(index: u64) -> Self {
                Self(index)
            }

            /// The raw counter value.
            #[must_use]
            pub const fn index(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

network_id!(
    /// Assigned to a fact by `add_fact`; WMEs of the fact use it as their
    /// identifier. Displays as `f-N`.
    FactId,
    "f"
);

network_id!(
    /// Assigned to a production by `add_production`. Displays as `p-N`.
    ProductionId,
    "p"
);
