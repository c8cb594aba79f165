use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// One of the two competing teams.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Camp {
    A,
    B,
}

impl Camp {
    pub const ALL: [Camp; 2] = [Camp::A, Camp::B];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Camp::A => 0,
            Camp::B => 1,
        }
    }

    /// Single-byte tag used on the serial wire.
    pub fn tag(self) -> u8 {
        match self {
            Camp::A => b'A',
            Camp::B => b'B',
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'A' | b'a' => Some(Camp::A),
            b'B' | b'b' => Some(Camp::B),
            _ => None,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Camp::A => Camp::B,
            Camp::B => Camp::A,
        }
    }
}

impl fmt::Display for Camp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Camp::A => f.write_str("camp A"),
            Camp::B => f.write_str("camp B"),
        }
    }
}

/// Fixed two-slot storage indexed by [`Camp`].
///
/// Serialized as `{ "a": .., "b": .. }` so configuration files stay readable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerCamp<T> {
    pub a: T,
    pub b: T,
}

impl<T> PerCamp<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    pub fn from_fn(mut f: impl FnMut(Camp) -> T) -> Self {
        Self {
            a: f(Camp::A),
            b: f(Camp::B),
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(Camp, T) -> U) -> PerCamp<U> {
        PerCamp {
            a: f(Camp::A, self.a),
            b: f(Camp::B, self.b),
        }
    }

    pub fn as_ref(&self) -> PerCamp<&T> {
        PerCamp {
            a: &self.a,
            b: &self.b,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Camp, &T)> {
        [(Camp::A, &self.a), (Camp::B, &self.b)].into_iter()
    }
}

impl<T> Index<Camp> for PerCamp<T> {
    type Output = T;

    #[inline]
    fn index(&self, camp: Camp) -> &T {
        match camp {
            Camp::A => &self.a,
            Camp::B => &self.b,
        }
    }
}

impl<T> IndexMut<Camp> for PerCamp<T> {
    #[inline]
    fn index_mut(&mut self, camp: Camp) -> &mut T {
        match camp {
            Camp::A => &mut self.a,
            Camp::B => &mut self.b,
        }
    }
}
