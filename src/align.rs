//! Positional alignment of bucket sequences.
//!
//! Bucketed factors are matched to response buckets by index, never by
//! key. Two sequences may be zipped only when their lengths agree; every
//! bucketed transformation checks [`align`] first and skips its section on
//! [`Alignment::Misaligned`].

/// Outcome of comparing two bucket sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Both sequences have this many buckets.
    Aligned(usize),
    Misaligned { left: usize, right: usize },
}

impl Alignment {
    pub fn is_aligned(self) -> bool {
        matches!(self, Self::Aligned(_))
    }

    /// Common length, if any.
    pub fn len(self) -> Option<usize> {
        match self {
            Self::Aligned(n) => Some(n),
            Self::Misaligned { .. } => None,
        }
    }
}

/// Compare the lengths of two ordered sequences.
pub fn align<A, B>(left: &[A], right: &[B]) -> Alignment {
    if left.len() == right.len() {
        Alignment::Aligned(left.len())
    } else {
        Alignment::Misaligned {
            left: left.len(),
            right: right.len(),
        }
    }
}
