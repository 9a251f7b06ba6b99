//! Set type alias that switches between gxhash and std collections based on
//! feature flags. gxhash needs AES-NI/SSE2 intrinsics, so it is opt-in.
//!
//! Both variants are built with `HashSet::default()`.

/// Type alias for HashSet that uses gxhash when available, std otherwise
#[cfg(feature = "gxhash")]
pub type HashSet<T> = gxhash::HashSet<T>;

/// Type alias for HashSet that uses gxhash when available, std otherwise
#[cfg(not(feature = "gxhash"))]
pub type HashSet<T> = std::collections::HashSet<T>;
