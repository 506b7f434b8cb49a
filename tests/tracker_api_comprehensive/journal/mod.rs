//! Journal behavior through the public API.

mod capacity;
mod concurrency;
mod ordering;
