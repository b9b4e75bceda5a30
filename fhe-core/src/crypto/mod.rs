//! Viewer-side cryptography.

mod sealed;

pub use sealed::SealedValue;
