// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits describing what a run
// is made of. No Burn types and no file I/O live here.

// Labelled images, splits and normalisation constants
pub mod image;

// Dataset / model / precision choices
pub mod options;

// Typed error enums
pub mod error;

// Abstractions the data layer implements
pub mod traits;
