//! Placeholder substitution for template instantiation.
//!
//! Template content is scanned with a configurable regex (default
//! `\{\{\s*(\w+)\s*\}\}`) whose single capturing group yields a token name. Each
//! token is looked up in layered providers:
//!
//! 1. the project table of the target's project root, seeded with the context
//!    defaults `meta`, `name` and `path` when the project does not define them
//! 2. the global table (built-in macros overlaid by the configured macro file)
//!
//! A token no provider knows becomes the empty string. It is never an error and
//! never left in place.
//!
//! ## Provider files
//!
//! Both the global macro file and the project file (`templar.json` by default)
//! are JSON objects mapping token names to literal values:
//!
//! ```json
//! { "author": "Jane Doe", "license": "MIT", "year": 2024 }
//! ```
//!
//! Computed providers are registered from Rust with
//! [`ProviderTable::insert_computed`].

pub mod engine;
pub mod provider;

pub use engine::PlaceholderEngine;
pub use provider::{
    builtin_macros, coerce, JsonProviderLoader, ProviderLoader, ProviderSource, ProviderTable,
    ProviderValue, ResolutionContext,
};
