//! Core library for templar.
//!
//! Manages a user-defined library of file templates and instantiates new files
//! from them:
//!
//! - [`index::IndexStore`] persists the id -> [`meta::TemplateMeta`] mapping in
//!   `<store_root>/index.json` and notifies listeners of every change
//! - [`placeholder::PlaceholderEngine`] replaces `{{ token }}` markers using
//!   project, context and global providers
//! - [`service::TemplateService`] ties both together into the create / update /
//!   remove / instantiate lifecycle that front-ends call
//!
//! Configuration is explicit: build a [`config::TemplarConfig`] and hand it to
//! [`service::TemplateService::from_config`].

pub mod config;
pub mod error;
pub mod index;
pub mod meta;
pub mod paths;
pub mod placeholder;
pub mod service;

pub use error::{Result, TemplarError};
pub use meta::{Index, TemplateDraft, TemplateMeta};
pub use service::{Instantiation, TemplateService};
