//! The library code for the `inkpot` static site generator. At its core is a
//! macro substitution engine ([`crate::render`]): it loads an HTML template,
//! replaces every occurrence of each macro key with either a literal string
//! or the contents of another file, and writes the result to disk.
//!
//! The site builder ([`crate::build`]) drives the engine once per output
//! page:
//!
//! 1. The index page, showing the most recent articles
//! 2. The archive pages, listing every article a page at a time
//! 3. One page per article
//!
//! Article metadata comes from JSON files ([`crate::article`]) and the layout
//! of the site from an `inkpot.yaml` project file ([`crate::config`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod article;
pub mod build;
pub mod config;
pub mod listing;
pub mod macros;
pub mod render;
mod util;
