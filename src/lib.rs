//! rstree: render adjacency-list and nested-set hierarchies as tree-view JSON
//!
//! Layers, innermost first:
//! - `domain`: reconstruction, grouping, selection and label sanitizing
//! - `application`: services combining fetch, cache and domain logic
//! - `infrastructure`: row sources, caches and the service container
//! - `cli`: argument parsing and command dispatch

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
