//! # EntityTagger: span annotation tool
//!
//! Serves a directory of plain-text documents in the browser, lets the user
//! tag substrings with entity classes from a fixed palette, and stores the
//! spans as one JSON file per document.
//!
//! ## Architecture
//!
//! - **[`annotation`]**: Spans, offset ranges, overlap checks, offset resolution
//! - **[`render`]**: Text + spans → highlighted segments / HTML, and back
//! - **[`palette`]**: Entity classes and their display colors
//! - **[`store`]**: Document listing and span persistence (filesystem or HTTP)
//! - **[`session`]**: Editing session with dirty flag and auto-save timer
//! - **[`web`]**: axum server: editor page, document API, save endpoint
//! - **[`config`]**: Configuration loading and validation

pub mod annotation;
pub mod config;
pub mod palette;
pub mod render;
pub mod session;
pub mod store;
pub mod web;
