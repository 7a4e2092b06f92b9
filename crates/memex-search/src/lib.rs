//! # memex-search
//!
//! The semantic linking subsystem: given free text, find the nearest
//! chat messages and canvas notes across two independently embedded
//! collections, materialize graph edges from the results, and resolve
//! backlinks (edge-based and wiki-link text scan).
//!
//! Components:
//! - [`RelatednessEngine`] — embed a query once, search both
//!   collections, resolve hits through owner-checked lookups.
//! - [`LinkMaterializer`] — persist relatedness results as labeled
//!   edges, guarding against self-loops.
//! - [`BacklinkResolver`] — incoming edges and `[[Title]]` text scans.
//! - [`WikiLinkResolver`] — title suggestion and resolve-or-create.

pub mod backlinks;
pub mod linker;
pub mod relatedness;
pub mod wikilink;

pub use backlinks::BacklinkResolver;
pub use linker::{format_score_label, LinkMaterializer};
pub use relatedness::RelatednessEngine;
pub use wikilink::{extract_wiki_link_targets, normalize_title_key, WikiLinkResolver};
