//! Knowledge-base collaborator client.
//!
//! Evidence records may carry an opaque `kb_resource_id` back-reference into
//! an external knowledge-base service. This module resolves those ids to
//! resource metadata for validation and display. The collaborator is
//! optional; when unconfigured, back-references are stored untouched.

mod client;

pub use client::{KbClient, KbResource};
