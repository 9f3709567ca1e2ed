//! Fact collection for the Java repository map.
//!
//! Extracts per-file lexical facts (package, imports, declared types),
//! build-descriptor metadata, and optional bytecode-derived dependency
//! edges. Everything here is a collaborator of the core pipeline: the
//! graph builder consumes the immutable fact records produced here.

pub mod build_meta;
pub mod bytecode;
pub mod collect;
pub mod java;
