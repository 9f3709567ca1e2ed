//! Core types and storage for the Java repository map (jrm).
//!
//! Provides the graph data model ([`model::RepoGraph`]), the typed output
//! document ([`document::DocValue`]), configuration loading, the error
//! taxonomy, and atomic artifact storage.

pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod storage;
