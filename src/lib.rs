#![deny(missing_docs)]

//! Core library for answering questions about a research paper with retrieval-augmented agents.

/// Research crew: agent roles, tools, and the stage executor.
pub mod agents;
/// Programmatic facade over initialization and querying.
pub mod assistant;
/// Environment-driven configuration management.
pub mod config;
/// Interactive console loop.
pub mod console;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Chat-completion client abstraction and adapters.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline counters.
pub mod metrics;
/// PDF ingestion, chunking, and index construction.
pub mod processing;
/// Search formatting exposed to agents.
pub mod retrieval;
/// File-backed vector index.
pub mod store;
