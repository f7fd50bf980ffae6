/// State management module
///
/// This module handles all photo state, including:
/// - The photo store and its SQLite implementation (library.rs)
/// - Shared data structures (data.rs)
/// - Filter parameters (edit.rs)
/// - Overlays and their ordering (overlay.rs)
/// - The editing session between capture and save (session.rs)

pub mod data;
pub mod edit;
pub mod library;
pub mod overlay;
pub mod session;
