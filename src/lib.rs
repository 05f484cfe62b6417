//! # Photopipe
//!
//! A plugin-driven static site generator for photo galleries. Your
//! filesystem is the data source: directories become albums, image
//! directories become gallery entries, and TOML sidecars carry metadata.
//! Everything the generator *does* to that content — image conversion,
//! copying, HTML rendering — is a plugin, run in a configured order.
//!
//! # Architecture: Content Tree Through a Plugin Sequence
//!
//! A run has three phases:
//!
//! ```text
//! 1. Init      register built-in plugins + load project plugins
//! 2. Load      content/  →  Site { albums: [Album { images: [Image] }] }
//! 3. Run       fold the Site through the configured plugin sequence
//! ```
//!
//! Each plugin exposes up to three hooks — site, album, image — applied in
//! that order over the tree. Hooks receive owned copies of what they
//! transform and return a replacement or keep the original; plugins run
//! strictly one after another, so each can rely on everything its
//! predecessors produced. The engine guarantees positional ordering of
//! albums and images no matter how hook calls are dispatched internally.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`plugins::engine`] | The core: plugin registry, hook staging, sequencing |
//! | [`plugins`] | Pipeline facade, built-in plugins, project-plugin loading |
//! | [`content`] | Content tree types and filesystem loading |
//! | [`config`] | `photopipe.toml` loading and the dotted-path accessor |
//! | [`formats`] | Image extension ↔ codec mapping |
//! | [`timer`] | Named-stamp stopwatch for per-plugin timing |
//! | [`generate`] | Full-run orchestration |
//! | [`init`] | Project scaffolding |
//! | [`print`] | Content tree inspection |
//!
//! # Design Decisions
//!
//! ## Plugins Are Data, Not Trait Implementations
//!
//! A plugin is a named record of optional hook closures rather than a trait
//! with default methods. The registry validates the capability set once at
//! install time — a nameless or hookless plugin never gets in — and the
//! stage runner checks each hook exactly once per run instead of dispatching
//! through no-op defaults.
//!
//! ## Ownership Instead of Defensive Copies
//!
//! Hooks take the value they transform by value and their context by shared
//! reference. A hook can mutate its own copy freely and either return it or
//! drop it; it cannot reach engine state. This is the ownership-native form
//! of the deep-copy isolation that dynamic-language pipelines do at runtime.
//!
//! ## Maud Over Template Engines
//!
//! The render plugin generates HTML with compile-time Maud templates:
//! malformed markup is a build error, interpolation is escaped by default,
//! and there is no template directory to ship or get out of sync.
//!
//! ## Pure-Rust Imaging
//!
//! The convert plugin uses the `image` crate (Lanczos3 resampling) for all
//! pixel work. No ImageMagick, no system dependencies — a single binary
//! that works the same everywhere.

pub mod config;
pub mod content;
pub mod formats;
pub mod generate;
pub mod init;
pub mod plugins;
pub mod print;
pub mod timer;
