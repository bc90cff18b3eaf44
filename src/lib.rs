//! incubator scaffolds projects from templates.
//! It renders a template into a project directory and provisions it: git
//! history, a GitHub repository and an optional post-create hook.

/// Typed prompt answers
pub mod answers;

/// The `empty` template compiled into the binary
pub mod builtin;

/// Template cache freshness
pub mod cache;

/// Command-line interface
pub mod cli;

/// User configuration in `~/.incubator`
pub mod config;

/// Opening projects in an editor
pub mod editor;

/// Error types and handling
pub mod error;

/// Cloning and updating template repositories
pub mod fetcher;

/// Git and GitHub operations
pub mod git;

/// Post-create hook execution
pub mod hooks;

/// Template catalog: registries and local templates
pub mod loader;

pub mod logger;

/// Template manifest model
pub mod manifest;

/// Answer collection from prompts and preloaded JSON
pub mod parser;

/// Ordered provisioning steps and their driver
pub mod pipeline;

/// Rendering a template tree into a project directory
pub mod processor;

/// User input and interaction handling
pub mod prompt;

/// MiniJinja rendering engine
pub mod renderer;

/// Conditional file rules and path placeholders
pub mod rules;

/// External process execution
pub mod runner;

/// Template source trees
pub mod source;
