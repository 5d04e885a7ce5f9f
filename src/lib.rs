//! **uic** - Source annotation and patch engine
//!
//! Injects stable `data-agent-id` attributes into JSX/TSX/HTML opening tags at
//! known positions, renders the edits as unified diffs, and writes them behind
//! a mirrored, checksummed backup.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// Subcommand handlers
pub mod cli_ext {
    /// `uic annotate`: element list in, diffs or written files out
    pub mod annotate_cmd;
    pub use annotate_cmd::run as annotate_run;
}

/// Core pipeline - locate, edit, diff, back up, orchestrate
pub mod core {
    /// Lexical opening-tag scanner (strings, `{...}` expressions, nested `<`)
    pub mod locate;
    pub use locate::{TagSpan, locate_insertion_point, locate_tag_end_line, locate_tag_span};

    /// Insert or replace one attribute inside an opening tag
    pub mod attribute;
    pub use attribute::{AGENT_ID_ATTR, AttributeEdit, AttributeEditor, apply_attribute};

    /// Bottom-up application of every target in one file
    pub mod annotate;
    pub use annotate::{AnnotationResult, AnnotationTarget, annotate_source};

    /// Bounded-lookahead unified diff
    pub mod diff;
    pub use diff::{FilePatch, format_unified_diff};

    /// Mirrored backup tree with blake3 verification
    pub mod backup;
    pub use backup::{BackupResult, cleanup_backup, create_backup, restore_backup};

    /// Batch driver over many files
    pub mod orchestrate;
    pub use orchestrate::{AnnotateError, AnnotateOptions, AnnotateResult, annotate_files};
}

/// Infrastructure - configuration, element lists, file I/O
pub mod infra {
    /// Layered configuration (`uic.toml` + `UIC__*` env)
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Element list loading
    pub mod elements;
    pub use elements::{ElementRecord, ElementsError, load_elements};

    /// Source reads and atomic writes
    pub mod io;
    pub use io::{read_source, write_atomic};
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use cli_ext::annotate_run;
pub use infra::{Config, load_config};

// Core types for external consumers
pub use crate::core::{
    AnnotateError, AnnotateOptions, AnnotateResult, AnnotationResult, AnnotationTarget,
    BackupResult, FilePatch, annotate_files, annotate_source, format_unified_diff,
};
