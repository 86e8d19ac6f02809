//! Core library for `mkwheel`.
//!
//! Packages already-built Python extension-module artifacts into a binary
//! wheel archive: resolves the interpreter/ABI/platform compatibility tag,
//! formats the WHEEL and METADATA records, and assembles the zip container
//! together with its content-addressed RECORD manifest. Construction is
//! atomic: a failed build leaves no archive file on disk.

pub mod builder;
pub mod metadata;
pub mod record;
pub mod tag;

pub use builder::{BuildConfig, BuildError, WheelBuilder};
pub use tag::{CompatTag, InterpreterEnv, TagError};
