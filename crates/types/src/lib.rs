//! Foundation types for GraphQL code generation.
//!
//! This crate provides shared types used across the code generation stack.
//! It has zero external dependencies, making it suitable as a foundation layer.
//!
//! # Type Categories
//!
//! - **File types**: [`FileId`], [`FileUri`], [`DocumentOrigin`]
//! - **Position types**: [`OffsetRange`], [`Position`], [`SourceLocation`]

mod file;
mod position;

pub use file::{DocumentOrigin, FileId, FileUri};
pub use position::{OffsetRange, Position, SourceLocation};
