//! A self-contained miniature filesystem stored inside a single host file.
//!
//! An image is a fixed-size container split into a 4-byte header, a
//! fixed-capacity doubly-linked block-allocation table, and an array of
//! equal-sized data blocks. This crate implements the on-disk block
//! engine: binary layout, allocation table, directory-entry protocol
//! spanning chained blocks, path resolution, and positional I/O over
//! chained blocks with on-demand extension.
//!
//! It does not implement an interactive shell, a CLI entry point, or
//! `name=value` option parsing; those are thin wrappers a caller builds on
//! top of [`Image`]'s public operations.

pub mod alloc_table;
pub mod block_io;
pub mod codec;
pub mod config;
pub mod directory;
pub mod error;
pub mod handle;
pub mod header;
mod image;
pub mod path;

pub use config::CreateOptions;
pub use error::{Error, Result};
pub use handle::FileHandleInfo;
pub use header::Header;
pub use image::{Image, ImageInfo, LsEntry};
