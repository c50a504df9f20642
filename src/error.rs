//! Error taxonomy for the block engine.

use std::io;

/// An error produced by an engine operation.
///
/// No engine operation panics or aborts on a reachable path; every failure
/// is reported through this type, and partial effects made before the
/// failure are left visible on the image, per the best-effort (non
/// transactional) design.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A host filesystem operation failed.
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),

	/// Fewer bytes were read than requested; the image is shorter than its
	/// header/allocation table claims.
	#[error("short read: expected {expected} bytes, got {got}")]
	ShortRead {
		/// Number of bytes the caller asked for.
		expected: usize,
		/// Number of bytes actually read.
		got: usize,
	},

	/// Fewer bytes were written than requested.
	#[error("short write: expected {expected} bytes, wrote {got}")]
	ShortWrite {
		/// Number of bytes the caller asked to write.
		expected: usize,
		/// Number of bytes actually written.
		got: usize,
	},

	/// The header or allocation table is internally inconsistent, e.g. a
	/// chain walk stepped into an `UNUSED` block.
	#[error("corrupt image: {0}")]
	BadImage(String),

	/// A path was not absolute, or one of its segments exceeded the
	/// 11-byte name limit.
	#[error("invalid path: {0}")]
	InvalidPath(String),

	/// `create`'s `bs`/`bc` options failed validation (zero, or `bs` not a
	/// multiple of the directory-entry size).
	#[error("invalid image configuration: {0}")]
	InvalidConfig(String),

	/// No entry with the given name exists in the searched directory.
	#[error("not found")]
	NotFound,

	/// An entry with the given name already exists.
	#[error("already exists")]
	Exists,

	/// The resolved entry is not a directory.
	#[error("not a directory")]
	NotADirectory,

	/// The resolved entry is not a file.
	#[error("not a file")]
	NotAFile,

	/// The allocation table has no free block left.
	#[error("no space left on image")]
	NoSpace,

	/// A file is already open; only one may be open at a time.
	#[error("a file is already open")]
	Busy,

	/// No file is currently open.
	#[error("no file is open")]
	NotOpen,

	/// A seek target lies outside the currently allocated chain.
	#[error("seek position out of range")]
	OutOfRange,

	/// `fread` ran into the end of the file's chain before filling the
	/// requested length. Bytes already copied into the caller's buffer are
	/// not rolled back.
	#[error("read past end of file")]
	ReadPastEnd,
}

/// The result type returned by every engine operation.
pub type Result<T> = std::result::Result<T, Error>;
