//! Positioned reads and writes against the image file.
//!
//! Every operation seeks absolutely before touching the file; nothing here
//! relies on the stream's current position carrying over between calls; two
//! callers alternating block and allocation-table writes must not corrupt
//! each other's view of the file.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{Error, Result};

/// Reads exactly `buf.len()` bytes from `file` at absolute offset `offset`.
///
/// A short read (end of file reached before `buf` is filled) is always an
/// error, never a partial success.
pub fn read_at(file: &mut File, offset: u64, buf: &mut [u8]) -> Result<()> {
	file.seek(SeekFrom::Start(offset))?;
	match file.read_exact(buf) {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(Error::ShortRead {
			expected: buf.len(),
			got: 0,
		}),
		Err(e) => Err(e.into()),
	}
}

/// Writes `buf` to `file` at absolute offset `offset`.
pub fn write_at(file: &mut File, offset: u64, buf: &[u8]) -> Result<()> {
	file.seek(SeekFrom::Start(offset))?;
	file.write_all(buf)?;
	Ok(())
}
