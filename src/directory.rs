//! Directory entries and the chain-walking iterator over them.

use std::fs::File;

use crate::alloc_table::{AllocTable, EOF, UNUSED};
use crate::block_io::read_at;
use crate::codec::{read_u16, write_u16};
use crate::error::{Error, Result};
use crate::header::Header;

/// `type` tag for the end-of-directory sentinel entry.
pub const TYPE_END: u16 = 0;
/// `type` tag for a directory entry.
pub const TYPE_DIRECTORY: u16 = 1;
/// `type` tag for a file entry.
pub const TYPE_FILE: u16 = 2;

/// Maximum usable name length (11 bytes + mandatory NUL = 12-byte window).
pub const NAME_MAX: usize = 11;
/// Size in bytes of the name window, NUL included.
const NAME_FIELD_SIZE: usize = 12;

/// One 16-byte directory entry: `type`, `target_block`, NUL-terminated
/// name. Borrowed from the iterator's block buffer; callers that need to
/// retain the name past the next call must copy it out, e.g. via
/// [`DirEntry::to_owned_entry`].
#[derive(Debug, Clone, Copy)]
pub struct DirEntry<'a> {
	/// `TYPE_DIRECTORY` or `TYPE_FILE` (never `TYPE_END`; the iterator
	/// stops before yielding that one).
	pub entry_type: u16,
	/// First block of the named object's chain.
	pub target_block: u16,
	name_bytes: &'a [u8],
}

impl<'a> DirEntry<'a> {
	/// The entry's name, as bytes up to (not including) the NUL terminator.
	pub fn name(&self) -> &'a [u8] {
		let len = self.name_bytes.iter().position(|&b| b == 0).unwrap_or(self.name_bytes.len());
		&self.name_bytes[..len]
	}

	/// Copies this entry into an owned value, for retaining past the
	/// iterator's next step.
	pub fn to_owned_entry(&self) -> OwnedDirEntry {
		OwnedDirEntry {
			entry_type: self.entry_type,
			target_block: self.target_block,
			name: self.name().to_vec(),
		}
	}
}

/// An owned copy of a [`DirEntry`], for use after the iterator has moved on.
#[derive(Debug, Clone)]
pub struct OwnedDirEntry {
	/// `TYPE_DIRECTORY` or `TYPE_FILE`.
	pub entry_type: u16,
	/// First block of the named object's chain.
	pub target_block: u16,
	/// The entry's name, without the NUL terminator.
	pub name: Vec<u8>,
}

/// Encodes one directory entry into a fresh 16-byte buffer.
///
/// `name` must already have been validated to fit within [`NAME_MAX`]
/// bytes.
pub fn encode_entry(entry_type: u16, target_block: u16, name: &[u8]) -> [u8; 16] {
	debug_assert!(name.len() <= NAME_MAX);
	let mut buf = [0u8; 16];
	write_u16(&mut buf, 0, entry_type);
	write_u16(&mut buf, 2, target_block);
	buf[4..4 + name.len()].copy_from_slice(name);
	buf
}

/// Walks a chain of directory blocks, yielding entries in on-disk order.
///
/// After iteration stops (`next` returns `None`), [`DirectoryIterator::position`]
/// tells the caller where to splice a new entry: at the recorded
/// `(block, offset)` if the chain was not exhausted, or at offset 0 of a
/// freshly-linked block if it was (`reached_eof`).
pub struct DirectoryIterator {
	block: Vec<u8>,
	current_block: u16,
	offset: usize,
	reached_eof: bool,
	block_size: usize,
	/// `(block, offset)` of the entry most recently returned by `next`,
	/// recorded *before* `offset` advances past it. `rm`'s compaction needs
	/// this pre-advance address for both the removed entry and the last
	/// entry visited (see spec §4.5, §9 note 1).
	last_entry_pos: Option<(u16, usize)>,
}

impl DirectoryIterator {
	/// Opens an iterator positioned at the start of `start_block`.
	pub fn open(file: &mut File, header: &Header, start_block: u16) -> Result<Self> {
		let mut block = vec![0u8; header.block_size as usize];
		read_at(file, header.block_offset(start_block), &mut block)?;
		Ok(Self {
			block,
			current_block: start_block,
			offset: 0,
			reached_eof: false,
			block_size: header.block_size as usize,
			last_entry_pos: None,
		})
	}

	/// The block the iterator is currently positioned in.
	pub fn current_block(&self) -> u16 {
		self.current_block
	}

	/// `(block, offset)` the caller should write a new 16-byte entry into,
	/// and whether the chain was exhausted (in which case a new block must
	/// be linked first and the entry placed at offset 0 of it).
	pub fn position(&self) -> (u16, usize, bool) {
		(self.current_block, self.offset, self.reached_eof)
	}

	/// `(block, offset)` of the entry most recently returned by `next`, i.e.
	/// the slot that entry actually occupies — valid immediately after a
	/// call to `next` that returned `Some`.
	pub fn last_entry_position(&self) -> Option<(u16, usize)> {
		self.last_entry_pos
	}

	/// Advances to the next entry, following block-chain links as needed.
	///
	/// Returns `None` at the first `TYPE_END` entry (without advancing past
	/// it) or when the chain reaches `EOF`.
	pub fn next(&mut self, file: &mut File, header: &Header, at: &AllocTable) -> Result<Option<DirEntry<'_>>> {
		if self.offset >= self.block_size {
			self.offset = 0;
			let next_block = at.get_next(self.current_block);
			if next_block == EOF {
				self.reached_eof = true;
				return Ok(None);
			}
			if next_block == UNUSED {
				return Err(Error::BadImage(format!(
					"directory chain stepped into unused block 0x{:04x}",
					self.current_block
				)));
			}
			self.current_block = next_block;
			read_at(file, header.block_offset(next_block), &mut self.block)?;
		}

		let entry_type = read_u16(&self.block, self.offset);
		if entry_type == TYPE_END {
			return Ok(None);
		}

		let target_block = read_u16(&self.block, self.offset + 2);
		let name_bytes = &self.block[self.offset + 4..self.offset + 4 + NAME_FIELD_SIZE];
		self.last_entry_pos = Some((self.current_block, self.offset));
		self.offset += 16;

		Ok(Some(DirEntry {
			entry_type,
			target_block,
			name_bytes,
		}))
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn encode_entry_pads_with_zeros() {
		let buf = encode_entry(TYPE_DIRECTORY, 1, b"a");
		assert_eq!(buf, [1, 0, 1, 0, b'a', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
	}

	#[test]
	fn dir_entry_name_stops_at_nul() {
		let block = encode_entry(TYPE_FILE, 3, b"f");
		let entry = DirEntry {
			entry_type: TYPE_FILE,
			target_block: 3,
			name_bytes: &block[4..16],
		};
		assert_eq!(entry.name(), b"f");
	}
}
