//! Image lifecycle and the POSIX-like operations built on top of the block
//! engine: `create`, `open`, `close`, `info`, `mkdir`, `touch`, `ls`, `rm`,
//! and the positional file handle group.

use std::fs::{File, OpenOptions};
use std::path::Path as FsPath;

use crate::alloc_table::{self, AllocTable, EOF, UNUSED};
use crate::block_io::write_at;
use crate::config::CreateOptions;
use crate::directory::{encode_entry, DirectoryIterator, NAME_MAX, TYPE_DIRECTORY, TYPE_FILE};
use crate::error::{Error, Result};
use crate::handle::{FileHandle, FileHandleInfo};
use crate::header::Header;
use crate::path::{resolve_directory, split_parent_leaf};

/// An open image: the file handle, the in-memory allocation table, cached
/// header values, and at most one open positional file handle.
///
/// Exclusively owned; there is no support for two `Image`s sharing one
/// backing file.
pub struct Image {
	file: File,
	header: Header,
	at: AllocTable,
	open_file: Option<FileHandle>,
}

/// One entry as reported by [`Image::ls`].
#[derive(Debug, Clone)]
pub struct LsEntry {
	/// `"dir"`, `"file"`, or `"unkn"` for any other type tag.
	pub type_tag: &'static str,
	/// First block of the named object.
	pub target_block: u16,
	/// The entry's name.
	pub name: Vec<u8>,
}

/// Block usage summary as reported by [`Image::info`].
#[derive(Debug, Clone, Copy)]
pub struct ImageInfo {
	/// Size in bytes of a data block.
	pub block_size: u16,
	/// Number of data blocks.
	pub block_count: u16,
	/// Number of allocated blocks.
	pub used_blocks: u32,
	/// Number of free blocks.
	pub unused_blocks: u32,
}

impl Image {
	/// Formats a new image at `path`, truncating any existing file.
	///
	/// Writes the header, an allocation table with every block free except
	/// block 0 (reserved for the root directory), and `block_count` zeroed
	/// data blocks.
	pub fn create<P: AsRef<FsPath>>(path: P, options: CreateOptions) -> Result<()> {
		let header = Header::new(options.block_size, options.block_count)?;

		let mut file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;

		write_at(&mut file, 0, &header.encode())?;

		let at = AllocTable::formatted(header.block_count, header.alloc_table_offset());
		write_at(&mut file, header.alloc_table_offset(), at.as_bytes())?;

		let zero_block = vec![0u8; header.block_size as usize];
		for b in 0..header.block_count {
			write_at(&mut file, header.block_offset(b), &zero_block)?;
		}

		log::debug!(
			"formatted image: block_size={} block_count={} total_size={}",
			header.block_size,
			header.block_count,
			header.image_size()
		);
		Ok(())
	}

	/// Opens an existing image, reading its header and full allocation
	/// table into memory.
	pub fn open<P: AsRef<FsPath>>(path: P) -> Result<Self> {
		let mut file = OpenOptions::new().read(true).write(true).open(path)?;

		let mut header_buf = [0u8; crate::header::HEADER_SIZE];
		crate::block_io::read_at(&mut file, 0, &mut header_buf)?;
		let header = Header::decode(&header_buf)?;

		let at = alloc_table::load(&mut file, &header)?;

		Ok(Self {
			file,
			header,
			at,
			open_file: None,
		})
	}

	/// Closes the image, releasing the allocation table buffer and the
	/// underlying file handle.
	pub fn close(self) {
		// `self` is dropped here; the `File` and `AllocTable` buffer are
		// released by their own `Drop` impls.
	}

	/// Flushes the underlying file stream. Not called implicitly by any
	/// other operation.
	pub fn sync(&mut self) -> Result<()> {
		use std::io::Write;
		self.file.flush()?;
		self.file.sync_all()?;
		Ok(())
	}

	/// Reports block size, block count, and a used/unused block breakdown.
	pub fn info(&self) -> ImageInfo {
		let mut used = 0u32;
		for b in 0..self.header.block_count {
			if self.at.get_next(b) != UNUSED {
				used += 1;
			}
		}
		ImageInfo {
			block_size: self.header.block_size,
			block_count: self.header.block_count,
			used_blocks: used,
			unused_blocks: self.header.block_count as u32 - used,
		}
	}

	fn validate_leaf(leaf: &str) -> Result<()> {
		if leaf == "/" {
			return Err(Error::InvalidPath("the root directory cannot be modified".into()));
		}
		if leaf.len() + 1 > NAME_MAX + 1 {
			return Err(Error::InvalidPath(format!("name too long: {leaf}")));
		}
		Ok(())
	}

	/// Finds `leaf` in the directory starting at `parent_block`. Returns
	/// `(found_target_block_if_exists, slot_block, slot_offset, reached_eof)`.
	fn scan_for_leaf(&mut self, parent_block: u16, leaf: &str) -> Result<(Option<u16>, u16, usize, bool)> {
		let mut it = DirectoryIterator::open(&mut self.file, &self.header, parent_block)?;
		let mut found = None;
		while let Some(entry) = it.next(&mut self.file, &self.header, &self.at)? {
			if entry.name() == leaf.as_bytes() {
				found = Some(entry.target_block);
				break;
			}
		}
		let (block, offset, reached_eof) = it.position();
		Ok((found, block, offset, reached_eof))
	}

	/// Allocates a slot for a new entry in a directory chain, linking a
	/// fresh block if the chain was exhausted.
	fn make_slot(&mut self, parent_tail_block: u16, offset: usize, reached_eof: bool) -> Result<(u16, usize)> {
		if !reached_eof {
			return Ok((parent_tail_block, offset));
		}
		let new_tail = self.at.alloc(&mut self.file, self.header.block_count, parent_tail_block, EOF)?;
		if new_tail == 0 {
			return Err(Error::NoSpace);
		}
		self.at.set_next(&mut self.file, parent_tail_block, new_tail)?;
		Ok((new_tail, 0))
	}

	fn create_entry(&mut self, path: &str, entry_type: u16) -> Result<()> {
		let (parent_path, leaf) = split_parent_leaf(path);
		Self::validate_leaf(&leaf)?;

		let parent_block = resolve_directory(&mut self.file, &self.header, &self.at, &parent_path)?;
		let (existing, slot_block, slot_offset, reached_eof) = self.scan_for_leaf(parent_block, &leaf)?;
		if existing.is_some() {
			return Err(Error::Exists);
		}

		let new_block = self.at.alloc(&mut self.file, self.header.block_count, EOF, EOF)?;
		if new_block == 0 {
			return Err(Error::NoSpace);
		}

		let (slot_block, slot_offset) = self.make_slot(slot_block, slot_offset, reached_eof)?;

		let entry = encode_entry(entry_type, new_block, leaf.as_bytes());
		let abs = self.header.block_offset(slot_block) + slot_offset as u64;
		write_at(&mut self.file, abs, &entry)?;

		log::debug!("created entry {leaf:?} type={entry_type} at block 0x{new_block:04x}");
		Ok(())
	}

	/// Creates a new empty directory at `path`.
	pub fn mkdir(&mut self, path: &str) -> Result<()> {
		self.create_entry(path, TYPE_DIRECTORY)
	}

	/// Creates a new empty file at `path`.
	pub fn touch(&mut self, path: &str) -> Result<()> {
		self.create_entry(path, TYPE_FILE)
	}

	/// Lists the entries of the directory at `path`, in on-disk (insertion)
	/// order.
	pub fn ls(&mut self, path: &str) -> Result<Vec<LsEntry>> {
		let block = resolve_directory(&mut self.file, &self.header, &self.at, path)?;
		let mut it = DirectoryIterator::open(&mut self.file, &self.header, block)?;
		let mut out = Vec::new();
		while let Some(entry) = it.next(&mut self.file, &self.header, &self.at)? {
			let type_tag = match entry.entry_type {
				TYPE_DIRECTORY => "dir",
				TYPE_FILE => "file",
				_ => "unkn",
			};
			out.push(LsEntry {
				type_tag,
				target_block: entry.target_block,
				name: entry.name().to_vec(),
			});
		}
		Ok(out)
	}

	/// Removes the entry at `path`: frees its entire data/directory chain
	/// and compacts the parent directory by overwriting the removed slot
	/// with the last visited entry (a harmless self-copy if the removed
	/// entry already was the last one).
	///
	/// `rmdir` is a plain alias for this; neither recurses into a
	/// directory's children nor rejects a non-empty one (see DESIGN.md).
	pub fn rm(&mut self, path: &str) -> Result<()> {
		let (parent_path, leaf) = split_parent_leaf(path);
		Self::validate_leaf(&leaf)?;
		let parent_block = resolve_directory(&mut self.file, &self.header, &self.at, &parent_path)?;

		let mut it = DirectoryIterator::open(&mut self.file, &self.header, parent_block)?;
		let mut victim: Option<(u16, usize, u16)> = None;

		while let Some(entry) = it.next(&mut self.file, &self.header, &self.at)? {
			if victim.is_none() && entry.name() == leaf.as_bytes() {
				let (block, offset) = it.last_entry_position().expect("just yielded an entry");
				victim = Some((block, offset, entry.target_block));
			}
		}

		let Some((victim_block, victim_offset, victim_target)) = victim else {
			return Err(Error::NotFound);
		};
		let (last_block, last_offset) = it.last_entry_position().expect("at least the victim was visited");

		self.at.free_chain(&mut self.file, victim_target)?;

		let mut last_entry = [0u8; 16];
		crate::block_io::read_at(
			&mut self.file,
			self.header.block_offset(last_block) + last_offset as u64,
			&mut last_entry,
		)?;
		write_at(
			&mut self.file,
			self.header.block_offset(victim_block) + victim_offset as u64,
			&last_entry,
		)?;

		if (last_block, last_offset) == (victim_block, victim_offset) {
			log::debug!("rm: removed entry was the last in its directory, compaction is a self-copy");
		}
		Ok(())
	}

	/// Alias for [`Image::rm`].
	pub fn rmdir(&mut self, path: &str) -> Result<()> {
		self.rm(path)
	}

	/// Opens `path` as the image's single file handle.
	pub fn fopen(&mut self, path: &str) -> Result<()> {
		if self.open_file.is_some() {
			return Err(Error::Busy);
		}

		let (parent_path, leaf) = split_parent_leaf(path);
		Self::validate_leaf(&leaf)?;
		let parent_block = resolve_directory(&mut self.file, &self.header, &self.at, &parent_path)?;

		let mut it = DirectoryIterator::open(&mut self.file, &self.header, parent_block)?;
		let mut found = None;
		while let Some(entry) = it.next(&mut self.file, &self.header, &self.at)? {
			if entry.name() == leaf.as_bytes() {
				found = Some((entry.entry_type, entry.target_block));
				break;
			}
		}

		match found {
			Some((TYPE_FILE, start)) => {
				self.open_file = Some(FileHandle::open(start));
				Ok(())
			}
			Some(_) => Err(Error::NotAFile),
			None => Err(Error::NotFound),
		}
	}

	/// Closes the currently open file handle.
	pub fn fclose(&mut self) -> Result<()> {
		if self.open_file.take().is_none() {
			return Err(Error::NotOpen);
		}
		Ok(())
	}

	/// Reports whether a file is open and, if so, its cursor state.
	pub fn finfo(&self) -> Option<FileHandleInfo> {
		self.open_file.as_ref().map(FileHandle::info)
	}

	/// Seeks the open file handle to absolute byte position `pos`.
	pub fn fseek(&mut self, pos: u64) -> Result<()> {
		let handle = self.open_file.as_mut().ok_or(Error::NotOpen)?;
		handle.seek(&self.header, &self.at, pos)
	}

	/// Writes `buf` into the open file handle at the cursor, extending the
	/// chain as needed.
	pub fn fwrite(&mut self, buf: &[u8]) -> Result<()> {
		let mut handle = self.open_file.take().ok_or(Error::NotOpen)?;
		let result = handle.write(&mut self.file, &self.header, &mut self.at, buf);
		self.open_file = Some(handle);
		result
	}

	/// Reads `len` bytes from the open file handle at the cursor.
	pub fn fread(&mut self, len: usize) -> Result<Vec<u8>> {
		let mut handle = self.open_file.take().ok_or(Error::NotOpen)?;
		let mut buf = vec![0u8; len];
		let result = handle.read(&mut self.file, &self.header, &self.at, &mut buf);
		self.open_file = Some(handle);
		result.map(|()| buf)
	}
}
