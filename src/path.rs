//! Resolution of absolute, slash-delimited paths to block numbers.

use std::fs::File;

use crate::alloc_table::AllocTable;
use crate::directory::{DirectoryIterator, NAME_MAX, TYPE_DIRECTORY};
use crate::error::{Error, Result};
use crate::header::Header;

/// Block number of the root directory's first block. Permanently reserved.
pub const ROOT_BLOCK: u16 = 0;

/// Splits `path` into `(parent, leaf)` using dirname/basename semantics: the
/// leaf is the final non-empty segment, the parent is everything before it
/// (re-prefixed with `/` if the original path was absolute).
///
/// `"/"` and `""` both yield a leaf of `"/"`, which callers reject as "the
/// root directory cannot be modified".
pub fn split_parent_leaf(path: &str) -> (String, String) {
	let trimmed = path.trim_end_matches('/');
	if trimmed.is_empty() {
		return ("/".to_string(), "/".to_string());
	}
	match trimmed.rfind('/') {
		Some(idx) => {
			let parent = if idx == 0 { "/" } else { &trimmed[..idx] };
			(parent.to_string(), trimmed[idx + 1..].to_string())
		}
		None => ("/".to_string(), trimmed.to_string()),
	}
}

/// Resolves an absolute path to the block number of the directory it names.
///
/// Empty segments (including ones produced by trailing slashes) are
/// skipped. `"/"` resolves to [`ROOT_BLOCK`].
pub fn resolve_directory(file: &mut File, header: &Header, at: &AllocTable, path: &str) -> Result<u16> {
	if !path.starts_with('/') {
		return Err(Error::InvalidPath(format!("path must be absolute: {path}")));
	}

	let mut block = ROOT_BLOCK;
	for segment in path.split('/') {
		if segment.is_empty() {
			continue;
		}
		if segment.len() + 1 > NAME_MAX + 1 {
			return Err(Error::InvalidPath(format!("path segment too long: {segment}")));
		}

		let mut it = DirectoryIterator::open(file, header, block)?;
		let mut found = None;
		while let Some(entry) = it.next(file, header, at)? {
			if entry.name() == segment.as_bytes() {
				found = Some(entry.to_owned_entry());
				break;
			}
		}

		match found {
			Some(entry) if entry.entry_type == TYPE_DIRECTORY => block = entry.target_block,
			Some(_) => return Err(Error::NotADirectory),
			None => return Err(Error::NotFound),
		}
	}

	Ok(block)
}
