//! Options recognized by [`crate::Image::create`].

use crate::header::{DEFAULT_BLOCK_COUNT, DEFAULT_BLOCK_SIZE};

/// Options for formatting a new image.
///
/// `bs` and `bc` mirror the two option names the (out-of-scope) CLI accepts
/// via `name=value` pairs; this type only models the parsed result, it does
/// not itself parse argv or read stdin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateOptions {
	/// Size in bytes of a data block.
	pub block_size: u16,
	/// Number of data blocks.
	pub block_count: u16,
}

impl Default for CreateOptions {
	fn default() -> Self {
		Self {
			block_size: DEFAULT_BLOCK_SIZE,
			block_count: DEFAULT_BLOCK_COUNT,
		}
	}
}

impl CreateOptions {
	/// Parses `name=value` pairs as accepted by `create`'s option list.
	/// Recognizes `bs` and `bc`; unknown names are ignored, matching the
	/// external CLI's documented behavior.
	pub fn parse_pairs<'a, I: IntoIterator<Item = &'a str>>(pairs: I) -> Self {
		let mut opts = Self::default();
		for pair in pairs {
			let Some((name, value)) = pair.split_once('=') else {
				continue;
			};
			let Ok(value) = value.parse::<u16>() else {
				continue;
			};
			match name {
				"bs" => opts.block_size = value,
				"bc" => opts.block_count = value,
				_ => {}
			}
		}
		opts
	}
}
