//! End-to-end coverage of the literal scenarios and boundary conditions this
//! crate is built against.

use std::fs;

use blockfs::{CreateOptions, Error, Image};
use tempfile::NamedTempFile;

fn scratch_path() -> (NamedTempFile, String) {
	let tmp = NamedTempFile::new().unwrap();
	let path = tmp.path().to_str().unwrap().to_string();
	(tmp, path)
}

#[test]
fn s1_format_is_bit_exact() {
	let (_tmp, path) = scratch_path();
	Image::create(&path, CreateOptions { block_size: 128, block_count: 128 }).unwrap();

	let bytes = fs::read(&path).unwrap();
	assert_eq!(bytes.len(), 16_900);
	assert_eq!(&bytes[0..4], &[0x80, 0x00, 0x80, 0x00]);
	assert_eq!(&bytes[4..8], &[0xFF, 0xFF, 0xFF, 0xFF]);
	assert!(bytes[8..516].iter().all(|&b| b == 0));
}

#[test]
fn s2_mkdir_in_root() {
	let (_tmp, path) = scratch_path();
	Image::create(&path, CreateOptions::default()).unwrap();
	let mut img = Image::open(&path).unwrap();

	img.mkdir("/a").unwrap();

	let bytes = fs::read(&path).unwrap();
	// AT record for block 1: offset 4 + 1*4.
	assert_eq!(&bytes[8..12], &[0xFF, 0xFF, 0xFF, 0xFF]);
	// Entry at 4 + 512 + 0.
	assert_eq!(&bytes[516..522], &[0x01, 0x00, 0x01, 0x00, b'a', 0x00]);
}

#[test]
fn s3_mkdir_nested() {
	let (_tmp, path) = scratch_path();
	Image::create(&path, CreateOptions::default()).unwrap();
	let mut img = Image::open(&path).unwrap();
	img.mkdir("/a").unwrap();

	img.mkdir("/a/b").unwrap();

	let bytes = fs::read(&path).unwrap();
	assert_eq!(&bytes[12..16], &[0xFF, 0xFF, 0xFF, 0xFF]); // AT record for block 2.
	let block1_offset = 4 + 512 + 128;
	assert_eq!(&bytes[block1_offset..block1_offset + 6], &[0x01, 0x00, 0x02, 0x00, b'b', 0x00]);
}

#[test]
fn s4_ls_reports_one_padded_entry() {
	let (_tmp, path) = scratch_path();
	Image::create(&path, CreateOptions::default()).unwrap();
	let mut img = Image::open(&path).unwrap();
	img.mkdir("/a").unwrap();
	img.mkdir("/a/b").unwrap();

	let entries = img.ls("/a").unwrap();
	assert_eq!(entries.len(), 1);
	assert_eq!(entries[0].type_tag, "dir");
	assert_eq!(entries[0].target_block, 2);
	assert_eq!(entries[0].name, b"b");
}

#[test]
fn s5_file_round_trip() {
	let (_tmp, path) = scratch_path();
	Image::create(&path, CreateOptions::default()).unwrap();
	let mut img = Image::open(&path).unwrap();

	img.touch("/f").unwrap();
	img.fopen("/f").unwrap();
	img.fwrite(b"hello").unwrap();
	img.fclose().unwrap();

	img.fopen("/f").unwrap();
	let data = img.fread(5).unwrap();
	assert_eq!(data, b"hello");
}

#[test]
fn s6_write_past_one_block_extends_the_chain() {
	let (_tmp, path) = scratch_path();
	Image::create(&path, CreateOptions::default()).unwrap();
	let mut img = Image::open(&path).unwrap();

	img.touch("/f").unwrap();
	img.fopen("/f").unwrap();
	let payload = vec![0x42u8; 200];
	img.fwrite(&payload).unwrap();

	let info = img.info();
	assert_eq!(info.used_blocks, 3); // root + the file's two blocks.

	img.fclose().unwrap();
	img.fopen("/f").unwrap();
	let back = img.fread(200).unwrap();
	assert_eq!(back, payload);
}

#[test]
fn mkdir_root_is_rejected() {
	let (_tmp, path) = scratch_path();
	Image::create(&path, CreateOptions::default()).unwrap();
	let mut img = Image::open(&path).unwrap();

	assert!(matches!(img.mkdir("/"), Err(Error::InvalidPath(_))));
}

#[test]
fn name_length_boundary() {
	let (_tmp, path) = scratch_path();
	Image::create(&path, CreateOptions::default()).unwrap();
	let mut img = Image::open(&path).unwrap();

	img.mkdir("/01234567890").unwrap(); // 11 bytes, fits.
	assert!(matches!(img.mkdir("/012345678901"), Err(Error::InvalidPath(_)))); // 12 bytes, rejected.
}

#[test]
fn create_rejects_block_size_not_multiple_of_sixteen() {
	let (_tmp, path) = scratch_path();
	let err = Image::create(&path, CreateOptions { block_size: 17, block_count: 128 }).unwrap_err();
	assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn directory_spanning_two_blocks() {
	let (_tmp, path) = scratch_path();
	// 16-byte blocks: exactly one entry fits per block, forcing a new block
	// on the second mkdir.
	Image::create(&path, CreateOptions { block_size: 16, block_count: 16 }).unwrap();
	let mut img = Image::open(&path).unwrap();

	img.mkdir("/a").unwrap();
	img.mkdir("/b").unwrap();

	let entries = img.ls("/").unwrap();
	assert_eq!(entries.iter().map(|e| e.name.clone()).collect::<Vec<_>>(), vec![b"a".to_vec(), b"b".to_vec()]);
}

#[test]
fn alloc_table_exhaustion_fails_no_space() {
	let (_tmp, path) = scratch_path();
	Image::create(&path, CreateOptions { block_size: 16, block_count: 2 }).unwrap();
	let mut img = Image::open(&path).unwrap();

	// Block 0 is root, block 1 is the only free block.
	img.mkdir("/a").unwrap();
	assert!(matches!(img.mkdir("/b"), Err(Error::NoSpace)));
}

#[test]
fn fread_past_end_fails_after_partial_fill() {
	let (_tmp, path) = scratch_path();
	Image::create(&path, CreateOptions::default()).unwrap();
	let mut img = Image::open(&path).unwrap();

	img.touch("/f").unwrap();
	img.fopen("/f").unwrap();
	img.fwrite(b"hi").unwrap();
	img.fclose().unwrap();

	img.fopen("/f").unwrap();
	assert!(matches!(img.fread(10), Err(Error::ReadPastEnd)));
}

#[test]
fn rm_compacts_by_overwriting_victim_with_the_last_entry() {
	// No compaction of freed blocks is a stated non-goal: removing a
	// non-last entry overwrites its slot with the last entry's bytes but
	// does not shrink the chain, so the last slot keeps its (now
	// duplicated) old content.
	let (_tmp, path) = scratch_path();
	Image::create(&path, CreateOptions::default()).unwrap();
	let mut img = Image::open(&path).unwrap();

	img.mkdir("/a").unwrap();
	img.mkdir("/b").unwrap();
	img.mkdir("/c").unwrap();

	img.rm("/a").unwrap();

	let names: Vec<_> = img.ls("/").unwrap().into_iter().map(|e| e.name).collect();
	assert_eq!(names, vec![b"c".to_vec(), b"b".to_vec(), b"c".to_vec()]);
}

#[test]
fn rm_of_the_sole_entry_is_a_harmless_self_copy() {
	// Freeing the last remaining entry's data chain still happens, but the
	// directory slot itself is left with its original (now stale) bytes —
	// the entry keeps appearing in `ls` even though its block is freed.
	let (_tmp, path) = scratch_path();
	Image::create(&path, CreateOptions::default()).unwrap();
	let mut img = Image::open(&path).unwrap();

	img.mkdir("/a").unwrap();
	let before = img.info();

	img.rm("/a").unwrap();

	let after = img.info();
	assert_eq!(after.used_blocks, before.used_blocks - 1);
	let names: Vec<_> = img.ls("/").unwrap().into_iter().map(|e| e.name).collect();
	assert_eq!(names, vec![b"a".to_vec()]);
}

#[test]
fn only_one_file_may_be_open_at_a_time() {
	let (_tmp, path) = scratch_path();
	Image::create(&path, CreateOptions::default()).unwrap();
	let mut img = Image::open(&path).unwrap();

	img.touch("/f").unwrap();
	img.touch("/g").unwrap();
	img.fopen("/f").unwrap();
	assert!(matches!(img.fopen("/g"), Err(Error::Busy)));
}
