use byteorder::{
	BE,
	ByteOrder
};

use thiserror::Error;

use crate::{
	channel_count_for,
	ColorType,
	HEADER_SIZE,
	IHDR,
	IHDR_LENGTH,
	MAGIC
};

const CHUNK_LENGTH_OFFSET: usize = 8;
const CHUNK_TYPE_OFFSET: usize = 12;
const WIDTH_OFFSET: usize = 16;
const HEIGHT_OFFSET: usize = 20;
const BIT_DEPTH_OFFSET: usize = 24;
const COLOR_TYPE_OFFSET: usize = 25;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum PNGFormatError {
	#[error("Bad magic number")]
	BadMagic,
	#[error("Bad IHDR header")]
	BadChunkHeader,
	#[error("Truncated IHDR chunk: only {length} bytes")]
	Truncated {
		length: usize,
	},
}

/// Read-only view over a PNG buffer whose signature and IHDR chunk header
/// have been checked. Only [`validate`] creates one, so every accessor reads
/// from at least [`HEADER_SIZE`] bytes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeaderView<'a> {
	data: &'a [u8],
}

impl<'a> HeaderView<'a> {
	pub fn width(&self) -> u32 {
		BE::read_u32(&self.data[WIDTH_OFFSET..HEIGHT_OFFSET])
	}

	pub fn height(&self) -> u32 {
		BE::read_u32(&self.data[HEIGHT_OFFSET..BIT_DEPTH_OFFSET])
	}

	/// Returns `(width, height)` in pixels
	pub fn dimensions(&self) -> (u32, u32) {
		(self.width(), self.height())
	}

	pub fn bit_depth(&self) -> u8 {
		self.data[BIT_DEPTH_OFFSET]
	}

	/// Raw color type byte. May hold values outside of [`ColorType`].
	pub fn color_type(&self) -> u8 {
		self.data[COLOR_TYPE_OFFSET]
	}

	pub fn known_color_type(&self) -> Option<ColorType> {
		ColorType::from_u8(self.color_type())
	}

	pub fn channel_count(&self) -> u8 {
		channel_count_for(self.color_type())
	}

	pub fn bits_per_pixel(&self) -> u16 {
		u16::from(self.bit_depth()) * u16::from(self.channel_count())
	}

	/// The whole buffer this view was created from
	pub fn bytes(&self) -> &'a [u8] {
		self.data
	}
}

/// Checks the PNG signature and the IHDR chunk header.
/// This is a structural check only; no chunk after the header is looked at.
pub fn validate(data: &[u8]) -> Result<HeaderView<'_>, PNGFormatError> {
	if data.get(..CHUNK_LENGTH_OFFSET) != Some(&MAGIC[..]) {
		return Err(PNGFormatError::BadMagic);
	}

	if data.len() < WIDTH_OFFSET
		|| BE::read_u32(&data[CHUNK_LENGTH_OFFSET..CHUNK_TYPE_OFFSET]) != IHDR_LENGTH
		|| BE::read_u32(&data[CHUNK_TYPE_OFFSET..WIDTH_OFFSET]) != IHDR
	{
		return Err(PNGFormatError::BadChunkHeader);
	}

	if data.len() < HEADER_SIZE {
		return Err(PNGFormatError::Truncated { length: data.len() });
	}

	Ok(HeaderView { data: data })
}

#[cfg(test)]
mod tests {
	use super::*;

	fn header(width: u32, height: u32, bit_depth: u8, color_type: u8) -> Vec<u8> {
		let mut data = MAGIC.to_vec();
		data.extend_from_slice(&IHDR_LENGTH.to_be_bytes());
		data.extend_from_slice(b"IHDR");
		data.extend_from_slice(&width.to_be_bytes());
		data.extend_from_slice(&height.to_be_bytes());
		data.extend_from_slice(&[bit_depth, color_type, 0, 0, 0]);
		data
	}

	#[test]
	fn test_validate() {
		let data = header(48, 32, 8, 6);
		let view = validate(&data).unwrap();

		assert_eq!((48, 32), view.dimensions());
		assert_eq!(8, view.bit_depth());
		assert_eq!(6, view.color_type());
		assert_eq!(Some(ColorType::TruecolorAlpha), view.known_color_type());
		assert_eq!(4, view.channel_count());
		assert_eq!(32, view.bits_per_pixel());
		assert_eq!(data.as_slice(), view.bytes());
	}

	#[test]
	fn test_big_endian_dimensions() {
		let data = header(0x0001_0002, 0x0300_0004, 16, 0);
		let view = validate(&data).unwrap();

		assert_eq!(65538, view.width());
		assert_eq!(0x0300_0004, view.height());
		assert_eq!(16, view.bits_per_pixel());
	}

	#[test]
	fn test_bad_magic() {
		let mut data = header(16, 16, 8, 0);
		data[0] = 0;
		assert_eq!(Err(PNGFormatError::BadMagic), validate(&data));

		assert_eq!(Err(PNGFormatError::BadMagic), validate(&[]));
		assert_eq!(Err(PNGFormatError::BadMagic), validate(&MAGIC[..7]));
	}

	#[test]
	fn test_bad_chunk_header() {
		let mut data = header(16, 16, 8, 0);
		data[11] = 14;
		assert_eq!(Err(PNGFormatError::BadChunkHeader), validate(&data));

		let mut data = header(16, 16, 8, 0);
		data[12..16].copy_from_slice(b"IDAT");
		assert_eq!(Err(PNGFormatError::BadChunkHeader), validate(&data));

		assert_eq!(Err(PNGFormatError::BadChunkHeader), validate(&MAGIC));
	}

	#[test]
	fn test_truncated() {
		let data = header(16, 16, 8, 0);
		assert_eq!(Err(PNGFormatError::Truncated { length: 25 }), validate(&data[..25]));
		assert!(validate(&data[..HEADER_SIZE]).is_ok());
	}

	#[test]
	fn test_unknown_color_type() {
		let data = header(16, 16, 8, 5);
		let view = validate(&data).unwrap();

		assert_eq!(None, view.known_color_type());
		assert_eq!(1, view.channel_count());
		assert_eq!(8, view.bits_per_pixel());
	}

	#[test]
	fn test_wide_bits_per_pixel() {
		let data = header(16, 16, 255, 6);
		assert_eq!(1020, validate(&data).unwrap().bits_per_pixel());
	}
}
