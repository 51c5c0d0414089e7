pub mod ihdr;

pub use ihdr::{
	HeaderView,
	PNGFormatError,
	validate
};

use iconkit_core::tag4;

/// PNG file signature
pub const MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Chunk type of the image header, which must be the first chunk
pub const IHDR: u32 = tag4!(b"IHDR");

/// Data length of the IHDR chunk
pub const IHDR_LENGTH: u32 = 13;

/// Bytes needed to read every IHDR field used by [`HeaderView`]
pub const HEADER_SIZE: usize = 26;

#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(u8)]
pub enum ColorType {
	Grayscale = 0,
	Truecolor = 2,
	Indexed = 3,
	GrayscaleAlpha = 4,
	TruecolorAlpha = 6,
}

impl ColorType {
	pub fn from_u8(value: u8) -> Option<ColorType> {
		match value {
			0 => Some(ColorType::Grayscale),
			2 => Some(ColorType::Truecolor),
			3 => Some(ColorType::Indexed),
			4 => Some(ColorType::GrayscaleAlpha),
			6 => Some(ColorType::TruecolorAlpha),
			_ => None,
		}
	}

	/// Number of samples stored per pixel
	pub fn channels(self) -> u8 {
		match self {
			ColorType::Grayscale => 1,
			ColorType::Truecolor => 3,
			ColorType::Indexed => 1,
			ColorType::GrayscaleAlpha => 2,
			ColorType::TruecolorAlpha => 4,
		}
	}
}

/// Returns the channel count for a raw IHDR color type.
/// Unrecognized color types count as a single channel.
pub fn channel_count_for(color_type: u8) -> u8 {
	ColorType::from_u8(color_type).map_or(1, ColorType::channels)
}
