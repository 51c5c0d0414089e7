use image::{
	DynamicImage,
	ImageFormat,
	imageops::FilterType
};

use log::{
	debug,
	info
};

use std::{
	fs,
	io::{
		self,
		Cursor
	},
	path::Path
};

use thiserror::Error;

use iconkit_textures_windows::{
	ico::MAX_DIMENSION,
	IcoExportError,
	write_ico
};

pub const DEFAULT_SIZES: &str = "16,24,32,48,256";

#[derive(Error, Debug)]
pub enum PackError {
	#[error("Invalid size: \"{0}\"")]
	InvalidSize(String),
	#[error("Image error")]
	Image {
		#[from]
		source: image::ImageError,
	},
	#[error("Icon error")]
	Icon {
		#[from]
		source: IcoExportError,
	},
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
}

/// Parses a comma-separated list of edge lengths, each between 1 and 256
pub fn parse_sizes(sizes: &str) -> Result<Vec<u32>, PackError> {
	sizes.split(',')
		.map(|size| {
			let size = size.trim();
			match size.parse::<u32>() {
				Ok(n) if (1..=MAX_DIMENSION).contains(&n) => Ok(n),
				_ => Err(PackError::InvalidSize(size.to_string())),
			}
		})
		.collect()
}

/// Scales `img` to a `size`x`size` square and encodes it as 8-bit RGBA PNG
pub fn resize_png(img: &DynamicImage, size: u32) -> Result<Vec<u8>, PackError> {
	let resized = img.resize_exact(size, size, FilterType::Triangle).to_rgba8();

	let mut png = vec![];
	resized.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

	debug!("Resized to {}x{}: {} bytes", size, size, png.len());
	Ok(png)
}

/// Builds an icon file with one image per entry of `sizes`, in that order
pub fn pack_image(img: &DynamicImage, sizes: &[u32]) -> Result<Vec<u8>, PackError> {
	let icons = sizes.iter()
		.map(|size| resize_png(img, *size))
		.collect::<Result<Vec<_>, _>>()?;

	Ok(write_ico(&icons)?)
}

/// Reads the PNG at `input` and packs it with [`pack_image`]
pub fn pack(input: &Path, sizes: &[u32]) -> Result<Vec<u8>, PackError> {
	let data = fs::read(input)?;
	let img = image::load_from_memory_with_format(&data, ImageFormat::Png)?;
	info!("Loaded {}: {}x{}", input.display(), img.width(), img.height());

	pack_image(&img, sizes)
}

#[cfg(test)]
mod tests {
	use image::{
		Rgba,
		RgbaImage
	};

	use iconkit_textures_windows::Icon;

	use super::*;

	fn gradient(width: u32, height: u32) -> DynamicImage {
		DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
			Rgba([(x * 4) as u8, (y * 4) as u8, 128, 255])
		}))
	}

	#[test]
	fn test_parse_sizes() {
		assert_eq!(vec![16, 24, 32, 48, 256], parse_sizes(DEFAULT_SIZES).unwrap());
		assert_eq!(vec![1, 64], parse_sizes(" 1, 64 ").unwrap());
	}

	#[test]
	fn test_parse_sizes_invalid() {
		for sizes in ["", "16,,32", "abc", "0", "257", "-16", "16,4294967296"] {
			assert!(matches!(parse_sizes(sizes), Err(PackError::InvalidSize(_))), "{}", sizes);
		}

		match parse_sizes("16,x24") {
			Err(PackError::InvalidSize(size)) => assert_eq!("x24", size),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn test_resize_png() {
		let png = resize_png(&gradient(40, 30), 24).unwrap();
		let img = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();

		assert_eq!((24, 24), (img.width(), img.height()));
	}

	#[test]
	fn test_pack_image() {
		let ico = pack_image(&gradient(64, 64), &[16, 48, 256]).unwrap();
		let icon = Icon::read(&ico).unwrap();

		assert_eq!(3, icon.header.num_images);
		assert_eq!(ico.len(), icon.encoded_len());

		let sizes: Vec<(u8, u8, u16)> = icon.entries.iter().map(|e| (e.width, e.height, e.bpp)).collect();
		assert_eq!(vec![(16, 16, 32), (48, 48, 32), (0, 0, 32)], sizes);

		let img = image::load_from_memory_with_format(&icon.images[2], ImageFormat::Png).unwrap();
		assert_eq!((256, 256), (img.width(), img.height()));
	}

	#[test]
	fn test_pack_missing_file() {
		let result = pack(Path::new("test_data/does_not_exist.png"), &[16]);
		assert!(matches!(result, Err(PackError::IO { .. })));
	}
}
