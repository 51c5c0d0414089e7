use byteorder::{
	LE,
	ReadBytesExt,
	WriteBytesExt
};

use log::{
	debug,
	error,
	info
};

use std::io;
use thiserror::Error;

#[cfg(feature = "export")]
use iconkit_textures_png::{
	self as png,
	HeaderView,
	PNGFormatError
};

pub const HEADER_SIZE: u32 = 6;
pub const DIRECTORY_ENTRY_SIZE: u32 = 16;
pub const NUM_COLOR_PLANES: u16 = 1;

/// Largest number of images a header can count
pub const MAX_IMAGES: usize = u16::MAX as usize;

/// Largest width or height of a single image, stored as 0
pub const MAX_DIMENSION: u32 = 256;

#[derive(Clone, Copy, Debug, PartialEq)]
#[repr(u16)]
pub enum ImageType {
	Icon = 1,
	Cursor,
}

impl ImageType {
	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R) -> Result<ImageType, IcoImportError>
	where
		R: ReadBytesExt,
	{
		let kind = buf.read_u16::<LE>()?;
		match kind {
			1 => Ok(ImageType::Icon),
			2 => Ok(ImageType::Cursor),
			_ => Err(IcoImportError::ImageType(kind)),
		}
	}

	#[cfg(feature = "export")]
	fn write<W>(self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u16::<LE>(self as u16)
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Header {
	reserved: u16, // must be 0
	pub kind: ImageType,
	pub num_images: u16,
}

impl Header {
	pub fn new(kind: ImageType, num_images: u16) -> Header {
		Header {
			reserved: 0,
			kind: kind,
			num_images: num_images,
		}
	}

	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R) -> Result<Header, IcoImportError>
	where
		R: ReadBytesExt,
	{
		let reserved = buf.read_u16::<LE>()?;
		if reserved != 0 {
			return Err(IcoImportError::Reserved(reserved));
		}

		Ok(Header {
			reserved: reserved,
			kind: ImageType::read(buf)?,
			num_images: buf.read_u16::<LE>()?,
		})
	}

	#[cfg(feature = "export")]
	fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u16::<LE>(self.reserved)?;
		self.kind.write(buf)?;
		buf.write_u16::<LE>(self.num_images)
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectoryEntry {
	pub width: u8, // 0 means 256
	pub height: u8, // 0 means 256
	pub palette_size: u8, // 0 for direct color images
	reserved: u8,
	pub color_planes: u16,
	pub bpp: u16,
	pub data_length: u32,
	pub data_offset: u32,
}

impl DirectoryEntry {
	/// Builds the entry for the validated image at `index` of the list, whose
	/// payload starts `offset` bytes into the file.
	#[cfg(feature = "export")]
	fn new(index: usize, view: &HeaderView, offset: u64) -> Result<DirectoryEntry, IcoExportError> {
		let (width, height) = view.dimensions();
		if width > MAX_DIMENSION || height > MAX_DIMENSION {
			error!("Image {} is {}x{}, the maximum is {}x{}", index, width, height,
				MAX_DIMENSION, MAX_DIMENSION);
			return Err(IcoExportError::DimensionTooLarge {
				index: index,
				width: width,
				height: height,
			});
		}

		let data_length = u32::try_from(view.bytes().len())
			.map_err(|_| IcoExportError::OffsetOverflow { index: index })?;
		let data_offset = u32::try_from(offset)
			.map_err(|_| IcoExportError::OffsetOverflow { index: index })?;

		Ok(DirectoryEntry {
			width: encode_dimension(width),
			height: encode_dimension(height),
			palette_size: 0,
			reserved: 0,
			color_planes: NUM_COLOR_PLANES,
			bpp: view.bits_per_pixel(),
			data_length: data_length,
			data_offset: data_offset,
		})
	}

	/// Width in pixels
	pub fn pixel_width(&self) -> u32 {
		decode_dimension(self.width)
	}

	/// Height in pixels
	pub fn pixel_height(&self) -> u32 {
		decode_dimension(self.height)
	}

	#[cfg(feature = "import")]
	fn read<R>(buf: &mut R) -> Result<DirectoryEntry, IcoImportError>
	where
		R: ReadBytesExt,
	{
		Ok(DirectoryEntry {
			width: buf.read_u8()?,
			height: buf.read_u8()?,
			palette_size: buf.read_u8()?,
			reserved: buf.read_u8()?,
			color_planes: buf.read_u16::<LE>()?,
			bpp: buf.read_u16::<LE>()?,
			data_length: buf.read_u32::<LE>()?,
			data_offset: buf.read_u32::<LE>()?,
		})
	}

	#[cfg(feature = "export")]
	fn write<W>(&self, buf: &mut W) -> io::Result<()>
	where
		W: WriteBytesExt,
	{
		buf.write_u8(self.width)?;
		buf.write_u8(self.height)?;
		buf.write_u8(self.palette_size)?;
		buf.write_u8(self.reserved)?;
		buf.write_u16::<LE>(self.color_planes)?;
		buf.write_u16::<LE>(self.bpp)?;
		buf.write_u32::<LE>(self.data_length)?;
		buf.write_u32::<LE>(self.data_offset)
	}
}

/// Expects `pixels` to be at most [`MAX_DIMENSION`]
#[cfg(feature = "export")]
fn encode_dimension(pixels: u32) -> u8 {
	if pixels == MAX_DIMENSION {
		0
	} else {
		pixels as u8
	}
}

fn decode_dimension(stored: u8) -> u32 {
	if stored == 0 {
		MAX_DIMENSION
	} else {
		stored as u32
	}
}

/// Validates every image and lays out the directory. Nothing is serialized
/// until this has succeeded for the whole list.
#[cfg(feature = "export")]
fn build_directory<P>(images: &[P]) -> Result<Vec<DirectoryEntry>, IcoExportError>
where
	P: AsRef<[u8]>,
{
	if images.len() > MAX_IMAGES {
		error!("{} images given, the maximum is {}", images.len(), MAX_IMAGES);
		return Err(IcoExportError::TooManyImages(images.len()));
	}

	let mut offset = HEADER_SIZE as u64 + DIRECTORY_ENTRY_SIZE as u64 * images.len() as u64;
	let mut entries = Vec::with_capacity(images.len());

	for (index, image) in images.iter().enumerate() {
		let view = png::validate(image.as_ref()).map_err(|cause| {
			error!("Image {} is not a valid PNG: {}", index, cause);
			IcoExportError::InvalidPayload {
				index: index,
				cause: cause,
			}
		})?;

		let entry = DirectoryEntry::new(index, &view, offset)?;
		debug!("Image {}: {}x{}, {} bpp, {} bytes at offset {}", index, entry.pixel_width(),
			entry.pixel_height(), entry.bpp, entry.data_length, entry.data_offset);

		offset += entry.data_length as u64;
		entries.push(entry);
	}

	Ok(entries)
}

#[cfg(feature = "export")]
fn write_parts<W, P>(header: &Header, entries: &[DirectoryEntry], images: &[P], buf: &mut W) -> io::Result<()>
where
	W: WriteBytesExt,
	P: AsRef<[u8]>,
{
	header.write(buf)?;

	for entry in entries.iter() {
		entry.write(buf)?;
	}

	for image in images.iter() {
		buf.write_all(image.as_ref())?;
	}

	Ok(())
}

fn encoded_len(entries: &[DirectoryEntry]) -> usize {
	let data: usize = entries.iter().map(|e| e.data_length as usize).sum();
	(HEADER_SIZE + DIRECTORY_ENTRY_SIZE * entries.len() as u32) as usize + data
}

/// Packs PNG images into an icon file, keeping their order.
///
/// Every image is checked before any output is produced, so an error never
/// leaves a partial file behind.
#[cfg(feature = "export")]
pub fn write_ico<P>(images: &[P]) -> Result<Vec<u8>, IcoExportError>
where
	P: AsRef<[u8]>,
{
	let entries = build_directory(images)?;
	let header = Header::new(ImageType::Icon, entries.len() as u16);

	let mut ico = Vec::with_capacity(encoded_len(&entries));
	write_parts(&header, &entries, images, &mut ico)?;

	info!("Packed {} images into {} bytes", entries.len(), ico.len());
	Ok(ico)
}

#[derive(Clone, Debug, PartialEq)]
pub struct Icon {
	pub header: Header,
	pub entries: Vec<DirectoryEntry>,
	pub images: Vec<Vec<u8>>,
}

impl Icon {
	#[cfg(feature = "export")]
	pub fn new(images: Vec<Vec<u8>>) -> Result<Icon, IcoExportError> {
		let entries = build_directory(&images)?;

		Ok(Icon {
			header: Header::new(ImageType::Icon, entries.len() as u16),
			entries: entries,
			images: images,
		})
	}

	/// Size of the serialized file in bytes
	pub fn encoded_len(&self) -> usize {
		encoded_len(&self.entries)
	}

	#[cfg(feature = "export")]
	pub fn write<W>(&self, buf: &mut W) -> Result<(), IcoExportError>
	where
		W: WriteBytesExt,
	{
		write_parts(&self.header, &self.entries, &self.images, buf)?;
		Ok(())
	}

	/// Parses a whole icon file, copying out each image at its recorded
	/// offset and length.
	#[cfg(feature = "import")]
	pub fn read(data: &[u8]) -> Result<Icon, IcoImportError> {
		let mut buf = data;
		let header = Header::read(&mut buf)?;

		let mut entries = Vec::with_capacity(header.num_images as usize);
		for _ in 0..header.num_images {
			entries.push(DirectoryEntry::read(&mut buf)?);
		}

		let mut images = Vec::with_capacity(entries.len());
		for (index, entry) in entries.iter().enumerate() {
			let start = entry.data_offset as usize;
			let image = start.checked_add(entry.data_length as usize)
				.and_then(|end| data.get(start..end))
				.ok_or(IcoImportError::OutOfBounds {
					index: index,
					offset: entry.data_offset,
					length: entry.data_length,
				})?;

			images.push(image.to_vec());
		}

		debug!("Read {:?} with {} images", header.kind, entries.len());

		Ok(Icon {
			header: header,
			entries: entries,
			images: images,
		})
	}
}

#[cfg(feature = "export")]
#[derive(Error, Debug)]
pub enum IcoExportError {
	#[error("Too many images: {0}, the maximum is 65535")]
	TooManyImages(usize),
	#[error("Image {index} is not a valid PNG")]
	InvalidPayload {
		index: usize,
		#[source]
		cause: PNGFormatError,
	},
	#[error("Image {index} is {width}x{height}, the maximum is 256x256")]
	DimensionTooLarge {
		index: usize,
		width: u32,
		height: u32,
	},
	#[error("Image {index} does not fit within 4 GiB")]
	OffsetOverflow {
		index: usize,
	},
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
}

#[cfg(feature = "import")]
#[derive(Error, Debug)]
pub enum IcoImportError {
	#[error("I/O error")]
	IO {
		#[from]
		source: io::Error,
	},
	#[error("Not an icon file: image type {0}")]
	ImageType(u16),
	#[error("Image {index} lies outside of the file: {length} bytes at offset {offset}")]
	OutOfBounds {
		index: usize,
		offset: u32,
		length: u32,
	},
	#[error("Not an icon file: reserved field is {0:X}")]
	Reserved(u16),
}
