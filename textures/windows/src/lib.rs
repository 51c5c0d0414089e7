//! Windows icon containers holding PNG-encoded images.
//!
//! An icon file is a 6 byte header, one 16 byte directory entry per image and
//! the image payloads, stored back to back in directory order. All integers
//! are little endian.

pub mod ico;

pub use ico::{
	DirectoryEntry,
	Header,
	Icon,
	ImageType
};

#[cfg(feature = "export")]
pub use ico::{
	IcoExportError,
	write_ico
};

#[cfg(feature = "import")]
pub use ico::IcoImportError;
