//! Converts KTX2 textures into the KTX1 layout, keeping every mip level and cube face
//! byte for byte and carrying selected key/value entries (spherical harmonics by default).

pub mod config;
pub mod convert;
pub mod error;
pub mod header;
pub mod index;
pub mod ktx1;
pub mod kvd;
pub mod level;
pub mod reader;
pub mod texture;
pub mod vk_format;

#[cfg(test)]
pub(crate) mod test_util;

pub use config::{ConvertOptions, SPHERICAL_HARMONICS_KEY, Strictness};
pub use convert::{ConversionReport, Stage, convert, convert_bytes, convert_with};
pub use error::{ConvertError, Warning};
pub use ktx1::TextureKtx1;
pub use texture::TextureKtx2;
pub use vk_format::VkFormat;
