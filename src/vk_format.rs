#![allow(non_camel_case_types)]

pub const GL_UNSIGNED_BYTE: u32 = 0x1401;
pub const GL_FLOAT: u32 = 0x1406;
pub const GL_HALF_FLOAT: u32 = 0x140B;
pub const GL_UNSIGNED_INT_10F_11F_11F_REV: u32 = 0x8C3B;

pub const GL_RED: u32 = 0x1903;
pub const GL_RGB: u32 = 0x1907;
pub const GL_RGBA: u32 = 0x1908;
pub const GL_RG: u32 = 0x8227;

pub const GL_RGBA8: u32 = 0x8058;
pub const GL_SRGB8_ALPHA8: u32 = 0x8C43;
pub const GL_R16F: u32 = 0x822D;
pub const GL_RG16F: u32 = 0x822F;
pub const GL_RGBA16F: u32 = 0x881A;
pub const GL_RGBA32F: u32 = 0x8814;
pub const GL_R11F_G11F_B10F: u32 = 0x8C3A;

/// Uncompressed Vulkan formats that have a KTX1 equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum VkFormat {
    R8G8B8A8_UNORM = 37,
    R8G8B8A8_SRGB = 43,
    R16_SFLOAT = 76,
    R16G16_SFLOAT = 83,
    R16G16B16A16_SFLOAT = 97,
    R32G32B32A32_SFLOAT = 109,
    B10G11R11_UFLOAT_PACK32 = 122,
}

/// The five GL fields a KTX1 header uses to describe pixel data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GlFormat {
    pub gl_type: u32,
    pub gl_type_size: u32,
    pub gl_format: u32,
    pub gl_internal_format: u32,
    pub gl_base_internal_format: u32,
}

const fn gl(
    gl_type: u32,
    gl_type_size: u32,
    gl_format: u32,
    gl_internal_format: u32,
) -> GlFormat {
    GlFormat {
        gl_type,
        gl_type_size,
        gl_format,
        gl_internal_format,
        gl_base_internal_format: gl_format,
    }
}

impl VkFormat {
    pub const ALL: [VkFormat; 7] = [
        VkFormat::R8G8B8A8_UNORM,
        VkFormat::R8G8B8A8_SRGB,
        VkFormat::R16_SFLOAT,
        VkFormat::R16G16_SFLOAT,
        VkFormat::R16G16B16A16_SFLOAT,
        VkFormat::R32G32B32A32_SFLOAT,
        VkFormat::B10G11R11_UFLOAT_PACK32,
    ];

    /// Looks up a raw `vkFormat` header value. Formats without a KTX1 mapping give `None`.
    pub fn from_raw(value: u32) -> Option<VkFormat> {
        VkFormat::ALL.into_iter().find(|format| *format as u32 == value)
    }

    pub fn from_gl_internal_format(gl_internal_format: u32) -> Option<VkFormat> {
        VkFormat::ALL
            .into_iter()
            .find(|format| format.gl().gl_internal_format == gl_internal_format)
    }

    pub fn gl(self) -> GlFormat {
        match self {
            VkFormat::R8G8B8A8_UNORM => gl(GL_UNSIGNED_BYTE, 1, GL_RGBA, GL_RGBA8),
            VkFormat::R8G8B8A8_SRGB => gl(GL_UNSIGNED_BYTE, 1, GL_RGBA, GL_SRGB8_ALPHA8),
            VkFormat::R16_SFLOAT => gl(GL_HALF_FLOAT, 2, GL_RED, GL_R16F),
            VkFormat::R16G16_SFLOAT => gl(GL_HALF_FLOAT, 2, GL_RG, GL_RG16F),
            VkFormat::R16G16B16A16_SFLOAT => gl(GL_HALF_FLOAT, 2, GL_RGBA, GL_RGBA16F),
            VkFormat::R32G32B32A32_SFLOAT => gl(GL_FLOAT, 4, GL_RGBA, GL_RGBA32F),
            VkFormat::B10G11R11_UFLOAT_PACK32 => {
                gl(GL_UNSIGNED_INT_10F_11F_11F_REV, 4, GL_RGB, GL_R11F_G11F_B10F)
            }
        }
    }
}
