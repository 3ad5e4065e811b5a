// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Type-safe pixel format definitions for frame and buffer textures.
//!
//! Each pixel format encodes its channel layout and the concrete pixel type
//! stored in a texture of that format:
//!
//! - [`RGBA8UNorm`] - 4-channel 8-bit normalized, pixel type [`Unorm4`]
//! - [`RGBA32Float`] - 4-channel 32-bit float, pixel type [`Float4`]
//!
//! Blending always happens in [`Float4`]; every pixel type converts to and from it.
//!
//! # Examples
//!
//! ```
//! use save_and_restore::pixel_formats::{Float4, Unorm4};
//!
//! let red = Unorm4 { r: 255, g: 0, b: 0, a: 255 };
//! let float: Float4 = red.into();
//! assert_eq!(float.r, 1.0);
//! assert_eq!(Unorm4::from_floats(float), red);
//! ```

/*
Quick note on type design.  Pixel formats are zero-sized types rather than an enum
so that a texture's format is part of its type.  A buffer registry of RGBA8 textures
can't be handed a copier that writes float pixels.
 */

use crate::pixel_formats::sealed::{CPixelTrait, PixelFormat, ReprC};
use std::fmt::Debug;

/// Sealed traits for pixel format type safety.
///
/// Only the pixel formats defined in this crate can be used with texture APIs.
pub(crate) mod sealed {
    use crate::pixel_formats::Float4;
    use std::fmt::Debug;

    /// Core trait for pixel format types.
    pub trait PixelFormat: Debug + Send + Sync + 'static {
        /// Number of bytes per pixel for this format.
        const BYTES_PER_PIXEL: u8;

        /// The concrete pixel type with guaranteed C-compatible memory layout.
        type CPixel: Copy + Debug + Default + PartialEq + Send + Sync + ReprC + CPixelTrait;
    }

    /// Marker trait indicating C-compatible memory layout.
    ///
    /// # Safety
    ///
    /// Implementors must have no padding and no uninitialized bytes.
    pub unsafe trait ReprC {}

    /// Operations supported by pixel types.
    pub trait CPixelTrait {
        /// Widens the pixel to normalized floats.
        fn to_float4(self) -> Float4;
        /// Narrows normalized floats to this pixel type, clamping as needed.
        fn from_float4(float4: Float4) -> Self;
    }
}

/// Convert a slice of C-compatible pixels to raw bytes.
#[cfg_attr(not(feature = "backend_wgpu"), allow(dead_code))]
pub(crate) fn pixel_as_bytes<T: ReprC>(t: &[T]) -> &[u8] {
    //safe because we know that T is repr(C)
    //(we offloaded the safety check to the ReprC trait)
    unsafe { std::slice::from_raw_parts(t.as_ptr() as *const u8, std::mem::size_of_val(t)) }
}

/// 8-bit normalized unsigned integer pixel with RGBA channels.
///
/// Values are stored as 0-255 and interpreted as 0.0-1.0.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Unorm4 {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel
    pub a: u8,
}
unsafe impl ReprC for Unorm4 {}

impl Unorm4 {
    /// Transparent black.
    pub const ZERO: Unorm4 = Unorm4 {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /**
    Creates a pixel from normalized floats, rounding and clamping each channel.
    */
    pub fn from_floats(float4: Float4) -> Self {
        Unorm4 {
            r: (float4.r * 255.0).round().clamp(0.0, 255.0) as u8,
            g: (float4.g * 255.0).round().clamp(0.0, 255.0) as u8,
            b: (float4.b * 255.0).round().clamp(0.0, 255.0) as u8,
            a: (float4.a * 255.0).round().clamp(0.0, 255.0) as u8,
        }
    }
}

impl From<Unorm4> for Float4 {
    fn from(c: Unorm4) -> Self {
        Float4 {
            r: c.r as f32 / 255.0,
            g: c.g as f32 / 255.0,
            b: c.b as f32 / 255.0,
            a: c.a as f32 / 255.0,
        }
    }
}

impl CPixelTrait for Unorm4 {
    fn to_float4(self) -> Float4 {
        self.into()
    }
    fn from_float4(float4: Float4) -> Self {
        Unorm4::from_floats(float4)
    }
}

/// 4-channel 8-bit normalized format.
///
/// This is the format of frame and buffer textures unless a backend is asked otherwise.
#[derive(Debug, Clone)]
pub struct RGBA8UNorm;
impl PixelFormat for RGBA8UNorm {
    const BYTES_PER_PIXEL: u8 = 4;
    type CPixel = Unorm4;
}

/// Four-channel floating point pixel.
///
/// Channels are nominally in 0.0-1.0, but float formats may hold values outside it.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Float4 {
    /// Red channel
    pub r: f32,
    /// Green channel
    pub g: f32,
    /// Blue channel
    pub b: f32,
    /// Alpha channel
    pub a: f32,
}
unsafe impl ReprC for Float4 {}

impl Float4 {
    /// Applies `f` to each channel.
    pub fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Float4 {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
            a: f(self.a),
        }
    }

    /// Combines two pixels channel by channel.
    pub fn zip_with(self, other: Float4, f: impl Fn(f32, f32) -> f32) -> Self {
        Float4 {
            r: f(self.r, other.r),
            g: f(self.g, other.g),
            b: f(self.b, other.b),
            a: f(self.a, other.a),
        }
    }
}

impl CPixelTrait for Float4 {
    fn to_float4(self) -> Float4 {
        self
    }
    fn from_float4(float4: Float4) -> Self {
        float4
    }
}

/// 4-channel 32-bit float format. Total size is 16 bytes per pixel.
///
/// Useful for buffers that must survive repeated additive restores without
/// quantization.
#[derive(Debug, Clone)]
pub struct RGBA32Float;
impl PixelFormat for RGBA32Float {
    const BYTES_PER_PIXEL: u8 = 16;
    type CPixel = Float4;
}
