// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! CPU-resident textures.

[Texture] is a plain 2D array of pixels.  [SoftwareTexture] is the shared handle the
software backend passes around: cloning it clones the handle, not the pixels, so the
registry, the copier and the host can all name the same texture.

# Coordinate Systems

- Origin (0, 0) is at the top-left
- X increases to the right
- Y increases downward

# Example

```
use save_and_restore::backend::software::texture::{Texture, Texel};
use save_and_restore::pixel_formats::{RGBA8UNorm, Unorm4};

let mut texture = Texture::<RGBA8UNorm>::new(4, 4, Unorm4::ZERO);
let white = Unorm4 { r: 255, g: 255, b: 255, a: 255 };
texture[Texel { x: 1, y: 2 }] = white;
assert_eq!(texture[Texel { x: 1, y: 2 }], white);
```
*/

use crate::pixel_formats::{RGBA8UNorm, Unorm4};
use crate::pixel_formats::sealed::PixelFormat;
use std::ops::{Index, IndexMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A 2D array of pixels, stored row-major with the origin at the top-left.
#[derive(Debug)]
pub struct Texture<Format: PixelFormat> {
    data: Vec<Format::CPixel>,
    width: u16,
    height: u16,
}

/// Integer texture coordinates.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Texel {
    pub x: u16,
    pub y: u16,
}

impl Texel {
    /// The origin texel at coordinates (0, 0).
    pub const ZERO: Texel = Texel { x: 0, y: 0 };

    const fn vec_offset(&self, width: u16) -> usize {
        width as usize * self.y as usize + self.x as usize
    }

    /**
    Maps this texel in a texture of size `from` onto the nearest texel of a texture of size `to`.

    This is nearest-neighbor stretching, which is what the copier does when sizes differ.
    */
    pub const fn stretched(self, from: (u16, u16), to: (u16, u16)) -> Texel {
        Texel {
            x: (self.x as u32 * to.0 as u32 / from.0 as u32) as u16,
            y: (self.y as u32 * to.1 as u32 / from.1 as u32) as u16,
        }
    }
}

impl<Format: PixelFormat> Texture<Format> {
    /// Creates a texture with every pixel set to `initialize_element`.
    pub fn new(width: u16, height: u16, initialize_element: Format::CPixel) -> Self {
        Self {
            width,
            height,
            data: vec![initialize_element; width as usize * height as usize],
        }
    }

    /// Creates a texture whose pixels are computed by `initialize_with`.
    pub fn new_with<F: Fn(Texel) -> Format::CPixel>(
        width: u16,
        height: u16,
        initialize_with: F,
    ) -> Self {
        let mut vec = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                vec.push(initialize_with(Texel { x, y }))
            }
        }
        Self {
            width,
            height,
            data: vec,
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Pixels in row-major order (Y-major, X-minor).
    #[inline]
    pub fn texture_data(&self) -> &[Format::CPixel] {
        &self.data
    }

    #[inline]
    pub(crate) fn texture_data_mut(&mut self) -> &mut [Format::CPixel] {
        &mut self.data
    }

    pub fn fill(&mut self, pixel: Format::CPixel) {
        self.data.fill(pixel);
    }

    /// Iterates every texel, top row first.
    pub(crate) fn texels(&self) -> impl Iterator<Item = Texel> + use<Format> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Texel { x, y }))
    }
}

//derive would require Format: Clone
impl<Format: PixelFormat> Clone for Texture<Format> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

impl<Format: PixelFormat> Index<Texel> for Texture<Format> {
    type Output = Format::CPixel;

    fn index(&self, index: Texel) -> &Self::Output {
        assert!(index.x < self.width && index.y < self.height);
        &self.data[index.vec_offset(self.width)]
    }
}

impl<Format: PixelFormat> IndexMut<Texel> for Texture<Format> {
    fn index_mut(&mut self, index: Texel) -> &mut Self::Output {
        assert!(index.x < self.width && index.y < self.height);
        &mut self.data[index.vec_offset(self.width)]
    }
}

/**
A shared handle to a CPU texture.

Handles compare by identity with [SoftwareTexture::same_texture]; two handles to
equal-looking pixels are still different textures.
*/
#[derive(Debug)]
pub struct SoftwareTexture<Format: PixelFormat = RGBA8UNorm> {
    texture: Arc<Mutex<Texture<Format>>>,
    debug_name: Arc<str>,
}

impl<Format: PixelFormat> Clone for SoftwareTexture<Format> {
    fn clone(&self) -> Self {
        Self {
            texture: self.texture.clone(),
            debug_name: self.debug_name.clone(),
        }
    }
}

impl SoftwareTexture {
    /// A transparent black [RGBA8UNorm] texture.
    pub fn new(debug_name: &str, width: u16, height: u16) -> Self {
        Self::blank(debug_name, width, height)
    }

    pub fn new_filled(debug_name: &str, width: u16, height: u16, pixel: Unorm4) -> Self {
        Self::from_texture(debug_name, Texture::new(width, height, pixel))
    }
}

impl<Format: PixelFormat> SoftwareTexture<Format> {
    /// A texture of default pixels, in any format.
    pub fn blank(debug_name: &str, width: u16, height: u16) -> Self {
        Self::from_texture(debug_name, Texture::new(width, height, Format::CPixel::default()))
    }

    pub fn from_texture(debug_name: &str, texture: Texture<Format>) -> Self {
        Self {
            texture: Arc::new(Mutex::new(texture)),
            debug_name: debug_name.into(),
        }
    }

    pub fn debug_name(&self) -> &str {
        &self.debug_name
    }

    pub fn size(&self) -> (u16, u16) {
        let texture = self.lock();
        (texture.width(), texture.height())
    }

    /// Whether both handles refer to the same texture.
    pub fn same_texture(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.texture, &other.texture)
    }

    pub fn read(&self, texel: Texel) -> Format::CPixel {
        self.lock()[texel]
    }

    pub fn write(&self, texel: Texel, pixel: Format::CPixel) {
        self.lock()[texel] = pixel;
    }

    pub fn fill(&self, pixel: Format::CPixel) {
        self.lock().fill(pixel);
    }

    /// A copy of the current pixels, row-major.
    pub fn snapshot(&self) -> Vec<Format::CPixel> {
        self.lock().texture_data().to_vec()
    }

    /// Locks the texture for direct access.
    pub fn lock(&self) -> MutexGuard<'_, Texture<Format>> {
        //a panicking writer leaves pixels, not broken invariants
        self.texture.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
