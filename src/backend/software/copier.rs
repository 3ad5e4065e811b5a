// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! CPU frame copies.

use crate::backend::software::texture::{SoftwareTexture, Texture};
use crate::blend::BlendMode;
use crate::copier::{CopyError, FrameCopier};
use crate::pixel_formats::sealed::{CPixelTrait, PixelFormat};

/**
Copies software textures pixel by pixel.

Sources are stretched onto the destination with nearest-neighbor sampling.  Blending is
done in [crate::pixel_formats::Float4] and narrowed back to the destination's format.
*/
#[derive(Debug, Default)]
pub struct SoftwareCopier {
    copies: usize,
}

impl SoftwareCopier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of copies performed so far.
    pub fn copies(&self) -> usize {
        self.copies
    }
}

fn blit<Format: PixelFormat>(
    destination: &mut Texture<Format>,
    blend: Option<BlendMode>,
    source: &Texture<Format>,
) {
    let to = (destination.width(), destination.height());
    let from = (source.width(), source.height());
    match blend {
        None | Some(BlendMode::Replace) if from == to => {
            destination
                .texture_data_mut()
                .copy_from_slice(source.texture_data());
        }
        _ => {
            let blend = blend.unwrap_or_default();
            for texel in destination.texels() {
                let s = source[texel.stretched(to, from)].to_float4();
                let d = destination[texel].to_float4();
                destination[texel] = Format::CPixel::from_float4(blend.apply(s, d));
            }
        }
    }
}

impl<Format: PixelFormat> FrameCopier<SoftwareTexture<Format>> for SoftwareCopier {
    fn copy(
        &mut self,
        destination: &SoftwareTexture<Format>,
        blend: Option<BlendMode>,
        source: &SoftwareTexture<Format>,
    ) -> Result<(), CopyError> {
        if destination.same_texture(source) {
            return Err(CopyError::SameTexture);
        }
        //stages run on one thread, so holding both locks can't deadlock
        let source = source.lock();
        let mut destination_guard = destination.lock();
        let empty_source = source.width() == 0 || source.height() == 0;
        let empty_destination = destination_guard.width() == 0 || destination_guard.height() == 0;
        if empty_source && !empty_destination {
            return Err(CopyError::Backend(format!(
                "can't stretch an empty source onto {}",
                destination.debug_name()
            )));
        }
        blit(&mut destination_guard, blend, &source);
        self.copies += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::software::texture::Texel;
    use crate::pixel_formats::{Float4, RGBA32Float, Unorm4};

    const GREY: Unorm4 = Unorm4 { r: 100, g: 100, b: 100, a: 255 };
    const DARK: Unorm4 = Unorm4 { r: 50, g: 20, b: 0, a: 255 };

    #[test]
    fn replace_overwrites() {
        let mut copier = SoftwareCopier::new();
        let source = SoftwareTexture::new_filled("source", 2, 2, GREY);
        let destination = SoftwareTexture::new_filled("destination", 2, 2, DARK);
        copier.copy(&destination, None, &source).unwrap();
        assert!(destination.snapshot().iter().all(|p| *p == GREY));
        assert_eq!(copier.copies(), 1);
    }

    #[test]
    fn blends_with_destination() {
        let mut copier = SoftwareCopier::new();
        let source = SoftwareTexture::new_filled("source", 2, 2, GREY);
        let destination = SoftwareTexture::new_filled("destination", 2, 2, DARK);
        copier
            .copy(&destination, Some(BlendMode::Additive), &source)
            .unwrap();
        assert_eq!(
            destination.read(Texel::ZERO),
            Unorm4 { r: 150, g: 120, b: 100, a: 255 }
        );
        copier
            .copy(&destination, Some(BlendMode::Maximum), &source)
            .unwrap();
        assert_eq!(
            destination.read(Texel::ZERO),
            Unorm4 { r: 150, g: 120, b: 100, a: 255 }
        );
    }

    #[test]
    fn stretches_smaller_source() {
        let mut copier = SoftwareCopier::new();
        let source = SoftwareTexture::from_texture(
            "source",
            Texture::<crate::pixel_formats::RGBA8UNorm>::new_with(2, 1, |t| {
                if t.x == 0 { GREY } else { DARK }
            }),
        );
        let destination = SoftwareTexture::new("destination", 4, 2);
        copier.copy(&destination, None, &source).unwrap();
        assert_eq!(destination.read(Texel { x: 1, y: 1 }), GREY);
        assert_eq!(destination.read(Texel { x: 2, y: 0 }), DARK);
        assert_eq!(destination.read(Texel { x: 3, y: 1 }), DARK);
    }

    #[test]
    fn copying_onto_itself_is_refused() {
        let mut copier = SoftwareCopier::new();
        let texture = SoftwareTexture::new("t", 2, 2);
        assert_eq!(
            copier.copy(&texture, None, &texture.clone()),
            Err(CopyError::SameTexture)
        );
        assert_eq!(copier.copies(), 0);
    }

    #[test]
    fn float_textures_blend_too() {
        let mut copier = SoftwareCopier::new();
        let half = Float4 { r: 0.5, g: 0.5, b: 0.5, a: 1.0 };
        let source = SoftwareTexture::from_texture("s", Texture::<RGBA32Float>::new(1, 1, half));
        let destination =
            SoftwareTexture::from_texture("d", Texture::<RGBA32Float>::new(1, 1, half));
        copier
            .copy(&destination, Some(BlendMode::Multiply), &source)
            .unwrap();
        assert_eq!(
            destination.read(Texel::ZERO),
            Float4 { r: 0.25, g: 0.25, b: 0.25, a: 1.0 }
        );
    }
}
