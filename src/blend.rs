// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Blend functions used when a stored frame is composited onto the active target.

The set is closed: option strings are parsed into a [BlendMode] when the stage is
configured, and unknown names are rejected there.

| mode           | per channel (s = source, d = destination)           |
|----------------|-----------------------------------------------------|
| `Replace`      | s                                                   |
| `Maximum`      | max(s, d)                                           |
| `Average`      | (s + d) / 2                                         |
| `Additive`     | min(s + d, 1)                                       |
| `Subtractive1` | max(d - s, 0)                                       |
| `Subtractive2` | max(s - d, 0)                                       |
| `Multiply`     | s * d                                               |
| `Multiply2`    | min(2 * s * d, 1)                                   |
| `Alpha`        | s * sa + d * (1 - sa), alpha channel sa + da * (1 - sa) |

Except for `Alpha`, the alpha channel follows the color formula.
*/

use crate::pixel_formats::Float4;
use crate::stage::config::ConfigError;
use std::fmt::Display;
use std::str::FromStr;

/**
How a restored frame is composited onto its destination.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// The source overwrites the destination.
    #[default]
    Replace,
    /// Per-channel maximum.
    Maximum,
    /// Per-channel mean.
    Average,
    /// Saturating sum.
    Additive,
    /// Destination minus source.
    Subtractive1,
    /// Source minus destination.
    Subtractive2,
    /// Per-channel product.
    Multiply,
    /// Per-channel product, doubled.
    Multiply2,
    /// Source-over, weighted by the source alpha.
    Alpha,
}

impl BlendMode {
    /// Every supported mode, in the order names are reported in errors.
    pub const ALL: [BlendMode; 9] = [
        BlendMode::Replace,
        BlendMode::Maximum,
        BlendMode::Average,
        BlendMode::Additive,
        BlendMode::Subtractive1,
        BlendMode::Subtractive2,
        BlendMode::Multiply,
        BlendMode::Multiply2,
        BlendMode::Alpha,
    ];

    /// The canonical option name.
    pub const fn name(self) -> &'static str {
        match self {
            BlendMode::Replace => "Replace",
            BlendMode::Maximum => "Maximum",
            BlendMode::Average => "Average",
            BlendMode::Additive => "Additive",
            BlendMode::Subtractive1 => "Subtractive1",
            BlendMode::Subtractive2 => "Subtractive2",
            BlendMode::Multiply => "Multiply",
            BlendMode::Multiply2 => "Multiply2",
            BlendMode::Alpha => "Alpha",
        }
    }

    /**
    Composites `source` onto `destination`.

    Results are clamped to 0-1, which is what an 8-bit normalized render target does
    on the GPU.
    */
    pub fn apply(self, source: Float4, destination: Float4) -> Float4 {
        let blended = match self {
            BlendMode::Replace => source,
            BlendMode::Maximum => source.zip_with(destination, f32::max),
            BlendMode::Average => source.zip_with(destination, |s, d| (s + d) * 0.5),
            BlendMode::Additive => source.zip_with(destination, |s, d| s + d),
            BlendMode::Subtractive1 => source.zip_with(destination, |s, d| d - s),
            BlendMode::Subtractive2 => source.zip_with(destination, |s, d| s - d),
            BlendMode::Multiply => source.zip_with(destination, |s, d| s * d),
            BlendMode::Multiply2 => source.zip_with(destination, |s, d| 2.0 * s * d),
            BlendMode::Alpha => {
                let sa = source.a;
                let color = source.zip_with(destination, |s, d| s * sa + d * (1.0 - sa));
                Float4 {
                    a: sa + destination.a * (1.0 - sa),
                    ..color
                }
            }
        };
        blended.map(|c| c.clamp(0.0, 1.0))
    }

    pub(crate) fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|m| m.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Display for BlendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BlendMode {
    type Err = ConfigError;

    /// Names match case-insensitively, so preset spellings like `ADDITIVE` parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownBlendMode {
                value: s.to_string(),
            })
    }
}
