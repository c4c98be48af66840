// SPDX-License-Identifier: MIT
//
// Copyright 2016-2025, Johann Tuffe.

//! Color engine: RGB and HSL colors, theme tints, interpolation and the
//! legacy indexed palette.

use std::fmt;

use crate::theme::ThemeColors;

/// A 24 bit RGB color
///
/// `Display` prints the upper case hex form without `#`, e.g. `FF0000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    /// Red channel (0-255)
    pub red: u8,
    /// Green channel (0-255)
    pub green: u8,
    /// Blue channel (0-255)
    pub blue: u8,
}

/// A color in the HSL space
///
/// `hue` is in degrees `[0, 360)`, `saturation` and `lightness` in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Hsl {
    /// Hue in degrees
    pub hue: f64,
    /// Saturation
    pub saturation: f64,
    /// Lightness
    pub lightness: f64,
}

impl Rgb {
    /// Black
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    /// White
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    /// Create a new color from its channels
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Rgb { red, green, blue }
    }

    /// Create a color from a `0xRRGGBB` integer
    pub const fn from_u32(rgb: u32) -> Self {
        Rgb::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    /// Parses `RRGGBB` or `AARRGGBB` hex, with an optional leading `#`.
    ///
    /// The alpha channel is ignored.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let hex = match hex.len() {
            6 => hex,
            8 => &hex[2..],
            _ => return None,
        };
        u32::from_str_radix(hex, 16).ok().map(Rgb::from_u32)
    }

    /// Converts to HSL
    pub fn to_hsl(self) -> Hsl {
        let r = self.red as f64 / 255.;
        let g = self.green as f64 / 255.;
        let b = self.blue as f64 / 255.;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let lightness = (max + min) / 2.;
        let d = max - min;
        if d == 0. {
            return Hsl {
                hue: 0.,
                saturation: 0.,
                lightness,
            };
        }
        let saturation = d / (1. - (2. * lightness - 1.).abs());
        let hue = if max == r {
            let h = 60. * ((g - b) / d % 6.);
            if b > g {
                h + 360.
            } else {
                h
            }
        } else if max == g {
            60. * ((b - r) / d + 2.)
        } else {
            60. * ((r - g) / d + 4.)
        };
        Hsl {
            hue,
            saturation,
            lightness,
        }
    }

    /// Converts back from HSL, rounding each channel to the nearest integer
    pub fn from_hsl(hsl: Hsl) -> Self {
        let Hsl {
            hue: h,
            saturation: s,
            lightness: l,
        } = hsl;
        let c = (1. - (2. * l - 1.).abs()) * s;
        let x = c * (1. - ((h / 60.) % 2. - 1.).abs());
        let m = l - c / 2.;
        let (r, g, b) = if h < 60. {
            (c, x, 0.)
        } else if h < 120. {
            (x, c, 0.)
        } else if h < 180. {
            (0., c, x)
        } else if h < 240. {
            (0., x, c)
        } else if h < 300. {
            (x, 0., c)
        } else {
            (c, 0., x)
        };
        let channel = |v: f64| ((v + m) * 255.).round().clamp(0., 255.) as u8;
        Rgb::new(channel(r), channel(g), channel(b))
    }

    /// Applies a tint in `[-1, 1]`, darkening for negative values and
    /// lightening for positive ones. A zero tint returns the color unchanged.
    pub fn tint(self, tint: f64) -> Self {
        if tint == 0. {
            return self;
        }
        let mut hsl = self.to_hsl();
        hsl.lightness = if tint < 0. {
            hsl.lightness * (1. + tint)
        } else {
            hsl.lightness * (1. - tint) + tint
        };
        Rgb::from_hsl(hsl)
    }

    /// Interpolates in HSL between `self` (at 0) and `other` (at 1),
    /// following the shorter way around the hue circle.
    pub fn interpolate(self, other: Rgb, fraction: f64) -> Self {
        if fraction.is_nan() || fraction <= 0. {
            return self;
        }
        if fraction >= 1. {
            return other;
        }
        let mut a = self.to_hsl();
        let mut b = other.to_hsl();
        if (a.hue - b.hue).abs() > 180. {
            if a.hue > b.hue {
                a.hue -= 360.;
            } else {
                b.hue -= 360.;
            }
        }
        let lerp = |x: f64, y: f64| x + (y - x) * fraction;
        let mut hue = lerp(a.hue, b.hue);
        if hue < 0. {
            hue += 360.;
        }
        Rgb::from_hsl(Hsl {
            hue,
            saturation: lerp(a.saturation, b.saturation),
            lightness: lerp(a.lightness, b.lightness),
        })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

/// Legacy indexed palette: 8 standard colors, the 56 classic colors and the
/// system foreground at 64.
const INDEXED: [u32; 65] = [
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF, // 0-7
    0x000000, 0xFFFFFF, 0xFF0000, 0x00FF00, 0x0000FF, 0xFFFF00, 0xFF00FF, 0x00FFFF, // 8-15
    0x800000, 0x008000, 0x000080, 0x808000, 0x800080, 0x008080, 0xC0C0C0, 0x808080, // 16-23
    0x9999FF, 0x993366, 0xFFFFCC, 0xCCFFFF, 0x660066, 0xFF8080, 0x0066CC, 0xCCCCFF, // 24-31
    0x000080, 0xFF00FF, 0xFFFF00, 0x00FFFF, 0x800080, 0x800000, 0x008080, 0x0000FF, // 32-39
    0x00CCFF, 0xCCFFFF, 0xCCFFCC, 0xFFFF99, 0x99CCFF, 0xFF99CC, 0xCC99FF, 0xFFCC99, // 40-47
    0x3366FF, 0x33CCCC, 0x99CC00, 0xFFCC00, 0xFF9900, 0xFF6600, 0x666699, 0x969696, // 48-55
    0x003366, 0x339966, 0x003300, 0x333300, 0x993300, 0x993366, 0x333399, 0x333333, // 56-63
    0x000000, // 64
];

/// Looks up a legacy palette index
pub fn indexed_color(index: u32) -> Option<Rgb> {
    INDEXED.get(index as usize).map(|c| Rgb::from_u32(*c))
}

/// An unresolved color reference as found in the style and rule parts
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ColorRef {
    /// Explicit color
    Rgb(Rgb),
    /// Theme slot (spreadsheet index order) with a tint
    Theme {
        /// Theme index
        index: u32,
        /// Tint, rounded to 2 decimals
        tint: f64,
    },
    /// Legacy palette index
    Indexed(u32),
    /// Automatic color
    #[default]
    Auto,
}

impl ColorRef {
    /// Builds a reference from the raw attributes of a color element.
    ///
    /// An explicit rgb wins over a theme, which wins over an indexed color.
    pub fn from_parts(
        rgb: Option<&str>,
        theme: Option<u32>,
        tint: Option<f64>,
        indexed: Option<u32>,
    ) -> Self {
        if let Some(rgb) = rgb.and_then(Rgb::from_hex) {
            ColorRef::Rgb(rgb)
        } else if let Some(index) = theme {
            let tint = tint.map_or(0., |t| (t * 100.).round() / 100.);
            ColorRef::Theme { index, tint }
        } else if let Some(i) = indexed {
            ColorRef::Indexed(i)
        } else {
            ColorRef::Auto
        }
    }

    /// Resolves the reference into a concrete color, `None` for automatic
    /// colors and undefined slots.
    pub fn resolve(&self, theme: &ThemeColors) -> Option<Rgb> {
        match *self {
            ColorRef::Rgb(c) => Some(c),
            ColorRef::Theme { index, tint } => theme.by_index(index).map(|c| c.tint(tint)),
            ColorRef::Indexed(i) => indexed_color(i),
            ColorRef::Auto => None,
        }
    }
}
