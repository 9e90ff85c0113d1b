//! LED colors and color buffers.

use std::fmt::{self, Display, Formatter};
use std::ops::Deref;
use std::str::FromStr;

use bytes::{BufMut, Bytes, BytesMut};

/// RGB color.
#[derive(Default, PartialEq, Eq, Debug, Copy, Clone)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl FromStr for Rgb {
    type Err = ();

    fn from_str(s: &str) -> Result<Rgb, ()> {
        let chars = if s.starts_with("0x") && s.len() == 8 {
            &s[2..]
        } else {
            return Err(());
        };

        match u32::from_str_radix(chars, 16) {
            Ok(mut color) => {
                let b = (color & 0xff) as u8;
                color >>= 8;
                let g = (color & 0xff) as u8;
                color >>= 8;
                let r = color as u8;
                Ok(Rgb { r, g, b })
            },
            Err(_) => Err(()),
        }
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Per-LED color buffer in the SDK's three bytes per LED layout.
#[derive(Default, PartialEq, Eq, Debug, Clone)]
pub struct ColorBuffer(Bytes);

impl ColorBuffer {
    /// Fill `led_count` LEDs with the same color.
    pub fn filled(led_count: usize, color: Rgb) -> Self {
        Self::from_colors(std::iter::repeat(color).take(led_count))
    }

    pub fn from_colors<I: IntoIterator<Item = Rgb>>(colors: I) -> Self {
        let colors = colors.into_iter();
        let mut buf = BytesMut::with_capacity(colors.size_hint().0 * 3);

        for color in colors {
            buf.put_u8(color.r);
            buf.put_u8(color.g);
            buf.put_u8(color.b);
        }

        Self(buf.freeze())
    }

    /// Number of LEDs covered by this buffer.
    pub fn led_count(&self) -> usize {
        self.0.len() / 3
    }

    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl Deref for ColorBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for ColorBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
