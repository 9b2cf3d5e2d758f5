//! Owned pixel buffers.

use crate::Color;

/// An owned byte image of `width * height * channels` bytes.
///
/// Rows are stored bottom-up (row 0 is the bottom of the picture), matching
/// the TGA default, and pixels are packed in B,G,R,A channel order. The
/// buffer length always equals `width * height * channels`; every mutating
/// operation maintains that invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    channels: u32,
    data: Vec<u8>,
}

impl Image {
    /// Create a zeroed image. `channels` is bytes per pixel: 1 (grayscale),
    /// 3 (BGR) or 4 (BGRA).
    pub fn new(width: u32, height: u32, channels: u32) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![0; (width * height * channels) as usize],
        }
    }

    /// Wrap an existing byte buffer. The buffer length must match the
    /// dimensions exactly; mismatches fall back to a zeroed buffer.
    pub fn from_bytes(width: u32, height: u32, channels: u32, data: Vec<u8>) -> Self {
        let expected = (width * height * channels) as usize;
        if data.len() != expected {
            log::warn!(
                "image buffer length {} does not match {}x{}x{}, zeroing",
                data.len(),
                width,
                height,
                channels
            );
            return Self::new(width, height, channels);
        }
        Self { width, height, channels, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per pixel.
    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        ((y * self.width + x) * self.channels) as usize
    }

    /// Pixel at (x, y). Out-of-bounds reads return the default color.
    pub fn get(&self, x: u32, y: u32) -> Color {
        if x >= self.width || y >= self.height {
            return Color::default();
        }
        let at = self.offset(x, y);
        Color::from_bytes(&self.data[at..at + self.channels as usize])
    }

    /// Set the pixel at (x, y); out-of-bounds writes are ignored.
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let at = self.offset(x, y);
        let channels = self.channels as usize;
        color.write_bytes(&mut self.data[at..at + channels]);
    }

    /// Mirror the image left-to-right in place.
    pub fn flip_horizontal(&mut self) {
        let channels = self.channels as usize;
        for y in 0..self.height {
            for x in 0..self.width / 2 {
                let a = self.offset(x, y);
                let b = self.offset(self.width - 1 - x, y);
                for c in 0..channels {
                    self.data.swap(a + c, b + c);
                }
            }
        }
    }

    /// Mirror the image top-to-bottom in place.
    pub fn flip_vertical(&mut self) {
        let row = (self.width * self.channels) as usize;
        for y in 0..self.height / 2 {
            let a = y as usize * row;
            let b = (self.height - 1 - y) as usize * row;
            for c in 0..row {
                self.data.swap(a + c, b + c);
            }
        }
    }

    /// Resample to a new size by box filtering: every destination pixel is
    /// the per-channel average of the source rectangle it covers.
    pub fn scaled(&self, new_width: u32, new_height: u32) -> Image {
        let mut out = Image::new(new_width, new_height, self.channels);
        if new_width == 0 || new_height == 0 || self.width == 0 || self.height == 0 {
            return out;
        }

        let channels = self.channels as usize;
        for y in 0..new_height {
            // Half-open source row range covered by this destination row.
            let sy0 = (y as u64 * self.height as u64 / new_height as u64) as u32;
            let sy1 = (((y + 1) as u64 * self.height as u64).div_ceil(new_height as u64)) as u32;
            for x in 0..new_width {
                let sx0 = (x as u64 * self.width as u64 / new_width as u64) as u32;
                let sx1 = (((x + 1) as u64 * self.width as u64).div_ceil(new_width as u64)) as u32;

                let mut sums = [0u64; 4];
                let mut count = 0u64;
                for sy in sy0..sy1 {
                    for sx in sx0..sx1 {
                        let at = self.offset(sx, sy);
                        for c in 0..channels {
                            sums[c] += self.data[at + c] as u64;
                        }
                        count += 1;
                    }
                }

                let at = out.offset(x, y);
                for c in 0..channels {
                    out.data[at + c] = (sums[c] / count) as u8;
                }
            }
        }
        out
    }

    /// Sample by UV coordinates in [0, 1] with wrap-around, (0, 0) at the
    /// bottom-left. Nearest-neighbor lookup.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        if self.width == 0 || self.height == 0 {
            return Color::default();
        }
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);
        let x = ((u * self.width as f32) as u32).min(self.width - 1);
        let y = ((v * self.height as f32) as u32).min(self.height - 1);
        self.get(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_length_invariant() {
        let img = Image::new(7, 3, 3);
        assert_eq!(img.data().len(), 7 * 3 * 3);

        let scaled = img.scaled(5, 2);
        assert_eq!(scaled.data().len(), 5 * 2 * 3);
    }

    #[test]
    fn test_get_set_round_trip() {
        let mut img = Image::new(4, 4, 4);
        let c = Color::rgba(10, 20, 30, 40);
        img.set(2, 1, c);

        assert_eq!(img.get(2, 1), c);
        assert_eq!(img.get(0, 0), Color::from_bytes(&[0, 0, 0, 0]));
    }

    #[test]
    fn test_out_of_bounds_access_is_harmless() {
        let mut img = Image::new(2, 2, 3);
        img.set(5, 5, Color::WHITE);
        assert_eq!(img.get(5, 5), Color::default());
    }

    #[test]
    fn test_flip_horizontal() {
        let mut img = Image::new(2, 1, 1);
        img.set(0, 0, Color::from_gray(1));
        img.set(1, 0, Color::from_gray(2));
        img.flip_horizontal();

        assert_eq!(img.get(0, 0).b, 2);
        assert_eq!(img.get(1, 0).b, 1);
    }

    #[test]
    fn test_flip_vertical() {
        let mut img = Image::new(1, 3, 1);
        img.set(0, 0, Color::from_gray(1));
        img.set(0, 1, Color::from_gray(2));
        img.set(0, 2, Color::from_gray(3));
        img.flip_vertical();

        assert_eq!(img.get(0, 0).b, 3);
        assert_eq!(img.get(0, 1).b, 2);
        assert_eq!(img.get(0, 2).b, 1);
    }

    #[test]
    fn test_scaled_downsamples_by_averaging() {
        let mut img = Image::new(2, 2, 1);
        img.set(0, 0, Color::from_gray(10));
        img.set(1, 0, Color::from_gray(20));
        img.set(0, 1, Color::from_gray(30));
        img.set(1, 1, Color::from_gray(40));

        let small = img.scaled(1, 1);
        assert_eq!(small.get(0, 0).b, 25);
    }

    #[test]
    fn test_scaled_upsamples_by_replication() {
        let mut img = Image::new(1, 1, 3);
        img.set(0, 0, Color::rgba(9, 8, 7, 255));

        let big = img.scaled(3, 3);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(big.get(x, y), Color::rgba(9, 8, 7, 255));
            }
        }
    }

    #[test]
    fn test_sample_wraps() {
        let mut img = Image::new(2, 2, 3);
        img.set(0, 0, Color::rgba(255, 0, 0, 255));

        assert_eq!(img.sample(0.0, 0.0), img.sample(1.0, 1.0));
        assert_eq!(img.sample(0.25, 0.25), Color::rgba(255, 0, 0, 255));
    }
}
