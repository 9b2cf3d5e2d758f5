//! TGA file codec, plain and run-length-encoded.
//!
//! Supports 8-bit grayscale, 24-bit BGR and 32-bit BGRA pixels, which map
//! directly onto the `Image` byte layout. Writes always emit the v2 footer
//! with a zeroed extension/developer area.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::Image;

/// Errors that can occur while reading or writing TGA files.
#[derive(Error, Debug)]
pub enum TgaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file ends before the declared pixel data")]
    Truncated,

    #[error("unsupported pixel depth: {0} bits")]
    UnsupportedDepth(u8),

    #[error("unsupported image type: {0}")]
    UnsupportedImageType(u8),

    #[error("run-length data exceeds the declared pixel count")]
    RleOverrun,
}

pub type TgaResult<T> = Result<T, TgaError>;

const HEADER_LEN: usize = 18;
const FOOTER_SIGNATURE: &[u8; 18] = b"TRUEVISION-XFILE.\0";

// Image type codes from the TGA spec.
const TYPE_TRUECOLOR: u8 = 2;
const TYPE_GRAYSCALE: u8 = 3;
const TYPE_RLE_TRUECOLOR: u8 = 10;
const TYPE_RLE_GRAYSCALE: u8 = 11;

/// Descriptor bit 5: rows are stored top-to-bottom.
const DESCRIPTOR_TOP_ORIGIN: u8 = 0x20;

/// Read a TGA file into an image. On error no image is produced, so a
/// failed load never leaves partial pixel data visible to the caller.
pub fn read(path: impl AsRef<Path>) -> TgaResult<Image> {
    let bytes = fs::read(path)?;
    decode(&bytes)
}

/// Decode TGA bytes into an image normalized to bottom-up row order.
pub fn decode(bytes: &[u8]) -> TgaResult<Image> {
    if bytes.len() < HEADER_LEN {
        return Err(TgaError::Truncated);
    }

    let id_length = bytes[0] as usize;
    let image_type = bytes[2];
    let width = u16::from_le_bytes([bytes[12], bytes[13]]) as u32;
    let height = u16::from_le_bytes([bytes[14], bytes[15]]) as u32;
    let depth = bytes[16];
    let descriptor = bytes[17];

    let channels = match depth {
        8 => 1u32,
        24 => 3,
        32 => 4,
        other => return Err(TgaError::UnsupportedDepth(other)),
    };

    let rle = match image_type {
        TYPE_TRUECOLOR | TYPE_GRAYSCALE => false,
        TYPE_RLE_TRUECOLOR | TYPE_RLE_GRAYSCALE => true,
        other => return Err(TgaError::UnsupportedImageType(other)),
    };

    let pixel_data = bytes
        .get(HEADER_LEN + id_length..)
        .ok_or(TgaError::Truncated)?;

    let data = if rle {
        decode_rle(pixel_data, width * height, channels as usize)?
    } else {
        let len = (width * height * channels) as usize;
        pixel_data
            .get(..len)
            .ok_or(TgaError::Truncated)?
            .to_vec()
    };

    let mut image = Image::from_bytes(width, height, channels, data);
    if descriptor & DESCRIPTOR_TOP_ORIGIN != 0 {
        image.flip_vertical();
    }

    log::debug!("decoded TGA: {}x{} @ {} bpp, rle={}", width, height, depth, rle);
    Ok(image)
}

/// Expand run-length packets into exactly `pixel_count` pixels.
fn decode_rle(bytes: &[u8], pixel_count: u32, channels: usize) -> TgaResult<Vec<u8>> {
    let total = pixel_count as usize * channels;
    let mut out = Vec::with_capacity(total);
    let mut at = 0;

    while out.len() < total {
        let header = *bytes.get(at).ok_or(TgaError::Truncated)?;
        at += 1;

        if header < 128 {
            // Raw packet: header + 1 literal pixels follow.
            let count = header as usize + 1;
            let len = count * channels;
            let literals = bytes.get(at..at + len).ok_or(TgaError::Truncated)?;
            if out.len() + len > total {
                return Err(TgaError::RleOverrun);
            }
            out.extend_from_slice(literals);
            at += len;
        } else {
            // Run packet: one pixel follows, repeated header - 127 times.
            let count = header as usize - 127;
            let pixel = bytes.get(at..at + channels).ok_or(TgaError::Truncated)?;
            if out.len() + count * channels > total {
                return Err(TgaError::RleOverrun);
            }
            for _ in 0..count {
                out.extend_from_slice(pixel);
            }
            at += channels;
        }
    }

    Ok(out)
}

/// Write an image as TGA, optionally run-length encoded.
pub fn write(image: &Image, path: impl AsRef<Path>, rle: bool) -> TgaResult<()> {
    fs::write(path, encode(image, rle))?;
    Ok(())
}

/// Encode an image as TGA bytes.
pub fn encode(image: &Image, rle: bool) -> Vec<u8> {
    let channels = image.channels();
    let image_type = match (channels, rle) {
        (1, false) => TYPE_GRAYSCALE,
        (1, true) => TYPE_RLE_GRAYSCALE,
        (_, false) => TYPE_TRUECOLOR,
        (_, true) => TYPE_RLE_TRUECOLOR,
    };
    // Bits 0-3 of the descriptor declare the alpha channel depth.
    let descriptor = if channels == 4 { 0x08 } else { 0x00 };

    let mut out = Vec::new();
    out.extend_from_slice(&[0, 0, image_type, 0, 0, 0, 0, 0]);
    out.extend_from_slice(&0u16.to_le_bytes()); // x origin
    out.extend_from_slice(&0u16.to_le_bytes()); // y origin
    out.extend_from_slice(&(image.width() as u16).to_le_bytes());
    out.extend_from_slice(&(image.height() as u16).to_le_bytes());
    out.push((channels * 8) as u8);
    out.push(descriptor);

    if rle {
        encode_rle(image, &mut out);
    } else {
        out.extend_from_slice(image.data());
    }

    // Zeroed extension and developer directory offsets, then the v2
    // footer signature.
    out.extend_from_slice(&[0u8; 8]);
    out.extend_from_slice(FOOTER_SIGNATURE);
    out
}

/// Run-length encode the pixel data. Packets never cross a row boundary
/// and never exceed the 128-pixel packet limit.
fn encode_rle(image: &Image, out: &mut Vec<u8>) {
    const MAX_PACKET: usize = 128;

    let channels = image.channels() as usize;
    let row_len = image.width() as usize * channels;
    let data = image.data();

    for row in data.chunks(row_len) {
        let pixels: Vec<&[u8]> = row.chunks(channels).collect();
        let mut at = 0;

        while at < pixels.len() {
            // Length of the run of identical pixels starting here.
            let mut run = 1;
            while at + run < pixels.len()
                && run < MAX_PACKET
                && pixels[at + run] == pixels[at]
            {
                run += 1;
            }

            if run > 1 {
                out.push((run - 1 + 128) as u8);
                out.extend_from_slice(pixels[at]);
                at += run;
            } else {
                // Gather literals until the next run of at least two.
                let mut literal = 1;
                while at + literal < pixels.len()
                    && literal < MAX_PACKET
                    && pixels[at + literal] != pixels[at + literal - 1]
                {
                    literal += 1;
                }
                // Leave the start of the next run for a run packet.
                if at + literal < pixels.len() && literal > 1 {
                    literal -= 1;
                }
                out.push((literal - 1) as u8);
                for pixel in &pixels[at..at + literal] {
                    out.extend_from_slice(pixel);
                }
                at += literal;
            }
        }
    }
}
