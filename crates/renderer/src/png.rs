//! PNG encoding for RGBA composites.
//!
//! Two encodings are produced:
//! - **Indexed (color type 3)** when the image has at most 256 distinct
//!   RGBA values. Fully transparent fallbacks and flat index classes land
//!   here and encode to a few hundred bytes.
//! - **RGBA (color type 6)** otherwise.
//!
//! Input rows may be stored top-down or bottom-up; the encoder always
//! writes north-up scanlines.

use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::io::Write;

use crate::error::{RenderError, Result};

/// PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096;

/// Storage order of the rows handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOrder {
    /// Row 0 is the top of the image.
    TopDown,
    /// Row 0 is the bottom of the image.
    BottomUp,
}

type Palette = Vec<(u8, u8, u8, u8)>;

/// Encode RGBA pixels, choosing indexed output when the colors fit.
pub fn create_png_auto(pixels: &[u8], width: usize, height: usize, order: RowOrder) -> Result<Vec<u8>> {
    check_len(pixels.len(), width * height * 4)?;

    let extracted = if width * height >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette_sequential(pixels)
    };

    match extracted {
        Some((palette, indices)) => create_png_indexed(width, height, &palette, &indices, order),
        None => create_png(pixels, width, height, order),
    }
}

/// Encode RGBA pixels as color type 6.
pub fn create_png(pixels: &[u8], width: usize, height: usize, order: RowOrder) -> Result<Vec<u8>> {
    check_len(pixels.len(), width * height * 4)?;

    let mut png = Vec::with_capacity(pixels.len() / 2 + 64);
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));
    let idat = deflate_scanlines(pixels, width * 4, height, order)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// Encode palette indices as color type 3 with a tRNS chunk when any entry
/// is not fully opaque.
pub fn create_png_indexed(
    width: usize,
    height: usize,
    palette: &[(u8, u8, u8, u8)],
    indices: &[u8],
    order: RowOrder,
) -> Result<Vec<u8>> {
    check_len(indices.len(), width * height)?;
    if palette.is_empty() || palette.len() > MAX_PALETTE_SIZE {
        return Err(RenderError::Encode(format!(
            "palette has {} entries",
            palette.len()
        )));
    }

    let mut png = Vec::with_capacity(indices.len() / 2 + palette.len() * 4 + 64);
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = palette.iter().flat_map(|&(r, g, b, _)| [r, g, b]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if palette.iter().any(|&(_, _, _, a)| a < 255) {
        let trns: Vec<u8> = palette.iter().map(|&(_, _, _, a)| a).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(indices, width, height, order)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn check_len(got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(RenderError::Encode(format!(
            "buffer has {} bytes, expected {}",
            got, expected
        )));
    }
    Ok(())
}

fn ihdr(width: usize, height: usize, color_type: u8) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[0..4].copy_from_slice(&(width as u32).to_be_bytes());
    data[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type;
    // compression, filter and interlace methods stay 0
    data
}

/// Pack RGBA bytes into a u32 for faster hashing and comparison
#[inline(always)]
fn pack_color(px: &[u8]) -> u32 {
    u32::from_le_bytes([px[0], px[1], px[2], px[3]])
}

#[inline(always)]
fn unpack_color(packed: u32) -> (u8, u8, u8, u8) {
    let [r, g, b, a] = packed.to_le_bytes();
    (r, g, b, a)
}

fn extract_palette_sequential(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let packed = pack_color(px);
        let index = match lookup.get(&packed) {
            Some(&i) => i,
            None => {
                if palette.len() == MAX_PALETTE_SIZE {
                    return None;
                }
                let i = palette.len() as u8;
                palette.push(unpack_color(packed));
                lookup.insert(packed, i);
                i
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Two parallel passes: distinct colors per chunk, then index mapping once
/// the merged palette is known to fit.
fn extract_palette_parallel(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let pixels_per_chunk = (pixels.len() / 4 / rayon::current_num_threads()).max(256);

    let distinct: Vec<HashSet<u32>> = pixels
        .par_chunks(pixels_per_chunk * 4)
        .map(|chunk| {
            let mut seen = HashSet::with_capacity(MAX_PALETTE_SIZE);
            for px in chunk.chunks_exact(4) {
                seen.insert(pack_color(px));
                if seen.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            seen
        })
        .collect();

    // Sorted so the palette (and the encoded bytes) do not depend on hash order.
    let mut merged: Vec<u32> = distinct.into_iter().flatten().collect();
    merged.sort_unstable();
    merged.dedup();
    if merged.len() > MAX_PALETTE_SIZE {
        return None;
    }

    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(merged.len());
    let mut palette: Palette = Vec::with_capacity(merged.len());
    for packed in merged {
        lookup.insert(packed, palette.len() as u8);
        palette.push(unpack_color(packed));
    }

    let indices: Vec<u8> = pixels
        .par_chunks_exact(4)
        .map(|px| lookup.get(&pack_color(px)).copied().unwrap_or(0))
        .collect();

    Some((palette, indices))
}

/// Prefix each scanline with filter byte 0 (in north-up order) and deflate.
fn deflate_scanlines(data: &[u8], row_bytes: usize, height: usize, order: RowOrder) -> Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(height * (row_bytes + 1));
    for i in 0..height {
        let row = match order {
            RowOrder::TopDown => i,
            RowOrder::BottomUp => height - 1 - i,
        };
        raw.push(0);
        raw.extend_from_slice(&data[row * row_bytes..(row + 1) * row_bytes]);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&raw)
        .map_err(|e| RenderError::Encode(format!("IDAT compression failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| RenderError::Encode(format!("IDAT compression failed: {}", e)))
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_palette_simple() {
        let pixels = [
            255, 0, 0, 255, //
            0, 255, 0, 255, //
            0, 0, 255, 255, //
            255, 0, 0, 255,
        ];
        let (palette, indices) = extract_palette_sequential(&pixels).unwrap();
        assert_eq!(palette.len(), 3);
        assert_eq!(indices, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_palette_overflow() {
        let pixels: Vec<u8> = (0..300u32).flat_map(|i| [i as u8, (i >> 8) as u8, 0, 255]).collect();
        assert!(extract_palette_sequential(&pixels).is_none());
        assert!(extract_palette_parallel(&pixels).is_none());
    }

    #[test]
    fn test_parallel_matches_sequential_colors() {
        let mut pixels = Vec::with_capacity(128 * 128 * 4);
        for y in 0..128u32 {
            for x in 0..128u32 {
                let c = ((x / 4 + y / 4) % 40) as u8;
                pixels.extend_from_slice(&[c * 5, 100 + c, 200 - c, 255]);
            }
        }
        let (palette, indices) = extract_palette_parallel(&pixels).unwrap();
        assert_eq!(palette.len(), 40);
        for (i, px) in pixels.chunks_exact(4).enumerate() {
            let (r, g, b, a) = palette[indices[i] as usize];
            assert_eq!([r, g, b, a], [px[0], px[1], px[2], px[3]]);
        }
    }

    #[test]
    fn test_bottom_up_rows_are_flipped() {
        // Two rows: bottom row red, top row blue, stored bottom-up.
        let pixels = [255, 0, 0, 255, 0, 0, 255, 255];
        let flipped = create_png(&pixels, 1, 2, RowOrder::BottomUp).unwrap();
        let top_down = [0, 0, 255, 255, 255, 0, 0, 255];
        let straight = create_png(&top_down, 1, 2, RowOrder::TopDown).unwrap();
        assert_eq!(flipped, straight);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(create_png(&[0; 7], 1, 2, RowOrder::TopDown).is_err());
        assert!(create_png_indexed(2, 2, &[(0, 0, 0, 0)], &[0; 3], RowOrder::TopDown).is_err());
    }

    #[test]
    fn test_transparent_palette_writes_trns() {
        let png = create_png_auto(&[0u8; 16 * 4], 4, 4, RowOrder::TopDown).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);
        assert!(png.windows(4).any(|w| w == b"tRNS"));
    }
}
