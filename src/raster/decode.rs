use std::io::Read as _;

use crate::{
    container::header::{PixelFormat, SampleDepth},
    container::records::ChannelData,
    foundation::error::{RasterError, RasterResult},
    raster::buffer::buffer_len,
};

const RAW: u16 = 0;
const RLE: u16 = 1;
const ZIP: u16 = 2;
const ZIP_PREDICTED: u16 = 3;

/// Largest output a single PackBits packet can produce from two stored bytes.
const PACKBITS_MAX_RUN: usize = 128;

/// Upper bound on the deflate expansion ratio.
const DEFLATE_MAX_RATIO: usize = 1032;

/// Decode one channel into a `width * height` plane of 8-bit samples.
///
/// The stored size is checked against the declared dimensions before anything is allocated, so a
/// small file cannot claim a huge plane.
pub(crate) fn decode_channel(
    channel: &ChannelData,
    width: u32,
    height: u32,
    format: PixelFormat,
) -> RasterResult<Vec<u8>> {
    if !matches!(channel.compression, RAW | RLE | ZIP | ZIP_PREDICTED) {
        return Err(RasterError::UnsupportedCompression(channel.compression));
    }
    let bps = format.depth.bytes();
    let plane_len = buffer_len(width, height, 1)?;
    if plane_len == 0 {
        return Ok(Vec::new());
    }
    let row_len = width as usize * bps;
    let expected = plane_len * bps;
    let corrupt = |msg: String| RasterError::corrupt(format!("channel {}: {msg}", channel.id));

    let stored = match channel.compression {
        RAW => {
            if channel.bytes.len() != expected {
                return Err(corrupt(format!(
                    "raw data is {} bytes, expected {expected}",
                    channel.bytes.len()
                )));
            }
            channel.bytes.clone()
        }
        RLE => {
            let long_counts = format.version.is_large();
            let (counts, body) =
                rle_row_counts(&channel.bytes, row_len, height as usize, long_counts).map_err(corrupt)?;
            unpack_rle(&counts, body, row_len).map_err(corrupt)?
        }
        ZIP => inflate(&channel.bytes, expected).map_err(corrupt)?,
        _ => {
            let mut data = inflate(&channel.bytes, expected).map_err(corrupt)?;
            undo_prediction(&mut data, width as usize, format.depth);
            data
        }
    };

    Ok(to_u8_samples(stored, format.depth))
}

/// Read the per-row byte counts and check they can plausibly expand to `row_len` bytes each.
fn rle_row_counts(
    bytes: &[u8],
    row_len: usize,
    rows: usize,
    long_counts: bool,
) -> Result<(Vec<usize>, &[u8]), String> {
    let count_width = if long_counts { 4 } else { 2 };
    let table_len = rows
        .checked_mul(count_width)
        .filter(|&n| n <= bytes.len())
        .ok_or_else(|| format!("rle row table needs {rows} rows, data is {} bytes", bytes.len()))?;
    let (table, body) = bytes.split_at(table_len);

    let min_row = row_len.div_ceil(PACKBITS_MAX_RUN) * 2;
    let mut total = 0usize;
    let mut counts = Vec::with_capacity(rows);
    for (row, count) in table.chunks_exact(count_width).enumerate() {
        let n = if long_counts {
            u32::from_be_bytes([count[0], count[1], count[2], count[3]]) as usize
        } else {
            usize::from(u16::from_be_bytes([count[0], count[1]]))
        };
        if n < min_row {
            return Err(format!(
                "rle row {row} declares {n} bytes, cannot expand to {row_len}"
            ));
        }
        total = total.saturating_add(n);
        counts.push(n);
    }
    if total > body.len() {
        return Err(format!(
            "rle rows declare {total} bytes, {} present",
            body.len()
        ));
    }
    Ok((counts, body))
}

/// PackBits decoding of rows whose byte counts are already validated.
fn unpack_rle(counts: &[usize], mut body: &[u8], row_len: usize) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(row_len * counts.len());
    for (row, &n) in counts.iter().enumerate() {
        let (packed, rest) = body.split_at(n);
        body = rest;

        let start = out.len();
        packbits_into(packed, row_len, &mut out).map_err(|msg| format!("rle row {row}: {msg}"))?;
        if out.len() - start != row_len {
            return Err(format!(
                "rle row {row} decoded to {} bytes, expected {row_len}",
                out.len() - start
            ));
        }
    }
    Ok(out)
}

fn packbits_into(mut packed: &[u8], limit: usize, out: &mut Vec<u8>) -> Result<(), String> {
    let start = out.len();
    while let Some((&header, rest)) = packed.split_first() {
        packed = rest;
        let header = header as i8;
        if header >= 0 {
            let n = header as usize + 1;
            if n > packed.len() {
                return Err("literal run past end of row data".to_string());
            }
            out.extend_from_slice(&packed[..n]);
            packed = &packed[n..];
        } else if header != -128 {
            let n = 1 + usize::from(header.unsigned_abs());
            let (&value, rest) = packed
                .split_first()
                .ok_or_else(|| "repeat run past end of row data".to_string())?;
            packed = rest;
            out.resize(out.len() + n, value);
        }
        if out.len() - start > limit {
            return Err(format!("row overflows {limit} bytes"));
        }
    }
    Ok(())
}

fn inflate(bytes: &[u8], expected: usize) -> Result<Vec<u8>, String> {
    if expected > bytes.len().saturating_mul(DEFLATE_MAX_RATIO) {
        return Err(format!(
            "zip stream of {} bytes cannot inflate to {expected}",
            bytes.len()
        ));
    }
    let mut out = Vec::new();
    flate2::read::ZlibDecoder::new(bytes)
        .take(expected as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| format!("zip stream: {e}"))?;
    if out.len() != expected {
        return Err(format!(
            "zip stream inflated to {} bytes, expected {expected}",
            out.len()
        ));
    }
    Ok(out)
}

/// Reverse the per-row delta encoding of compression mode 3.
fn undo_prediction(data: &mut [u8], width: usize, depth: SampleDepth) {
    let row_len = width * depth.bytes();
    if row_len == 0 {
        return;
    }
    for row in data.chunks_exact_mut(row_len) {
        match depth {
            SampleDepth::Eight => {
                for i in 1..row.len() {
                    row[i] = row[i].wrapping_add(row[i - 1]);
                }
            }
            SampleDepth::Sixteen => {
                let mut prev = 0u16;
                for px in row.chunks_exact_mut(2) {
                    let v = u16::from_be_bytes([px[0], px[1]]).wrapping_add(prev);
                    px.copy_from_slice(&v.to_be_bytes());
                    prev = v;
                }
            }
            SampleDepth::ThirtyTwo => {
                // Byte-wise delta over the whole row, then the row is stored as four byte planes.
                for i in 1..row.len() {
                    row[i] = row[i].wrapping_add(row[i - 1]);
                }
                let planar = row.to_vec();
                for x in 0..width {
                    for b in 0..4 {
                        row[x * 4 + b] = planar[b * width + x];
                    }
                }
            }
        }
    }
}

fn to_u8_samples(stored: Vec<u8>, depth: SampleDepth) -> Vec<u8> {
    match depth {
        SampleDepth::Eight => stored,
        SampleDepth::Sixteen => stored.chunks_exact(2).map(|s| s[0]).collect(),
        SampleDepth::ThirtyTwo => stored
            .chunks_exact(4)
            .map(|s| {
                let v = f32::from_be_bytes([s[0], s[1], s[2], s[3]]);
                let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
                (v * 255.0).round() as u8
            })
            .collect(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/decode.rs"]
mod tests;
