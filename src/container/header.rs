use crate::{
    container::reader::ByteReader,
    foundation::core::ColorModel,
    foundation::error::{ParseError, ParseResult},
};

const SIGNATURE: &[u8; 4] = b"8BPS";

/// Container flavor; the large-document variant widens several length fields to 64 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PsdVersion {
    /// Version 1, canvases up to 30 000 px per side.
    Psd,
    /// Version 2 ("large document"), canvases up to 300 000 px per side.
    Psb,
}

impl PsdVersion {
    /// `true` when section and channel lengths are 8 bytes wide.
    pub fn is_large(self) -> bool {
        matches!(self, Self::Psb)
    }

    /// Largest legal canvas or layer side in pixels.
    pub fn max_dimension(self) -> u32 {
        match self {
            Self::Psd => 30_000,
            Self::Psb => 300_000,
        }
    }
}

/// Document color mode as declared in the header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    /// 1-bit bitmap.
    Bitmap,
    /// Single gray channel.
    Grayscale,
    /// Palette-based color.
    Indexed,
    /// Red, green, blue.
    Rgb,
    /// Cyan, magenta, yellow, black.
    Cmyk,
    /// Arbitrary spot channels.
    Multichannel,
    /// Gray channel rendered through duotone curves.
    Duotone,
    /// CIE L*a*b*.
    Lab,
}

impl ColorMode {
    fn from_code(code: u16) -> ParseResult<Self> {
        Ok(match code {
            0 => Self::Bitmap,
            1 => Self::Grayscale,
            2 => Self::Indexed,
            3 => Self::Rgb,
            4 => Self::Cmyk,
            7 => Self::Multichannel,
            8 => Self::Duotone,
            9 => Self::Lab,
            other => {
                return Err(ParseError::unsupported(format!(
                    "unknown color mode {other}"
                )));
            }
        })
    }
}

/// Bytes per channel sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleDepth {
    /// 8-bit unsigned.
    Eight,
    /// 16-bit unsigned, big-endian.
    Sixteen,
    /// 32-bit float, big-endian.
    ThirtyTwo,
}

impl SampleDepth {
    /// Width of one sample in bytes.
    pub fn bytes(self) -> usize {
        match self {
            Self::Eight => 1,
            Self::Sixteen => 2,
            Self::ThirtyTwo => 4,
        }
    }
}

/// Everything a rasterizer needs to interpret raw channel bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelFormat {
    /// Color model of the decoded samples.
    pub model: ColorModel,
    /// Stored sample width.
    pub depth: SampleDepth,
    /// Container flavor (drives RLE row-count width).
    pub version: PsdVersion,
}

/// Fixed-size file header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FileHeader {
    /// Container flavor.
    pub version: PsdVersion,
    /// Channel count of the merged image, alpha channels included.
    pub channels: u16,
    /// Canvas height in pixels.
    pub height: u32,
    /// Canvas width in pixels.
    pub width: u32,
    /// Bits per channel: 1, 8, 16 or 32.
    pub depth: u16,
    /// Document color mode.
    pub color_mode: ColorMode,
}

impl FileHeader {
    /// Resolve the sample format layers of this document are rendered in.
    ///
    /// Only modes that can carry layers are accepted; bitmap, indexed and multichannel documents
    /// are always flat.
    pub fn pixel_format(&self) -> ParseResult<PixelFormat> {
        let model = match self.color_mode {
            ColorMode::Grayscale | ColorMode::Duotone => ColorModel::Gray,
            ColorMode::Rgb => ColorModel::Rgb,
            ColorMode::Cmyk => ColorModel::Cmyk,
            ColorMode::Lab => ColorModel::Lab,
            other => {
                return Err(ParseError::unsupported(format!(
                    "layers in {other:?} documents"
                )));
            }
        };
        let depth = match self.depth {
            8 => SampleDepth::Eight,
            16 => SampleDepth::Sixteen,
            32 => SampleDepth::ThirtyTwo,
            other => {
                return Err(ParseError::unsupported(format!("{other}-bit layers")));
            }
        };
        Ok(PixelFormat {
            model,
            depth,
            version: self.version,
        })
    }
}

pub(crate) fn read_header(r: &mut ByteReader<'_>) -> ParseResult<FileHeader> {
    let sig = r.sig("file signature")?;
    if &sig != SIGNATURE {
        return Err(ParseError::unsupported(format!(
            "bad signature {:?}",
            String::from_utf8_lossy(&sig)
        )));
    }

    let version = match r.u16("file version")? {
        1 => PsdVersion::Psd,
        2 => PsdVersion::Psb,
        other => {
            return Err(ParseError::unsupported(format!("file version {other}")));
        }
    };
    r.skip(6, "header reserved bytes")?;

    let channels = r.u16("channel count")?;
    if !(1..=56).contains(&channels) {
        return Err(ParseError::malformed(format!(
            "channel count {channels} outside 1..=56"
        )));
    }

    let height = r.u32("canvas height")?;
    let width = r.u32("canvas width")?;
    let max = version.max_dimension();
    if !(1..=max).contains(&height) || !(1..=max).contains(&width) {
        return Err(ParseError::malformed(format!(
            "canvas {width}x{height} outside 1..={max}"
        )));
    }

    let depth = r.u16("bit depth")?;
    if ![1, 8, 16, 32].contains(&depth) {
        return Err(ParseError::unsupported(format!("bit depth {depth}")));
    }

    let color_mode = ColorMode::from_code(r.u16("color mode")?)?;

    Ok(FileHeader {
        version,
        channels,
        height,
        width,
        depth,
        color_mode,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/container/header.rs"]
mod tests;
