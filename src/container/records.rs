use crate::{
    container::header::{FileHeader, PsdVersion},
    container::reader::ByteReader,
    foundation::core::BBox,
    foundation::error::{ParseError, ParseResult},
};

/// Tagged-block keys whose length field is 8 bytes wide in PSB files.
const LONG_KEYS: [[u8; 4]; 13] = [
    *b"LMsk", *b"Lr16", *b"Lr32", *b"Layr", *b"Mt16", *b"Mt32", *b"Mtrn", *b"Alph", *b"FMsk",
    *b"lnk2", *b"FEid", *b"FXid", *b"PxSD",
];

/// Global tagged blocks that carry the layer info of 16/32-bit documents.
const LAYER_INFO_KEYS: [[u8; 4]; 3] = [*b"Lr16", *b"Lr32", *b"Layr"];

/// Adjustment and fill layer keys.
const ADJUSTMENT_KEYS: [[u8; 4]; 20] = [
    *b"SoCo", *b"GdFl", *b"PtFl", *b"brit", *b"levl", *b"curv", *b"expA", *b"vibA", *b"hue ",
    *b"hue2", *b"blnc", *b"blwh", *b"phfl", *b"mixr", *b"clrL", *b"nvrt", *b"post", *b"thrs",
    *b"grdm", *b"selc",
];

const MAX_LAYER_CHANNELS: u16 = 56;

/// One channel's bytes, still compressed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ChannelData {
    /// 0.. color, -1 transparency, -2 user mask, -3 real user mask.
    pub(crate) id: i16,
    pub(crate) compression: u16,
    pub(crate) bytes: Vec<u8>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct MaskInfo {
    pub(crate) rect: BBox,
    pub(crate) default_color: u8,
    pub(crate) disabled: bool,
}

/// Section divider setting (`lsct`/`lsdk`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Divider {
    Layer,
    OpenGroup,
    ClosedGroup,
    GroupEnd,
    Other(u32),
}

impl Divider {
    fn from_code(code: u32) -> Self {
        match code {
            0 => Self::Layer,
            1 => Self::OpenGroup,
            2 => Self::ClosedGroup,
            3 => Self::GroupEnd,
            other => Self::Other(other),
        }
    }
}

/// A layer record with its channel data attached, in file (bottom-to-top) order.
#[derive(Clone, Debug)]
pub(crate) struct LayerRecord {
    pub(crate) rect: BBox,
    pub(crate) blend_key: [u8; 4],
    pub(crate) opacity: u8,
    pub(crate) clipping: bool,
    pub(crate) hidden: bool,
    pub(crate) mask: Option<MaskInfo>,
    pub(crate) name: String,
    pub(crate) divider: Option<Divider>,
    pub(crate) adjustment: Option<[u8; 4]>,
    pub(crate) channels: Vec<ChannelData>,
}

struct TaggedBlock<'a> {
    key: [u8; 4],
    data: ByteReader<'a>,
}

fn read_tagged_block<'a>(
    r: &mut ByteReader<'a>,
    version: PsdVersion,
) -> ParseResult<TaggedBlock<'a>> {
    let sig = r.sig("tagged block signature")?;
    if &sig != b"8BIM" && &sig != b"8B64" {
        return Err(ParseError::malformed(format!(
            "bad tagged block signature {:?} at offset {}",
            String::from_utf8_lossy(&sig),
            r.position() - 4
        )));
    }
    let key = r.sig("tagged block key")?;
    let long = version.is_large() && LONG_KEYS.contains(&key);
    let data = r.section(long, "tagged block data")?;
    Ok(TaggedBlock { key, data })
}

/// Parse the layer & mask information section into flat layer records.
pub(crate) fn read_layer_and_mask(
    r: &mut ByteReader<'_>,
    header: &FileHeader,
) -> ParseResult<Vec<LayerRecord>> {
    let long = header.version.is_large();
    let mut section = r.section(long, "layer and mask information")?;
    if section.is_empty() {
        return Ok(Vec::new());
    }

    let info = section.section(long, "layer info")?;
    let mut layers = if info.is_empty() {
        Vec::new()
    } else {
        read_layer_info(info, header)?
    };

    if section.remaining() >= 4 {
        section.section(false, "global layer mask info")?;
    }

    loop {
        section.skip_zero_padding();
        if section.remaining() < 12 {
            break;
        }
        let block = read_tagged_block(&mut section, header.version)?;
        if layers.is_empty() && LAYER_INFO_KEYS.contains(&block.key) {
            tracing::debug!(
                key = %String::from_utf8_lossy(&block.key),
                "layer info stored in global block"
            );
            layers = read_layer_info(block.data, header)?;
        }
    }

    Ok(layers)
}

fn read_layer_info(mut r: ByteReader<'_>, header: &FileHeader) -> ParseResult<Vec<LayerRecord>> {
    // A negative count flags that the merged alpha belongs to the first alpha channel.
    let count = r.i16("layer count")?.unsigned_abs();

    let mut records = Vec::with_capacity(usize::from(count).min(1024));
    let mut lengths = Vec::with_capacity(records.capacity());
    for index in 0..count {
        let (record, channel_table) = read_layer_record(&mut r, header).map_err(|e| match e {
            ParseError::Malformed(msg) => ParseError::malformed(format!("layer {index}: {msg}")),
            other => other,
        })?;
        records.push(record);
        lengths.push(channel_table);
    }

    for (record, table) in records.iter_mut().zip(lengths) {
        for (id, len) in table {
            let bytes = r.take(len, "channel image data")?;
            record.channels.push(split_channel(id, bytes));
        }
    }

    Ok(records)
}

fn split_channel(id: i16, bytes: &[u8]) -> ChannelData {
    match bytes {
        [hi, lo, rest @ ..] => ChannelData {
            id,
            compression: u16::from_be_bytes([*hi, *lo]),
            bytes: rest.to_vec(),
        },
        _ => ChannelData {
            id,
            compression: 0,
            bytes: Vec::new(),
        },
    }
}

type ChannelTable = Vec<(i16, usize)>;

fn read_layer_record(
    r: &mut ByteReader<'_>,
    header: &FileHeader,
) -> ParseResult<(LayerRecord, ChannelTable)> {
    let long = header.version.is_large();

    let top = r.i32("layer top")?;
    let left = r.i32("layer left")?;
    let bottom = r.i32("layer bottom")?;
    let right = r.i32("layer right")?;
    let rect = BBox::new(left, top, right, bottom);
    let max = header.version.max_dimension();
    if rect.width() > max || rect.height() > max {
        return Err(ParseError::malformed(format!(
            "layer rect {}x{} exceeds {max}",
            rect.width(),
            rect.height()
        )));
    }

    let n = r.u16("layer channel count")?;
    if n > MAX_LAYER_CHANNELS {
        return Err(ParseError::malformed(format!(
            "layer channel count {n} exceeds {MAX_LAYER_CHANNELS}"
        )));
    }
    let mut table = Vec::with_capacity(usize::from(n));
    for _ in 0..n {
        let id = r.i16("channel id")?;
        let len = r.length(long, "channel data length")?;
        table.push((id, len));
    }

    let sig = r.sig("blend mode signature")?;
    if &sig != b"8BIM" {
        return Err(ParseError::malformed(format!(
            "bad blend mode signature {:?}",
            String::from_utf8_lossy(&sig)
        )));
    }
    let blend_key = r.sig("blend mode key")?;
    let opacity = r.u8("opacity")?;
    let clipping = r.u8("clipping")? != 0;
    let flags = r.u8("layer flags")?;
    r.skip(1, "layer filler")?;

    let mut extra = r.section(false, "layer extra data")?;
    let mask = read_mask(extra.section(false, "layer mask data")?)?;
    extra.section(false, "layer blending ranges")?;
    let mut name = extra.pascal_string(4, "layer name")?;

    let mut divider = None;
    let mut adjustment = None;
    loop {
        extra.skip_zero_padding();
        if extra.remaining() < 12 {
            break;
        }
        let mut block = read_tagged_block(&mut extra, header.version)?;
        match &block.key {
            b"luni" => name = read_unicode_name(&mut block.data)?,
            b"lsct" | b"lsdk" => {
                divider = Some(Divider::from_code(block.data.u32("section divider")?));
            }
            key if ADJUSTMENT_KEYS.contains(key) => adjustment = Some(*key),
            _ => {}
        }
    }

    let record = LayerRecord {
        rect,
        blend_key,
        opacity,
        clipping,
        hidden: flags & 0x02 != 0,
        mask,
        name,
        divider,
        adjustment,
        channels: Vec::with_capacity(table.len()),
    };
    Ok((record, table))
}

fn read_mask(mut m: ByteReader<'_>) -> ParseResult<Option<MaskInfo>> {
    if m.remaining() < 18 {
        return Ok(None);
    }
    let top = m.i32("mask top")?;
    let left = m.i32("mask left")?;
    let bottom = m.i32("mask bottom")?;
    let right = m.i32("mask right")?;
    let default_color = m.u8("mask default color")?;
    let flags = m.u8("mask flags")?;
    Ok(Some(MaskInfo {
        rect: BBox::new(left, top, right, bottom),
        default_color,
        disabled: flags & 0x02 != 0,
    }))
}

fn read_unicode_name(r: &mut ByteReader<'_>) -> ParseResult<String> {
    let units = r.u32("unicode name length")? as usize;
    let bytes = r.take(
        units
            .checked_mul(2)
            .ok_or_else(|| ParseError::malformed("unicode name length overflow"))?,
        "unicode name",
    )?;
    let name: String = char::decode_utf16(
        bytes
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
    )
    .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
    .collect();
    Ok(name.trim_end_matches('\0').to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/container/records.rs"]
mod tests;
