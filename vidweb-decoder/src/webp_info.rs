//! WebP RIFF container parsing

use crate::{Error, ImageFormat, ImageInfo, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// Animation bit of the VP8X feature flags
const ANIMATION_FLAG: u8 = 0x02;

/// Signature byte that starts a lossless bitstream
const VP8L_SIGNATURE: u8 = 0x2F;

fn malformed(reason: impl Into<String>) -> Error {
    Error::Malformed {
        format: "webp",
        reason: reason.into(),
    }
}

/// Walks the RIFF chunks of a WebP file and collects canvas and timing data
pub fn read_webp_info(data: &[u8]) -> Result<ImageInfo> {
    let mut reader = Cursor::new(data);

    let mut fourcc = [0u8; 4];
    reader.read_exact(&mut fourcc)?;
    if &fourcc != b"RIFF" {
        return Err(malformed("missing RIFF header"));
    }
    let riff_size = reader.read_u32::<LittleEndian>()? as u64;
    reader.read_exact(&mut fourcc)?;
    if &fourcc != b"WEBP" {
        return Err(malformed("missing WEBP form type"));
    }

    let end = (8 + riff_size).min(data.len() as u64);
    let mut canvas: Option<(u32, u32)> = None;
    let mut animated = false;
    let mut loop_count = None;
    let mut frame_count = 0u32;
    let mut duration_ms = 0u64;

    while reader.position() + 8 <= end {
        reader.read_exact(&mut fourcc)?;
        let chunk_size = reader.read_u32::<LittleEndian>()? as u64;
        let payload_start = reader.position();
        let payload_end = payload_start + chunk_size;
        if payload_end > data.len() as u64 {
            return Err(malformed(format!(
                "chunk {} runs past the end of the file",
                String::from_utf8_lossy(&fourcc)
            )));
        }

        match &fourcc {
            b"VP8X" => {
                let flags = reader.read_u8()?;
                reader.read_u24::<LittleEndian>()?;
                let width = reader.read_u24::<LittleEndian>()? + 1;
                let height = reader.read_u24::<LittleEndian>()? + 1;
                canvas = Some((width, height));
                animated = flags & ANIMATION_FLAG != 0;
            }
            b"ANIM" => {
                // Background colour, then loop count
                reader.read_u32::<LittleEndian>()?;
                loop_count = Some(reader.read_u16::<LittleEndian>()?);
            }
            b"ANMF" => {
                // Frame x/y offsets and size precede the duration
                for _ in 0..4 {
                    reader.read_u24::<LittleEndian>()?;
                }
                duration_ms += reader.read_u24::<LittleEndian>()? as u64;
                frame_count += 1;
            }
            b"VP8 " => {
                // Frame tag and start code, then 14-bit dimensions
                let mut header = [0u8; 6];
                reader.read_exact(&mut header)?;
                if header[3..6] != [0x9D, 0x01, 0x2A] {
                    return Err(malformed("bad VP8 start code"));
                }
                let width = (reader.read_u16::<LittleEndian>()? & 0x3FFF) as u32;
                let height = (reader.read_u16::<LittleEndian>()? & 0x3FFF) as u32;
                canvas.get_or_insert((width, height));
                frame_count += 1;
            }
            b"VP8L" => {
                if reader.read_u8()? != VP8L_SIGNATURE {
                    return Err(malformed("bad VP8L signature"));
                }
                let bits = reader.read_u32::<LittleEndian>()?;
                let width = (bits & 0x3FFF) + 1;
                let height = ((bits >> 14) & 0x3FFF) + 1;
                canvas.get_or_insert((width, height));
                frame_count += 1;
            }
            _ => {}
        }

        // Chunks are padded to an even size
        reader.set_position(payload_end + (chunk_size & 1));
    }

    let (width, height) = canvas.ok_or_else(|| malformed("no image chunk found"))?;

    Ok(ImageInfo {
        format: ImageFormat::Webp,
        width,
        height,
        frame_count,
        duration_ms,
        loop_count,
        animated,
        size_bytes: data.len() as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    fn chunk(out: &mut Vec<u8>, fourcc: &[u8; 4], payload: &[u8]) {
        out.write_all(fourcc).unwrap();
        out.write_u32::<LittleEndian>(payload.len() as u32).unwrap();
        out.write_all(payload).unwrap();
        if payload.len() % 2 == 1 {
            out.push(0);
        }
    }

    fn riff(chunks: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.write_all(b"RIFF").unwrap();
        out.write_u32::<LittleEndian>(4 + chunks.len() as u32).unwrap();
        out.write_all(b"WEBP").unwrap();
        out.write_all(chunks).unwrap();
        out
    }

    fn anmf(duration: u32) -> Vec<u8> {
        let mut payload = Vec::new();
        for value in [0, 0, 99, 49, duration] {
            payload.write_u24::<LittleEndian>(value).unwrap();
        }
        payload.push(0); // flags
        // Nested bitstream chunk, skipped by the reader
        chunk(&mut payload, b"VP8 ", &[0u8; 5]);
        payload
    }

    #[test]
    fn test_animated_webp() {
        let mut chunks = Vec::new();

        let mut vp8x = vec![ANIMATION_FLAG, 0, 0, 0];
        vp8x.write_u24::<LittleEndian>(99).unwrap();
        vp8x.write_u24::<LittleEndian>(49).unwrap();
        chunk(&mut chunks, b"VP8X", &vp8x);

        let mut anim = Vec::new();
        anim.write_u32::<LittleEndian>(0xFFFF_FFFF).unwrap();
        anim.write_u16::<LittleEndian>(0).unwrap();
        chunk(&mut chunks, b"ANIM", &anim);

        for duration in [67, 67, 66] {
            chunk(&mut chunks, b"ANMF", &anmf(duration));
        }

        let data = riff(&chunks);
        let info = read_webp_info(&data).unwrap();

        assert_eq!(info.format, ImageFormat::Webp);
        assert_eq!((info.width, info.height), (100, 50));
        assert!(info.animated);
        assert_eq!(info.loop_count, Some(0));
        assert_eq!(info.frame_count, 3);
        assert_eq!(info.duration_ms, 200);
        assert_eq!(info.size_bytes, data.len() as u64);
    }

    #[test]
    fn test_still_lossless_webp() {
        let mut payload = vec![VP8L_SIGNATURE];
        let bits: u32 = (31 << 14) | 63; // 64x32
        payload.write_u32::<LittleEndian>(bits).unwrap();
        let mut chunks = Vec::new();
        chunk(&mut chunks, b"VP8L", &payload);

        let info = read_webp_info(&riff(&chunks)).unwrap();

        assert_eq!((info.width, info.height), (64, 32));
        assert_eq!(info.frame_count, 1);
        assert!(!info.animated);
        assert_eq!(info.loop_count, None);
    }

    #[test]
    fn test_still_lossy_webp() {
        let mut payload = vec![0x10, 0x02, 0x00, 0x9D, 0x01, 0x2A];
        payload.write_u16::<LittleEndian>(320).unwrap();
        payload.write_u16::<LittleEndian>(240).unwrap();
        let mut chunks = Vec::new();
        chunk(&mut chunks, b"VP8 ", &payload);

        let info = read_webp_info(&riff(&chunks)).unwrap();
        assert_eq!((info.width, info.height), (320, 240));
        assert_eq!(info.frame_count, 1);
    }

    #[test]
    fn test_truncated_chunk() {
        let mut chunks = Vec::new();
        chunk(&mut chunks, b"VP8X", &[0u8; 10]);
        let mut data = riff(&chunks);
        data.truncate(data.len() - 4);

        assert!(matches!(
            read_webp_info(&data),
            Err(Error::Malformed { format: "webp", .. })
        ));
    }

    #[test]
    fn test_not_webp() {
        let mut data = riff(&[]);
        data[8..12].copy_from_slice(b"AVI ");
        assert!(matches!(read_webp_info(&data), Err(Error::Malformed { .. })));
        assert!(matches!(read_webp_info(b"RIFF"), Err(Error::Io(_))));
    }
}
