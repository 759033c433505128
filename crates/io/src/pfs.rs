// PFS stream codec
//
// Layout:
//   PFS1\n<width> <height>\n<channel count>\n<tag count>\n<name=value>\n...
//   per channel: <name>\n<tag count>\n<name=value>\n...
//   ENDH<channel data, f32 little-endian, one channel after another>

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::FormatError;
use crate::frame::Frame;

const MAGIC: &str = "PFS1";
const END_OF_HEADER: &[u8; 4] = b"ENDH";
/// Sanity bounds for header counts
const MAX_CHANNELS: usize = 1024;
const MAX_TAGS: usize = 1024;
/// 16384 x 16384
const MAX_PIXELS: usize = 1 << 28;

pub fn write_frame<W: Write>(frame: &Frame, writer: &mut W) -> Result<(), FormatError> {
    writeln!(writer, "{}", MAGIC)?;
    writeln!(writer, "{} {}", frame.width(), frame.height())?;
    writeln!(writer, "{}", frame.channels().len())?;
    write_tags(frame.tags(), writer)?;
    for channel in frame.channels() {
        writeln!(writer, "{}", channel.name())?;
        write_tags(channel.tags(), writer)?;
    }
    writer.write_all(END_OF_HEADER)?;

    for channel in frame.channels() {
        let mut bytes = Vec::with_capacity(channel.data().len() * 4);
        for v in channel.data() {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        writer.write_all(&bytes)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_tags<W: Write>(tags: &BTreeMap<String, String>, writer: &mut W) -> Result<(), FormatError> {
    writeln!(writer, "{}", tags.len())?;
    for (name, value) in tags {
        if name.contains(['=', '\n']) || value.contains('\n') {
            return Err(FormatError::InvalidHeader(format!("tag {:?} cannot be stored", name)));
        }
        writeln!(writer, "{}={}", name, value)?;
    }
    Ok(())
}

pub fn read_frame<R: BufRead>(reader: &mut R) -> Result<Frame, FormatError> {
    let magic = read_line(reader)?;
    if magic != MAGIC {
        return Err(FormatError::InvalidHeader(format!("bad magic {:?}", magic)));
    }

    let dims = read_line(reader)?;
    let (width, height) = dims
        .split_once(' ')
        .and_then(|(w, h)| Some((w.trim().parse::<usize>().ok()?, h.trim().parse::<usize>().ok()?)))
        .ok_or_else(|| FormatError::InvalidHeader(format!("bad dimensions {:?}", dims)))?;
    if width.checked_mul(height).map_or(true, |n| n > MAX_PIXELS) {
        return Err(FormatError::InvalidHeader(format!("{}x{} exceeds the size limit", width, height)));
    }
    let mut frame = Frame::new(width, height)?;

    let channel_count = read_count(reader, MAX_CHANNELS)?;
    for (name, value) in read_tags(reader)? {
        frame.set_tag(&name, &value);
    }

    let mut headers = Vec::with_capacity(channel_count);
    for _ in 0..channel_count {
        let name = read_line(reader)?;
        if name.is_empty() {
            return Err(FormatError::InvalidHeader("empty channel name".to_string()));
        }
        let tags = read_tags(reader)?;
        headers.push((name, tags));
    }

    let mut end = [0u8; 4];
    reader.read_exact(&mut end)?;
    if &end != END_OF_HEADER {
        return Err(FormatError::InvalidHeader("missing ENDH".to_string()));
    }

    let byte_len = frame.pixel_count() * 4;
    for (name, tags) in headers {
        // grows with the data actually present
        let mut bytes = Vec::new();
        reader.by_ref().take(byte_len as u64).read_to_end(&mut bytes)?;
        if bytes.len() != byte_len {
            return Err(FormatError::Stream(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("channel {} has {} of {} bytes", name, bytes.len(), byte_len),
            )));
        }
        let data = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        let channel = frame.add_channel(&name, data)?;
        for (tag, value) in tags {
            channel.set_tag(&tag, &value);
        }
    }

    Ok(frame)
}

fn read_line<R: BufRead>(reader: &mut R) -> Result<String, FormatError> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Err(FormatError::InvalidHeader("unexpected end of header".to_string()));
    }
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

fn read_count<R: BufRead>(reader: &mut R, max: usize) -> Result<usize, FormatError> {
    let line = read_line(reader)?;
    match line.trim().parse::<usize>() {
        Ok(n) if n <= max => Ok(n),
        _ => Err(FormatError::InvalidHeader(format!("bad count {:?}", line))),
    }
}

fn read_tags<R: BufRead>(reader: &mut R) -> Result<Vec<(String, String)>, FormatError> {
    let count = read_count(reader, MAX_TAGS)?;
    let mut tags = Vec::with_capacity(count);
    for _ in 0..count {
        let line = read_line(reader)?;
        let (name, value) = line
            .split_once('=')
            .ok_or_else(|| FormatError::InvalidHeader(format!("bad tag {:?}", line)))?;
        tags.push((name.to_string(), value.to_string()));
    }
    Ok(tags)
}

pub fn write_file(frame: &Frame, path: &Path) -> Result<(), FormatError> {
    let file = File::create(path).map_err(|e| FormatError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    write_frame(frame, &mut writer)
}

pub fn read_file(path: &Path) -> Result<Frame, FormatError> {
    let file = File::open(path).map_err(|e| FormatError::io(path, e))?;
    read_frame(&mut BufReader::new(file))
}
