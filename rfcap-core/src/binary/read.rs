use byteorder::{ByteOrder, LittleEndian};

use crate::HEADER_SIZE;

pub fn read_i64_le(
    buf: &[u8; HEADER_SIZE],
    off: &mut usize,
) -> i64 {
    let v = LittleEndian::read_i64(&buf[*off..*off + 8]);
    *off += 8;
    v
}

pub fn read_f64_le(
    buf: &[u8; HEADER_SIZE],
    off: &mut usize,
) -> f64 {
    let v = LittleEndian::read_f64(&buf[*off..*off + 8]);
    *off += 8;
    v
}

pub fn read_u32_le(
    buf: &[u8; HEADER_SIZE],
    off: &mut usize,
) -> u32 {
    let v = LittleEndian::read_u32(&buf[*off..*off + 4]);
    *off += 4;
    v
}

pub fn read_u8(
    buf: &[u8; HEADER_SIZE],
    off: &mut usize,
) -> u8 {
    let v = buf[*off];
    *off += 1;
    v
}
