use byteorder::{ByteOrder, LittleEndian};

use crate::HEADER_SIZE;

pub fn write_i64_le(
    buf: &mut [u8; HEADER_SIZE],
    off: &mut usize,
    val: i64,
) {
    LittleEndian::write_i64(&mut buf[*off..*off + 8], val);
    *off += 8;
}

pub fn write_f64_le(
    buf: &mut [u8; HEADER_SIZE],
    off: &mut usize,
    val: f64,
) {
    LittleEndian::write_f64(&mut buf[*off..*off + 8], val);
    *off += 8;
}

pub fn write_u32_le(
    buf: &mut [u8; HEADER_SIZE],
    off: &mut usize,
    val: u32,
) {
    LittleEndian::write_u32(&mut buf[*off..*off + 4], val);
    *off += 4;
}

pub fn write_u8(
    buf: &mut [u8; HEADER_SIZE],
    off: &mut usize,
    val: u8,
) {
    buf[*off] = val;
    *off += 1;
}
