//! 12-битный nibble-упаковщик I16 выборок (4 → 3).
//!
//! АЦП с разрядностью 12 бит кладут значение в старшие биты int16, младший
//! полубайт всегда нулевой. Упаковщик раскладывает старшие 12 бит каждого
//! четвёртого значения по младшим полубайтам трёх предыдущих:
//!
//! ```text
//! out[0] = (a & 0xFFF0) | ((d & 0x00F0) >> 4)
//! out[1] = (b & 0xFFF0) | ((d & 0x0F00) >> 8)
//! out[2] = (c & 0xFFF0) | ((d & 0xF000) >> 12)
//! ```
//!
//! Для данных с ненулевым младшим полубайтом преобразование с потерями:
//! этот полубайт перезаписывается.

use rfcap_types::{RfcapError, RfcapResult};

/// Значений int16 во входной группе упаковки.
pub const UNPACKED_GROUP: usize = 4;

/// Значений int16 в упакованной группе.
pub const PACKED_GROUP: usize = 3;

/// Комплексных выборок во входной группе на уровне IQ буферов: 4 выборки =
/// 8 значений = 2 группы, что даёт целое число упакованных выборок (3).
pub const UNPACKED_IQ_GROUP: usize = 4;

/// Комплексных выборок в упакованной IQ группе.
pub const PACKED_IQ_GROUP: usize = 3;

const HIGH_12: u16 = 0xFFF0;
const LOW_NIBBLE: u16 = 0x000F;

/// Те же биты в беззнаковой интерпретации.
#[inline]
fn to_bits<const N: usize>(v: [i16; N]) -> [u16; N] {
    v.map(|x| x as u16)
}

/// Те же биты в знаковой интерпретации.
#[inline]
fn from_bits<const N: usize>(v: [u16; N]) -> [i16; N] {
    v.map(|x| x as i16)
}

/// Длина упакованного буфера для `len` входных значений.
pub fn packed_len(len: usize) -> usize {
    len / UNPACKED_GROUP * PACKED_GROUP
}

/// Длина распакованного буфера для `len` упакованных значений.
pub fn unpacked_len(len: usize) -> usize {
    len / PACKED_GROUP * UNPACKED_GROUP
}

/// Упаковывает `input` (длина кратна 4) в `output`.
///
/// Возвращает число записанных значений. При ошибке `output` не меняется.
pub fn pack_i16(
    input: &[i16],
    output: &mut [i16],
) -> RfcapResult<usize> {
    if input.len() % UNPACKED_GROUP != 0 {
        return Err(RfcapError::MisalignedLength {
            len: input.len(),
            multiple: UNPACKED_GROUP,
        });
    }

    let out_len = packed_len(input.len());
    if output.len() < out_len {
        return Err(RfcapError::BufferTooSmall {
            needed: out_len,
            available: output.len(),
        });
    }

    for g in 0..input.len() / UNPACKED_GROUP {
        let i = g * UNPACKED_GROUP;
        let o = g * PACKED_GROUP;
        let [a, b, c, d] = to_bits([input[i], input[i + 1], input[i + 2], input[i + 3]]);

        let packed = from_bits([
            (a & HIGH_12) | ((d & 0x00F0) >> 4),
            (b & HIGH_12) | ((d & 0x0F00) >> 8),
            (c & HIGH_12) | ((d & 0xF000) >> 12),
        ]);

        output[o..o + PACKED_GROUP].copy_from_slice(&packed);
    }

    Ok(out_len)
}

/// Распаковывает `input` (длина кратна 3) в `output`.
pub fn unpack_i16(
    input: &[i16],
    output: &mut [i16],
) -> RfcapResult<usize> {
    if input.len() % PACKED_GROUP != 0 {
        return Err(RfcapError::MisalignedLength {
            len: input.len(),
            multiple: PACKED_GROUP,
        });
    }

    let out_len = unpacked_len(input.len());
    if output.len() < out_len {
        return Err(RfcapError::BufferTooSmall {
            needed: out_len,
            available: output.len(),
        });
    }

    for g in 0..input.len() / PACKED_GROUP {
        let i = g * PACKED_GROUP;
        let o = g * UNPACKED_GROUP;
        let [x, y, z] = to_bits([input[i], input[i + 1], input[i + 2]]);

        let unpacked = from_bits([
            x & HIGH_12,
            y & HIGH_12,
            z & HIGH_12,
            ((x & LOW_NIBBLE) << 4) | ((y & LOW_NIBBLE) << 8) | ((z & LOW_NIBBLE) << 12),
        ]);

        output[o..o + UNPACKED_GROUP].copy_from_slice(&unpacked);
    }

    Ok(out_len)
}

/// Упаковывает IQ буфер; `input.len()` кратна 4 выборкам.
///
/// Буфер из `N` пар рассматривается как плоский int16 массив длины `2N`.
/// Возвращает число записанных выборок.
pub fn pack_iq(
    input: &[[i16; 2]],
    output: &mut [[i16; 2]],
) -> RfcapResult<usize> {
    if input.len() % UNPACKED_IQ_GROUP != 0 {
        return Err(RfcapError::MisalignedLength {
            len: input.len(),
            multiple: UNPACKED_IQ_GROUP,
        });
    }

    let n = pack_i16(input.as_flattened(), output.as_flattened_mut())?;
    Ok(n / 2)
}

/// Распаковывает IQ буфер; `input.len()` кратна 3 выборкам.
pub fn unpack_iq(
    input: &[[i16; 2]],
    output: &mut [[i16; 2]],
) -> RfcapResult<usize> {
    if input.len() % PACKED_IQ_GROUP != 0 {
        return Err(RfcapError::MisalignedLength {
            len: input.len(),
            multiple: PACKED_IQ_GROUP,
        });
    }

    let n = unpack_i16(input.as_flattened(), output.as_flattened_mut())?;
    Ok(n / 2)
}
