//! Формат файлов rfcap версии 1
//!
//! Файл состоит из фиксированного 48-байтного заголовка и непрерывного потока
//! комплексных выборок. Заголовок всегда little-endian, чтобы magic читался
//! одинаково на любой платформе; порядок байт самих выборок объявлен в
//! заголовке.
//!
//! ```text
//! [0..6]   MAGIC            b"RFCAP1"
//! [6..14]  CAPTURE_TIME     i64  наносекунды от Unix epoch
//! [14..22] CENTER_FREQUENCY f64  Гц
//! [22..26] SAMPLE_RATE      u32  выборок в секунду
//! [26]     SAMPLE_FORMAT    u8   бит 0x80 = nibble-сжатие, младшие 7 бит = id
//! [27]     BYTE_ORDER       u8   0 = little, 1 = big
//! [28..48] RESERVED         нули
//! ```
//!
//! 48 байт выбраны так, чтобы поток complex64 после заголовка оставался
//! выровненным на 16 байт.

use std::io::Read;

use log::warn;
use rfcap_types::{
    unix_nanos_to_system_time, ByteOrder, Header, Magic, Receiver, RfcapError, RfcapResult,
    SampleFormat, COMPRESSED_FLAG,
};

use crate::binary::{
    read_f64_le, read_i64_le, read_u32_le, read_u8, write_f64_le, write_i64_le, write_u32_le,
    write_u8,
};

/// Размер фиксированного заголовка (48 байт)
pub const HEADER_SIZE: usize = 48;

/// Смещение зарезервированной области
pub const RESERVED_OFFSET: usize = 28;

/// Размер зарезервированной области (20 байт)
pub const RESERVED_SIZE: usize = HEADER_SIZE - RESERVED_OFFSET;

/// Кодирование заголовка в бинарный вид и обратно.
pub trait HeaderExt: Sized {
    /// Сериализация заголовка в 48 байт.
    fn encode(&self) -> RfcapResult<[u8; HEADER_SIZE]>;

    /// Десериализация заголовка из 48 байт.
    fn decode(buf: &[u8; HEADER_SIZE]) -> RfcapResult<Self>;
}

impl HeaderExt for Header {
    fn encode(&self) -> RfcapResult<[u8; HEADER_SIZE]> {
        self.validate()?;

        let format_id = self.sample_format.as_u8();
        if format_id & COMPRESSED_FLAG != 0 {
            return Err(RfcapError::invalid_header(format!(
                "sample format id {format_id} does not fit in 7 bits"
            )));
        }

        let mut buf = [0u8; HEADER_SIZE];
        let mut off = 0;

        buf[off..off + 6].copy_from_slice(&self.magic.0);
        off += 6;

        write_i64_le(&mut buf, &mut off, self.capture_time_ns()?);
        write_f64_le(&mut buf, &mut off, self.center_frequency);
        write_u32_le(&mut buf, &mut off, self.sample_rate);

        let format_byte = if self.compressed {
            format_id | COMPRESSED_FLAG
        } else {
            format_id
        };
        write_u8(&mut buf, &mut off, format_byte);
        write_u8(&mut buf, &mut off, self.effective_byte_order().as_u8());

        debug_assert_eq!(off, RESERVED_OFFSET);

        // [28..48] reserved, уже нули
        Ok(buf)
    }

    fn decode(buf: &[u8; HEADER_SIZE]) -> RfcapResult<Self> {
        let mut off = 0;

        let mut magic = [0u8; 6];
        magic.copy_from_slice(&buf[off..off + 6]);
        let magic = Magic(magic);
        if !magic.is_known() {
            return Err(RfcapError::UnknownMagic(magic.0));
        }
        off += 6;

        let capture_time = unix_nanos_to_system_time(read_i64_le(buf, &mut off));
        let center_frequency = read_f64_le(buf, &mut off);
        let sample_rate = read_u32_le(buf, &mut off);

        let format_byte = read_u8(buf, &mut off);
        let compressed = format_byte & COMPRESSED_FLAG != 0;
        let sample_format = SampleFormat::from_u8(format_byte & !COMPRESSED_FLAG);

        let order_byte = read_u8(buf, &mut off);
        let byte_order = ByteOrder::from_u8(order_byte).unwrap_or_else(|| {
            warn!("rfcap: unknown byte order {order_byte}, assuming little-endian");
            ByteOrder::Little
        });

        Ok(Header {
            magic,
            capture_time,
            center_frequency,
            sample_rate,
            sample_format,
            compressed,
            byte_order: Some(byte_order),
        })
    }
}

/// Читает ровно 48 байт заголовка из потока и декодирует их.
///
/// Поток после вызова стоит в начале полезной нагрузки.
pub fn read_header<R: Read>(input: &mut R) -> RfcapResult<Header> {
    let mut buf = [0u8; HEADER_SIZE];

    input
        .read_exact(&mut buf)
        .map_err(|e| RfcapError::from_io_eof(e, "rfcap header"))?;

    Header::decode(&buf)
}

/// Строит заголовок по текущим настройкам приёмника.
pub fn header_from_sdr<D: Receiver + ?Sized>(dev: &D) -> RfcapResult<Header> {
    let center_frequency = dev.get_center_frequency()?;
    let sample_rate = dev.get_sample_rate()?;

    Ok(Header::new(center_frequency, sample_rate, dev.sample_format()))
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, time::SystemTime};

    use super::*;

    fn deterministic_header(format: SampleFormat) -> Header {
        let mut h = Header::new(1_337_000_000.0, 180_000_000, format);
        h.capture_time = unix_nanos_to_system_time(1_704_067_200_123_456_789);
        h.byte_order = Some(ByteOrder::Little);
        h
    }

    #[test]
    fn test_header_round_trip() {
        for format in [
            SampleFormat::U8,
            SampleFormat::I8,
            SampleFormat::I16,
            SampleFormat::C64,
        ] {
            for order in [ByteOrder::Little, ByteOrder::Big] {
                let mut h = deterministic_header(format);
                h.byte_order = Some(order);
                h.compressed = format == SampleFormat::I16;

                let bytes = h.encode().unwrap();
                assert_eq!(bytes.len(), HEADER_SIZE);

                let decoded = Header::decode(&bytes).unwrap();
                assert_eq!(decoded, h);
            }
        }
    }

    #[test]
    fn test_header_round_trip_now() {
        let h = Header::new(1_090_000_000.0, 2_000_000, SampleFormat::C64);
        let decoded = Header::decode(&h.encode().unwrap()).unwrap();

        // SystemTime::now() может быть точнее наносекунды, сравниваем через ns
        assert_eq!(
            decoded.capture_time_ns().unwrap(),
            h.capture_time_ns().unwrap()
        );
        assert!(decoded.capture_time <= SystemTime::now());
    }

    #[test]
    fn test_missing_byte_order_normalized_to_little() {
        let mut h = deterministic_header(SampleFormat::U8);
        h.byte_order = None;

        let decoded = Header::decode(&h.encode().unwrap()).unwrap();
        assert_eq!(decoded.byte_order, Some(ByteOrder::Little));
    }

    #[test]
    fn test_header_byte_layout() {
        let mut h = deterministic_header(SampleFormat::I16);
        h.compressed = true;
        h.byte_order = Some(ByteOrder::Big);

        let bytes = h.encode().unwrap();

        assert_eq!(&bytes[0..6], b"RFCAP1", "magic");
        assert_eq!(
            &bytes[6..14],
            &1_704_067_200_123_456_789i64.to_le_bytes(),
            "capture_time LE"
        );
        assert_eq!(
            &bytes[14..22],
            &1_337_000_000.0f64.to_le_bytes(),
            "center_frequency LE"
        );
        // sample_rate = 180_000_000 = 0x0ABA9500
        assert_eq!(&bytes[22..26], &[0x00, 0x95, 0xBA, 0x0A], "sample_rate LE");
        assert_eq!(bytes[26], 0x80 | 3, "i16 + compressed flag");
        assert_eq!(bytes[27], 1, "byte_order = big");
        assert!(bytes[RESERVED_OFFSET..].iter().all(|&b| b == 0), "reserved");
    }

    #[test]
    fn test_compression_bit_only_when_set() {
        let h = deterministic_header(SampleFormat::I16);
        let bytes = h.encode().unwrap();
        assert_eq!(bytes[26], 3);
    }

    #[test]
    fn test_encode_rejects_compressed_non_i16() {
        let mut h = deterministic_header(SampleFormat::C64);
        h.compressed = true;
        assert!(matches!(h.encode(), Err(RfcapError::InvalidHeader(_))));
    }

    #[test]
    fn test_decode_unknown_magic() {
        let mut bytes = deterministic_header(SampleFormat::U8).encode().unwrap();
        bytes[0..6].copy_from_slice(b"RFCAP0");

        match Header::decode(&bytes) {
            Err(RfcapError::UnknownMagic(m)) => assert_eq!(&m, b"RFCAP0"),
            other => panic!("expected UnknownMagic, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_unknown_byte_order_is_little() {
        let mut bytes = deterministic_header(SampleFormat::I16).encode().unwrap();
        bytes[27] = 0xEE;

        let h = Header::decode(&bytes).unwrap();
        assert_eq!(h.byte_order, Some(ByteOrder::Little));
    }

    #[test]
    fn test_decode_ignores_reserved() {
        let mut bytes = deterministic_header(SampleFormat::C64).encode().unwrap();
        for b in &mut bytes[RESERVED_OFFSET..] {
            *b = 0xFF;
        }

        let h = Header::decode(&bytes).unwrap();
        assert_eq!(h, deterministic_header(SampleFormat::C64));
    }

    #[test]
    fn test_decode_unknown_format_id() {
        let mut bytes = deterministic_header(SampleFormat::I16).encode().unwrap();
        bytes[26] = 0x80 | 0x55;

        let h = Header::decode(&bytes).unwrap();
        assert_eq!(h.sample_format, SampleFormat::Unknown(0x55));
        assert!(h.compressed);
    }

    #[test]
    fn test_read_header_short_input() {
        let mut cursor = Cursor::new(vec![b'R', b'F', b'C']);
        assert!(matches!(
            read_header(&mut cursor),
            Err(RfcapError::UnexpectedEof(_))
        ));
    }

    #[test]
    fn test_read_header_consumes_exactly_48_bytes() {
        let mut raw = deterministic_header(SampleFormat::U8)
            .encode()
            .unwrap()
            .to_vec();
        raw.extend_from_slice(&[1, 2, 3, 4]);

        let mut cursor = Cursor::new(raw);
        read_header(&mut cursor).unwrap();
        assert_eq!(cursor.position(), HEADER_SIZE as u64);
    }
}
