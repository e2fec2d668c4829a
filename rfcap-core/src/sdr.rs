//! Файл rfcap в роли приёмника.
//!
//! Позволяет подставить запись туда, где код ожидает живое SDR устройство.
//! Метаданные берутся из заголовка, настройки менять нельзя.

use std::io::Read;

use rfcap_types::{
    GainStage, HardwareInfo, Header, ReadCloser, Receiver, RfcapError, RfcapResult,
    SampleFormat, SampleReader, Samples,
};

use crate::stream::RfcapReader;

/// Приёмник только для чтения поверх [`RfcapReader`].
pub struct ReaderSdr<R: Read> {
    header: Header,
    reader: RfcapReader<R>,
}

impl<R: Read> ReaderSdr<R> {
    pub fn new(reader: RfcapReader<R>) -> Self {
        Self {
            header: reader.header().clone(),
            reader,
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn into_inner(self) -> RfcapReader<R> {
        self.reader
    }
}

/// Открывает файл без LZ4 и оборачивает его в [`ReaderSdr`].
pub fn reader_as_sdr<R: Read>(stream: R) -> RfcapResult<ReaderSdr<R>> {
    Ok(ReaderSdr::new(RfcapReader::new(stream)?))
}

impl<R: Read> Receiver for ReaderSdr<R> {
    fn hardware_info(&self) -> HardwareInfo {
        HardwareInfo {
            manufacturer: String::new(),
            product: "rfcap".to_string(),
            serial: String::new(),
        }
    }

    fn get_center_frequency(&self) -> RfcapResult<f64> {
        Ok(self.header.center_frequency)
    }

    fn set_center_frequency(
        &mut self,
        _hz: f64,
    ) -> RfcapResult<()> {
        Err(RfcapError::NotSupported("set_center_frequency on a capture file"))
    }

    fn get_sample_rate(&self) -> RfcapResult<u32> {
        Ok(self.header.sample_rate)
    }

    fn set_sample_rate(
        &mut self,
        _rate: u32,
    ) -> RfcapResult<()> {
        Err(RfcapError::NotSupported("set_sample_rate on a capture file"))
    }

    fn sample_format(&self) -> SampleFormat {
        self.header.sample_format
    }

    fn get_gain_stages(&self) -> RfcapResult<Vec<GainStage>> {
        Ok(Vec::new())
    }

    fn get_gain(
        &self,
        _stage: &GainStage,
    ) -> RfcapResult<f32> {
        Err(RfcapError::NotSupported("get_gain on a capture file"))
    }

    fn set_gain(
        &mut self,
        _stage: &GainStage,
        _db: f32,
    ) -> RfcapResult<()> {
        Err(RfcapError::NotSupported("set_gain on a capture file"))
    }

    fn set_automatic_gain(
        &mut self,
        _enabled: bool,
    ) -> RfcapResult<()> {
        Err(RfcapError::NotSupported("set_automatic_gain on a capture file"))
    }

    fn set_ppm(
        &mut self,
        _ppm: i32,
    ) -> RfcapResult<()> {
        Err(RfcapError::NotSupported("set_ppm on a capture file"))
    }

    fn start_rx(&mut self) -> RfcapResult<Box<dyn ReadCloser + '_>> {
        Ok(Box::new(RxStream {
            reader: &mut self.reader,
        }))
    }

    // Файлом владеет вызывающий
    fn close(&mut self) -> RfcapResult<()> {
        Ok(())
    }
}

/// Поток приёма, выданный [`ReaderSdr::start_rx`].
pub struct RxStream<'a, R: Read> {
    reader: &'a mut RfcapReader<R>,
}

impl<R: Read> SampleReader for RxStream<'_, R> {
    fn sample_rate(&self) -> u32 {
        self.reader.header().sample_rate
    }

    fn sample_format(&self) -> SampleFormat {
        self.reader.header().sample_format
    }

    fn read(
        &mut self,
        samples: &mut Samples,
    ) -> RfcapResult<usize> {
        self.reader.read(samples)
    }
}

impl<R: Read> ReadCloser for RxStream<'_, R> {
    fn close(&mut self) -> RfcapResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use rfcap_types::ByteOrder;

    use super::*;
    use crate::{read_full, stream::RfcapWriter};

    fn capture() -> Vec<u8> {
        let mut header = Header::new(915e6, 2_400_000, SampleFormat::I8);
        header.byte_order = Some(ByteOrder::Big);

        let mut writer = RfcapWriter::new(Vec::new(), header).unwrap();
        writer.write(&Samples::I8(vec![[1, -1]; 64])).unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_metadata_from_header() {
        let sdr = reader_as_sdr(Cursor::new(capture())).unwrap();

        assert_eq!(sdr.get_center_frequency().unwrap(), 915e6);
        assert_eq!(sdr.get_sample_rate().unwrap(), 2_400_000);
        assert_eq!(sdr.sample_format(), SampleFormat::I8);
        assert_eq!(sdr.hardware_info().product, "rfcap");
        assert!(sdr.get_gain_stages().unwrap().is_empty());
    }

    #[test]
    fn test_setters_not_supported() {
        let mut sdr = reader_as_sdr(Cursor::new(capture())).unwrap();
        let stage = GainStage {
            name: "LNA".into(),
            min_db: 0.0,
            max_db: 40.0,
        };

        assert!(matches!(
            sdr.set_center_frequency(1e9),
            Err(RfcapError::NotSupported(_))
        ));
        assert!(matches!(
            sdr.set_sample_rate(1),
            Err(RfcapError::NotSupported(_))
        ));
        assert!(matches!(
            sdr.set_gain(&stage, 10.0),
            Err(RfcapError::NotSupported(_))
        ));
        assert!(matches!(sdr.get_gain(&stage), Err(RfcapError::NotSupported(_))));
        assert!(matches!(
            sdr.set_automatic_gain(true),
            Err(RfcapError::NotSupported(_))
        ));
        assert!(matches!(sdr.set_ppm(3), Err(RfcapError::NotSupported(_))));

        // Заголовок не изменился
        assert_eq!(sdr.get_center_frequency().unwrap(), 915e6);
    }

    #[test]
    fn test_start_rx_reads_payload() {
        let mut sdr = reader_as_sdr(Cursor::new(capture())).unwrap();

        {
            let mut rx = sdr.start_rx().unwrap();
            assert_eq!(rx.sample_rate(), 2_400_000);

            let mut buf = Samples::new(SampleFormat::I8, 64).unwrap();
            assert_eq!(read_full(rx.as_mut(), &mut buf).unwrap(), 64);
            assert_eq!(buf, Samples::I8(vec![[1, -1]; 64]));
            assert_eq!(rx.read(&mut buf).unwrap(), 0);

            rx.close().unwrap();
        }

        sdr.close().unwrap();
        assert_eq!(sdr.into_inner().samples_read(), 64);
    }
}
