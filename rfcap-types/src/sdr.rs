//! Интерфейсы SDR, через которые формат общается с внешним миром.
//!
//! Реальные устройства живут вне этой библиотеки; здесь только контракты,
//! которым подчиняются потоки выборок и "виртуальный" приёмник поверх файла.

use crate::{RfcapResult, SampleFormat, Samples};

/// Источник комплексных выборок.
pub trait SampleReader {
    /// Комплексных выборок в секунду.
    fn sample_rate(&self) -> u32;

    /// Формат выдаваемых выборок.
    fn sample_format(&self) -> SampleFormat;

    /// Читает до `samples.len()` выборок в начало буфера.
    ///
    /// `Ok(0)` означает конец потока.
    fn read(
        &mut self,
        samples: &mut Samples,
    ) -> RfcapResult<usize>;
}

/// Приёмник комплексных выборок.
pub trait SampleWriter {
    fn sample_rate(&self) -> u32;

    fn sample_format(&self) -> SampleFormat;

    /// Пишет весь буфер; возвращает число принятых выборок.
    fn write(
        &mut self,
        samples: &Samples,
    ) -> RfcapResult<usize>;
}

/// Поток приёма, который нужно закрыть по окончании.
pub trait ReadCloser: SampleReader {
    fn close(&mut self) -> RfcapResult<()>;
}

/// Усилительный каскад приёмника.
#[derive(Debug, Clone, PartialEq)]
pub struct GainStage {
    pub name: String,
    pub min_db: f32,
    pub max_db: f32,
}

/// Информация об устройстве (для логирования).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HardwareInfo {
    pub manufacturer: String,
    pub product: String,
    pub serial: String,
}

/// Абстракция SDR приёмника.
pub trait Receiver {
    fn hardware_info(&self) -> HardwareInfo;

    fn get_center_frequency(&self) -> RfcapResult<f64>;

    fn set_center_frequency(
        &mut self,
        hz: f64,
    ) -> RfcapResult<()>;

    fn get_sample_rate(&self) -> RfcapResult<u32>;

    fn set_sample_rate(
        &mut self,
        rate: u32,
    ) -> RfcapResult<()>;

    fn sample_format(&self) -> SampleFormat;

    fn get_gain_stages(&self) -> RfcapResult<Vec<GainStage>>;

    fn get_gain(
        &self,
        stage: &GainStage,
    ) -> RfcapResult<f32>;

    fn set_gain(
        &mut self,
        stage: &GainStage,
        db: f32,
    ) -> RfcapResult<()>;

    fn set_automatic_gain(
        &mut self,
        enabled: bool,
    ) -> RfcapResult<()>;

    fn set_ppm(
        &mut self,
        ppm: i32,
    ) -> RfcapResult<()>;

    /// Запускает приём. Поток заимствует приёмник до закрытия.
    fn start_rx(&mut self) -> RfcapResult<Box<dyn ReadCloser + '_>>;

    fn close(&mut self) -> RfcapResult<()>;
}
