// Симулятор выдаёт комплексную синусоиду с pacing по реальному времени, так что
// пайплайн записи видит данные почти как с настоящего SDR.
// Для i16 значения 12-битные и выровнены влево: запись с --pack проходит
// через упаковщик без потерь.

use std::{
    f32::consts::PI,
    thread,
    time::{Duration, Instant},
};

use rfcap_types::{
    GainStage, HardwareInfo, ReadCloser, Receiver, RfcapError, RfcapResult, SampleFormat,
    SampleReader, Samples,
};

/// Усилительные каскады симулятора.
const LNA: &str = "LNA";
const VGA: &str = "VGA";

/// Генератор синтетического I/Q сигнала, реализующий [`Receiver`].
pub struct SimulatedReceiver {
    pub center_freq_hz: f64,
    pub sample_rate_hz: u32,
    pub sample_format: SampleFormat,
    pub tone_freq_hz: f32,
    /// Выдавать выборки в темпе `sample_rate_hz`
    pub realtime: bool,
    pub lna_db: f32,
    pub vga_db: f32,
    pub automatic_gain: bool,
    pub ppm: i32,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl SimulatedReceiver {
    pub fn new(
        center_freq_hz: f64,
        sample_rate_hz: u32,
        sample_format: SampleFormat,
    ) -> Self {
        Self {
            center_freq_hz,
            sample_rate_hz,
            sample_format,
            tone_freq_hz: 1_000.0,
            realtime: true,
            lna_db: 16.0,
            vga_db: 20.0,
            automatic_gain: false,
            ppm: 0,
        }
    }

    fn stage_slot(
        &mut self,
        stage: &GainStage,
    ) -> RfcapResult<&mut f32> {
        match stage.name.as_str() {
            LNA => Ok(&mut self.lna_db),
            VGA => Ok(&mut self.vga_db),
            _ => Err(RfcapError::NotSupported("unknown gain stage")),
        }
    }
}

impl Receiver for SimulatedReceiver {
    fn hardware_info(&self) -> HardwareInfo {
        HardwareInfo {
            manufacturer: "rfcap".to_string(),
            product: "Simulated SDR".to_string(),
            serial: "SIM-0001".to_string(),
        }
    }

    fn get_center_frequency(&self) -> RfcapResult<f64> {
        Ok(self.center_freq_hz)
    }

    fn set_center_frequency(
        &mut self,
        hz: f64,
    ) -> RfcapResult<()> {
        self.center_freq_hz = hz;
        Ok(())
    }

    fn get_sample_rate(&self) -> RfcapResult<u32> {
        Ok(self.sample_rate_hz)
    }

    fn set_sample_rate(
        &mut self,
        rate: u32,
    ) -> RfcapResult<()> {
        if rate == 0 {
            return Err(RfcapError::NotSupported("zero sample rate"));
        }

        self.sample_rate_hz = rate;
        Ok(())
    }

    fn sample_format(&self) -> SampleFormat {
        self.sample_format
    }

    fn get_gain_stages(&self) -> RfcapResult<Vec<GainStage>> {
        Ok(vec![
            GainStage {
                name: LNA.to_string(),
                min_db: 0.0,
                max_db: 40.0,
            },
            GainStage {
                name: VGA.to_string(),
                min_db: 0.0,
                max_db: 62.0,
            },
        ])
    }

    fn get_gain(
        &self,
        stage: &GainStage,
    ) -> RfcapResult<f32> {
        match stage.name.as_str() {
            LNA => Ok(self.lna_db),
            VGA => Ok(self.vga_db),
            _ => Err(RfcapError::NotSupported("unknown gain stage")),
        }
    }

    fn set_gain(
        &mut self,
        stage: &GainStage,
        db: f32,
    ) -> RfcapResult<()> {
        *self.stage_slot(stage)? = db.clamp(stage.min_db, stage.max_db);
        Ok(())
    }

    fn set_automatic_gain(
        &mut self,
        enabled: bool,
    ) -> RfcapResult<()> {
        self.automatic_gain = enabled;
        Ok(())
    }

    fn set_ppm(
        &mut self,
        ppm: i32,
    ) -> RfcapResult<()> {
        self.ppm = ppm;
        Ok(())
    }

    fn start_rx(&mut self) -> RfcapResult<Box<dyn ReadCloser + '_>> {
        if let SampleFormat::Unknown(id) = self.sample_format {
            return Err(RfcapError::UnsupportedFormat(id));
        }

        Ok(Box::new(ToneStream {
            device: self,
            position: 0,
            started: Instant::now(),
            closed: false,
        }))
    }

    fn close(&mut self) -> RfcapResult<()> {
        Ok(())
    }
}

/// Поток выборок симулятора.
pub struct ToneStream<'a> {
    device: &'a SimulatedReceiver,
    /// Номер следующей выборки от начала приёма
    position: u64,
    started: Instant,
    closed: bool,
}

impl ToneStream<'_> {
    fn phase(
        &self,
        i: u64,
    ) -> f32 {
        let t = (self.position + i) as f32 / self.device.sample_rate_hz as f32;
        2.0 * PI * self.device.tone_freq_hz * t
    }

    /// Pacing: синхронизация по реальному времени.
    fn pace(&self) {
        let period_ns = 1_000_000_000f64 / self.device.sample_rate_hz as f64;
        let expected = Duration::from_nanos((self.position as f64 * period_ns) as u64);
        let elapsed = self.started.elapsed();

        if expected > elapsed {
            thread::sleep(expected - elapsed);
        }
    }
}

impl SampleReader for ToneStream<'_> {
    fn sample_rate(&self) -> u32 {
        self.device.sample_rate_hz
    }

    fn sample_format(&self) -> SampleFormat {
        self.device.sample_format
    }

    fn read(
        &mut self,
        samples: &mut Samples,
    ) -> RfcapResult<usize> {
        if self.closed {
            return Ok(0);
        }

        if samples.format() != self.device.sample_format {
            return Err(RfcapError::FormatMismatch {
                expected: self.device.sample_format,
                found: samples.format(),
            });
        }

        let n = samples.len();

        match samples {
            Samples::I16(v) => {
                for (i, s) in v.iter_mut().enumerate() {
                    let p = self.phase(i as u64);
                    // 12 бит, младший nibble нулевой
                    *s = [
                        ((2_047.0 * p.sin()) as i16) << 4,
                        ((2_047.0 * p.cos()) as i16) << 4,
                    ];
                }
            }
            Samples::I8(v) => {
                for (i, s) in v.iter_mut().enumerate() {
                    let p = self.phase(i as u64);
                    *s = [(127.0 * p.sin()) as i8, (127.0 * p.cos()) as i8];
                }
            }
            Samples::U8(v) => {
                for (i, s) in v.iter_mut().enumerate() {
                    let p = self.phase(i as u64);
                    *s = [
                        (127.5 + 127.0 * p.sin()) as u8,
                        (127.5 + 127.0 * p.cos()) as u8,
                    ];
                }
            }
            Samples::C64(v) => {
                for (i, s) in v.iter_mut().enumerate() {
                    let p = self.phase(i as u64);
                    *s = [p.sin(), p.cos()];
                }
            }
        }

        self.position += n as u64;

        if self.device.realtime {
            self.pace();
        }

        Ok(n)
    }
}

impl ReadCloser for ToneStream<'_> {
    fn close(&mut self) -> RfcapResult<()> {
        self.closed = true;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
