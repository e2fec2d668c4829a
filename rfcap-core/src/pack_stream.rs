//! Потоковые обёртки над nibble-упаковщиком.
//!
//! Упаковщик работает группами по 4 комплексные выборки (8 значений int16 →
//! 6 значений = 3 выборки), поэтому обёртки передают ему только целые группы,
//! а хвост (не более 3 выборок) держат до следующего вызова.

use rfcap_types::{
    RfcapError, RfcapResult, SampleFormat, SampleReader, SampleWriter, Samples,
};

use crate::packer::{pack_iq, unpack_iq, PACKED_IQ_GROUP, UNPACKED_IQ_GROUP};

/// Выборок, запрашиваемых у источника за один вызов при упаковке.
pub const PACK_CHUNK_SAMPLES: usize = 32 * 1024;

/// Выборок, запрашиваемых у источника за один вызов при распаковке.
pub const UNPACK_CHUNK_SAMPLES: usize = (32 * 1024 / 4) * 3;

fn require_i16(format: SampleFormat) -> RfcapResult<()> {
    if format != SampleFormat::I16 {
        return Err(RfcapError::FormatMismatch {
            expected: SampleFormat::I16,
            found: format,
        });
    }
    Ok(())
}

fn i16_samples(samples: &Samples) -> RfcapResult<&[[i16; 2]]> {
    samples.as_i16().ok_or(RfcapError::FormatMismatch {
        expected: SampleFormat::I16,
        found: samples.format(),
    })
}

/// Направление преобразования [`TransformReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// 4 выборки → 3
    Pack,
    /// 3 выборки → 4
    Unpack,
}

impl Transform {
    /// Выборок во входной группе.
    fn input_group(&self) -> usize {
        match self {
            Transform::Pack => UNPACKED_IQ_GROUP,
            Transform::Unpack => PACKED_IQ_GROUP,
        }
    }

    fn output_group(&self) -> usize {
        match self {
            Transform::Pack => PACKED_IQ_GROUP,
            Transform::Unpack => UNPACKED_IQ_GROUP,
        }
    }

    fn chunk(&self) -> usize {
        match self {
            Transform::Pack => PACK_CHUNK_SAMPLES,
            Transform::Unpack => UNPACK_CHUNK_SAMPLES,
        }
    }

    fn apply(
        &self,
        input: &[[i16; 2]],
        output: &mut [[i16; 2]],
    ) -> RfcapResult<usize> {
        match self {
            Transform::Pack => pack_iq(input, output),
            Transform::Unpack => unpack_iq(input, output),
        }
    }
}

/// Читатель, упаковывающий или распаковывающий I16 поток источника.
pub struct TransformReader<R: SampleReader> {
    inner: R,
    transform: Transform,
    /// Сырые выборки источника, ещё не собранные в группу.
    pending: Vec<[i16; 2]>,
    /// Преобразованные выборки, ещё не отданные вызывающему.
    ready: Vec<[i16; 2]>,
    ready_pos: usize,
    scratch: Samples,
    eof: bool,
}

impl<R: SampleReader> TransformReader<R> {
    pub fn new(
        inner: R,
        transform: Transform,
    ) -> RfcapResult<Self> {
        require_i16(inner.sample_format())?;

        Ok(Self {
            inner,
            transform,
            pending: Vec::with_capacity(transform.chunk() + transform.input_group()),
            ready: Vec::new(),
            ready_pos: 0,
            scratch: Samples::I16(vec![[0; 2]; transform.chunk()]),
            eof: false,
        })
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Пополняет `ready`. `false`: источник исчерпан.
    fn refill(&mut self) -> RfcapResult<bool> {
        let group = self.transform.input_group();

        loop {
            let whole = self.pending.len() / group * group;

            if whole > 0 {
                self.ready.resize(whole / group * self.transform.output_group(), [0; 2]);
                self.ready_pos = 0;

                let n = self
                    .transform
                    .apply(&self.pending[..whole], &mut self.ready)?;
                self.ready.truncate(n);
                self.pending.drain(..whole);

                return Ok(true);
            }

            if self.eof {
                if self.pending.is_empty() {
                    return Ok(false);
                }

                return Err(RfcapError::unexpected_eof(format!(
                    "{} trailing samples do not form a {group}-sample group",
                    self.pending.len()
                )));
            }

            let n = self.inner.read(&mut self.scratch)?;
            if n == 0 {
                self.eof = true;
                continue;
            }

            let chunk = i16_samples(&self.scratch)?;
            self.pending.extend_from_slice(&chunk[..n]);
        }
    }
}

impl<R: SampleReader> SampleReader for TransformReader<R> {
    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn sample_format(&self) -> SampleFormat {
        SampleFormat::I16
    }

    fn read(
        &mut self,
        samples: &mut Samples,
    ) -> RfcapResult<usize> {
        let found = samples.format();
        let out = samples.as_i16_mut().ok_or(RfcapError::FormatMismatch {
            expected: SampleFormat::I16,
            found,
        })?;

        if out.is_empty() {
            return Ok(0);
        }

        if self.ready_pos == self.ready.len() && !self.refill()? {
            return Ok(0);
        }

        let n = out.len().min(self.ready.len() - self.ready_pos);
        out[..n].copy_from_slice(&self.ready[self.ready_pos..self.ready_pos + n]);
        self.ready_pos += n;

        Ok(n)
    }
}

/// Читатель, упаковывающий сырой I16 поток.
pub fn pack_reader<R: SampleReader>(reader: R) -> RfcapResult<TransformReader<R>> {
    TransformReader::new(reader, Transform::Pack)
}

/// Читатель, распаковывающий упакованный I16 поток.
pub fn unpack_reader<R: SampleReader>(reader: R) -> RfcapResult<TransformReader<R>> {
    TransformReader::new(reader, Transform::Unpack)
}

/// Писатель, упаковывающий I16 выборки перед передачей дальше.
pub struct PackWriter<W: SampleWriter> {
    inner: W,
    /// Хвост предыдущей записи (меньше одной группы).
    leftover: Vec<[i16; 2]>,
    packed: Vec<[i16; 2]>,
}

impl<W: SampleWriter> PackWriter<W> {
    pub fn new(inner: W) -> RfcapResult<Self> {
        require_i16(inner.sample_format())?;

        Ok(Self {
            inner,
            leftover: Vec::with_capacity(UNPACKED_IQ_GROUP),
            packed: Vec::new(),
        })
    }

    /// Выборки, ждущие до полной группы.
    pub fn buffered(&self) -> usize {
        self.leftover.len()
    }

    /// Отбрасывает неполную группу; возвращает число выброшенных выборок.
    pub fn discard_buffered(&mut self) -> usize {
        let n = self.leftover.len();
        self.leftover.clear();
        n
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Возвращает внутренний писатель. Если в буфере остался неполный хвост,
    /// его нельзя упаковать: [`RfcapError::MisalignedLength`].
    pub fn finish(self) -> RfcapResult<W> {
        if !self.leftover.is_empty() {
            return Err(RfcapError::MisalignedLength {
                len: self.leftover.len(),
                multiple: UNPACKED_IQ_GROUP,
            });
        }

        Ok(self.inner)
    }

    fn emit(
        &mut self,
        input: &[[i16; 2]],
    ) -> RfcapResult<()> {
        if input.is_empty() {
            return Ok(());
        }

        let mut packed = std::mem::take(&mut self.packed);
        packed.resize(input.len() / UNPACKED_IQ_GROUP * PACKED_IQ_GROUP, [0; 2]);
        pack_iq(input, &mut packed)?;

        let samples = Samples::I16(packed);
        self.inner.write(&samples)?;
        if let Samples::I16(buf) = samples {
            self.packed = buf;
        }

        Ok(())
    }
}

impl<W: SampleWriter> SampleWriter for PackWriter<W> {
    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    fn sample_format(&self) -> SampleFormat {
        SampleFormat::I16
    }

    /// Принимает все выборки; неполная группа в конце остаётся в буфере.
    fn write(
        &mut self,
        samples: &Samples,
    ) -> RfcapResult<usize> {
        let mut input = i16_samples(samples)?;
        let accepted = input.len();

        // Сначала дополняем хвост прошлой записи до целой группы
        if !self.leftover.is_empty() {
            let take = (UNPACKED_IQ_GROUP - self.leftover.len()).min(input.len());
            self.leftover.extend_from_slice(&input[..take]);
            input = &input[take..];

            if self.leftover.len() < UNPACKED_IQ_GROUP {
                return Ok(accepted);
            }

            let group = std::mem::take(&mut self.leftover);
            self.emit(&group)?;
            self.leftover = group;
            self.leftover.clear();
        }

        let whole = input.len() / UNPACKED_IQ_GROUP * UNPACKED_IQ_GROUP;
        self.emit(&input[..whole])?;
        self.leftover.extend_from_slice(&input[whole..]);

        Ok(accepted)
    }
}

/// Писатель, упаковывающий поток перед `writer`.
pub fn pack_writer<W: SampleWriter>(writer: W) -> RfcapResult<PackWriter<W>> {
    PackWriter::new(writer)
}
