use std::io::{self, Read};

use log::trace;

use crate::process::Fill;

/// [`Read`] over a [`Fill`] engine.
///
/// Reads large enough for a whole window are filled in place; smaller ones are
/// served from a staging buffer of [`Fill::min_buffer_len`] bytes. Engine
/// errors surface as [`io::ErrorKind::Other`]; stream failures keep their
/// [`StreamError`](crate::utils::errors::StreamError) reachable through
/// [`io::Error::get_ref`].
#[derive(Debug)]
pub struct FillReader<F: Fill> {
    engine: F,
    staged: Box<[u8]>,
    pos: usize,
    len: usize,
    end: bool,
}

impl<F: Fill> FillReader<F> {
    pub fn new(engine: F) -> Self {
        let staged = vec![0u8; engine.min_buffer_len()].into_boxed_slice();
        Self {
            engine,
            staged,
            pos: 0,
            len: 0,
            end: false,
        }
    }

    pub fn get_ref(&self) -> &F {
        &self.engine
    }

    /// Returns the engine. Staged bytes not yet read are lost.
    pub fn into_inner(self) -> F {
        self.engine
    }

    fn stage(&mut self) -> io::Result<()> {
        let filled = self.engine.fill(&mut self.staged).map_err(io::Error::other)?;
        trace!("FillReader staged {} bytes", filled.len);

        self.pos = 0;
        self.len = filled.len;
        self.end = filled.end;
        Ok(())
    }
}

impl<F: Fill> Read for FillReader<F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.pos == self.len {
            if self.end {
                return Ok(0);
            }

            if buf.len() >= self.staged.len() {
                let filled = self.engine.fill(buf).map_err(io::Error::other)?;
                self.end = filled.end;
                if filled.len > 0 || filled.end {
                    return Ok(filled.len);
                }
                continue;
            }

            self.stage()?;
        }

        let n = buf.len().min(self.len - self.pos);
        buf[..n].copy_from_slice(&self.staged[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Filled;
    use crate::process::interleave::{InterleaveConfig, Interleaver};
    use crate::process::resample::{ResampleConfig, Resampler};
    use crate::utils::errors::StreamError;
    use crate::utils::source::{ByteSource, SliceSource, SourceRef};

    fn data() -> Vec<u8> {
        (0..97u32).map(|i| (i * 37 % 256) as u8).collect()
    }

    fn filled(engine: &mut impl Fill) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = vec![0u8; 1024];
        loop {
            let Filled { len, end } = engine.fill(&mut buf).unwrap();
            out.extend_from_slice(&buf[..len]);
            if end {
                return out;
            }
        }
    }

    fn resampler(data: &[u8]) -> Resampler<'_> {
        let config = ResampleConfig::new(5, 11, 3);
        Resampler::new(SourceRef::owned(SliceSource::new(data)), &config).unwrap()
    }

    #[test]
    fn read_to_end_matches_fill() {
        let data = data();
        let expected = filled(&mut resampler(&data));

        let mut actual = Vec::new();
        FillReader::new(resampler(&data))
            .read_to_end(&mut actual)
            .unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn byte_at_a_time() {
        let data = data();
        fn sources(d: &[u8]) -> Vec<SourceRef<'_>> {
            vec![
                SourceRef::owned(SliceSource::new(d)),
                SourceRef::owned(SliceSource::new(&d[3..])),
            ]
        }
        let config = InterleaveConfig::uniform(2, 7);

        let expected = filled(&mut Interleaver::new(sources(&data), &config).unwrap());
        let reader = FillReader::new(Interleaver::new(sources(&data), &config).unwrap());
        let actual: Vec<u8> = reader.bytes().map(Result::unwrap).collect();

        assert_eq!(actual, expected);
    }

    #[test]
    fn end_is_sticky() {
        let data = [0xAB];
        let mut reader = FillReader::new(resampler(&data));
        let mut buf = [0u8; 64];

        while reader.read(&mut buf).unwrap() > 0 {}
        assert_eq!(reader.read(&mut buf).unwrap(), 0);
        assert!(reader.get_ref().is_exhausted());
    }

    struct Broken;

    impl ByteSource for Broken {
        fn next_byte(&mut self) -> io::Result<Option<u8>> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn engine_errors_become_io_errors() {
        let config = ResampleConfig::new(8, 8, 1);
        let engine = Resampler::new(SourceRef::owned(Broken), &config).unwrap();

        let err = FillReader::new(engine).read(&mut [0u8; 1]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert!(matches!(
            err.get_ref().and_then(|e| e.downcast_ref::<StreamError>()),
            Some(StreamError::Read { written: 0, .. })
        ));
    }

    struct Refusing;

    impl Fill for Refusing {
        fn fill(&mut self, out: &mut [u8]) -> anyhow::Result<Filled> {
            anyhow::bail!(StreamError::BufferTooSmall {
                needed: 4,
                available: out.len(),
            })
        }

        fn min_buffer_len(&self) -> usize {
            4
        }

        fn is_exhausted(&self) -> bool {
            false
        }
    }

    #[test]
    fn bailed_errors_keep_their_type() {
        let err = FillReader::new(Refusing).read(&mut [0u8; 1]).unwrap_err();
        assert!(matches!(
            err.get_ref().and_then(|e| e.downcast_ref::<StreamError>()),
            Some(StreamError::BufferTooSmall {
                needed: 4,
                available: 4
            })
        ));
    }
}
