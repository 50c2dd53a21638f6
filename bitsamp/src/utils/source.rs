//! Byte sources consumed by the decode engines.
//!
//! The engines only ever pull one byte at a time. Repositioning is needed
//! solely by the resampler when `SeekSource` is enabled, so `position` and
//! `seek` default to [`io::ErrorKind::Unsupported`].

use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};

pub trait ByteSource {
    /// Returns the next byte, or `None` once the source is exhausted.
    fn next_byte(&mut self) -> io::Result<Option<u8>>;

    /// Current byte offset from the start of the source.
    fn position(&mut self) -> io::Result<u64> {
        Err(unsupported("position"))
    }

    /// Repositions the source so the next byte read is at `offset`.
    fn seek(&mut self, _offset: u64) -> io::Result<()> {
        Err(unsupported("seek"))
    }

    /// Releases the underlying resource. Called once by an engine that owns the source.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn unsupported(op: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{op}: source is not seekable"),
    )
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).next_byte()
    }

    fn position(&mut self) -> io::Result<u64> {
        (**self).position()
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        (**self).seek(offset)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).next_byte()
    }

    fn position(&mut self) -> io::Result<u64> {
        (**self).position()
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        (**self).seek(offset)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// A source handed to an engine, either owned by it or lent for its lifetime.
///
/// Engines close [`SourceRef::Owned`] sources on disposal and leave
/// [`SourceRef::Borrowed`] ones to the caller.
pub enum SourceRef<'a> {
    Owned(Box<dyn ByteSource + 'a>),
    Borrowed(&'a mut dyn ByteSource),
}

impl<'a> SourceRef<'a> {
    pub fn owned<S: ByteSource + 'a>(source: S) -> Self {
        Self::Owned(Box::new(source))
    }

    pub fn borrowed(source: &'a mut dyn ByteSource) -> Self {
        Self::Borrowed(source)
    }

    pub fn owns_source(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    pub fn as_dyn(&mut self) -> &mut dyn ByteSource {
        match self {
            Self::Owned(source) => source.as_mut(),
            Self::Borrowed(source) => &mut **source,
        }
    }

    /// Closes the source if the engine owns it. Borrowed sources are left alone.
    pub fn close_if_owned(&mut self) -> io::Result<()> {
        match self {
            Self::Owned(source) => source.close(),
            Self::Borrowed(_) => Ok(()),
        }
    }
}

impl std::fmt::Debug for SourceRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Owned(_) => write!(f, "SourceRef::Owned"),
            Self::Borrowed(_) => write!(f, "SourceRef::Borrowed"),
        }
    }
}

/// In-memory source over a byte slice. Seekable.
#[derive(Debug, Clone, Default)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }
}

impl ByteSource for SliceSource<'_> {
    #[inline(always)]
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        Ok(byte)
    }

    fn position(&mut self) -> io::Result<u64> {
        Ok(self.pos as u64)
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        if offset > self.data.len() as u64 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("seek({offset}): beyond end of {} byte slice", self.data.len()),
            ));
        }
        self.pos = offset as usize;
        Ok(())
    }
}

#[inline(always)]
fn next_buffered<R: Read>(reader: &mut BufReader<R>) -> io::Result<Option<u8>> {
    loop {
        let byte = match reader.fill_buf() {
            Ok(buf) => buf.first().copied(),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if byte.is_some() {
            reader.consume(1);
        }
        return Ok(byte);
    }
}

/// Buffered forward-only source over any reader, e.g. a pipe.
#[derive(Debug)]
pub struct StreamSource<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> StreamSource<R> {
    pub fn new(read: R) -> Self {
        Self {
            reader: BufReader::new(read),
        }
    }

    pub fn with_capacity(capacity: usize, read: R) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, read),
        }
    }
}

impl<R: Read> ByteSource for StreamSource<R> {
    #[inline(always)]
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        next_buffered(&mut self.reader)
    }
}

/// Buffered seekable source, typically over a [`std::fs::File`].
#[derive(Debug)]
pub struct FileSource<R: Read + Seek> {
    reader: BufReader<R>,
}

impl<R: Read + Seek> FileSource<R> {
    pub fn new(read: R) -> Self {
        Self {
            reader: BufReader::new(read),
        }
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

impl<R: Read + Seek> ByteSource for FileSource<R> {
    #[inline(always)]
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        next_buffered(&mut self.reader)
    }

    fn position(&mut self) -> io::Result<u64> {
        self.reader.stream_position()
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        let current = self.reader.stream_position()?;
        if current == offset {
            return Ok(());
        }

        // Stay inside the read buffer when the jump is short
        match i64::try_from(offset).ok().zip(i64::try_from(current).ok()) {
            Some((to, from)) => self.reader.seek_relative(to - from),
            None => self.reader.seek(SeekFrom::Start(offset)).map(|_| ()),
        }
    }
}
