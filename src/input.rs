use std::fs::File;
use std::io::{self, Stdin};
use std::path::Path;

use anyhow::{Context, Result};
use bitsamp::utils::source::{ByteSource, FileSource, StreamSource};

/// Unified input source over a file or the stdin pipe
#[derive(Debug)]
pub enum InputSource {
    Pipe(StreamSource<Stdin>),
    File(FileSource<File>),
}

impl InputSource {
    /// Open `input_path`, or stdin for "-"
    pub fn open<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let path = input_path.as_ref();

        if is_pipe(path) {
            return Ok(Self::Pipe(StreamSource::new(io::stdin())));
        }

        let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        Ok(Self::File(FileSource::new(file)))
    }

    /// Check if this is pipe input
    pub fn is_pipe(&self) -> bool {
        matches!(self, Self::Pipe(_))
    }
}

pub fn is_pipe(path: &Path) -> bool {
    path.as_os_str() == "-"
}

impl ByteSource for InputSource {
    #[inline(always)]
    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        match self {
            Self::Pipe(source) => source.next_byte(),
            Self::File(source) => source.next_byte(),
        }
    }

    fn position(&mut self) -> io::Result<u64> {
        match self {
            Self::Pipe(source) => source.position(),
            Self::File(source) => source.position(),
        }
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        match self {
            Self::Pipe(source) => source.seek(offset),
            Self::File(source) => source.seek(offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_input_is_seekable() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(&[1, 2, 3])?;

        let mut input = InputSource::open(file.path())?;
        assert!(!input.is_pipe());
        assert_eq!(input.next_byte()?, Some(1));
        assert_eq!(input.position()?, 1);

        input.seek(2)?;
        assert_eq!(input.next_byte()?, Some(3));
        assert_eq!(input.next_byte()?, None);
        Ok(())
    }

    #[test]
    fn dash_is_stdin() -> Result<()> {
        let mut input = InputSource::open("-")?;
        assert!(input.is_pipe());
        assert_eq!(input.position().unwrap_err().kind(), io::ErrorKind::Unsupported);
        Ok(())
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = InputSource::open("/nonexistent/bitsampd-input").unwrap_err();
        assert!(err.to_string().contains("bitsampd-input"));
    }
}
