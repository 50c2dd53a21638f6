#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be {expected}. Got {value}")]
    OutOfRange {
        name: &'static str,
        value: i64,
        expected: &'static str,
    },

    #[error("Samples is required")]
    MissingSamples,

    #[error("Mapping must have 2^InputBits = {expected} entries. Got {actual}")]
    MappingLength { expected: usize, actual: usize },

    #[error("Mapping[{index}] = {value} must be an integer")]
    MappingEntryNotIntegral { index: usize, value: f64 },

    #[error("Mapping[{index}] = {value} exceeds the output range 0..={max}")]
    MappingEntryOutOfRange { index: usize, value: i64, max: u32 },

    #[error("DataSource must name at least one source")]
    NoDataSource,

    #[error("{name} must not be an empty array")]
    EmptyPerSourceArray { name: &'static str },

    #[error("{name} has {len} entries but only {sources} data sources are configured")]
    PerSourceLength {
        name: &'static str,
        len: usize,
        sources: usize,
    },

    #[error("Configuration describes {expected} data sources, {actual} were supplied")]
    SourceCountMismatch { expected: usize, actual: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    #[error("Failed to read the source position for SeekSource")]
    Position(#[source] std::io::Error),

    #[error("Failed to reposition the source to byte offset {offset}")]
    Reseek {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Source read failed after {written} bytes were written to the output")]
    Read {
        written: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Output buffer too small for one window: need {needed} bytes, got {available}")]
    BufferTooSmall { needed: usize, available: usize },
}
