//! Key/value parameter dictionaries for building engines.
//!
//! These mirror the configuration keys a pipeline attaches to a filter
//! (`InputBits`, `Samples`, ...). Missing keys take their documented defaults;
//! [`ResampleParams::validate`] and [`InterleaveParams::validate`] check every
//! range and produce the typed configs the engines are built from. The first
//! violation wins.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

use crate::process::interleave::{InterleaveConfig, SourceSpec};
use crate::process::resample::{ResampleConfig, WindowSpec};
use crate::structs::alignment::Alignment;
use crate::structs::repeat::Repeat;
use crate::utils::errors::ConfigError;

fn ranged(
    name: &'static str,
    value: i64,
    min: i64,
    max: i64,
    expected: &'static str,
) -> Result<i64> {
    if !(min..=max).contains(&value) {
        bail!(ConfigError::OutOfRange {
            name,
            value,
            expected,
        });
    }
    Ok(value)
}

fn bits(name: &'static str, value: i64) -> Result<u32> {
    ranged(name, value, 1, 16, "between 1 and 16").map(|v| v as u32)
}

fn count(name: &'static str, value: i64) -> Result<u32> {
    ranged(name, value, 0, u32::MAX as i64, "a non-negative integer").map(|v| v as u32)
}

fn positive(name: &'static str, value: i64) -> Result<u32> {
    ranged(name, value, 1, u32::MAX as i64, "a positive integer").map(|v| v as u32)
}

fn alignment(
    repeat_name: &'static str,
    repeat: i64,
    bits_name: &'static str,
    bits: i64,
) -> Result<Alignment> {
    Ok(Alignment::every(
        count(repeat_name, repeat)?,
        positive(bits_name, bits)?,
    ))
}

/// Parameters of the single-source resampling decoder.
///
/// Unknown keys are rejected, so a misspelled key cannot fall back to a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default, deny_unknown_fields)]
pub struct ResampleParams {
    pub input_bits: i64,
    pub samples: Option<i64>,
    pub bits_before: i64,
    pub bits_after: i64,
    pub input_align_repeat: i64,
    pub input_align_bits: i64,
    /// Defaults to `InputBits`.
    pub output_bits: Option<i64>,
    pub output_align_repeat: i64,
    pub output_align_bits: i64,
    pub repeat: i64,
    pub seek_source: bool,
    pub mapping: Option<Vec<f64>>,
}

impl Default for ResampleParams {
    fn default() -> Self {
        Self {
            input_bits: 8,
            samples: None,
            bits_before: 0,
            bits_after: 0,
            input_align_repeat: 0,
            input_align_bits: 8,
            output_bits: None,
            output_align_repeat: 0,
            output_align_bits: 8,
            repeat: 0,
            seek_source: false,
            mapping: None,
        }
    }
}

impl ResampleParams {
    pub fn validate(&self) -> Result<ResampleConfig> {
        let bits_in = bits("InputBits", self.input_bits)?;
        let Some(samples) = self.samples else {
            bail!(ConfigError::MissingSamples);
        };
        let samples = positive("Samples", samples)?;
        let bits_before = count("BitsBefore", self.bits_before)?;
        let bits_after = count("BitsAfter", self.bits_after)?;
        let input_align = alignment(
            "InputAlignRepeat",
            self.input_align_repeat,
            "InputAlignBits",
            self.input_align_bits,
        )?;
        let bits_out = bits("OutputBits", self.output_bits.unwrap_or(self.input_bits))?;
        let output_align = alignment(
            "OutputAlignRepeat",
            self.output_align_repeat,
            "OutputAlignBits",
            self.output_align_bits,
        )?;
        let repeat = Repeat::from_count(count("Repeat", self.repeat)? as u64);

        let mapping = match &self.mapping {
            Some(entries) => Some(integral_mapping(entries, bits_in, bits_out)?),
            None => None,
        };

        let config = ResampleConfig {
            bits_in,
            bits_out,
            window: WindowSpec {
                samples,
                bits_before,
                bits_after,
            },
            input_align,
            output_align,
            repeat,
            seek_source: self.seek_source,
            mapping,
        };
        config.validate()?;

        Ok(config)
    }
}

fn integral_mapping(entries: &[f64], bits_in: u32, bits_out: u32) -> Result<Vec<u32>> {
    let expected = 1usize << bits_in;
    if entries.len() != expected {
        bail!(ConfigError::MappingLength {
            expected,
            actual: entries.len(),
        });
    }

    let max = (1u32 << bits_out) - 1;

    entries
        .iter()
        .enumerate()
        .map(|(index, &value)| {
            if !value.is_finite() || value.fract() != 0.0 {
                bail!(ConfigError::MappingEntryNotIntegral { index, value });
            }
            if value < 0.0 || value > max as f64 {
                bail!(ConfigError::MappingEntryOutOfRange {
                    index,
                    value: value as i64,
                    max,
                });
            }
            Ok(value as u32)
        })
        .collect()
}

/// A per-source parameter: one value for every source, or one per source.
///
/// An array shorter than the source list is sticky: its last element applies
/// to all remaining sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PerSource {
    One(i64),
    Many(Vec<i64>),
}

impl PerSource {
    pub fn expand(&self, name: &'static str, sources: usize) -> Result<Vec<i64>> {
        match self {
            Self::One(value) => Ok(vec![*value; sources]),
            Self::Many(values) => {
                let Some(&last) = values.last() else {
                    bail!(ConfigError::EmptyPerSourceArray { name });
                };
                if values.len() > sources {
                    bail!(ConfigError::PerSourceLength {
                        name,
                        len: values.len(),
                        sources,
                    });
                }

                let mut expanded = values.clone();
                expanded.resize(sources, last);
                Ok(expanded)
            }
        }
    }
}

/// Parameters of the multi-source interleaving decoder.
///
/// The `DataSource` list itself is supplied separately, as live sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default, deny_unknown_fields)]
pub struct InterleaveParams {
    pub input_bits: PerSource,
    pub input_align_repeat: PerSource,
    pub input_align_bits: PerSource,
    pub output_align_repeat: i64,
    pub output_align_bits: i64,
    pub repeat: i64,
}

impl Default for InterleaveParams {
    fn default() -> Self {
        Self {
            input_bits: PerSource::One(8),
            input_align_repeat: PerSource::One(0),
            input_align_bits: PerSource::One(8),
            output_align_repeat: 0,
            output_align_bits: 8,
            repeat: 0,
        }
    }
}

impl InterleaveParams {
    pub fn validate(&self, sources: usize) -> Result<InterleaveConfig> {
        if sources == 0 {
            bail!(ConfigError::NoDataSource);
        }

        let input_bits = self.input_bits.expand("InputBits", sources)?;
        let align_repeat = self.input_align_repeat.expand("InputAlignRepeat", sources)?;
        let align_bits = self.input_align_bits.expand("InputAlignBits", sources)?;

        let sources = input_bits
            .into_iter()
            .zip(align_repeat)
            .zip(align_bits)
            .map(|((bits_in, repeat), unit)| {
                Ok(SourceSpec {
                    bits_in: bits("InputBits", bits_in)?,
                    alignment: alignment("InputAlignRepeat", repeat, "InputAlignBits", unit)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let config = InterleaveConfig {
            sources,
            output_align: alignment(
                "OutputAlignRepeat",
                self.output_align_repeat,
                "OutputAlignBits",
                self.output_align_bits,
            )?,
            repeat: Repeat::from_count(count("Repeat", self.repeat)? as u64),
        };
        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::alignment::AlignCycle;

    fn config_error(err: anyhow::Error) -> ConfigError {
        err.downcast::<ConfigError>().expect("not a ConfigError")
    }

    #[test]
    fn resample_defaults() -> Result<()> {
        let params: ResampleParams = serde_yaml_ng::from_str("Samples: 3")?;
        let config = params.validate()?;

        assert_eq!(config.bits_in, 8);
        assert_eq!(config.bits_out, 8);
        assert_eq!(config.window.samples, 3);
        assert_eq!(config.window.bits_before, 0);
        assert_eq!(config.input_align, Alignment::never());
        assert_eq!(config.output_align.unit_bits, 8);
        assert_eq!(config.repeat, Repeat::Unbounded);
        assert!(!config.seek_source);
        assert!(config.mapping.is_none());
        Ok(())
    }

    #[test]
    fn output_bits_follow_input_bits() -> Result<()> {
        let params: ResampleParams = serde_yaml_ng::from_str("InputBits: 12\nSamples: 1")?;
        assert_eq!(params.validate()?.bits_out, 12);
        Ok(())
    }

    #[test]
    fn resample_full_dictionary() -> Result<()> {
        let yaml = "
InputBits: 2
OutputBits: 3
Samples: 4
BitsBefore: 1
BitsAfter: 7
InputAlignRepeat: 2
InputAlignBits: 32
OutputAlignRepeat: 1
OutputAlignBits: 16
Repeat: 9
SeekSource: true
Mapping: [0, 3, 5, 7]
";
        let config = serde_yaml_ng::from_str::<ResampleParams>(yaml)?.validate()?;

        assert_eq!(config.window.bits_after, 7);
        assert_eq!(config.input_align.unit_bits, 32);
        assert!(matches!(config.input_align.cycle, AlignCycle::Every(n) if n.get() == 2));
        assert_eq!(config.repeat, Repeat::from_count(9));
        assert!(config.seek_source);
        assert_eq!(config.mapping, Some(vec![0, 3, 5, 7]));
        Ok(())
    }

    #[test]
    fn resample_violations() {
        let base = ResampleParams {
            samples: Some(1),
            ..Default::default()
        };

        let err = ResampleParams::default().validate().unwrap_err();
        assert!(matches!(config_error(err), ConfigError::MissingSamples));

        let cases = [
            ResampleParams { input_bits: 17, ..base.clone() },
            ResampleParams { samples: Some(0), ..base.clone() },
            ResampleParams { bits_before: -1, ..base.clone() },
            ResampleParams { input_align_bits: 0, ..base.clone() },
            ResampleParams { output_bits: Some(0), ..base.clone() },
            ResampleParams { repeat: -3, ..base.clone() },
        ];
        for params in cases {
            let err = params.validate().unwrap_err();
            assert!(matches!(config_error(err), ConfigError::OutOfRange { .. }));
        }
    }

    #[test]
    fn first_violation_wins() {
        let params = ResampleParams {
            input_bits: 0,
            samples: Some(0),
            ..Default::default()
        };
        match config_error(params.validate().unwrap_err()) {
            ConfigError::OutOfRange { name, value, .. } => {
                assert_eq!(name, "InputBits");
                assert_eq!(value, 0);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn mapping_violations() {
        let params = ResampleParams {
            input_bits: 1,
            output_bits: Some(2),
            samples: Some(1),
            mapping: Some(vec![0.0, 1.5]),
            ..Default::default()
        };
        assert!(matches!(
            config_error(params.validate().unwrap_err()),
            ConfigError::MappingEntryNotIntegral { index: 1, .. }
        ));

        let params = ResampleParams {
            mapping: Some(vec![0.0, 4.0]),
            ..params
        };
        assert!(matches!(
            config_error(params.validate().unwrap_err()),
            ConfigError::MappingEntryOutOfRange { index: 1, value: 4, max: 3 }
        ));

        let params = ResampleParams {
            mapping: Some(vec![0.0, 1.0, 2.0]),
            ..params
        };
        assert!(matches!(
            config_error(params.validate().unwrap_err()),
            ConfigError::MappingLength { expected: 2, actual: 3 }
        ));
    }

    #[test]
    fn misspelled_keys_are_rejected() {
        let err = serde_yaml_ng::from_str::<ResampleParams>("Samples: 1\nOutputBit: 4").unwrap_err();
        assert!(err.to_string().contains("OutputBit"), "{err}");

        let err = serde_yaml_ng::from_str::<InterleaveParams>("InputBit: [4, 8]").unwrap_err();
        assert!(err.to_string().contains("InputBit"), "{err}");
    }

    #[test]
    fn non_numeric_mapping_fails_to_parse() {
        let parsed = serde_yaml_ng::from_str::<ResampleParams>("Samples: 1\nMapping: [a, b]");
        assert!(parsed.is_err());
    }

    #[test]
    fn sticky_arrays() -> Result<()> {
        assert_eq!(PerSource::One(4).expand("InputBits", 3)?, vec![4, 4, 4]);
        assert_eq!(
            PerSource::Many(vec![1, 2]).expand("InputBits", 4)?,
            vec![1, 2, 2, 2]
        );
        assert_eq!(
            PerSource::Many(vec![7]).expand("InputBits", 3)?,
            PerSource::One(7).expand("InputBits", 3)?
        );

        let err = PerSource::Many(vec![1, 2, 3]).expand("InputBits", 2).unwrap_err();
        assert!(matches!(
            config_error(err),
            ConfigError::PerSourceLength { len: 3, sources: 2, .. }
        ));

        let err = PerSource::Many(vec![]).expand("InputBits", 2).unwrap_err();
        assert!(matches!(
            config_error(err),
            ConfigError::EmptyPerSourceArray { .. }
        ));
        Ok(())
    }

    #[test]
    fn interleave_dictionary() -> Result<()> {
        let yaml = "
InputBits: [4, 12]
InputAlignRepeat: 2
InputAlignBits: [8, 8, 16]
Repeat: 5
";
        let params: InterleaveParams = serde_yaml_ng::from_str(yaml)?;
        let config = params.validate(3)?;

        let bits: Vec<_> = config.sources.iter().map(|s| s.bits_in).collect();
        assert_eq!(bits, vec![4, 12, 12]);
        assert_eq!(config.sources[2].alignment, Alignment::every(2, 16));
        assert_eq!(config.output_align, Alignment::never());
        assert_eq!(config.repeat, Repeat::from_count(5));
        Ok(())
    }

    #[test]
    fn interleave_violations() {
        let err = InterleaveParams::default().validate(0).unwrap_err();
        assert!(matches!(config_error(err), ConfigError::NoDataSource));

        let params = InterleaveParams {
            input_bits: PerSource::Many(vec![8, 0]),
            ..Default::default()
        };
        assert!(matches!(
            config_error(params.validate(2).unwrap_err()),
            ConfigError::OutOfRange { name: "InputBits", value: 0, .. }
        ));
    }
}
