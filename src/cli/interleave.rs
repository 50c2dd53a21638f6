use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use indicatif::MultiProgress;

use bitsamp::process::interleave::Interleaver;
use bitsamp::structs::params::{InterleaveParams, PerSource};
use bitsamp::utils::source::SourceRef;

use super::command::InterleaveArgs;
use super::drive::{drive, open_output};
use crate::input::{InputSource, is_pipe};
use crate::job::{self, InterleaveJob};

fn per_source(values: &[i64]) -> Option<PerSource> {
    match values {
        [] => None,
        [one] => Some(PerSource::One(*one)),
        many => Some(PerSource::Many(many.to_vec())),
    }
}

/// Command-line flags win over job file keys.
fn overlay(args: &InterleaveArgs, mut params: InterleaveParams) -> InterleaveParams {
    if let Some(bits) = per_source(&args.input_bits) {
        params.input_bits = bits;
    }
    if let Some(repeat) = per_source(&args.input_align_repeat) {
        params.input_align_repeat = repeat;
    }
    if let Some(bits) = per_source(&args.input_align_bits) {
        params.input_align_bits = bits;
    }

    if let Some(bits) = args.job.output_align_bits {
        params.output_align_bits = bits;
    }
    if let Some(repeat) = args.job.output_align_repeat {
        params.output_align_repeat = repeat;
    }
    if let Some(repeat) = args.job.repeat {
        params.repeat = repeat;
    }

    params
}

/// Job file sources are relative to the job file.
fn resolve(job_file: Option<&Path>, sources: Vec<PathBuf>) -> Vec<PathBuf> {
    let Some(base) = job_file.and_then(Path::parent) else {
        return sources;
    };

    sources
        .into_iter()
        .map(|p| {
            if p.is_relative() && !is_pipe(&p) {
                base.join(p)
            } else {
                p
            }
        })
        .collect()
}

pub fn cmd_interleave(args: &InterleaveArgs, multi: Option<&MultiProgress>) -> Result<()> {
    let job_file = args.job.params.as_deref();
    let loaded: InterleaveJob = job::load(job_file)?;

    let job = InterleaveJob {
        data_source: if args.inputs.is_empty() {
            resolve(job_file, loaded.data_source)
        } else {
            args.inputs.clone()
        },
        params: overlay(args, loaded.params),
    };
    job::log_effective("interleave", &job);

    let config = job.params.validate(job.data_source.len())?;
    if job.data_source.iter().filter(|p| is_pipe(p)).count() > 1 {
        bail!("stdin can feed only one input");
    }

    log::info!("Interleaving {} streams", job.data_source.len());
    let sources = job
        .data_source
        .iter()
        .map(|path| InputSource::open(path).map(SourceRef::owned))
        .collect::<Result<Vec<_>>>()?;

    let mut engine = Interleaver::new(sources, &config)?;
    let mut out = open_output(args.job.output.as_deref())?;

    drive(&mut engine, &mut out, args.job.buffer_size, multi)?;
    log::info!("Interleaved {} composite windows", engine.windows());

    engine.close()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::command::JobArgs;
    use bitsamp::utils::errors::ConfigError;
    use std::fs;

    fn args(inputs: Vec<PathBuf>, output: &Path) -> InterleaveArgs {
        InterleaveArgs {
            inputs,
            job: JobArgs {
                output: Some(output.to_path_buf()),
                params: None,
                buffer_size: 16,
                output_align_bits: None,
                output_align_repeat: None,
                repeat: None,
            },
            input_bits: Vec::new(),
            input_align_repeat: Vec::new(),
            input_align_bits: Vec::new(),
        }
    }

    #[test]
    fn two_nibble_streams() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        let output = dir.path().join("out.bin");
        fs::write(&a, [0xAB, 0xCD])?;
        fs::write(&b, [0x12, 0x34])?;

        let mut args = args(vec![a, b], &output);
        args.input_bits = vec![4];
        args.job.repeat = Some(2);

        cmd_interleave(&args, None)?;
        assert_eq!(fs::read(&output)?, vec![0xA1, 0xB2]);
        Ok(())
    }

    #[test]
    fn job_file_sources_are_relative_to_it() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("data"))?;
        fs::write(dir.path().join("data/hi.bin"), [0xAB, 0xCD, 0xEF])?;
        fs::write(dir.path().join("data/lo.bin"), [0x12])?;
        let params = dir.path().join("job.yaml");
        fs::write(
            &params,
            "DataSource: [data/hi.bin, data/lo.bin]\nInputBits: [12, 4]\n",
        )?;
        let output = dir.path().join("out.bin");

        let mut args = args(Vec::new(), &output);
        args.job.params = Some(params);

        cmd_interleave(&args, None)?;
        assert_eq!(fs::read(&output)?, vec![0xAB, 0xC1, 0xDE, 0xF2]);
        Ok(())
    }

    #[test]
    fn no_sources_is_a_config_error() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let err = cmd_interleave(&args(Vec::new(), &dir.path().join("out")), None).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::NoDataSource)
        ));
        Ok(())
    }

    #[test]
    fn flags_expand_per_source() {
        let mut args = args(Vec::new(), Path::new("-"));
        args.input_bits = vec![4, 12];
        args.input_align_bits = vec![16];

        let params = overlay(&args, InterleaveParams::default());
        assert_eq!(params.input_bits, PerSource::Many(vec![4, 12]));
        assert_eq!(params.input_align_bits, PerSource::One(16));
        assert_eq!(params.input_align_repeat, PerSource::One(0));
    }
}
