use anyhow::Result;
use indicatif::MultiProgress;

use bitsamp::process::resample::Resampler;
use bitsamp::structs::params::ResampleParams;
use bitsamp::utils::source::SourceRef;

use super::command::ResampleArgs;
use super::drive::{drive, open_output};
use crate::input::InputSource;
use crate::job::{self, ResampleJob};

/// Command-line flags win over job file keys.
fn overlay(args: &ResampleArgs, mut params: ResampleParams) -> ResampleParams {
    macro_rules! set {
        ($src:expr => $($field:ident),*) => {
            $(if let Some(value) = $src.$field {
                params.$field = value;
            })*
        };
    }

    set!(args => input_bits, bits_before, bits_after, input_align_repeat, input_align_bits);
    set!(args.job => output_align_repeat, output_align_bits, repeat);

    if args.samples.is_some() {
        params.samples = args.samples;
    }
    if args.output_bits.is_some() {
        params.output_bits = args.output_bits;
    }
    if args.seek_source {
        params.seek_source = true;
    }

    params
}

pub fn cmd_resample(args: &ResampleArgs, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Resampling stream: {}", args.input.display());

    let loaded: ResampleJob = job::load(args.job.params.as_deref())?;
    let job = ResampleJob {
        params: overlay(args, loaded.params),
    };
    job::log_effective("resample", &job);

    let config = job.params.validate()?;
    let input = InputSource::open(&args.input)?;
    if config.seek_source && input.is_pipe() {
        log::warn!("SeekSource needs a seekable input, stdin is not");
    }

    let mut engine = Resampler::new(SourceRef::owned(input), &config)?;
    let mut out = open_output(args.job.output.as_deref())?;

    drive(&mut engine, &mut out, args.job.buffer_size, multi)?;
    log::info!("Resampled {} windows", engine.windows());

    engine.close()?;
    Ok(())
}
