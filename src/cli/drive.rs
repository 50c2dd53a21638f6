use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use bitsamp::process::{Fill, Filled};

use crate::input::is_pipe;

/// Opens `path` for writing, or stdout when absent or "-".
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) if !is_pipe(path) => {
            log::info!("Output path specified: {}", path.display());
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        _ => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

pub fn create_progress_bar(multi: &MultiProgress) -> Result<ProgressBar> {
    let pb = multi.add(ProgressBar::new_spinner());
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.green} {bytes} written ({binary_bytes_per_sec})\n{msg} | elapsed: {elapsed_precise}",
    )?);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

/// Fills `engine` into `out` until it is exhausted. Returns the bytes written.
pub fn drive<F: Fill>(
    engine: &mut F,
    out: &mut dyn Write,
    buffer_size: usize,
    multi: Option<&MultiProgress>,
) -> Result<u64> {
    let min = engine.min_buffer_len();
    if buffer_size < min {
        log::debug!("Raising buffer size from {buffer_size} to one window ({min} bytes)");
    }
    let mut buffer = vec![0u8; buffer_size.max(min)];

    let pb = multi.map(create_progress_bar).transpose()?;
    if let Some(ref pb) = pb {
        pb.set_message("decoding");
    }

    let start = Instant::now();
    let mut total = 0u64;
    loop {
        let Filled { len, end } = engine.fill(&mut buffer)?;

        out.write_all(&buffer[..len])?;
        total += len as u64;
        if let Some(ref pb) = pb {
            pb.inc(len as u64);
        }

        if end {
            break;
        }
    }
    out.flush()?;

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let elapsed = start.elapsed();
    let write_speed_mbps = if elapsed.as_secs_f64() > 0.0 {
        (total as f64) / 1_000_000.0 / elapsed.as_secs_f64()
    } else {
        0.0
    };
    log::info!(
        "Wrote {total} bytes in {:.3}s ({write_speed_mbps:.1} MB/s)",
        elapsed.as_secs_f64()
    );

    Ok(total)
}
