//! Helpers for converting measurement folders into AmbisonicsDRIR datasets.
//!
//! Decoding the audio itself is left to the caller. These functions cover
//! the rest: loudspeaker position files, sample layout and file naming.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

pub const SOFA_EXTENSION: &str = "sofa";

/// Reorder interleaved recordings from `(E,N,R)` to `(R,E,N)`.
///
/// Each loudspeaker recording arrives as `n` frames of `r` interleaved
/// Ambisonics channels, concatenated over `e` loudspeakers. `Data.IR` wants
/// the channel index outermost, so for a single measurement
/// `dst[r*E*N + e*N + n] = src[e*N*R + n*R + r]`.
pub fn reorder_enr_to_ren(data: &[f64], e: usize, n: usize, r: usize) -> Result<Vec<f64>> {
    if data.len() != e * n * r {
        return Err(Error::LengthMismatch {
            variable: "Data.IR".into(),
            expected: e * n * r,
            found: data.len(),
        });
    }

    let mut reordered = vec![0.0; data.len()];

    for ei in 0..e {
        for ni in 0..n {
            for ri in 0..r {
                reordered[ri * e * n + ei * n + ni] = data[ei * n * r + ni * r + ri];
            }
        }
    }

    Ok(reordered)
}

/// Samples per channel when the longest interleaved recording holds
/// `max_samples` samples over `receivers` channels.
pub fn samples_per_channel(max_samples: usize, receivers: usize) -> usize {
    match receivers {
        0 => 0,
        r => max_samples / r,
    }
}

/// Parse loudspeaker positions: whitespace separated `x y z` triples, one
/// triple per loudspeaker.
pub fn parse_loudspeaker_positions<R: BufRead>(reader: R) -> Result<Vec<[f64; 3]>> {
    let mut positions = Vec::new();
    let mut pending = Vec::with_capacity(3);
    let mut last_line = 0;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        last_line = idx + 1;

        for token in line.split_whitespace() {
            let value = token.parse::<f64>().map_err(|_| Error::InvalidPositions {
                line: idx + 1,
                reason: format!("`{token}` is not a number"),
            })?;

            pending.push(value);

            if pending.len() == 3 {
                positions.push([pending[0], pending[1], pending[2]]);
                pending.clear();
            }
        }
    }

    if !pending.is_empty() {
        return Err(Error::InvalidPositions {
            line: last_line,
            reason: format!("incomplete position, {} of 3 coordinates", pending.len()),
        });
    }

    Ok(positions)
}

/// Check that every recording has a position.
pub fn ensure_emitter_count(positions: &[[f64; 3]], recordings: usize) -> Result<()> {
    if positions.len() != recordings {
        log::warn!(
            "{} loudspeaker positions for {recordings} recordings",
            positions.len()
        );
        return Err(Error::LengthMismatch {
            variable: "EmitterPosition".into(),
            expected: recordings,
            found: positions.len(),
        });
    }

    Ok(())
}

/// `<output_dir>/<basename of input_folder>.sofa`
pub fn output_path<P: AsRef<Path>, Q: AsRef<Path>>(input_folder: P, output_dir: Q) -> PathBuf {
    let input_folder = input_folder.as_ref();
    let mut name = input_folder
        .file_name()
        .unwrap_or(input_folder.as_os_str())
        .to_os_string();

    name.push(".");
    name.push(SOFA_EXTENSION);

    output_dir.as_ref().join(name)
}
