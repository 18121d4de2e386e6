//! Safetensors I/O for recordings and synchronized pairs.
//!
//! Layout of a recording file:
//!
//! | key        | dtype          | shape    |                                  |
//! |------------|----------------|----------|----------------------------------|
//! | `data`     | F64 or F32     | `[C, T]` | channel × sample                 |
//! | `sfreq`    | F64, F32, I32  | `[1]`    | sampling frequency (Hz)          |
//! | `ch_names` | U8             | `[n]`    | newline-joined UTF-8, optional   |
use anyhow::{bail, Context, Result};
use ndarray::Array2;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::recording::Recording;
use crate::sync::SyncedPair;

// ── Low-level safetensors parser ─────────────────────────────────────────────

fn parse_header(bytes: &[u8]) -> Result<(HashMap<String, serde_json::Value>, usize)> {
    if bytes.len() < 8 {
        bail!("safetensors file too small");
    }
    let mut len = [0u8; 8];
    len.copy_from_slice(&bytes[..8]);
    let n = u64::from_le_bytes(len) as usize;
    if bytes.len() < 8 + n {
        bail!("safetensors header truncated ({} of {n} bytes)", bytes.len() - 8);
    }
    let header: HashMap<String, serde_json::Value> =
        serde_json::from_slice(&bytes[8..8 + n])
            .context("failed to parse safetensors header")?;
    Ok((header, 8 + n))
}

fn tensor_bytes<'a>(
    bytes: &'a [u8],
    data_start: usize,
    entry: &serde_json::Value,
) -> Result<&'a [u8]> {
    let offsets = entry["data_offsets"].as_array().context("missing data_offsets")?;
    let (s, e) = match offsets.as_slice() {
        [s, e] => (
            s.as_u64().context("bad data offset")? as usize,
            e.as_u64().context("bad data offset")? as usize,
        ),
        _ => bail!("data_offsets must hold two values"),
    };
    bytes
        .get(data_start + s..data_start + e)
        .context("tensor data out of bounds")
}

/// Read a numeric tensor as `f64`, whatever its stored float/int dtype.
fn read_f64_tensor(bytes: &[u8], data_start: usize, entry: &serde_json::Value) -> Result<Vec<f64>> {
    let raw = tensor_bytes(bytes, data_start, entry)?;
    let dtype = entry["dtype"].as_str().context("missing dtype")?;
    Ok(match dtype {
        "F64" => raw
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
            .collect(),
        "F32" => raw
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
            .collect(),
        "I32" => raw
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f64)
            .collect(),
        other => bail!("unsupported dtype {other}"),
    })
}

fn shape_of(entry: &serde_json::Value) -> Result<Vec<usize>> {
    entry["shape"]
        .as_array()
        .context("missing shape")?
        .iter()
        .map(|v| v.as_u64().map(|d| d as usize).context("bad shape entry"))
        .collect()
}

// ── Recording reader ─────────────────────────────────────────────────────────

/// Load a [`Recording`] from a safetensors file.
///
/// Channels without stored names are called `ch0`, `ch1`, ….
pub fn load_recording(path: &Path) -> Result<Recording> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let (header, data_start) = parse_header(&bytes)?;

    let data_entry = header.get("data").context("missing 'data' key")?;
    let shape = shape_of(data_entry)?;
    let [n_ch, n_t] = shape[..] else {
        bail!("'data' must be 2-D [C, T], got shape {shape:?}");
    };
    let values = read_f64_tensor(&bytes, data_start, data_entry)?;
    let data = Array2::from_shape_vec((n_ch, n_t), values)?;

    let sfreq_entry = header.get("sfreq").context("missing 'sfreq' key")?;
    let sfreq = *read_f64_tensor(&bytes, data_start, sfreq_entry)?
        .first()
        .context("empty 'sfreq' tensor")?;
    if !(sfreq >= 1.0) || sfreq.fract() != 0.0 {
        bail!("sampling frequency must be a positive integer, got {sfreq}");
    }

    // Channel names are optional.
    let ch_names = match header.get("ch_names") {
        Some(e) => std::str::from_utf8(tensor_bytes(&bytes, data_start, e)?)?
            .split('\n')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        None => (0..n_ch).map(|i| format!("ch{i}")).collect(),
    };

    Ok(Recording::new(data, ch_names, sfreq as u32)?)
}

// ── Generic safetensors builder ──────────────────────────────────────────────

/// Simple safetensors file writer for F64, I32 and U8 tensors.
///
/// ```rust,no_run
/// use resync::io::StWriter;
/// use std::path::Path;
/// let mut w = StWriter::new();
/// w.add_f64("signal", &[1.0, 2.0, 3.0], &[1, 3]);
/// w.write(Path::new("/tmp/out.safetensors")).unwrap();
/// ```
#[derive(Default)]
pub struct StWriter {
    entries: Vec<(String, Vec<u8>, &'static str, Vec<usize>)>,
}

impl StWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_f64(&mut self, name: &str, data: &[f64], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "F64", shape.to_vec()));
    }

    pub fn add_f64_arr2(&mut self, name: &str, arr: &Array2<f64>) {
        let data: Vec<f64> = arr.iter().copied().collect();
        self.add_f64(name, &data, &[arr.nrows(), arr.ncols()]);
    }

    pub fn add_i32(&mut self, name: &str, data: &[i32], shape: &[usize]) {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        self.entries.push((name.to_string(), bytes, "I32", shape.to_vec()));
    }

    /// Store a string as a 1-D U8 tensor.
    pub fn add_str(&mut self, name: &str, s: &str) {
        let bytes = s.as_bytes().to_vec();
        let len = bytes.len();
        self.entries.push((name.to_string(), bytes, "U8", vec![len]));
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        use std::io::Write;
        let mut header_map = serde_json::Map::new();
        let mut offset: usize = 0;
        for (name, data, dtype, shape) in &self.entries {
            header_map.insert(name.clone(), serde_json::json!({
                "dtype": dtype,
                "shape": shape,
                "data_offsets": [offset, offset + data.len()],
            }));
            offset += data.len();
        }
        let hdr_bytes = serde_json::to_vec(&header_map)?;
        let pad = (8 - hdr_bytes.len() % 8) % 8;
        let padded: Vec<u8> = hdr_bytes.into_iter()
            .chain(std::iter::repeat(b' ').take(pad))
            .collect();
        let mut f = std::fs::File::create(path)
            .with_context(|| format!("creating {}", path.display()))?;
        f.write_all(&(padded.len() as u64).to_le_bytes())?;
        f.write_all(&padded)?;
        for (_, data, _, _) in &self.entries {
            f.write_all(data)?;
        }
        Ok(())
    }
}

// ── Recording writers ────────────────────────────────────────────────────────

/// Write `rec` in the layout [`load_recording`] reads.
pub fn write_recording(rec: &Recording, path: &Path) -> Result<()> {
    let mut w = StWriter::new();
    w.add_f64_arr2("data", rec.data());
    w.add_f64("sfreq", &[rec.sfreq() as f64], &[1]);
    w.add_str("ch_names", &rec.ch_names().join("\n"));
    w.write(path)
}

/// Write both synchronized recordings into `dir`.
///
/// Files: `Intracranial_LFP_<session>.safetensors` and
/// `External_data_<session>.safetensors`. Returns their paths.
pub fn write_synced_pair(pair: &SyncedPair, dir: &Path, session_id: &str) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let lfp_path = dir.join(format!("Intracranial_LFP_{session_id}.safetensors"));
    let ext_path = dir.join(format!("External_data_{session_id}.safetensors"));
    write_recording(&pair.lfp, &lfp_path)?;
    write_recording(&pair.external, &ext_path)?;
    Ok((lfp_path, ext_path))
}
