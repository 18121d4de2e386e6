use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use resync::{
    estimate_timeshift, measure_timeshift, resync, IntracranialMethod,
    ManualPicker, PickRequest, Recording, Review, ReviewMode, Reviewer, SessionInput,
    SyncConfig, TimeshiftOptions,
    io::{load_recording, write_synced_pair},
};

#[derive(Parser)]
#[command(name = "resync", about = "Synchronize intracranial LFP and external recordings on DBS artifacts")]
struct Args {
    /// Intracranial recording (.safetensors: data [C, T], sfreq, ch_names)
    #[arg(long)]
    lfp: PathBuf,

    /// External recording (.safetensors: data [C, T], sfreq, ch_names)
    #[arg(long)]
    external: PathBuf,

    /// Intracranial channel carrying the artifacts (name or row index)
    #[arg(long, default_value = "0")]
    lfp_channel: String,

    /// External bipolar channel carrying the artifacts (name or row index)
    #[arg(long, default_value = "BIP 01")]
    external_channel: String,

    /// Session identifier used in output file names
    #[arg(long)]
    session: String,

    /// Output directory
    #[arg(long, default_value = "results")]
    output: PathBuf,

    /// JSON configuration file (any subset of the SyncConfig fields)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Crop both recordings one pre-roll before their anchors (default)
    #[arg(long, conflicts_with = "no_crop_both")]
    crop_both: bool,

    /// Keep the intracranial recording untouched, crop only the external one
    #[arg(long)]
    no_crop_both: bool,

    /// Intracranial method priority (repeatable): thresh, 1, 2, manual
    #[arg(long = "method")]
    methods: Vec<IntracranialMethod>,

    /// First external sample considered by the artifact scan
    #[arg(long)]
    start_index: Option<usize>,

    /// No prompts: accept the first detection, skip manual methods
    #[arg(long)]
    automated: bool,

    /// Measure the residual clock drift after synchronization
    #[arg(long)]
    timeshift: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut cfg: SyncConfig = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).context("parsing configuration")?
        }
        None => SyncConfig::default(),
    };
    if args.crop_both {
        cfg.crop_both = true;
    }
    if args.no_crop_both {
        cfg.crop_both = false;
    }
    if !args.methods.is_empty() {
        cfg.methods = args.methods.clone();
    }
    if let Some(start_index) = args.start_index {
        cfg.external.start_index = start_index;
    }
    if args.automated {
        cfg.mode = ReviewMode::Automated;
    }
    cfg.validate().context("checking configuration")?;

    let lfp = load_recording(&args.lfp)?;
    let ext = load_recording(&args.external)?;
    println!("Loaded intracranial: {} ch × {} samples @ {} Hz",
        lfp.n_channels(), lfp.n_samples(), lfp.sfreq());
    println!("Loaded external:     {} ch × {} samples @ {} Hz",
        ext.n_channels(), ext.n_samples(), ext.sfreq());

    let input = SessionInput {
        session_id: &args.session,
        lfp: &lfp,
        lfp_channel: resolve_channel(&lfp, &args.lfp_channel)?,
        external: &ext,
        external_channel: resolve_channel(&ext, &args.external_channel)?,
    };

    let (mut picker, mut reviewer) = (TerminalOperator, TerminalOperator);
    let (pair, mut record) = resync(&input, &cfg, &mut picker, &mut reviewer)?;

    if args.timeshift {
        let opts = TimeshiftOptions::from_config(&cfg);
        let m = match cfg.mode {
            ReviewMode::Automated => estimate_timeshift(
                &pair.lfp, input.lfp_channel, &pair.external, input.external_channel, &opts,
            )?,
            ReviewMode::Interactive => measure_timeshift(
                &pair.lfp, input.lfp_channel, &pair.external, input.external_channel,
                &mut picker, &opts,
            )?,
        };
        println!("Timeshift: {:.2} ms over {:.1} s", m.timeshift_ms, m.reference_secs);
        record.set_timeshift(m);
    }

    let (lfp_path, ext_path) = write_synced_pair(&pair, &args.output, &args.session)?;
    let params_path = args.output.join(format!("parameters_{}.json", args.session));
    std::fs::write(&params_path, record.to_json()?)
        .with_context(|| format!("writing {}", params_path.display()))?;

    for w in &record.warnings {
        println!("WARNING: {w}");
    }
    println!("Written → {}", lfp_path.display());
    println!("Written → {}", ext_path.display());
    println!("Written → {}", params_path.display());

    Ok(())
}

/// Row index from either a number or a channel name.
fn resolve_channel(rec: &Recording, spec: &str) -> Result<usize> {
    if let Ok(idx) = spec.parse::<usize>() {
        if idx >= rec.n_channels() {
            bail!("channel index {idx} out of range ({} channels)", rec.n_channels());
        }
        return Ok(idx);
    }
    rec.channel_index(spec)
        .with_context(|| format!("no channel named {spec:?}; available: {}", rec.ch_names().join(", ")))
}

/// Terminal front-end: typed times stand in for mouse picks.
struct TerminalOperator;

impl TerminalOperator {
    fn read_line() -> resync::Result<String> {
        std::io::stdout().flush().ok();
        let mut line = String::new();
        // Closed stdin can never confirm a pick.
        match std::io::stdin().lock().read_line(&mut line) {
            Ok(n) if n > 0 => Ok(line.trim().to_string()),
            _ => Err(resync::SyncError::EmptySelection),
        }
    }

    fn yes_no(question: &str) -> resync::Result<bool> {
        loop {
            print!("{question}");
            match Self::read_line()?.to_lowercase().as_str() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                _ => println!("  please answer y or n"),
            }
        }
    }
}

impl ManualPicker for TerminalOperator {
    fn pick(&mut self, req: &PickRequest<'_>) -> resync::Result<Vec<f64>> {
        let (lo, hi) = req.signal.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
        println!("\n[{}] {}", req.side, req.prompt);
        println!("  {} samples @ {} Hz ({:.3} s), range [{lo:.3}, {hi:.3}]",
            req.signal.len(), req.sfreq, req.signal.len() as f64 / req.sfreq as f64);
        println!("  enter time(s) in seconds, one per line; empty line to confirm");

        let mut picks = vec![];
        loop {
            print!("  pick> ");
            let line = Self::read_line()?;
            if line.is_empty() {
                if picks.is_empty() {
                    println!("  nothing picked yet");
                    continue;
                }
                return Ok(picks);
            }
            match line.parse::<f64>() {
                Ok(t) => picks.push(t),
                Err(_) => println!("  not a number: {line:?}"),
            }
        }
    }
}

impl Reviewer for TerminalOperator {
    fn confirm(&mut self, review: &Review<'_>) -> resync::Result<bool> {
        println!("\nMethod {}: intracranial artifact at {:.4} s, external artifact at {:.4} s",
            review.lfp_method, review.art_time_lfp, review.art_time_external);
        let shown: Vec<String> = review.lfp_candidates.iter().take(10).map(|t| format!("{t:.3}")).collect();
        println!("  intracranial candidates (s): {}", shown.join(", "));
        Self::yes_no("Are artifacts properly selected ? (y/n) ")
    }

    fn confirm_external(&mut self, art_time_external: f64) -> resync::Result<bool> {
        println!("\nExternal artifact detected at {art_time_external:.4} s");
        Self::yes_no("Is the external artifact properly selected ? (y/n) ")
    }
}
