//! respack-crypt: resource pack encryption CLI
//!
//!   encrypt <input.zip>   - encrypt a pack, writing archive, key file and info file
//!   inspect <archive>     - decrypt and list a contents index using a key file
//!   keygen                - print a fresh 32-character key

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use respack_crypt::{
    generate_key, read_index, CancelToken, EncryptorConfig, PackEncryptor, PackReader,
    CONTENTS_FILE_NAME,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "respack-crypt",
    version,
    about = "Encrypt resource packs for distribution"
)]
struct Cli {
    /// Path to respack.toml configuration file
    #[arg(long, short = 'c', env = "RESPACK_CONFIG", default_value = "respack.toml")]
    config: PathBuf,

    /// Log output format (overrides config)
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt a resource pack ZIP
    Encrypt {
        /// Input pack archive
        input: PathBuf,
        /// Output directory (default: next to the input)
        #[arg(long, short = 'o')]
        output_dir: Option<PathBuf>,
        /// Master key (default: freshly generated)
        #[arg(long, env = "RESPACK_MASTER_KEY", hide_env_values = true)]
        master_key: Option<String>,
        /// Additional root file to copy unencrypted (repeatable)
        #[arg(long = "exclude")]
        exclude: Vec<String>,
        /// Do not apply the configured exclusion list
        #[arg(long)]
        no_default_excludes: bool,
        /// Print every processed member
        #[arg(long, short = 'v')]
        verbose: bool,
    },

    /// List the entries of a contents index
    Inspect {
        /// Encrypted pack archive
        archive: PathBuf,
        /// Key file written by `encrypt`
        #[arg(long, short = 'k')]
        key_file: PathBuf,
        /// Index member to read
        #[arg(long, default_value = CONTENTS_FILE_NAME)]
        index: String,
    },

    /// Print a fresh 32-character key
    Keygen,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

fn init_logging(level: &str, format: LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = EncryptorConfig::load(&cli.config)
        .with_context(|| format!("loading config: {}", cli.config.display()))?;

    let format = cli.log_format.unwrap_or(match config.logging.format.as_str() {
        "json" => LogFormat::Json,
        _ => LogFormat::Text,
    });
    init_logging(&config.logging.level, format);

    match cli.command {
        Commands::Encrypt {
            input,
            output_dir,
            master_key,
            exclude,
            no_default_excludes,
            verbose,
        } => {
            if no_default_excludes {
                config.pack.excluded_files.clear();
            }
            config.pack.excluded_files.extend(exclude);
            cmd_encrypt(&config, &input, output_dir, master_key, verbose)
        }
        Commands::Inspect {
            archive,
            key_file,
            index,
        } => cmd_inspect(&archive, &key_file, &index),
        Commands::Keygen => {
            println!("{}", generate_key());
            Ok(())
        }
    }
}

fn cmd_encrypt(
    config: &EncryptorConfig,
    input: &Path,
    output_dir: Option<PathBuf>,
    master_key: Option<String>,
    verbose: bool,
) -> Result<()> {
    if !input.is_file() {
        anyhow::bail!("input archive not found: {}", input.display());
    }

    let output_dir = output_dir.unwrap_or_else(|| {
        input
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    });
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory: {}", output_dir.display()))?;

    let job = config.job_for(input, &output_dir, master_key.unwrap_or_else(generate_key));
    info!(input = %input.display(), output = %job.output().display(), "encrypting pack");

    let bar = ProgressBar::new(0);
    bar.set_style(ProgressStyle::with_template(
        "{spinner} [{bar:40}] {pos}/{len} {msg}",
    )?);

    let cancel = CancelToken::new();
    watch_interrupt(cancel.clone());

    let progress_bar = bar.clone();
    let mut encryptor = PackEncryptor::new(job)
        .with_cancel_token(cancel)
        .with_progress(move |p| {
            progress_bar.set_length(p.total as u64);
            progress_bar.set_position(p.completed as u64);
            progress_bar.set_message(p.label());
        });
    if verbose {
        let log_bar = bar.clone();
        encryptor = encryptor.with_log(move |line| log_bar.println(line));
    }

    // The pipeline blocks; keep it off the main thread
    let worker = std::thread::spawn(move || encryptor.run());
    let result = worker
        .join()
        .map_err(|_| anyhow!("encryption worker panicked"))?;
    bar.finish_and_clear();

    match result {
        Ok(report) => {
            println!("UUID:           {}", report.uuid);
            println!("Encrypted file: {}", report.output.display());
            println!("Key file:       {}", report.key_file.display());
            println!("Info file:      {}", report.info_file.display());
            println!(
                "{} encrypted, {} copied, {} subpack(s)",
                report.encrypted_files, report.copied_files, report.subpacks
            );
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            eprintln!("cancelled, existing outputs left unchanged");
            std::process::exit(130);
        }
        Err(e) => Err(e).context("encryption failed"),
    }
}

/// Cancel `token` on the first Ctrl-C; the run stops at its next checkpoint
fn watch_interrupt(token: CancelToken) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                warn!(error = %e, "interrupt handler unavailable");
                return;
            }
        };

        match runtime.block_on(tokio::signal::ctrl_c()) {
            Ok(()) => {
                info!("received SIGINT, cancelling");
                token.cancel();
            }
            Err(e) => warn!(error = %e, "registering SIGINT handler failed"),
        }
    });
}

fn cmd_inspect(archive: &Path, key_file: &Path, index: &str) -> Result<()> {
    let master_key = std::fs::read_to_string(key_file)
        .with_context(|| format!("reading key file: {}", key_file.display()))?;

    let mut reader = PackReader::open(archive)
        .with_context(|| format!("opening archive: {}", archive.display()))?;
    let blob = reader
        .read(index)
        .with_context(|| format!("reading {} from {}", index, archive.display()))?;

    let (header, contents) = read_index(&blob, master_key.trim())
        .with_context(|| format!("decoding {}", index))?;

    println!("Content id: {}", header.content_id);
    for entry in &contents.content {
        match &entry.key {
            Some(key) => println!("  {}  {}", key, entry.path),
            None => println!("  {:<32}  {}", "(plain)", entry.path),
        }
    }
    println!("{} entries", contents.content.len());
    Ok(())
}
