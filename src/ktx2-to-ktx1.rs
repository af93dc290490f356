use std::path::PathBuf;

use anyhow::Context;
use structopt::StructOpt;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use ktx2_to_ktx1::{ConvertError, ConvertOptions, Strictness, TextureKtx1};

#[derive(StructOpt)]
#[structopt(about = "Convert a KTX2 texture into a KTX1 texture")]
struct Opts {
    input: PathBuf,
    output: PathBuf,
    /// Fail on truncated key/value or face data instead of recovering.
    #[structopt(long)]
    strict: bool,
    /// Additional key/value entry to carry over ("sh" is always kept).
    #[structopt(long = "keep-key")]
    keep_keys: Vec<String>,
    /// Read the output back and check it after writing.
    #[structopt(long)]
    verify: bool,
    #[structopt(short, long)]
    verbose: bool,
}

fn verify(opts: &Opts, levels: u32) -> anyhow::Result<()> {
    let written = TextureKtx1::read_from_ktx1(&opts.output)
        .with_context(|| format!("reading back {}", opts.output.display()))?;
    anyhow::ensure!(
        written.levels.len() as u32 == levels,
        "expected {} levels in output, found {}",
        levels,
        written.levels.len()
    );
    anyhow::ensure!(written.vk_format().is_some(), "output format is not recognised");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::from_args();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if opts.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut options = ConvertOptions::default().with_strictness(if opts.strict {
        Strictness::Strict
    } else {
        Strictness::Lenient
    });
    for key in &opts.keep_keys {
        options = options.retain_key(key.as_str());
    }

    let report = match ktx2_to_ktx1::convert_with(&opts.input, &opts.output, &options) {
        Ok(report) => report,
        Err(error) => {
            let code = error.exit_code();
            report_error(&error);
            std::process::exit(code);
        }
    };

    if !report.is_clean() {
        tracing::warn!(
            "{} written with {} warning(s), output may be degraded",
            opts.output.display(),
            report.warnings.len()
        );
    }
    if opts.verify {
        verify(&opts, report.target.number_of_mipmap_levels)?;
        tracing::info!("verified {}", opts.output.display());
    }
    Ok(())
}

fn report_error(error: &ConvertError) {
    eprintln!("Error: {error}");
}
