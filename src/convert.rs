use std::path::Path;

use crate::config::ConvertOptions;
use crate::error::{ConvertError, Result, Warning};
use crate::header::Header;
use crate::ktx1::{Ktx1Header, TextureKtx1};
use crate::texture::TextureKtx2;

/// Where a conversion is, or where it stopped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Start,
    HeaderParsed,
    LevelIndexParsed,
    KeyValueParsed,
    LevelsExtracted,
    TargetBuilt,
    Written,
    Done,
    Failed,
}

#[derive(Debug, Default)]
pub(crate) struct Progress {
    stage: Stage,
    /// Last stage completed before the failure.
    failed_after: Option<Stage>,
}

impl Progress {
    pub(crate) fn advance(&mut self, next: Stage) {
        tracing::debug!(from = ?self.stage, to = ?next, "conversion stage");
        self.stage = next;
    }

    pub(crate) fn fail(&mut self, error: &ConvertError) {
        if self.stage == Stage::Failed {
            return;
        }
        self.failed_after = Some(self.stage);
        tracing::error!(after = ?self.failed_after, "conversion failed: {error}");
        self.stage = Stage::Failed;
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }
}

/// Summary of a successful conversion.
#[derive(Clone, Debug)]
pub struct ConversionReport {
    pub stage: Stage,
    pub source: Header,
    pub target: Ktx1Header,
    /// Recoverable problems met along the way, in the order they were found.
    pub warnings: Vec<Warning>,
    pub retained_keys: Vec<String>,
    pub dropped_keys: Vec<String>,
}

impl ConversionReport {
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

fn build_target(
    buffer: &[u8],
    options: &ConvertOptions,
    progress: &mut Progress,
) -> Result<(TextureKtx1, ConversionReport)> {
    let source = TextureKtx2::parse(buffer, options.strictness, progress)?;
    let dropped_keys = source.dropped_keys(options);
    for key in &dropped_keys {
        tracing::debug!(key = %key, "dropping key/value entry");
    }
    let retained_keys = source.retained_keys(options);
    let (source_header, warnings) = (source.header, source.warnings.clone());

    let target = source.into_ktx1(options)?;
    progress.advance(Stage::TargetBuilt);

    let report = ConversionReport {
        stage: Stage::TargetBuilt,
        source: source_header,
        target: target.header,
        warnings,
        retained_keys,
        dropped_keys,
    };
    Ok((target, report))
}

/// Converts KTX2 bytes to KTX1 bytes in memory.
pub fn convert_bytes(
    input: &[u8],
    options: &ConvertOptions,
) -> Result<(Vec<u8>, ConversionReport)> {
    let mut progress = Progress::default();
    let (target, mut report) =
        build_target(input, options, &mut progress).inspect_err(|error| progress.fail(error))?;

    let bytes = target.to_bytes();
    progress.advance(Stage::Done);
    report.stage = progress.stage();
    Ok((bytes, report))
}

/// Converts the KTX2 file at `input` into a KTX1 file at `output` with default options.
pub fn convert(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<ConversionReport> {
    convert_with(input, output, &ConvertOptions::default())
}

/// Converts the KTX2 file at `input` into a KTX1 file at `output`.
///
/// On error the output file, if one was created, is left in an undefined state.
pub fn convert_with(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<ConversionReport> {
    let (input, output) = (input.as_ref(), output.as_ref());
    tracing::info!(input = %input.display(), output = %output.display(), "converting");

    let mut progress = Progress::default();
    let result = crate::reader::read_file(input)
        .and_then(|buffer| build_target(&buffer, options, &mut progress))
        .and_then(|(target, report)| {
            target.write_to_ktx1(output)?;
            Ok(report)
        });

    let mut report = result.inspect_err(|error| progress.fail(error))?;
    progress.advance(Stage::Written);
    progress.advance(Stage::Done);
    report.stage = progress.stage();

    tracing::info!(
        levels = report.target.number_of_mipmap_levels,
        faces = report.target.number_of_faces,
        key_value_bytes = report.target.bytes_of_key_value_data,
        warnings = report.warnings.len(),
        "conversion complete"
    );
    Ok(report)
}
