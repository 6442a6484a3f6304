// src/convert.rs

//! File-level conversion: read, decode, write PNGs.
//!
//! `convert_file` is the single-file boundary. Every fatal decode error stops
//! there and comes back as an `anyhow::Error` naming the file and the error
//! kind. `run_batch` drives many files, optionally on several threads, and
//! keeps going past failures.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};

use crate::config::{Config, OutputConfig};
use crate::container::{self, Asset, DecodedFile};
use crate::font::FontAsset;
use crate::glyphs::extract_glyphs;

/// Where the outputs for one input file go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    /// Texture PNG, or the atlas PNG for fonts.
    pub image: PathBuf,
    /// Directory receiving `<n>.png` for each glyph.
    pub glyph_dir: PathBuf,
    pub metadata: PathBuf,
    pub decompressed: PathBuf,
}

impl OutputPaths {
    /// Derives output paths from the input's file stem. Outputs land in
    /// `out_dir` if given, otherwise next to the input.
    pub fn for_input(input: &Path, out_dir: Option<&Path>) -> Result<Self> {
        let stem = input
            .file_stem()
            .ok_or_else(|| anyhow!("Input path {} has no file name", input.display()))?;
        Ok(Self::named(&output_dir(input, out_dir), &stem.to_string_lossy()))
    }

    /// Like `for_input`, but folds the source extension into the name
    /// (`font.rtfont` -> `font_rtfont.png`). Used when two inputs of a batch
    /// share a stem.
    pub fn qualified(input: &Path, out_dir: Option<&Path>) -> Result<Self> {
        let name = input
            .file_name()
            .ok_or_else(|| anyhow!("Input path {} has no file name", input.display()))?
            .to_string_lossy()
            .replace('.', "_");
        Ok(Self::named(&output_dir(input, out_dir), &name))
    }

    fn named(dir: &Path, name: &str) -> Self {
        OutputPaths {
            image: dir.join(format!("{}.png", name)),
            glyph_dir: dir.join(name),
            metadata: dir.join(format!("{}.json", name)),
            decompressed: dir.join(format!("{}.decompressed.rtpack", name)),
        }
    }

    /// Path for the glyph with 1-based emitted index `ordinal`.
    pub fn glyph(&self, ordinal: usize) -> PathBuf {
        self.glyph_dir.join(format!("{}.png", ordinal))
    }
}

fn output_dir(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    }
}

/// Assigns every input of a batch its own output paths.
///
/// Inputs whose stem-derived paths would coincide switch to
/// `OutputPaths::qualified`. If even those collide (same file name in two
/// directories converted into one `out_dir`), the later input is refused so
/// no two conversions ever write the same file.
pub fn plan_outputs(inputs: &[PathBuf], out_dir: Option<&Path>) -> Vec<Result<OutputPaths>> {
    let mut stem_users: HashMap<PathBuf, usize> = HashMap::new();
    for input in inputs {
        if let Ok(paths) = OutputPaths::for_input(input, out_dir) {
            *stem_users.entry(paths.image).or_default() += 1;
        }
    }

    let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
    inputs
        .iter()
        .map(|input| {
            let paths = OutputPaths::for_input(input, out_dir)?;
            let paths = if stem_users.get(&paths.image).copied().unwrap_or(0) > 1 {
                let qualified = OutputPaths::qualified(input, out_dir)?;
                debug!(
                    "{} shares its output name, writing {} instead",
                    input.display(),
                    qualified.image.display()
                );
                qualified
            } else {
                paths
            };
            if let Some(owner) = claimed.get(&paths.image) {
                return Err(anyhow!(
                    "Output {} is already taken by {}",
                    paths.image.display(),
                    owner.display()
                ));
            }
            claimed.insert(paths.image.clone(), input.as_path());
            Ok(paths)
        })
        .collect()
}

/// What a successful conversion produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub input: PathBuf,
    pub kind: &'static str,
    pub width: u32,
    pub height: u32,
    pub glyphs_written: usize,
    /// Glyphs whose rectangle fell outside the atlas.
    pub glyphs_skipped: usize,
    pub files_written: usize,
}

/// Converts one file with stem-derived output paths. Nothing is written
/// unless decoding succeeds.
pub fn convert_file(input: &Path, output: &OutputConfig) -> Result<FileReport> {
    let paths = OutputPaths::for_input(input, output.directory.as_deref())?;
    convert_file_to(input, &paths, output)
}

/// Converts one file into the given `paths`.
pub fn convert_file_to(
    input: &Path,
    paths: &OutputPaths,
    output: &OutputConfig,
) -> Result<FileReport> {
    let bytes =
        fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    debug!("Loaded {} ({} bytes) onto memory.", input.display(), bytes.len());

    let decoded = container::decode_with(&bytes, output.dump_decompressed).map_err(|err| {
        let kind = err.kind();
        anyhow::Error::new(err).context(format!("{} in {}", kind, input.display()))
    })?;
    drop(bytes);

    write_outputs(input, &decoded, paths, output)
}

fn write_outputs(
    input: &Path,
    decoded: &DecodedFile,
    paths: &OutputPaths,
    output: &OutputConfig,
) -> Result<FileReport> {
    if let Some(dir) = paths.image.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    let mut files_written = 0;
    if output.dump_decompressed {
        if let Some(payload) = &decoded.inflated {
            fs::write(&paths.decompressed, payload).with_context(|| {
                format!("Failed to write {}", paths.decompressed.display())
            })?;
            debug!("Wrote decompressed payload to {}", paths.decompressed.display());
            files_written += 1;
        }
    }

    let mut report = match &decoded.asset {
        Asset::Texture(texture) => {
            texture.image.save_png(&paths.image)?;
            FileReport {
                input: input.to_path_buf(),
                kind: "texture",
                width: texture.image.width(),
                height: texture.image.height(),
                glyphs_written: 0,
                glyphs_skipped: 0,
                files_written: 1,
            }
        }
        Asset::Font(font) => write_font(input, font, paths, output)?,
    };
    report.files_written += files_written;
    debug!("{} --> {}", input.display(), paths.image.display());
    Ok(report)
}

fn write_font(
    input: &Path,
    font: &FontAsset,
    paths: &OutputPaths,
    output: &OutputConfig,
) -> Result<FileReport> {
    let atlas = &font.atlas.image;
    atlas.save_png(&paths.image)?;
    let mut report = FileReport {
        input: input.to_path_buf(),
        kind: "font",
        width: atlas.width(),
        height: atlas.height(),
        glyphs_written: 0,
        glyphs_skipped: 0,
        files_written: 1,
    };

    if output.write_metadata {
        let json = serde_json::to_string_pretty(&font.metadata())
            .context("Failed to serialise font metadata")?;
        fs::write(&paths.metadata, json)
            .with_context(|| format!("Failed to write {}", paths.metadata.display()))?;
        report.files_written += 1;
    }

    if output.extract_glyphs {
        debug!("Extracting all characters.");
        let extraction = extract_glyphs(font);
        if !extraction.glyphs.is_empty() {
            fs::create_dir_all(&paths.glyph_dir).with_context(|| {
                format!("Failed to create glyph directory {}", paths.glyph_dir.display())
            })?;
        }
        for glyph in &extraction.glyphs {
            glyph.image.save_png(&paths.glyph(glyph.ordinal))?;
        }
        if !extraction.failures.is_empty() {
            warn!(
                "{}: skipped {} glyph(s) lying outside the {}x{} atlas",
                input.display(),
                extraction.failures.len(),
                atlas.width(),
                atlas.height()
            );
        }
        report.glyphs_written = extraction.glyphs.len();
        report.glyphs_skipped = extraction.failures.len();
        report.files_written += extraction.glyphs.len();
    }

    Ok(report)
}

/// Files found on the command line, plus the paths that could not be read.
#[derive(Debug, Default)]
pub struct InputSet {
    pub files: Vec<PathBuf>,
    /// Missing paths and unlistable directories. Each counts as a failure.
    pub unreadable: Vec<(PathBuf, anyhow::Error)>,
}

impl InputSet {
    /// Number of command-line items that end up in the summary.
    pub fn len(&self) -> usize {
        self.files.len() + self.unreadable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.unreadable.is_empty()
    }
}

/// Expands the command-line paths into the list of files to convert.
///
/// Files are taken as given. Directories are scanned (not recursively) for
/// files whose extension is in `extensions`, sorted by name. A path that
/// cannot be accessed is recorded in `unreadable` and does not stop the scan.
pub fn collect_inputs(paths: &[PathBuf], extensions: &[String]) -> InputSet {
    let mut inputs = InputSet::default();
    for path in paths {
        let meta = match fs::metadata(path) {
            Ok(meta) => meta,
            Err(err) => {
                let err = anyhow::Error::new(err)
                    .context(format!("Cannot access {}", path.display()));
                inputs.unreadable.push((path.clone(), err));
                continue;
            }
        };
        if !meta.is_dir() {
            inputs.files.push(path.clone());
            continue;
        }

        match scan_dir(path, extensions) {
            Ok(found) => {
                debug!("{}: {} matching file(s)", path.display(), found.len());
                inputs.files.extend(found);
            }
            Err(err) => inputs.unreadable.push((path.clone(), err)),
        }
    }
    inputs
}

fn scan_dir(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("Failed to list directory {}", dir.display()))?
    {
        let entry_path = entry
            .with_context(|| format!("Failed to list directory {}", dir.display()))?
            .path();
        let matches = entry_path.is_file()
            && entry_path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)));
        if matches {
            found.push(entry_path);
        }
    }
    found.sort();
    Ok(found)
}

/// Outcome of a batch run, in input order.
#[derive(Debug)]
pub struct BatchSummary {
    pub converted: Vec<FileReport>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Converts every input, isolating failures per file.
///
/// With `config.batch.jobs > 1` files are handed out to scoped worker threads
/// through a shared index; each worker only touches its own files.
pub fn run_batch(inputs: &[PathBuf], config: &Config) -> BatchSummary {
    let start = Instant::now();
    let jobs = config.batch.jobs.clamp(1, inputs.len().max(1));
    let plan = plan_outputs(inputs, config.output.directory.as_deref());

    let mut results: Vec<(usize, Result<FileReport>)> = if jobs == 1 {
        inputs
            .iter()
            .enumerate()
            .map(|(i, input)| (i, convert_one(input, &plan[i], &config.output)))
            .collect()
    } else {
        let next = AtomicUsize::new(0);
        let output = &config.output;
        let plan = &plan;
        thread::scope(|scope| {
            let workers: Vec<_> = (0..jobs)
                .map(|_| {
                    let next = &next;
                    scope.spawn(move || {
                        let mut done = Vec::new();
                        loop {
                            let i = next.fetch_add(1, Ordering::Relaxed);
                            let Some(input) = inputs.get(i) else { break };
                            done.push((i, convert_one(input, &plan[i], output)));
                        }
                        done
                    })
                })
                .collect();
            workers
                .into_iter()
                .flat_map(|worker| match worker.join() {
                    Ok(done) => done,
                    Err(_) => {
                        error!("A conversion worker panicked; its remaining files were not converted");
                        Vec::new()
                    }
                })
                .collect()
        })
    };
    results.sort_by_key(|(i, _)| *i);

    // Inputs lost to a panicked worker still have to be reported.
    let mut seen = vec![false; inputs.len()];
    let mut converted = Vec::new();
    let mut failed = Vec::new();
    for (i, result) in results {
        seen[i] = true;
        match result {
            Ok(report) => converted.push(report),
            Err(err) => failed.push((inputs[i].clone(), err)),
        }
    }
    for (i, was_seen) in seen.into_iter().enumerate() {
        if !was_seen {
            failed.push((inputs[i].clone(), anyhow!("conversion worker panicked")));
        }
    }

    BatchSummary {
        converted,
        failed,
        elapsed: start.elapsed(),
    }
}

/// Runs a whole command line: reports unreadable paths, converts the files
/// and folds both into one summary.
pub fn convert_all(inputs: InputSet, config: &Config) -> BatchSummary {
    for (path, err) in &inputs.unreadable {
        error!("[!] Could not convert {} : {:#}", display_name(path), err);
    }
    let mut summary = run_batch(&inputs.files, config);
    summary.failed.extend(inputs.unreadable);
    summary
}

fn convert_one(
    input: &Path,
    paths: &Result<OutputPaths>,
    output: &OutputConfig,
) -> Result<FileReport> {
    let name = display_name(input);
    let result = match paths {
        Ok(paths) => convert_file_to(input, paths, output),
        Err(err) => Err(anyhow!("{:#}", err)),
    };
    match result {
        Ok(report) => {
            info!("Converted {} to png.", name);
            Ok(report)
        }
        Err(err) => {
            error!("[!] Could not convert {} : {:#}", name, err);
            Err(err)
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `"Processed N files in Xmins Yseconds."`
pub fn summary_line(summary: &BatchSummary) -> String {
    let secs = summary.elapsed.as_secs();
    format!(
        "Done. Processed {} files in {}mins {}seconds.",
        summary.converted.len(),
        secs / 60,
        secs % 60
    )
}
