// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Input discovery and output path handling.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::core::{EditError, Result};
use crate::io::formats::mcap::constants::MCAP_EXTENSION;

fn has_mcap_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == MCAP_EXTENSION)
}

/// List the MCAP files to process.
///
/// A file path must carry the `.mcap` extension. A directory is walked
/// recursively; the result is sorted.
pub fn collect_mcap_files<P: AsRef<Path>>(input: P) -> Result<Vec<PathBuf>> {
    collect(input.as_ref(), None)
}

/// Like [`collect_mcap_files`], but never descends into `output_dir`.
///
/// Used when the output directory sits inside the input tree, so files
/// written by an earlier run are not picked up as inputs.
pub fn collect_edit_inputs<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output_dir: Q,
) -> Result<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    let skip = output_dir.canonicalize().ok();
    collect(input.as_ref(), skip)
}

fn collect(input: &Path, skip: Option<PathBuf>) -> Result<Vec<PathBuf>> {
    let meta = fs::metadata(input).map_err(|e| EditError::io(input, e))?;

    if !meta.is_dir() {
        if !has_mcap_extension(input) {
            return Err(EditError::invalid_config(
                "input",
                format!(
                    "{} does not end with .{MCAP_EXTENSION} extension",
                    input.display()
                ),
            ));
        }
        return Ok(vec![input.to_path_buf()]);
    }

    let mut builder = WalkBuilder::new(input);
    builder.standard_filters(false).follow_links(false);
    if let Some(skip) = skip {
        builder.filter_entry(move |entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            !(is_dir && entry.path().canonicalize().is_ok_and(|p| p == skip))
        });
    }

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry.map_err(|e| EditError::io(input, e))?;
        let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
        if !is_dir && has_mcap_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Absolute form of `path`, resolving symlinks when it exists.
fn resolve(path: &Path) -> Result<PathBuf> {
    match path.canonicalize() {
        Ok(p) => Ok(p),
        Err(_) => std::path::absolute(path).map_err(|e| EditError::io(path, e)),
    }
}

/// Reject an output directory that is the input directory (or, for a
/// single file, the directory holding it).
pub fn ensure_distinct_output<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output: Q) -> Result<()> {
    let input = input.as_ref();
    let output = output.as_ref();

    let input_dir = if input.is_dir() {
        resolve(input)?
    } else {
        let parent = match input.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        resolve(parent)?
    };

    if input_dir == resolve(output)? {
        return Err(EditError::invalid_config(
            "output",
            "cannot use input directory as output directory",
        ));
    }
    Ok(())
}

/// Create the output directory (and parents) if missing.
///
/// Returns `true` if it was created.
pub fn ensure_output_dir<P: AsRef<Path>>(output: P) -> Result<bool> {
    let output = output.as_ref();
    if output.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(output).map_err(|e| EditError::io(output, e))?;
    Ok(true)
}

/// `<output_dir>/<input file name>`.
pub fn output_path_for<P: AsRef<Path>, Q: AsRef<Path>>(input: P, output_dir: Q) -> Result<PathBuf> {
    let input = input.as_ref();
    let name = input
        .file_name()
        .ok_or_else(|| EditError::io(input, "path has no file name"))?;
    Ok(output_dir.as_ref().join(name))
}

/// Whether `a` and `b` name the same existing file.
pub fn same_file<P: AsRef<Path>, Q: AsRef<Path>>(a: P, b: Q) -> bool {
    match (a.as_ref().canonicalize(), b.as_ref().canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Output path of every input, in input order.
///
/// Fails if two inputs share a file name (they would write the same
/// output) or if an input is its own output.
pub fn plan_outputs<Q: AsRef<Path>>(inputs: &[PathBuf], output_dir: Q) -> Result<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    let mut claimed: HashMap<PathBuf, &PathBuf> = HashMap::with_capacity(inputs.len());
    let mut outputs = Vec::with_capacity(inputs.len());

    for input in inputs {
        let output = output_path_for(input, output_dir)?;
        if same_file(input, &output) {
            return Err(EditError::invalid_config(
                "output",
                format!("{} would overwrite its own input", output.display()),
            ));
        }
        if let Some(first) = claimed.insert(output.clone(), input) {
            return Err(EditError::invalid_config(
                "output",
                format!(
                    "{} and {} both map to {}",
                    first.display(),
                    input.display(),
                    output.display()
                ),
            ));
        }
        outputs.push(output);
    }
    Ok(outputs)
}
