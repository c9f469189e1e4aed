// plans10x/src/pipeline.rs

//! Filesystem orchestration: one directory in, one directory out.
//!
//! Files are processed strictly one at a time; nothing is shared
//! between them and the first failure aborts the whole batch.

use crate::error::Result;
use crate::transform::transform_document;
use crate::xml;
use std::path::Path;

/// Filename prefix applied to every converted file.
const OUTPUT_PREFIX: &str = "10x_";

/// Convert every plan file in `source_dir` into `dest_dir`.
///
/// Direct entries whose name ends in `.xml` (case-insensitive) are
/// processed in enumeration order; everything else is ignored. The
/// destination directory (and intermediate components) is created up
/// front, and each output keeps its original name behind a `10x_`
/// prefix. Returns the number of files converted.
pub fn convert_dir<P1, P2>(source_dir: P1, dest_dir: P2) -> Result<usize>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let source_dir = source_dir.as_ref();
    let dest_dir = dest_dir.as_ref();

    fs_err::create_dir_all(dest_dir)?;

    let mut converted = 0;
    for entry in fs_err::read_dir(source_dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        if !name.to_lowercase().ends_with(".xml") {
            log::debug!("skipping {}", name);
            continue;
        }

        let output_name = format!("{}{}", OUTPUT_PREFIX, name);
        convert_file(entry.path(), dest_dir.join(&output_name))?;
        println!("  ✓ converted {} into {}", name, output_name);
        converted += 1;
    }

    println!("Converted {} plan file(s).", converted);
    Ok(converted)
}

/// Convert a single plan file: read, parse, transform every plan it
/// contains, and write the result to `dest`.
pub fn convert_file<P1, P2>(source: P1, dest: P2) -> Result<()>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let source = source.as_ref();
    let dest = dest.as_ref();

    let text = fs_err::read_to_string(source)?;
    let mut doc = xml::parse(&text).map_err(|e| e.for_file(source))?;
    transform_document(&mut doc, &mut rand::thread_rng());
    let output = xml::to_string(&doc).map_err(|e| e.for_file(source))?;
    fs_err::write(dest, output)?;

    log::info!("{} -> {}", source.display(), dest.display());
    Ok(())
}
