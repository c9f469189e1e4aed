// plans10x/src/lib.rs

//! Batch retrofitter for X4 station construction plans.
//!
//! This library converts exported station plans into variants that run
//! against the `10x_modules` extension:
//! - production/storage/habitat macros are renamed to their
//!   `10x_modules_` counterparts
//! - the plan's patch list gains the base extension dependency plus
//!   any DLC dependencies the plan already relies on
//! - the plan id is replaced with a fresh random `player_` id
//! - the display name gains a `10X ` prefix
//!
//! The [`convert_dir`] and [`convert_file`] entry points drive whole
//! directories or single files; [`reads`]/[`write`] and the [`Value`]
//! tree are exposed for scripted use without the CLI.

pub mod error;
pub mod pipeline;
pub mod plan;
pub mod transform;
pub mod xml;

use std::path::Path;

pub use error::{Plans10xError, Result};
pub use pipeline::{convert_dir, convert_file};
pub use plan::PlanSet;
pub use transform::{transform_document, transform_plan};
pub use xml::{Document, Value};

/// Parse a plan document from a file path.
///
/// # Examples
///
/// ```no_run
/// fn main() -> plans10x::Result<()> {
///     let doc = plans10x::read("constructionplans.xml")?;
///     println!("{:#?}", doc.root);
///     Ok(())
/// }
/// ```
pub fn read<P: AsRef<Path>>(path: P) -> Result<Document> {
    let path = path.as_ref();
    let contents = fs_err::read_to_string(path)?;
    reads(&contents).map_err(|e| e.for_file(path))
}

/// Parse a plan document from a string.
///
/// # Examples
///
/// ```
/// fn main() -> plans10x::Result<()> {
///     let doc = plans10x::reads(r#"<plans><plan id="a" name="Base"/></plans>"#)?;
///     Ok(())
/// }
/// ```
pub fn reads(content: &str) -> Result<Document> {
    xml::parse(content)
}

/// Serialize a plan document back to XML text.
pub fn to_string(doc: &Document) -> Result<String> {
    xml::to_string(doc)
}

/// Write a plan document to a file.
pub fn write<P: AsRef<Path>>(doc: &Document, path: P) -> Result<()> {
    fs_err::write(path.as_ref(), to_string(doc)?)?;
    Ok(())
}
