//! Field validation.
//!
//! One function per updatable field. Each turns a raw optional input into
//! either [`Validated::Unchanged`] (absent or sentinel), [`Validated::Apply`]
//! with the normalized value to hand to the platform, or a [`Rejection`]
//! explaining which constraint was violated. Validators only touch the local
//! filesystem to inspect or read the files named by paths.

use std::collections::BTreeSet;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use ugc_platform::{DEFAULT_LANGUAGE, Visibility, is_valid_language_code};

use crate::error::{Field, RejectReason, Rejection};
use crate::request::DependencyChanges;

/// Maximum title length, in characters.
pub const TITLE_MAX_CHARS: usize = 129;

/// Maximum description length, in characters.
pub const DESCRIPTION_MAX_CHARS: usize = 8000;

/// Maximum preview file size, inclusive.
pub const PREVIEW_MAX_BYTES: u64 = 1_048_576;

/// Tag input that leaves tags unchanged. Any other input, even empty, replaces them.
pub const TAGS_UNCHANGED: &str = "$EMPTY";

/// Visibility input that leaves visibility unchanged.
pub const VISIBILITY_UNSET: i64 = -1;

/// Result of validating one field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Validated<T> {
    /// Nothing to apply.
    Unchanged,
    /// Value to apply.
    Apply(T),
}

/// Dependency mutations left after diffing against the current set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyPlan<T> {
    pub add: Vec<T>,
    pub remove: Vec<T>,
}

/// Non-empty path, or `None` for absent and empty inputs.
fn given(path: Option<&Path>) -> Option<&Path> {
    path.filter(|path| !path.as_os_str().is_empty())
}

fn require_file(field: Field, path: &Path) -> Result<fs::Metadata, Rejection> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => Ok(metadata),
        _ => Err(Rejection::new(
            field,
            RejectReason::NotAFile {
                path: path.to_path_buf(),
            },
        )),
    }
}

fn read_text(field: Field, path: &Path) -> Result<String, Rejection> {
    require_file(field, path)?;
    fs::read_to_string(path).map_err(|err| {
        Rejection::new(
            field,
            RejectReason::Unreadable {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
        )
    })
}

fn check_length(field: Field, text: &str, max: usize) -> Result<(), Rejection> {
    let length = text.chars().count();
    if length > max {
        return Err(Rejection::new(field, RejectReason::TooLong { length, max }));
    }
    Ok(())
}

/// Description read from a text file.
///
/// # Errors
///
/// Rejects paths that are not readable regular files and texts longer than
/// [`DESCRIPTION_MAX_CHARS`].
pub fn description(path: Option<&Path>) -> Result<Validated<String>, Rejection> {
    let Some(path) = given(path) else {
        return Ok(Validated::Unchanged);
    };
    let text = read_text(Field::Description, path)?;
    check_length(Field::Description, &text, DESCRIPTION_MAX_CHARS)?;
    Ok(Validated::Apply(text))
}

/// Preview image path.
///
/// The image format is left to the platform.
///
/// # Errors
///
/// Rejects paths that are not regular files and files larger than [`PREVIEW_MAX_BYTES`].
pub fn preview(path: Option<&Path>) -> Result<Validated<PathBuf>, Rejection> {
    let Some(path) = given(path) else {
        return Ok(Validated::Unchanged);
    };
    let size = require_file(Field::Preview, path)?.len();
    if size > PREVIEW_MAX_BYTES {
        return Err(Rejection::new(
            Field::Preview,
            RejectReason::TooLarge {
                size,
                max: PREVIEW_MAX_BYTES,
            },
        ));
    }
    Ok(Validated::Apply(path.to_path_buf()))
}

/// Content directory path.
///
/// # Errors
///
/// Rejects paths that are not directories.
pub fn content(path: Option<&Path>) -> Result<Validated<PathBuf>, Rejection> {
    let Some(path) = given(path) else {
        return Ok(Validated::Unchanged);
    };
    if !path.is_dir() {
        return Err(Rejection::new(
            Field::Content,
            RejectReason::NotADirectory {
                path: path.to_path_buf(),
            },
        ));
    }
    Ok(Validated::Apply(path.to_path_buf()))
}

/// Item title. An empty title leaves the title unchanged.
///
/// # Errors
///
/// Rejects titles longer than [`TITLE_MAX_CHARS`].
pub fn title(title: Option<&str>) -> Result<Validated<String>, Rejection> {
    let Some(title) = title.filter(|title| !title.is_empty()) else {
        return Ok(Validated::Unchanged);
    };
    check_length(Field::Title, title, TITLE_MAX_CHARS)?;
    Ok(Validated::Apply(title.to_owned()))
}

/// Visibility level. [`VISIBILITY_UNSET`] leaves it unchanged.
///
/// # Errors
///
/// Rejects values outside 0 to 3.
pub fn visibility(raw: Option<i64>) -> Result<Validated<Visibility>, Rejection> {
    match raw {
        None | Some(VISIBILITY_UNSET) => Ok(Validated::Unchanged),
        Some(raw) => Visibility::try_from(raw).map(Validated::Apply).map_err(|value| {
            Rejection::new(Field::Visibility, RejectReason::VisibilityOutOfRange(value))
        }),
    }
}

/// Comma-separated tags.
///
/// Tokens are trimmed and empty ones dropped; order and duplicates are kept.
/// [`TAGS_UNCHANGED`] leaves the tags unchanged, while an empty string
/// clears them. Tags never fail validation.
#[must_use]
pub fn tags(raw: Option<&str>) -> Validated<Vec<String>> {
    match raw {
        None | Some(TAGS_UNCHANGED) => Validated::Unchanged,
        Some(raw) => Validated::Apply(
            raw.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_owned)
                .collect(),
        ),
    }
}

/// Update language code.
///
/// The default language needs no explicit call, so it and empty input
/// leave the language unchanged.
///
/// # Errors
///
/// Rejects codes the platform does not know.
pub fn language(code: Option<&str>) -> Result<Validated<String>, Rejection> {
    match code {
        None | Some("" | DEFAULT_LANGUAGE) => Ok(Validated::Unchanged),
        Some(code) if is_valid_language_code(code) => Ok(Validated::Apply(code.to_owned())),
        Some(code) => Err(Rejection::new(
            Field::Language,
            RejectReason::UnknownLanguage(code.to_owned()),
        )),
    }
}

/// Diff requested dependency changes against the item's current dependencies.
///
/// Additions already present and removals not present are dropped, and
/// repeated ids collapse. Unchanged when nothing is left to do.
///
/// # Errors
///
/// Rejects requests naming the same id in both lists.
pub fn dependencies<T>(
    field: Field,
    current: &[T],
    changes: &DependencyChanges<T>,
) -> Result<Validated<DependencyPlan<T>>, Rejection>
where
    T: Copy + Ord + Display,
{
    let add: BTreeSet<T> = changes.add.iter().copied().collect();
    let remove: BTreeSet<T> = changes.remove.iter().copied().collect();
    if let Some(conflict) = add.intersection(&remove).next() {
        return Err(Rejection::new(
            field,
            RejectReason::Conflicting(conflict.to_string()),
        ));
    }

    let current: BTreeSet<T> = current.iter().copied().collect();
    let plan = DependencyPlan {
        add: add.difference(&current).copied().collect(),
        remove: remove.intersection(&current).copied().collect(),
    };
    if plan.add.is_empty() && plan.remove.is_empty() {
        return Ok(Validated::Unchanged);
    }
    Ok(Validated::Apply(plan))
}

/// Change note read from a text file.
///
/// # Errors
///
/// Rejects paths that are not readable regular files.
pub fn patch_note(path: Option<&Path>) -> Result<Validated<String>, Rejection> {
    let Some(path) = given(path) else {
        return Ok(Validated::Unchanged);
    };
    read_text(Field::PatchNote, path).map(Validated::Apply)
}
