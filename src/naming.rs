//! Output filename conventions.
//!
//! Two schemes are in use across the portfolio:
//!
//! - **Slug**: the source name, lowercased, with every run of non-alphanumeric
//!   characters collapsed to one hyphen.
//!   `"My Photo_01 (final).JPG"` → `my-photo-01-final.webp`
//! - **Sequence**: `<prefix>-NN.webp` with a two-digit, zero-padded index, as
//!   used by the photo collections (`portrait-01.webp`, `portrait-02.webp`, …).
//!   A source named `hero.*` is the collection's cover image.

use std::path::Path;

/// Fallback slug for names with no alphanumeric characters at all.
const EMPTY_SLUG: &str = "image";

/// Stem of the collection cover image.
pub const HERO_STEM: &str = "hero";

/// Slugify a file stem.
///
/// - `"Sunset Over Bay"` → `"sunset-over-bay"`
/// - `"__draft__v2"` → `"draft-v2"`
/// - `"Café"` → `"café"` (Unicode letters are kept)
pub fn slugify(stem: &str) -> String {
    let mut slug = String::with_capacity(stem.len());
    let mut pending_hyphen = false;

    for c in stem.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

fn stem_of(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Output file name for the slug scheme.
pub fn slug_filename(file_name: &str, extension: &str) -> String {
    format!("{}.{}", slugify(stem_of(file_name)), extension)
}

/// Output file name for the sequence scheme.
pub fn sequence_filename(prefix: &str, index: u32, extension: &str) -> String {
    format!("{prefix}-{index:02}.{extension}")
}

/// Output file name of a collection's cover image.
pub fn hero_filename(extension: &str) -> String {
    format!("{HERO_STEM}.{extension}")
}

/// Parse the index out of a `<prefix>-NN` stem.
///
/// Returns `None` for stems that belong to another prefix or carry a
/// non-numeric suffix.
pub fn parse_sequence_index(prefix: &str, stem: &str) -> Option<u32> {
    stem.strip_prefix(prefix)?
        .strip_prefix('-')
        .filter(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))?
        .parse()
        .ok()
}

/// Whether a source file is a collection cover (`hero.jpg`, `HERO.PNG`, …).
pub fn is_hero(file_name: &str) -> bool {
    Path::new(file_name).extension().is_some() && stem_of(file_name).eq_ignore_ascii_case(HERO_STEM)
}
