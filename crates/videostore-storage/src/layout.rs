//! Naming rules shared by all backends.
//!
//! A record holds `video<ext>` and `metadata.json`. The helpers here decide what the
//! extension of an uploaded file is and which stored file counts as the video.

use videostore_core::constants::VIDEO_FILE_PREFIX;

/// Extension of an uploaded file name, leading dot included.
///
/// Only the last path component is considered, and a dot that merely starts the
/// name (`.bashrc`, `..x`) does not begin an extension. The suffix is kept verbatim,
/// so `Clip.MOV` yields `.MOV` and `movie.` yields `.`.
pub fn file_extension(file_name: &str) -> Option<&str> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);

    let dot = base.rfind('.')?;
    let leading_dots = base.len() - base.trim_start_matches('.').len();
    if dot < leading_dots {
        return None;
    }
    Some(&base[dot..])
}

/// Stored file name for a video with the given extension.
pub fn video_file_name(extension: Option<&str>) -> String {
    format!("{}{}", VIDEO_FILE_PREFIX, extension.unwrap_or(""))
}

pub fn is_video_file_name(name: &str) -> bool {
    name.starts_with(VIDEO_FILE_PREFIX)
}

/// Pick the video among the file names of a record.
///
/// A well-formed record has exactly one candidate; if several exist the
/// lexicographically smallest wins so repeated fetches agree.
pub fn select_video_file<I, S>(names: I) -> Option<S>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter(|name| is_video_file_name(name.as_ref()))
        .min_by(|a, b| a.as_ref().cmp(b.as_ref()))
}
