//! File naming for survey output

use std::path::{Path, PathBuf};

/// Longest sanitized address used as a file stem
const MAX_STEM_CHARS: usize = 50;

/// Results file written inside each survey folder
pub const RESULTS_FILE: &str = "results.json";

/// Replace path-hostile characters in a name
pub fn sanitize(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|&c| c != ',')
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

/// Hex digits of the address digest appended to every image name
const DIGEST_CHARS: usize = 8;

/// Leading house number of an address, if any
pub fn house_number(address: &str) -> Option<&str> {
    let address = address.trim_start();
    let end = address
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(address.len());
    (end > 0).then(|| &address[..end])
}

/// Short stable digest of the normalized address
fn address_digest(address: &str) -> String {
    let normalized = address.trim().to_lowercase();
    let hash = blake3::hash(normalized.as_bytes());
    hash.to_hex()[..DIGEST_CHARS].to_string()
}

/// Image file name for an address.
///
/// The readable stem is the leading house number when there is one, otherwise
/// the sanitized address. A digest of the whole address keeps names distinct
/// when one survey folder holds several streets.
pub fn image_file_name(address: &str, extension: &str) -> String {
    let stem = match house_number(address) {
        Some(number) => number.to_string(),
        None => sanitize(address).chars().take(MAX_STEM_CHARS).collect(),
    };
    format!("{stem}-{}.{extension}", address_digest(address))
}

/// Full path of the annotated image for an address
pub fn image_path(folder: &Path, address: &str, extension: &str) -> PathBuf {
    folder.join(image_file_name(address, extension))
}

/// Folder holding one survey's images and results
pub fn survey_folder(root: &Path, survey_name: &str) -> PathBuf {
    root.join(sanitize(survey_name))
}
