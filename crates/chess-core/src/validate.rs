//! Upload-time acceptance rules for game records.

use crate::error::{PgnError, UploadRejection};
use crate::move_tree::MoveTree;
use crate::pgn;

/// File extensions accepted for upload, compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { allowed_extensions }
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    pub fn allows(&self, file_name: &str) -> bool {
        match file_name.rsplit_once('.') {
            Some((_, ext)) => {
                let ext = ext.to_ascii_lowercase();
                self.allowed_extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(["pgn", "txt"])
    }
}

/// An accepted upload. `text` is the uploaded content, byte for byte.
#[derive(Debug)]
pub struct ValidatedUpload<'a> {
    pub text: &'a str,
    pub tree: MoveTree,
}

/// Checks run in order: extension, emptiness, structural parse errors, and
/// finally that the first ply is a real move.
pub fn validate_upload<'a>(
    file_name: &str,
    bytes: &'a [u8],
    policy: &UploadPolicy,
) -> Result<ValidatedUpload<'a>, UploadRejection> {
    if !policy.allows(file_name) {
        return Err(UploadRejection::InvalidExtension {
            allowed: policy.allowed_extensions().to_vec(),
        });
    }

    if bytes.is_empty() {
        return Err(UploadRejection::EmptyFile);
    }

    let text = std::str::from_utf8(bytes).map_err(|e| UploadRejection::ParseErrors {
        details: vec![format!("file is not valid UTF-8: {e}")],
    })?;

    let tree = match pgn::parse(text) {
        Ok(tree) => tree,
        Err(PgnError::EmptyInput) => return Err(UploadRejection::UnparseableFirstMove),
        Err(e @ PgnError::Unreadable(_)) => {
            return Err(UploadRejection::ParseErrors {
                details: vec![e.to_string()],
            })
        }
    };

    if !tree.errors().is_empty() {
        return Err(UploadRejection::ParseErrors {
            details: tree.errors().to_vec(),
        });
    }

    match tree.first_move() {
        Some(first) if !first.is_null() => Ok(ValidatedUpload { text, tree }),
        _ => Err(UploadRejection::UnparseableFirstMove),
    }
}
