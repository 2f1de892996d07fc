use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use crate::descriptor::ChaincodeLanguage;
use crate::error::LifecycleError;

const WORKSPACE_MARKER: &str = "src";

/// Result of validating a chaincode source path.
///
/// For golang the path is split around its `src` segment: `workspace_root`
/// is what the build expects as GOPATH and `chaincode_path` is the import
/// path relative to `<root>/src`. Other languages keep the path verbatim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedPath {
    pub workspace_root: Option<PathBuf>,
    pub chaincode_path: String,
}

pub fn resolve_chaincode_path(
    path: &str,
    language: ChaincodeLanguage,
) -> Result<ResolvedPath, LifecycleError> {
    if !Path::new(path).is_absolute() {
        return Err(LifecycleError::path(
            path,
            "please provide an absolute path to the chaincode code",
        ));
    }

    if !language.requires_workspace_split() {
        return Ok(ResolvedPath {
            workspace_root: None,
            chaincode_path: path.to_string(),
        });
    }

    // `/opt/gopath/src/` splits like `/opt/gopath/src`, leaving `src` last.
    let trimmed = trim_trailing_separators(path);
    let segments: Vec<&str> = trimmed.split(MAIN_SEPARATOR).collect();
    let marker = segments
        .iter()
        .rposition(|segment| *segment == WORKSPACE_MARKER);
    let index = match marker {
        Some(index) if index >= 1 && index < segments.len() - 1 => index,
        _ => {
            return Err(LifecycleError::path(
                path,
                "golang chaincode path must contain a 'src' segment in the middle, \
                 e.g. /opt/gopath/src/github.com/chaincode",
            ))
        }
    };

    let prefix = join_segments(&segments[..index]);
    // `/src/cc`: the workspace is the filesystem root, never an empty GOPATH.
    let workspace_root = if prefix.is_empty() {
        PathBuf::from(MAIN_SEPARATOR.to_string())
    } else {
        PathBuf::from(prefix)
    };

    Ok(ResolvedPath {
        workspace_root: Some(workspace_root),
        chaincode_path: join_segments(&segments[index + 1..]),
    })
}

fn trim_trailing_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches(MAIN_SEPARATOR);
    if trimmed.is_empty() {
        path
    } else {
        trimmed
    }
}

fn join_segments(segments: &[&str]) -> String {
    segments.join(&MAIN_SEPARATOR.to_string())
}
