//! Gitignore-style matching of paths relative to the working directory.

use std::path::Path;

use fx_core::{FxError, FxResult};
use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::DEPLOYMENT_FOLDER;

/// Compiled ignore rules. The deployment folder is always ignored.
#[derive(Clone, Debug)]
pub struct IgnoreMatcher {
    inner: Gitignore,
}

impl IgnoreMatcher {
    pub fn new<S: AsRef<str>>(root: &Path, rules: &[S]) -> FxResult<Self> {
        let mut builder = GitignoreBuilder::new(root);
        for rule in rules.iter().map(AsRef::as_ref).chain(std::iter::once(DEPLOYMENT_FOLDER)) {
            builder.add_line(None, rule).map_err(|e| FxError::Validation {
                field: "ignore rule".to_string(),
                value: format!("{} ({})", rule, e),
            })?;
        }
        let inner = builder.build().map_err(|e| FxError::Validation {
            field: "ignore rules".to_string(),
            value: e.to_string(),
        })?;
        Ok(Self { inner })
    }

    /// `relative` must not be absolute. A path inside an ignored folder is ignored.
    pub fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool {
        self.inner
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }
}
