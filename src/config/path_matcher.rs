use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::error::ConfigError;
use crate::util::is_tsx_path;

/// ワークスペース走査用の include / exclude 判定
#[derive(Debug, Clone)]
pub struct PathMatcher {
    include: Option<GlobSet>,
    exclude: GlobSet,
}

fn build_glob_set(patterns: &[String]) -> Result<GlobSet, ConfigError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidGlob {
            pattern: pattern.clone(),
            source,
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|source| ConfigError::InvalidGlob {
        pattern: patterns.join(", "),
        source,
    })
}

impl PathMatcher {
    /// include が空の場合は全TSXファイルが対象
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self, ConfigError> {
        let include = if include.is_empty() {
            None
        } else {
            Some(build_glob_set(include)?)
        };
        Ok(Self {
            include,
            exclude: build_glob_set(exclude)?,
        })
    }

    /// ワークスペースルートからの相対パスが一括適用の対象TSXファイルか判定
    pub fn is_target_file(&self, relative_path: &Path) -> bool {
        if !is_tsx_path(relative_path) || self.exclude.is_match(relative_path) {
            return false;
        }
        self.include
            .as_ref()
            .is_none_or(|include| include.is_match(relative_path))
    }

    /// ディレクトリを走査すべきか判定（excludeのみ）
    pub fn should_traverse_dir(&self, relative_path: &Path) -> bool {
        !self.exclude.is_match(relative_path)
    }
}
