//! Component descriptor models

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Suffix that names a component's companion descriptor file, e.g.
/// `Foo.widget` has the companion `Foo.widget-meta.xml`.
pub const COMPANION_SUFFIX: &str = "-meta.xml";

/// One deployable unit and its on-disk location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    /// Type name, e.g. "Widget"
    pub type_name: String,

    /// Full name, unique within the type
    pub name: String,

    /// Type-specific file suffix, e.g. "widget"
    pub suffix: String,

    /// Absolute path to the primary content file
    pub path: PathBuf,

    /// Whether the component carries a companion descriptor file
    #[serde(default)]
    pub has_companion: bool,

    /// Whether the companion descriptor file is itself the primary artifact
    #[serde(default)]
    pub is_companion: bool,
}

/// Companion descriptor path for a content file path
pub fn companion_path(content: &Path) -> PathBuf {
    let mut os = content.as_os_str().to_os_string();
    os.push(COMPANION_SUFFIX);
    PathBuf::from(os)
}

/// Content file path for a companion descriptor path. Returns `None` when the
/// path does not carry the companion suffix.
pub fn content_path(companion: &Path) -> Option<PathBuf> {
    companion
        .to_str()
        .and_then(|s| s.strip_suffix(COMPANION_SUFFIX))
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_companion_path_round_trip() {
        let content = PathBuf::from("/proj/src/widgets/Foo.widget");
        let companion = companion_path(&content);
        assert_eq!(
            companion,
            PathBuf::from("/proj/src/widgets/Foo.widget-meta.xml")
        );
        assert_eq!(content_path(&companion), Some(content));
    }

    #[test]
    fn test_content_path_requires_suffix() {
        assert_eq!(content_path(Path::new("/proj/src/widgets/Foo.widget")), None);
    }
}
