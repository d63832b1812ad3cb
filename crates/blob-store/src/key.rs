//! Storage keys derived from request paths

use std::fmt;
use std::path::PathBuf;

/// Reasons a path cannot be turned into a [`Key`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    Empty,
    Encoding(String),
    Segment(String),
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyError::Empty => write!(f, "key has no segments"),
            KeyError::Encoding(segment) => {
                write!(f, "invalid percent-encoding in segment: {}", segment)
            }
            KeyError::Segment(segment) => write!(f, "invalid key segment: {:?}", segment),
        }
    }
}

impl std::error::Error for KeyError {}

/// An artifact key: an ordered, non-empty list of path segments.
///
/// Used unchanged as the storage location and as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    segments: Vec<String>,
}

impl Key {
    /// Build a key from already-split segments
    pub fn new<I, S>(segments: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(KeyError::Empty);
        }
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    /// Derive a key from a URL path.
    ///
    /// One leading `/` is stripped, the rest is split on `/`, empty
    /// segments are dropped and each segment is percent-decoded.
    pub fn from_path(path: &str) -> Result<Self, KeyError> {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let segments = trimmed
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                urlencoding::decode(s)
                    .map(|decoded| decoded.into_owned())
                    .map_err(|_| KeyError::Encoding(s.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Relative filesystem path with one component per segment
    pub fn to_relative_path(&self) -> PathBuf {
        self.segments.iter().collect()
    }
}

fn validate_segment(segment: &str) -> Result<(), KeyError> {
    let invalid = segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
    if invalid {
        return Err(KeyError::Segment(segment.to_string()));
    }
    Ok(())
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path_strips_leading_slash() {
        let key = Key::from_path("/foo/bar").unwrap();
        assert_eq!(key.segments(), ["foo", "bar"]);
        assert_eq!(key.to_string(), "foo/bar");
    }

    #[test]
    fn test_from_path_drops_empty_segments() {
        let key = Key::from_path("/a//b/").unwrap();
        assert_eq!(key, Key::new(["a", "b"]).unwrap());
    }

    #[test]
    fn test_from_path_decodes_segments() {
        let key = Key::from_path("/libs/my%20lib-1.0.jar").unwrap();
        assert_eq!(key.segments(), ["libs", "my lib-1.0.jar"]);
    }

    #[test]
    fn test_from_path_rejects_traversal() {
        assert_eq!(
            Key::from_path("/a/../b"),
            Err(KeyError::Segment("..".to_string()))
        );
        assert!(Key::from_path("/a/%2E%2E/b").is_err());
        assert!(Key::from_path("/./b").is_err());
    }

    #[test]
    fn test_from_path_rejects_encoded_separators() {
        assert!(Key::from_path("/a%2Fb").is_err());
        assert!(Key::from_path("/a%5Cb").is_err());
        assert!(Key::from_path("/a%00b").is_err());
    }

    #[test]
    fn test_from_path_rejects_empty() {
        assert_eq!(Key::from_path("/"), Err(KeyError::Empty));
        assert_eq!(Key::from_path(""), Err(KeyError::Empty));
    }

    #[test]
    fn test_relative_path() {
        let key = Key::new(["org", "example", "lib.jar"]).unwrap();
        assert_eq!(
            key.to_relative_path(),
            PathBuf::from("org").join("example").join("lib.jar")
        );
    }

    #[test]
    fn test_key_error_display() {
        let err = KeyError::Segment("..".to_string());
        assert_eq!(format!("{}", err), "invalid key segment: \"..\"");
    }
}
