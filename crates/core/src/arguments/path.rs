use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// One selector in a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Selects a named field of an object.
    Field(String),
    /// Selects an element of an array.
    Index(usize),
}

impl From<&str> for PathSegment {
    #[inline]
    fn from(name: &str) -> Self {
        PathSegment::Field(name.to_owned())
    }
}

impl From<String> for PathSegment {
    #[inline]
    fn from(name: String) -> Self {
        PathSegment::Field(name)
    }
}

impl From<usize> for PathSegment {
    #[inline]
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, ".{name}"),
            PathSegment::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// An ordered sequence of field and index selectors into a nested
/// argument value.
///
/// The empty path addresses the root value. Paths serialize as plain
/// JSON arrays mixing field names and indexes, e.g. `["items", 0]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path {
    segments: Vec<PathSegment>,
}

impl Path {
    /// The empty path, addressing the root arguments value.
    #[inline]
    pub fn root() -> Self {
        Self::default()
    }

    /// Appends a selector to the path.
    #[inline]
    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    /// Returns a new path extending this one with `segment`.
    #[inline]
    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    /// The selectors of this path, outermost first.
    #[inline]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns whether `prefix` addresses this path or one of its
    /// ancestors.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.len() >= prefix.segments.len()
            && prefix.segments.iter().zip(&self.segments).all(|(a, b)| a == b)
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for Path {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$")?;
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Builds a [`Path`] from field names and indexes.
///
/// ```
/// use ctxflow_core::path;
///
/// let p = path!["items", 0, "name"];
/// assert_eq!(format!("{p}"), "$.items[0].name");
/// ```
#[macro_export]
macro_rules! path {
    ($($segment:expr),* $(,)?) => {{
        let mut path = $crate::arguments::Path::root();
        $(path.push($crate::arguments::PathSegment::from($segment));)*
        path
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Path::root()), "$");
        assert_eq!(format!("{}", path!["items", 0, "name"]), "$.items[0].name");
    }

    #[test]
    fn test_starts_with() {
        let path = path!["items", 0, "name"];
        assert!(path.starts_with(&Path::root()));
        assert!(path.starts_with(&path!["items"]));
        assert!(path.starts_with(&path!["items", 0]));
        assert!(path.starts_with(&path));
        assert!(!path.starts_with(&path!["items", 1]));
        assert!(!path.starts_with(&path!["items", 0, "name", "first"]));
    }

    #[test]
    fn test_serialize_deserialize() {
        let path = path!["items", 3, "id"];
        let serialized = serde_json::to_string(&path).unwrap();
        assert_eq!(serialized, r#"["items",3,"id"]"#);
        let deserialized: Path = serde_json::from_str(&serialized).unwrap();
        assert_eq!(path, deserialized);
    }
}
