use std::fmt::{Display, Formatter, Result as FmtResult};

/// Location of a stored object: bucket plus key.
///
/// Persisted in the video record as `"{bucket},{key}"`. Bucket names cannot
/// contain commas, slashes or colons, so the first comma splits the pair and
/// a URL whose path holds a comma is never mistaken for a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        ObjectRef {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn encode(&self) -> String {
        format!("{},{}", self.bucket, self.key)
    }

    /// Parse an encoded reference. Returns `None` for plain URLs and for
    /// values with an empty or malformed bucket or an empty key.
    pub fn parse(raw: &str) -> Option<Self> {
        let (bucket, key) = raw.split_once(',')?;
        if bucket.is_empty() || key.is_empty() || bucket.contains([':', '/']) {
            return None;
        }
        Some(ObjectRef::new(bucket, key))
    }
}

impl Display for ObjectRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_on_first_comma() {
        let reference = ObjectRef::parse("tubely-media,portrait/a,b.mp4").unwrap();
        assert_eq!(reference.bucket, "tubely-media");
        assert_eq!(reference.key, "portrait/a,b.mp4");
    }

    #[test]
    fn plain_urls_are_not_references() {
        assert_eq!(ObjectRef::parse("https://example.com/video.mp4"), None);
        assert_eq!(ObjectRef::parse(",landscape/x.mp4"), None);
        assert_eq!(ObjectRef::parse("bucket,"), None);
    }

    #[test]
    fn urls_with_commas_in_the_path_are_not_references() {
        assert_eq!(ObjectRef::parse("https://cdn.example.com/x,y.mp4"), None);
        assert_eq!(ObjectRef::parse("https://cdn.example.com/v/a.mp4?t=1,2"), None);
        assert_eq!(ObjectRef::parse("cdn.example.com/boots,cut.mp4"), None);
    }
}
