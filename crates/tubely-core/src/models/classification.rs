use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;

/// Aspect ratio bucket of an uploaded video, used to namespace its storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Landscape,
    Portrait,
    Other,
}

impl Classification {
    /// Map a display aspect ratio (`"16:9"`) to a classification.
    /// Unknown or absent ratios are `Other`.
    pub fn from_aspect_ratio(ratio: Option<&str>) -> Self {
        match ratio.map(str::trim) {
            Some("16:9") => Classification::Landscape,
            Some("9:16") => Classification::Portrait,
            _ => Classification::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Landscape => "landscape",
            Classification::Portrait => "portrait",
            Classification::Other => "other",
        }
    }
}

impl Display for Classification {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
