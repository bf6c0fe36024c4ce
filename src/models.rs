use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Editorial,
    Streetwear,
    Vintage,
}

impl Style {
    pub const ALL: [Style; 3] = [Style::Editorial, Style::Streetwear, Style::Vintage];

    pub fn as_str(&self) -> &'static str {
        match self {
            Style::Editorial => "editorial",
            Style::Streetwear => "streetwear",
            Style::Vintage => "vintage",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Style::Editorial => "Editorial",
            Style::Streetwear => "Streetwear",
            Style::Vintage => "Vintage",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Style::Editorial => "Clean, professional, magazine-style aesthetic",
            Style::Streetwear => "Urban, bold, contemporary street fashion",
            Style::Vintage => "Classic, retro, timeless appeal",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStyle(pub String);

impl fmt::Display for UnknownStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unsupported style: {}", self.0)
    }
}

impl std::error::Error for UnknownStyle {}

impl FromStr for Style {
    type Err = UnknownStyle;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "editorial" => Ok(Style::Editorial),
            "streetwear" => Ok(Style::Streetwear),
            "vintage" => Ok(Style::Vintage),
            _ => Err(UnknownStyle(value.to_string())),
        }
    }
}

/// One completed generation. Records are never mutated after the backend
/// creates them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    pub id: String,
    pub image_url: String,
    pub prompt: String,
    pub style: Style,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub image_data_url: String,
    pub prompt: String,
    pub style: Style,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}
