use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImage {
    pub id: String,
    pub url: String,
    /// Payload without any `data:` prefix.
    pub base64: String,
    pub mime_type: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    Portrait,
    #[serde(rename = "4:3")]
    Landscape,
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "9:16")]
    Tall,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Square,
        AspectRatio::Portrait,
        AspectRatio::Landscape,
        AspectRatio::Widescreen,
        AspectRatio::Tall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "3:4",
            AspectRatio::Landscape => "4:3",
            AspectRatio::Widescreen => "16:9",
            AspectRatio::Tall => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.as_str() == trimmed)
            .ok_or_else(|| {
                format!(
                    "Unsupported aspect ratio '{}'. Expected one of: {}",
                    trimmed,
                    join_options(AspectRatio::ALL.iter().map(AspectRatio::as_str))
                )
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1K")]
    OneK,
    #[serde(rename = "2K")]
    TwoK,
}

impl ImageSize {
    pub const ALL: [ImageSize; 2] = [ImageSize::OneK, ImageSize::TwoK];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::OneK => "1K",
            ImageSize::TwoK => "2K",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalised = value.trim().to_uppercase();
        ImageSize::ALL
            .into_iter()
            .find(|size| size.as_str() == normalised)
            .ok_or_else(|| {
                format!(
                    "Unsupported image size '{}'. Expected one of: {}",
                    value.trim(),
                    join_options(ImageSize::ALL.iter().map(ImageSize::as_str))
                )
            })
    }
}

/// Settings are replaced wholesale; both fields are closed enumerations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    pub aspect_ratio: AspectRatio,
    pub image_size: ImageSize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl GenerationResult {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            image_url: Some(url.into()),
            text: None,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            image_url: None,
            text: Some(text.into()),
        }
    }
}

fn join_options<'a>(options: impl Iterator<Item = &'a str>) -> String {
    options.collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_square_1k() {
        let settings = GenerationSettings::default();
        assert_eq!(settings.aspect_ratio, AspectRatio::Square);
        assert_eq!(settings.image_size, ImageSize::OneK);
    }

    #[test]
    fn parses_every_aspect_ratio() {
        for ratio in AspectRatio::ALL {
            assert_eq!(ratio.as_str().parse::<AspectRatio>(), Ok(ratio));
        }
        assert_eq!(" 16:9 ".parse::<AspectRatio>(), Ok(AspectRatio::Widescreen));
    }

    #[test]
    fn rejects_values_outside_the_enumeration() {
        let err = "21:9".parse::<AspectRatio>().unwrap_err();
        assert!(err.contains("21:9"));
        assert!(err.contains("9:16"));
        assert!("4K".parse::<ImageSize>().is_err());
        assert_eq!("2k".parse::<ImageSize>(), Ok(ImageSize::TwoK));
    }

    #[test]
    fn settings_serialise_with_wire_names() {
        let settings = GenerationSettings {
            aspect_ratio: AspectRatio::Tall,
            image_size: ImageSize::TwoK,
        };
        let value = serde_json::to_value(settings).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "aspectRatio": "9:16", "imageSize": "2K" })
        );
    }

    #[test]
    fn result_omits_missing_fields() {
        let value = serde_json::to_value(GenerationResult::text("only text")).unwrap();
        assert_eq!(value, serde_json::json!({ "text": "only text" }));
    }
}
