//! Content document schema.
//!
//! One JSON object holds every editable piece of the site. Sections are
//! replaced wholesale on update; top-level keys this schema does not know
//! about are carried through untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Shipped logo used when no custom logo is set.
pub const DEFAULT_LOGO: &str = "logo.png";

/// Shipped favicon used when no custom favicon is set.
pub const DEFAULT_FAVICON: &str = "favicon.ico";

/// Shipped hero banner used when no custom hero image is set.
pub const DEFAULT_HERO_IMAGE: &str = "hero.jpg";

/// The single site content document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentDocument {
    #[serde(default)]
    pub hero: Hero,

    #[serde(default)]
    pub about: About,

    #[serde(default)]
    pub menu: Vec<MenuItem>,

    #[serde(default)]
    pub team: Vec<TeamMember>,

    #[serde(default)]
    pub contact: Contact,

    #[serde(default)]
    pub footer: Footer,

    /// Asset filename of the site logo.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    /// Asset filename of the favicon.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,

    /// Keys outside the known sections, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentDocument {
    /// Logo filename, falling back to the shipped default.
    pub fn logo_or_default(&self) -> &str {
        self.logo.as_deref().unwrap_or(DEFAULT_LOGO)
    }

    /// Favicon filename, falling back to the shipped default.
    pub fn favicon_or_default(&self) -> &str {
        self.favicon.as_deref().unwrap_or(DEFAULT_FAVICON)
    }

    /// Hero image filename, falling back to the shipped default.
    pub fn hero_image_or_default(&self) -> &str {
        self.hero.image.as_deref().unwrap_or(DEFAULT_HERO_IMAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Hero {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub button_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct About {
    #[serde(default)]
    pub who: String,
    #[serde(default)]
    pub why: String,
}

/// A drink or dish on the menu.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MenuItem {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Currency string such as `$4.50`.
    #[serde(default)]
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
}

#[derive(Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(
        default,
        deserialize_with = "lenient_coordinate",
        skip_serializing_if = "Option::is_none"
    )]
    pub map_lat: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_coordinate",
        skip_serializing_if = "Option::is_none"
    )]
    pub map_lng: Option<f64>,
    /// Browser key for the embedded map. Never required, survives updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_maps_api_key: Option<String>,
}

impl std::fmt::Debug for Contact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Contact")
            .field("address", &self.address)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("map_lat", &self.map_lat)
            .field("map_lng", &self.map_lng)
            .field(
                "google_maps_api_key",
                &self.google_maps_api_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Footer {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

/// Parse a coordinate given as a JSON number or a numeric string.
///
/// Older documents stored coordinates as strings; anything unparseable is
/// read back as absent.
pub fn parse_coordinate(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_coordinate))
}
