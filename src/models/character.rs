//! Character records and the voice-actor credit records used to enrich them.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::utils::to_portable_markup;

/// Marker stored in [`CharacterRecord::voice_actors`] when VNDB has no
/// voice-actor credit for a character.
pub const UNRECORDED: &str = "未收錄";

/// Field paths requested from `/character` to populate a [`CharacterRecord`]
pub const CHARACTER_FIELDS: &[&str] = &[
    // basic fields
    "id",
    "name",
    "original",
    "aliases",
    "description",
    "image.url",
    "blood_type",
    "height",
    "weight",
    "bust",
    "waist",
    "hips",
    "cup",
    "age",
    "birthday",
    "sex",
    "gender",
    // vns fields
    "vns.title",
    "vns.alttitle",
    "vns.spoiler",
    "vns.role",
    "vns.titles.title",
    "vns.titles.main",
];

/// Field paths requested from `/vn` for the voice-actor join
pub const VA_FIELDS: &[&str] = &["va.staff.name", "va.staff.original", "va.character.id"];

fn unrecorded() -> Vec<String> {
    vec![UNRECORDED.to_string()]
}

/// A visual novel character
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub id: String,

    pub name: String,

    /// Name in the original script
    #[serde(rename = "original", default)]
    pub original_name: Option<String>,

    #[serde(default)]
    pub aliases: Vec<String>,

    /// Description in VNDB markup, see [`CharacterRecord::description_markdown`]
    #[serde(default)]
    pub description: Option<String>,

    #[serde(rename(deserialize = "image"), default, deserialize_with = "image_url")]
    pub image_url: Option<String>,

    #[serde(flatten)]
    pub physical: PhysicalAttributes,

    #[serde(rename = "vns", default)]
    pub appearances: Vec<Appearance>,

    /// Filled in by the voice-actor join
    #[serde(default = "unrecorded")]
    pub voice_actors: Vec<String>,
}

impl CharacterRecord {
    /// Description converted to portable markdown
    pub fn description_markdown(&self) -> Option<String> {
        self.description.as_deref().map(to_portable_markup)
    }

    /// Whether the voice-actor join found no credits
    pub fn voice_actors_unrecorded(&self) -> bool {
        self.voice_actors.len() == 1 && self.voice_actors[0] == UNRECORDED
    }
}

/// Physical attributes, normalised to optional strings.
///
/// VNDB sends a mix of numbers, strings and small arrays here; numbers are
/// rendered in decimal and arrays are joined with `/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicalAttributes {
    #[serde(default, deserialize_with = "stringish")]
    pub blood_type: Option<String>,
    #[serde(default, deserialize_with = "stringish")]
    pub height: Option<String>,
    #[serde(default, deserialize_with = "stringish")]
    pub weight: Option<String>,
    #[serde(default, deserialize_with = "stringish")]
    pub bust: Option<String>,
    #[serde(default, deserialize_with = "stringish")]
    pub waist: Option<String>,
    #[serde(default, deserialize_with = "stringish")]
    pub hips: Option<String>,
    #[serde(default, deserialize_with = "stringish")]
    pub cup: Option<String>,
    #[serde(default, deserialize_with = "stringish")]
    pub age: Option<String>,
    /// `month/day`
    #[serde(default, deserialize_with = "stringish")]
    pub birthday: Option<String>,
    /// `apparent/real`
    #[serde(default, deserialize_with = "stringish")]
    pub sex: Option<String>,
    #[serde(default, deserialize_with = "stringish")]
    pub gender: Option<String>,
}

/// A character's role in one visual novel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appearance {
    #[serde(rename = "title")]
    pub vn_title: String,

    #[serde(rename = "alttitle", default)]
    pub alt_title: Option<String>,

    /// `main`, `primary`, `side` or `appears`
    pub role: String,

    #[serde(default)]
    pub spoiler: u8,

    #[serde(default)]
    pub titles: Vec<VnTitle>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VnTitle {
    pub title: String,
    #[serde(default)]
    pub main: bool,
}

// `/vn` records used only by the voice-actor join.

#[derive(Debug, Clone, Deserialize)]
pub struct VnCreditRecord {
    #[serde(default)]
    pub va: Vec<VaCredit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VaCredit {
    pub character: CreditCharacter,
    pub staff: CreditStaff,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreditCharacter {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreditStaff {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "stringish")]
    pub original: Option<String>,
}

impl CreditStaff {
    /// Original-script name when present, else the display name
    pub fn preferred_name(&self) -> &str {
        match self.original.as_deref() {
            Some(original) if !original.is_empty() => original,
            _ => &self.name,
        }
    }
}

fn stringish<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(render(&value))
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(render).collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join("/"))
            }
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

fn image_url<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    struct Image {
        url: Option<String>,
    }

    let image: Option<Image> = Option::deserialize(deserializer)?;
    Ok(image.and_then(|i| i.url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_full_character() {
        let record: CharacterRecord = serde_json::from_value(json!({
            "id": "c17",
            "name": "Rei",
            "original": "レイ",
            "aliases": ["R"],
            "description": "A [url=https://example.com]friend[/url].",
            "image": {"url": "https://t.vndb.org/ch/17.jpg"},
            "blood_type": "a",
            "height": 158,
            "weight": null,
            "bust": 80,
            "waist": 56,
            "hips": 82,
            "cup": "B",
            "age": 17,
            "birthday": [3, 27],
            "sex": ["f", "f"],
            "gender": null,
            "vns": [
                {"title": "Some VN", "alttitle": null, "role": "main", "spoiler": 0,
                 "titles": [{"title": "Some VN", "main": true}]}
            ]
        }))
        .unwrap();

        assert_eq!(record.original_name.as_deref(), Some("レイ"));
        assert_eq!(record.image_url.as_deref(), Some("https://t.vndb.org/ch/17.jpg"));
        assert_eq!(record.physical.height.as_deref(), Some("158"));
        assert_eq!(record.physical.weight, None);
        assert_eq!(record.physical.birthday.as_deref(), Some("3/27"));
        assert_eq!(record.physical.sex.as_deref(), Some("f/f"));
        assert_eq!(record.appearances[0].role, "main");
        assert!(record.appearances[0].titles[0].main);
        assert!(record.voice_actors_unrecorded());
        assert_eq!(
            record.description_markdown().as_deref(),
            Some("A [friend](https://example.com).")
        );
    }

    #[test]
    fn test_decode_minimal_character() {
        let record: CharacterRecord =
            serde_json::from_value(json!({"id": "c5", "name": "X", "image": null})).unwrap();
        assert_eq!(record.image_url, None);
        assert!(record.appearances.is_empty());
        assert_eq!(record.voice_actors, vec![UNRECORDED.to_string()]);
    }

    #[test]
    fn test_preferred_staff_name() {
        let with_original = CreditStaff {
            name: "Kana".to_string(),
            original: Some("甲".to_string()),
        };
        let empty_original = CreditStaff {
            name: "Kana".to_string(),
            original: Some(String::new()),
        };
        let no_original = CreditStaff {
            name: "Kana".to_string(),
            original: None,
        };

        assert_eq!(with_original.preferred_name(), "甲");
        assert_eq!(empty_original.preferred_name(), "Kana");
        assert_eq!(no_original.preferred_name(), "Kana");
    }
}
