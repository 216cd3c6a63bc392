use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Result, YatraError};

pub type Places = Vec<Place>;

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A row of the backend `places` table as returned by the listing queries
pub struct Place {
    #[serde(rename = "place_id", default, deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub type_field: Option<String>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub lon: Option<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<String>,
    #[serde(default)]
    pub short_desc: Option<String>,
}

impl Place {
    /// Both coordinates, or nothing
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates { lat, lon }),
            _ => None,
        }
    }
}

/// A place together with its distance from the query origin.
/// Only meaningful for the query that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceResult {
    #[serde(flatten)]
    pub place: Place,
    pub distance_km: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(YatraError::invalid(format!("latitude {lat} is out of range")));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(YatraError::invalid(format!("longitude {lon} is out of range")));
        }
        Ok(Coordinates { lat, lon })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortKey {
    #[default]
    Distance,
    Name,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Festival {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub date_pattern: Option<String>,
    #[serde(default)]
    pub short_desc: Option<String>,
    #[serde(default)]
    pub long_desc: Option<String>,
}

impl Festival {
    pub fn label(&self) -> &str {
        self.date
            .as_deref()
            .or(self.date_pattern.as_deref())
            .or(self.name.as_deref())
            .unwrap_or("Festival")
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Response of the `place-detail` function: the stored place plus the
/// generated guide (tips, itinerary) which is kept as raw JSON
pub struct PlaceDetail {
    #[serde(default, deserialize_with = "id_string")]
    pub place_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub long_desc: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<String>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub lat: Option<f64>,
    #[serde(default, deserialize_with = "lenient_coordinate")]
    pub lon: Option<f64>,
    #[serde(default)]
    pub gemini: Value,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: String,
    pub email: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtisanProfile {
    pub artisan_id: String,
    pub display_name: String,
    pub address: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub skills: Vec<String>,
    pub story: String,
    pub contact_info: ContactInfo,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub artisan_id: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price: Option<f64>,
    pub stock: u32,
    pub images: Vec<String>,
}

/// A marketplace row as listed to visitors
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListing {
    #[serde(default, deserialize_with = "id_string")]
    pub product_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub images: Vec<String>,
    #[serde(default)]
    pub contact_info: Value,
}

/// One entry of the `festivals-calendar` response
#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarFestival {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub festival_date: Option<String>,
    #[serde(default = "one_day")]
    pub duration_days: u32,
    #[serde(default)]
    pub significance: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub traditions: Vec<String>,
    #[serde(default)]
    pub estimated_date: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FestivalCalendar {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub festivals: Vec<CalendarFestival>,
    #[serde(default)]
    pub cached: bool,
    #[serde(default)]
    pub fallback: bool,
}

fn one_day() -> u32 {
    1
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wishlist {
    pub user_id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub place_ids: Vec<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub name: String,
    pub error: String,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacesFetchSummary {
    pub state: String,
    #[serde(default)]
    pub received: u32,
    #[serde(default)]
    pub inserted: u32,
    #[serde(default)]
    pub failed: Vec<FetchFailure>,
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FestivalsFetchSummary {
    pub state: String,
    #[serde(default)]
    pub count: u32,
}

/// Accepts a JSON number or a numeric string. Anything else counts as absent.
fn lenient_coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite()))
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
