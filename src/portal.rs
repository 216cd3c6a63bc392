//! The user actions of the portal, written against [`Backend`] so they run
//! the same way over the real client and the test fake.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use lazy_static::lazy_static;
use tracing::{info, warn};

use crate::backend::{Backend, PRODUCT_IMAGES_BUCKET};
use crate::error::{Result, YatraError};
use crate::forms::{ArtisanForm, ImageUpload, ProductForm};
use crate::nearby::find_nearby;
use crate::types::{
    ArtisanProfile, CalendarFestival, Coordinates, DistanceResult, Festival, FestivalCalendar,
    FestivalsFetchSummary, PlaceDetail, Places, PlacesFetchSummary, Product, ProductListing,
    SortKey, Wishlist,
};

/// Upper bound on rows pulled from the backend for a nearby search
pub const NEARBY_CANDIDATE_LIMIT: usize = 200;
pub const EXPLORE_PLACE_LIMIT: usize = 20;
pub const EXPLORE_FESTIVAL_LIMIT: usize = 50;
pub const MARKETPLACE_LIMIT: usize = 50;

pub const STATES: [&str; 7] = [
    "Jharkhand",
    "Bihar",
    "West Bengal",
    "Odisha",
    "Chhattisgarh",
    "Uttar Pradesh",
    "Maharashtra",
];

lazy_static! {
    pub static ref KNOWN_PLACE_TYPES: BTreeSet<&'static str> =
        ["nature", "historical", "cultural"].into_iter().collect();
}

pub async fn register_artisan(backend: &dyn Backend, form: ArtisanForm) -> Result<ArtisanProfile> {
    let profile = form.validate()?;
    backend.upsert_artisan(&profile).await?;
    info!(artisan_id = %profile.artisan_id, "artisan profile submitted");
    Ok(profile)
}

/// Validates the product, uploads the image if one is given, then inserts.
/// Nothing is inserted when the upload fails.
pub async fn post_product(
    backend: &dyn Backend,
    form: ProductForm,
    image: Option<&Path>,
) -> Result<Product> {
    let mut product = form.validate()?;
    if let Some(file) = image {
        let upload = ImageUpload::for_file(&product.artisan_id, file)?;
        let bytes = tokio::fs::read(file).await?;
        let url = backend
            .upload_image(
                PRODUCT_IMAGES_BUCKET,
                &upload.object_path,
                bytes,
                upload.content_type,
            )
            .await?;
        product.images = vec![url];
    }
    backend.insert_product(&product).await?;
    info!(artisan_id = %product.artisan_id, title = %product.title, "product posted");
    Ok(product)
}

#[derive(Debug, Default)]
pub struct Exploration {
    pub places_fetch: Option<PlacesFetchSummary>,
    pub festivals_fetch: Option<FestivalsFetchSummary>,
    pub places: Places,
    pub festivals: Vec<Festival>,
}

/// Lists a state's places and festivals, optionally asking the hosted
/// functions to refresh them first
pub async fn explore(
    backend: &dyn Backend,
    state: &str,
    fetch_places: bool,
    fetch_festivals: bool,
) -> Result<Exploration> {
    require_state(state)?;
    let mut exploration = Exploration::default();
    if fetch_places {
        exploration.places_fetch = Some(backend.fetch_places(state).await?);
    }
    if fetch_festivals {
        exploration.festivals_fetch = Some(backend.fetch_festivals(state).await?);
    }
    exploration.places = backend.list_places(state, EXPLORE_PLACE_LIMIT).await?;
    exploration.festivals = backend.list_festivals(state, EXPLORE_FESTIVAL_LIMIT).await?;
    Ok(exploration)
}

/// A state's festivals, optionally refreshed through `festivals-fetch` first
pub async fn festivals(
    backend: &dyn Backend,
    state: &str,
    fetch: bool,
) -> Result<(Option<FestivalsFetchSummary>, Vec<Festival>)> {
    require_state(state)?;
    let summary = match fetch {
        true => Some(backend.fetch_festivals(state).await?),
        false => None,
    };
    let festivals = backend.list_festivals(state, EXPLORE_FESTIVAL_LIMIT).await?;
    Ok((summary, festivals))
}

/// The festival calendar of a state, dated entries first in date order,
/// undated ones after them in the order received
pub async fn festival_calendar(backend: &dyn Backend, state: &str) -> Result<FestivalCalendar> {
    require_state(state)?;
    let mut calendar = backend.festival_calendar(state).await?;
    calendar.festivals.sort_by(|a, b| calendar_key(a).cmp(&calendar_key(b)));
    Ok(calendar)
}

fn calendar_key(festival: &CalendarFestival) -> (bool, &str) {
    match festival.festival_date.as_deref() {
        Some(date) => (false, date),
        None => (true, ""),
    }
}

pub async fn marketplace(backend: &dyn Backend) -> Result<Vec<ProductListing>> {
    let products = backend.list_products(MARKETPLACE_LIMIT).await?;
    info!(products = products.len(), "marketplace listed");
    Ok(products)
}

fn require_state(state: &str) -> Result<()> {
    if state.trim().is_empty() {
        return Err(YatraError::invalid("state is required"));
    }
    Ok(())
}

pub async fn nearby(
    backend: &dyn Backend,
    origin: Coordinates,
    radius_km: f64,
    type_filter: &HashSet<String>,
    sort_by: SortKey,
) -> Result<Vec<DistanceResult>> {
    if !radius_km.is_finite() {
        return Err(YatraError::invalid(format!("radius {radius_km} is not a number")));
    }
    for kind in type_filter {
        if !KNOWN_PLACE_TYPES.contains(kind.as_str()) {
            warn!(%kind, "filtering on a place type the backend does not assign");
        }
    }
    let candidates = backend
        .list_places_with_coordinates(NEARBY_CANDIDATE_LIMIT)
        .await?;
    let results = find_nearby(origin, &candidates, radius_km, type_filter, sort_by);
    info!(
        candidates = candidates.len(),
        results = results.len(),
        radius_km,
        "nearby search"
    );
    Ok(results)
}

/// Adds a place to the user's wishlist. Returns the stored list and whether
/// the place was newly added.
pub async fn save_to_wishlist(
    backend: &dyn Backend,
    user_id: &str,
    place_id: &str,
) -> Result<(Wishlist, bool)> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(YatraError::invalid("user id is required to save a wishlist"));
    }
    if place_id.trim().is_empty() {
        return Err(YatraError::invalid("place id is required"));
    }
    let mut wishlist = backend
        .get_wishlist(user_id)
        .await?
        .unwrap_or_else(|| Wishlist {
            user_id: user_id.to_string(),
            place_ids: Vec::new(),
        });
    let added = !wishlist.place_ids.iter().any(|id| id == place_id);
    if added {
        wishlist.place_ids.push(place_id.to_string());
    }
    backend.upsert_wishlist(&wishlist).await?;
    Ok((wishlist, added))
}

pub async fn place_detail(
    backend: &dyn Backend,
    place_id: &str,
    state: Option<&str>,
) -> Result<PlaceDetail> {
    if place_id.trim().is_empty() {
        return Err(YatraError::invalid("place id is required"));
    }
    backend.fetch_place_detail(place_id, state).await
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapLinks {
    pub route: String,
    pub map_view: String,
}

/// Directions and panorama links, when the place has coordinates
pub fn map_links(detail: &PlaceDetail) -> Option<MapLinks> {
    let (lat, lon) = (detail.lat?, detail.lon?);
    Some(MapLinks {
        route: format!("https://www.google.com/maps/dir/?api=1&destination={lat},{lon}"),
        map_view: format!(
            "https://www.google.com/maps/@?api=1&map_action=pano&viewpoint={lat},{lon}"
        ),
    })
}
