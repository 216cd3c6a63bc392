//! The portal's only view of the hosted backend.
//!
//! Tables, storage and the hosted functions all sit behind [`Backend`], so
//! the commands never see HTTP. [`crate::supabase::SupabaseClient`] is the
//! real implementation; tests use [`fake::FakeBackend`].

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{
    ArtisanProfile, Festival, FestivalCalendar, FestivalsFetchSummary, PlaceDetail, Places,
    PlacesFetchSummary, Product, ProductListing, Wishlist,
};

pub const PRODUCT_IMAGES_BUCKET: &str = "product-images";

#[async_trait]
pub trait Backend: Send + Sync {
    /// Places stored for a state
    async fn list_places(&self, state: &str, limit: usize) -> Result<Places>;

    /// Places of any state that have both coordinates set
    async fn list_places_with_coordinates(&self, limit: usize) -> Result<Places>;

    async fn list_festivals(&self, state: &str, limit: usize) -> Result<Vec<Festival>>;

    /// Asks the `places-fetch` function to (re)populate a state's places
    async fn fetch_places(&self, state: &str) -> Result<PlacesFetchSummary>;

    async fn fetch_festivals(&self, state: &str) -> Result<FestivalsFetchSummary>;

    /// Dated festival list from the `festivals-calendar` function
    async fn festival_calendar(&self, state: &str) -> Result<FestivalCalendar>;

    async fn fetch_place_detail(&self, place_id: &str, state: Option<&str>) -> Result<PlaceDetail>;

    async fn upsert_artisan(&self, profile: &ArtisanProfile) -> Result<()>;

    async fn insert_product(&self, product: &Product) -> Result<()>;

    /// Most recently created products first
    async fn list_products(&self, limit: usize) -> Result<Vec<ProductListing>>;

    /// Stores an object, replacing any existing one, and returns its public URL
    async fn upload_image(
        &self,
        bucket: &str,
        object_path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String>;

    async fn get_wishlist(&self, user_id: &str) -> Result<Option<Wishlist>>;

    /// Insert or replace the wishlist row keyed by its user id
    async fn upsert_wishlist(&self, wishlist: &Wishlist) -> Result<()>;
}
