use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::config::Config;
use crate::error::{Result, YatraError};
use crate::types::{
    ArtisanProfile, Festival, FestivalCalendar, FestivalsFetchSummary, PlaceDetail, Places,
    PlacesFetchSummary, Product, ProductListing, Wishlist,
};

const PLACE_COLUMNS: &str = "place_id,name,type,lat,lon,images,short_desc";
const FESTIVAL_COLUMNS: &str = "name,state,date,date_pattern,short_desc,long_desc";
const PRODUCT_COLUMNS: &str = "product_id,title,description,images,price,category,contact_info";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates";

type Query = Vec<(&'static str, String)>;

/// Talks to a Supabase project: PostgREST tables, storage and edge functions.
///
/// Table reads, artisan and product writes and the festival calendar use
/// the anon key. The fetch functions, place detail and wishlists need the
/// service role key.
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    service_role_key: Option<String>,
}

impl SupabaseClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("yatra/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: config.supabase_url.clone(),
            anon_key: config.anon_key.clone(),
            service_role_key: config.service_role_key.clone(),
        })
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn function_url(&self, name: &str) -> String {
        format!("{}/functions/v1/{}", self.base_url, name)
    }

    fn object_url(&self, bucket: &str, object_path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, object_path)
    }

    pub fn public_url(&self, bucket: &str, object_path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, object_path
        )
    }

    fn service_key(&self) -> Result<&str> {
        self.service_role_key.as_deref().ok_or_else(|| {
            YatraError::ConfigError(
                "SUPABASE_SERVICE_ROLE_KEY is required for this action".to_string(),
            )
        })
    }

    fn authorized(&self, request: RequestBuilder, key: &str) -> RequestBuilder {
        request.header("apikey", key).bearer_auth(key)
    }

    fn select_request(&self, table: &str, query: &[(&str, String)], key: &str) -> RequestBuilder {
        self.authorized(self.http.get(self.rest_url(table)), key)
            .query(query)
    }

    fn write_request<B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
        key: &str,
        upsert: bool,
    ) -> RequestBuilder {
        let request = self
            .authorized(self.http.post(self.rest_url(table)), key)
            .json(body);
        match upsert {
            true => request.header("Prefer", MERGE_DUPLICATES),
            false => request,
        }
    }

    fn upload_request(
        &self,
        bucket: &str,
        object_path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> RequestBuilder {
        self.authorized(self.http.post(self.object_url(bucket, object_path)), &self.anon_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
    }

    fn invoke_request<B: Serialize + ?Sized>(
        &self,
        name: &str,
        body: &B,
        key: &str,
    ) -> RequestBuilder {
        self.authorized(self.http.post(self.function_url(name)), key)
            .json(body)
    }

    async fn ensure_success(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), %body, "backend request failed");
        Err(YatraError::BackendError {
            status: status.as_u16(),
            body,
        })
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
        key: &str,
    ) -> Result<Vec<T>> {
        debug!(table, ?query, "select");
        let response = self.select_request(table, query, key).send().await?;
        Ok(Self::ensure_success(response).await?.json().await?)
    }

    async fn write<B: Serialize + ?Sized>(
        &self,
        table: &str,
        body: &B,
        key: &str,
        upsert: bool,
    ) -> Result<()> {
        debug!(table, upsert, "write");
        let response = self.write_request(table, body, key, upsert).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn invoke<B, T>(&self, name: &str, body: &B, key: &str) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        info!(function = name, "invoking hosted function");
        let response = self.invoke_request(name, body, key).send().await?;
        Ok(Self::ensure_success(response).await?.json().await?)
    }
}

fn places_by_state(state: &str, limit: usize) -> Query {
    vec![
        ("select", PLACE_COLUMNS.to_string()),
        ("state", format!("eq.{state}")),
        ("limit", limit.to_string()),
    ]
}

fn places_with_coordinates(limit: usize) -> Query {
    vec![
        ("select", PLACE_COLUMNS.to_string()),
        ("lat", "not.is.null".to_string()),
        ("lon", "not.is.null".to_string()),
        ("limit", limit.to_string()),
    ]
}

fn festivals_by_state(state: &str, limit: usize) -> Query {
    vec![
        ("select", FESTIVAL_COLUMNS.to_string()),
        ("state", format!("eq.{state}")),
        ("limit", limit.to_string()),
    ]
}

fn newest_products(limit: usize) -> Query {
    vec![
        ("select", PRODUCT_COLUMNS.to_string()),
        ("order", "created_at.desc".to_string()),
        ("limit", limit.to_string()),
    ]
}

fn wishlist_of(user_id: &str) -> Query {
    vec![
        ("select", "user_id,place_ids".to_string()),
        ("user_id", format!("eq.{user_id}")),
    ]
}

#[async_trait]
impl Backend for SupabaseClient {
    async fn list_places(&self, state: &str, limit: usize) -> Result<Places> {
        self.select("places", &places_by_state(state, limit), &self.anon_key)
            .await
    }

    async fn list_places_with_coordinates(&self, limit: usize) -> Result<Places> {
        self.select("places", &places_with_coordinates(limit), &self.anon_key)
            .await
    }

    async fn list_festivals(&self, state: &str, limit: usize) -> Result<Vec<Festival>> {
        self.select("festivals", &festivals_by_state(state, limit), &self.anon_key)
            .await
    }

    async fn fetch_places(&self, state: &str) -> Result<PlacesFetchSummary> {
        let body = json!({ "state": state });
        self.invoke("places-fetch", &body, self.service_key()?).await
    }

    async fn fetch_festivals(&self, state: &str) -> Result<FestivalsFetchSummary> {
        let body = json!({ "state": state });
        self.invoke("festivals-fetch", &body, self.service_key()?).await
    }

    async fn festival_calendar(&self, state: &str) -> Result<FestivalCalendar> {
        let body = json!({ "state": state });
        self.invoke("festivals-calendar", &body, &self.anon_key).await
    }

    async fn fetch_place_detail(&self, place_id: &str, state: Option<&str>) -> Result<PlaceDetail> {
        let body = json!({ "place_id": place_id, "state": state });
        let mut detail: PlaceDetail = self
            .invoke("place-detail", &body, self.service_key()?)
            .await
            .map_err(|e| match e {
                YatraError::BackendError { status: 404, .. } => {
                    YatraError::NotFound(format!("place {place_id}"))
                }
                other => other,
            })?;
        if detail.place_id.is_empty() {
            detail.place_id = place_id.to_string();
        }
        Ok(detail)
    }

    async fn upsert_artisan(&self, profile: &ArtisanProfile) -> Result<()> {
        self.write("artisans", profile, &self.anon_key, true).await
    }

    async fn insert_product(&self, product: &Product) -> Result<()> {
        self.write("products", product, &self.anon_key, false).await
    }

    async fn list_products(&self, limit: usize) -> Result<Vec<ProductListing>> {
        self.select("products", &newest_products(limit), &self.anon_key)
            .await
    }

    async fn upload_image(
        &self,
        bucket: &str,
        object_path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        info!(bucket, object_path, len = bytes.len(), "uploading image");
        let response = self
            .upload_request(bucket, object_path, bytes, content_type)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(self.public_url(bucket, object_path))
    }

    async fn get_wishlist(&self, user_id: &str) -> Result<Option<Wishlist>> {
        let rows: Vec<Wishlist> = self
            .select("wishlists", &wishlist_of(user_id), self.service_key()?)
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn upsert_wishlist(&self, wishlist: &Wishlist) -> Result<()> {
        self.write("wishlists", wishlist, self.service_key()?, true)
            .await
    }
}
