use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{Result, YatraError};
use crate::types::PlaceDetail;

/// A place detail saved for offline viewing
#[derive(Debug, Clone, PartialEq)]
pub struct SavedPlace {
    pub detail: PlaceDetail,
    pub saved_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn new(db_url: &str) -> Result<Self> {
        let conn = Connection::open(db_url)?;
        conn.execute(
            "
            CREATE TABLE IF NOT EXISTS saved_place (
                place_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                state TEXT,
                detail_json TEXT NOT NULL,
                saved_at TEXT NOT NULL
            )
            ",
            (),
        )?;
        Ok(Store { conn })
    }

    /// Save or refresh a place bundle
    pub fn save_place(&self, detail: &PlaceDetail) -> Result<SavedPlace> {
        if detail.place_id.is_empty() {
            return Err(YatraError::invalid("cannot save a place without an id"));
        }
        let saved_at = Utc::now();
        self.conn.execute(
            "
            INSERT INTO saved_place (place_id, name, state, detail_json, saved_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(place_id) DO UPDATE SET
                name = excluded.name,
                state = excluded.state,
                detail_json = excluded.detail_json,
                saved_at = excluded.saved_at
            ",
            params![
                detail.place_id,
                detail.name,
                detail.state,
                serde_json::to_string(detail)?,
                saved_at.to_rfc3339()
            ],
        )?;
        Ok(SavedPlace {
            detail: detail.clone(),
            saved_at,
        })
    }

    /// Get a saved place
    pub fn get_place(&self, place_id: &str) -> Result<Option<SavedPlace>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT detail_json, saved_at FROM saved_place WHERE place_id = ?1",
                params![place_id],
                |row| Ok((row.get("detail_json")?, row.get("saved_at")?)),
            )
            .optional()?;
        row.map(|(json, saved_at)| decode(&json, &saved_at)).transpose()
    }

    /// All saved places, most recently saved first
    pub fn list_places(&self) -> Result<Vec<SavedPlace>> {
        let mut stmt = self
            .conn
            .prepare("SELECT detail_json, saved_at FROM saved_place ORDER BY saved_at DESC, name")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut places = Vec::new();
        for row in rows {
            let (json, saved_at) = row?;
            places.push(decode(&json, &saved_at)?);
        }
        Ok(places)
    }

    pub fn remove_place(&self, place_id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM saved_place WHERE place_id = ?1", params![place_id])?;
        Ok(removed > 0)
    }
}

fn decode(json: &str, saved_at: &str) -> Result<SavedPlace> {
    let saved_at = DateTime::parse_from_rfc3339(saved_at)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?
        .with_timezone(&Utc);
    Ok(SavedPlace {
        detail: serde_json::from_str(json)?,
        saved_at,
    })
}
