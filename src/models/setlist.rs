use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use uuid::Uuid;

use crate::{
    error::AppError,
    utils::{date::parse_date, id::parse_id, require_text, validate_optional_url},
};

/// A song within a setlist. Display order comes from `order`, not from the
/// position in the stored array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub title: String,
    pub album_image_url: Option<String>,
    pub order: i32,
}

/// Represents the 'setlists' table in the database.
/// Songs are stored as a JSON array.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetList {
    pub id: Uuid,
    pub concert_id: Uuid,
    pub day: i32,
    pub date: DateTime<Utc>,
    pub songs: Json<Vec<Song>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SetList {
    /// Orders songs by their `order` field. The sort is stable, so songs
    /// sharing an order keep their stored relative position.
    pub fn with_sorted_songs(mut self) -> Self {
        self.songs.0.sort_by_key(|s| s.order);
        self
    }
}

/// Validated setlist fields, shared by create and update.
#[derive(Debug, Clone)]
pub struct SetListInput {
    pub concert_id: Uuid,
    pub day: i32,
    pub date: DateTime<Utc>,
    pub songs: Vec<Song>,
}

/// DTO for creating or replacing a setlist.
/// The songs array always replaces the stored one wholesale.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetListRequest {
    pub concert_id: Option<String>,
    pub day: Option<i32>,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub songs: Vec<Song>,
}

/// Setlist fields checked without touching the store. The concert is still
/// open: it may come from the body, the route or the stored setlist.
#[derive(Debug, Clone)]
pub struct SetListFields {
    pub concert_id: Option<Uuid>,
    pub day: i32,
    pub date: DateTime<Utc>,
    pub songs: Vec<Song>,
}

impl SetListFields {
    pub fn for_concert(self, concert_id: Uuid) -> SetListInput {
        SetListInput {
            concert_id,
            day: self.day,
            date: self.date,
            songs: self.songs,
        }
    }
}

impl SetListRequest {
    /// Validates day, date, songs and a body concert id if one is given.
    pub fn into_fields(self) -> Result<SetListFields, AppError> {
        let concert_id = match self.concert_id.as_deref() {
            Some(raw) if !raw.trim().is_empty() => Some(parse_id(raw, "concertId")?),
            _ => None,
        };

        let day = match self.day {
            Some(day) if day >= 1 => day,
            Some(_) => {
                return Err(AppError::BadRequest(
                    "day must be a positive integer".to_string(),
                ));
            }
            None => return Err(AppError::BadRequest("day is required".to_string())),
        };

        let date = parse_date(&self.date, "date")?;

        let songs = self
            .songs
            .into_iter()
            .map(|song| {
                if song.order < 0 {
                    return Err(AppError::BadRequest(
                        "song order must not be negative".to_string(),
                    ));
                }
                Ok(Song {
                    title: require_text(&song.title, "song title", 200)?,
                    album_image_url: validate_optional_url(
                        song.album_image_url,
                        "albumImageUrl",
                    )?,
                    order: song.order,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SetListFields {
            concert_id,
            day,
            date,
            songs,
        })
    }

    /// `route_concert` takes precedence over a concert id in the body.
    pub fn into_input(self, route_concert: Option<Uuid>) -> Result<SetListInput, AppError> {
        let fields = self.into_fields()?;
        let concert_id = route_concert
            .or(fields.concert_id)
            .ok_or(AppError::BadRequest("concertId is required".to_string()))?;
        Ok(fields.for_concert(concert_id))
    }
}

/// Query parameters for listing setlists.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetListParams {
    pub concert_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(title: &str, order: i32) -> Song {
        Song {
            title: title.into(),
            album_image_url: None,
            order,
        }
    }

    #[test]
    fn songs_sort_by_order_field_not_position() {
        let now = Utc::now();
        let setlist = SetList {
            id: Uuid::new_v4(),
            concert_id: Uuid::new_v4(),
            day: 1,
            date: now,
            songs: Json(vec![song("Intro", 2), song("Encore", 1)]),
            created_at: now,
            updated_at: now,
        }
        .with_sorted_songs();

        let titles: Vec<_> = setlist.songs.0.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Encore", "Intro"]);
    }

    #[test]
    fn route_concert_wins_over_body() {
        let route = Uuid::new_v4();
        let req = SetListRequest {
            concert_id: Some(Uuid::new_v4().to_string()),
            day: Some(2),
            date: "2025-05-02".into(),
            songs: vec![song("Intro", 1)],
        };
        let input = req.into_input(Some(route)).unwrap();
        assert_eq!(input.concert_id, route);
        assert_eq!(input.day, 2);
    }

    #[test]
    fn day_must_be_positive() {
        let req = SetListRequest {
            concert_id: Some(Uuid::new_v4().to_string()),
            day: Some(0),
            date: "2025-05-02".into(),
            songs: vec![],
        };
        assert!(matches!(req.into_input(None), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn missing_concert_is_rejected() {
        let req = SetListRequest {
            concert_id: None,
            day: Some(1),
            date: "2025-05-02".into(),
            songs: vec![],
        };
        assert!(matches!(req.into_input(None), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn blank_song_title_is_rejected() {
        let req = SetListRequest {
            concert_id: Some(Uuid::new_v4().to_string()),
            day: Some(1),
            date: "2025-05-02".into(),
            songs: vec![song(" ", 1)],
        };
        assert!(matches!(req.into_input(None), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn fields_leave_concert_open_when_body_has_none() {
        let req = SetListRequest {
            concert_id: Some("  ".into()),
            day: Some(3),
            date: "2025-05-03".into(),
            songs: vec![song("Intro", 1)],
        };
        let fields = req.into_fields().unwrap();
        assert!(fields.concert_id.is_none());

        let concert = Uuid::new_v4();
        let input = fields.for_concert(concert);
        assert_eq!(input.concert_id, concert);
        assert_eq!(input.day, 3);
    }

    #[test]
    fn bad_date_fails_before_concert_is_resolved() {
        let req = SetListRequest {
            concert_id: None,
            day: Some(1),
            date: "someday".into(),
            songs: vec![],
        };
        assert!(matches!(req.into_fields(), Err(AppError::BadRequest(_))));
    }
}
