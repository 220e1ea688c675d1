//! Protected user-facing endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Serialize;

use crate::AppState;

/// Create user router
///
/// Routes:
/// - GET / - Confirmation page
/// - GET /user/:name - Stored value for a user
/// - GET /albums - Album listing
pub fn user_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/user/:name", get(get_user_value))
        .route("/albums", get(list_albums))
}

/// GET /
async fn home() -> &'static str {
    "User authenticated successfully!"
}

/// Value lookup response
///
/// Carries either `value` or `status: "no value"`.
#[derive(Debug, Serialize)]
pub struct UserValueResponse {
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
}

/// GET /user/:name
async fn get_user_value(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<UserValueResponse> {
    let response = match state.values.get(&name).await {
        Some(value) => UserValueResponse {
            user: name,
            value: Some(value),
            status: None,
        },
        None => UserValueResponse {
            user: name,
            value: None,
            status: Some("no value"),
        },
    };

    Json(response)
}

#[derive(Debug, Serialize)]
pub struct Album {
    pub id: &'static str,
    pub title: &'static str,
    pub artist: &'static str,
    pub price: f64,
}

static ALBUMS: [Album; 3] = [
    Album {
        id: "1",
        title: "Blue Train",
        artist: "John Coltrane",
        price: 56.99,
    },
    Album {
        id: "2",
        title: "Jeru",
        artist: "Gerry Mulligan",
        price: 17.99,
    },
    Album {
        id: "3",
        title: "Sarah Vaughan and Clifford Brown",
        artist: "Sarah Vaughan",
        price: 39.99,
    },
];

/// GET /albums
///
/// Static placeholder listing.
async fn list_albums() -> Json<&'static [Album]> {
    Json(&ALBUMS[..])
}
