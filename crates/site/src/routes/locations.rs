//! Practice locations page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use stillwaters_core::PracticeLocation;

use crate::config::MapsConfig;
use crate::error::Result;
use crate::filters;
use crate::middleware::CspNonce;
use crate::seo::SeoMeta;
use crate::state::AppState;

/// A location with its map links.
pub struct LocationView {
    pub location: PracticeLocation,
    /// Opens the address in Google Maps.
    pub directions_url: Option<String>,
    /// Embedded map frame, only when a maps key is configured.
    pub embed_url: Option<String>,
}

impl LocationView {
    #[must_use]
    pub fn new(location: PracticeLocation, maps: &MapsConfig) -> Self {
        let query = map_query(&location);
        let directions_url = query.as_deref().map(|q| {
            format!(
                "https://www.google.com/maps/search/?api=1&query={}",
                urlencoding::encode(q)
            )
        });
        let embed_url = maps.api_key.as_deref().zip(query.as_deref()).map(|(key, q)| {
            format!(
                "https://www.google.com/maps/embed/v1/place?key={}&q={}&zoom={}",
                urlencoding::encode(key),
                urlencoding::encode(q),
                maps.default_zoom
            )
        });

        Self {
            location,
            directions_url,
            embed_url,
        }
    }
}

/// What to search for on the map: coordinates when known, else the address.
fn map_query(location: &PracticeLocation) -> Option<String> {
    if location.is_telehealth {
        return None;
    }
    location
        .coordinates()
        .map(|(lat, lng)| format!("{lat},{lng}"))
        .or_else(|| Some(location.full_address()))
}

/// Locations template.
#[derive(Template, WebTemplate)]
#[template(path = "locations.html")]
pub struct LocationsTemplate {
    pub seo: SeoMeta,
    pub nonce: String,
    pub locations: Vec<LocationView>,
}

/// Display every active location.
#[instrument(skip(state, nonce))]
pub async fn index(State(state): State<AppState>, nonce: CspNonce) -> Result<LocationsTemplate> {
    let maps = &state.config().maps;
    let locations = state
        .locations()
        .active()
        .await?
        .iter()
        .cloned()
        .map(|l| LocationView::new(l, maps))
        .collect();

    Ok(LocationsTemplate {
        seo: SeoMeta::for_path(
            state.config(),
            "/locations",
            "Locations",
            "Where to find us in Hobart, and how telehealth sessions work.",
        ),
        nonce: nonce.0,
        locations,
    })
}
