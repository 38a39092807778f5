//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::catalog::{self, PRACTICE_NAME, PRACTITIONER, Service, Testimonial};
use crate::filters;
use crate::middleware::CspNonce;
use crate::seo::{SeoMeta, practice_graph};
use crate::state::AppState;

/// Number of services previewed on the home page.
const PREVIEW_COUNT: usize = 3;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub seo: SeoMeta,
    pub nonce: String,
    pub practitioner: &'static str,
    pub services: Vec<&'static Service>,
    pub testimonials: &'static [Testimonial],
}

/// Display the home page.
///
/// The structured-data graph lists every active location; if they cannot be
/// loaded the page still renders with the practice entry alone.
#[instrument(skip(state, nonce))]
pub async fn home(State(state): State<AppState>, nonce: CspNonce) -> HomeTemplate {
    let locations = state.locations().active().await.unwrap_or_else(|e| {
        tracing::error!("Failed to load locations: {e}");
        std::sync::Arc::default()
    });

    let seo = SeoMeta::for_path(
        state.config(),
        "/",
        PRACTICE_NAME,
        "Counselling in Hobart and by telehealth: anxiety, low mood, grief, relationships. \
         Medicare rebates available with a Mental Health Care Plan.",
    )
    .website()
    .with_json_ld(&practice_graph(&state.config().base_url, &locations));

    HomeTemplate {
        seo,
        nonce: nonce.0,
        practitioner: PRACTITIONER,
        services: catalog::services().iter().take(PREVIEW_COUNT).collect(),
        testimonials: catalog::testimonials(),
    }
}
