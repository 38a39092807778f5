//! Service catalogue and fee schedule pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::catalog::{self, Service};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::CspNonce;
use crate::seo::{SeoMeta, offer_catalog, service_json_ld};
use crate::state::AppState;

/// Service list template.
#[derive(Template, WebTemplate)]
#[template(path = "services/index.html")]
pub struct ServicesIndexTemplate {
    pub seo: SeoMeta,
    pub nonce: String,
    pub services: &'static [Service],
}

/// Service detail template.
#[derive(Template, WebTemplate)]
#[template(path = "services/show.html")]
pub struct ServiceShowTemplate {
    pub seo: SeoMeta,
    pub nonce: String,
    pub service: &'static Service,
}

/// Fee schedule template.
#[derive(Template, WebTemplate)]
#[template(path = "fees.html")]
pub struct FeesTemplate {
    pub seo: SeoMeta,
    pub nonce: String,
    pub services: &'static [Service],
}

/// Display every service.
#[instrument(skip(state, nonce))]
pub async fn index(State(state): State<AppState>, nonce: CspNonce) -> ServicesIndexTemplate {
    ServicesIndexTemplate {
        seo: SeoMeta::for_path(
            state.config(),
            "/services",
            "Services",
            "Individual, couples and telehealth counselling sessions.",
        ),
        nonce: nonce.0,
        services: catalog::services(),
    }
}

/// Display one service.
#[instrument(skip(state, nonce))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    nonce: CspNonce,
) -> Result<ServiceShowTemplate> {
    let service =
        catalog::service(&slug).ok_or_else(|| AppError::NotFound(format!("service {slug}")))?;

    let seo = SeoMeta::for_path(state.config(), &service.path(), service.name, service.summary)
        .with_json_ld(&service_json_ld(&state.config().base_url, service));

    Ok(ServiceShowTemplate {
        seo,
        nonce: nonce.0,
        service,
    })
}

/// Display the fee schedule.
#[instrument(skip(state, nonce))]
pub async fn fees(State(state): State<AppState>, nonce: CspNonce) -> FeesTemplate {
    let seo = SeoMeta::for_path(
        state.config(),
        "/fees",
        "Fees and Medicare rebates",
        "Session fees, Medicare rebates and what you pay out of pocket.",
    )
    .with_json_ld(&offer_catalog(&state.config().base_url, catalog::services()));

    FeesTemplate {
        seo,
        nonce: nonce.0,
        services: catalog::services(),
    }
}
