//! Page metadata and schema.org structured data.
//!
//! Every page template receives a [`SeoMeta`]; the base layout renders it into
//! `<title>`, the description and canonical tags, Open Graph tags and, when
//! present, a `<script type="application/ld+json">` block.

use serde_json::{Value, json};

use stillwaters_core::{Money, PracticeLocation};

use crate::catalog::{PRACTICE_EMAIL, PRACTICE_NAME, PRACTICE_PHONE, Service};
use crate::config::SiteConfig;

/// Head metadata for one page.
#[derive(Debug, Clone)]
pub struct SeoMeta {
    pub title: String,
    pub description: String,
    pub canonical_url: String,
    /// Open Graph type: `website` for the home page, `article` elsewhere.
    pub og_type: &'static str,
    /// Already escaped for embedding in a script element.
    pub json_ld: Option<String>,
    /// Keep search engines off transactional pages.
    pub noindex: bool,
}

impl SeoMeta {
    #[must_use]
    pub fn new(canonical_url: String, title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            canonical_url,
            og_type: "article",
            json_ld: None,
            noindex: false,
        }
    }

    /// Metadata for a site path, with the canonical URL taken from config.
    #[must_use]
    pub fn for_path(config: &SiteConfig, path: &str, title: &str, description: &str) -> Self {
        Self::new(config.absolute_url(path), title, description)
    }

    #[must_use]
    pub const fn website(mut self) -> Self {
        self.og_type = "website";
        self
    }

    #[must_use]
    pub fn with_json_ld(mut self, value: &Value) -> Self {
        self.json_ld = Some(script_json(value));
        self
    }

    #[must_use]
    pub const fn noindex(mut self) -> Self {
        self.noindex = true;
        self
    }

    /// `<title>` text, suffixed with the practice name.
    #[must_use]
    pub fn full_title(&self) -> String {
        if self.title == PRACTICE_NAME {
            self.title.clone()
        } else {
            format!("{} | {PRACTICE_NAME}", self.title)
        }
    }
}

/// Serialise JSON for a `<script>` element.
///
/// `<`, `>` and `&` are written as unicode escapes so no string value can
/// close the element or open a comment. The result is still valid JSON.
#[must_use]
pub fn script_json(value: &Value) -> String {
    value
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

fn organization_id(base_url: &str) -> String {
    format!("{base_url}/#practice")
}

fn price(money: Money) -> String {
    format!("{:.2}", money.amount())
}

fn offer(base_url: &str, service: &Service) -> Value {
    json!({
        "@type": "Offer",
        "url": format!("{base_url}{}", service.path()),
        "price": price(service.price),
        "priceCurrency": "AUD",
        "availability": "https://schema.org/InStock",
        "itemOffered": {
            "@type": "Service",
            "name": service.name,
        },
    })
}

/// The practice and each in-person location, for the home page.
#[must_use]
pub fn practice_graph(base_url: &str, locations: &[PracticeLocation]) -> Value {
    let org_id = organization_id(base_url);
    let mut graph = vec![json!({
        "@type": "ProfessionalService",
        "@id": org_id,
        "name": PRACTICE_NAME,
        "url": format!("{base_url}/"),
        "email": PRACTICE_EMAIL,
        "telephone": PRACTICE_PHONE,
        "areaServed": "Tasmania",
        "priceRange": "$$",
    })];

    for location in locations.iter().filter(|l| !l.is_telehealth) {
        let mut business = json!({
            "@type": "LocalBusiness",
            "@id": format!("{base_url}/locations#{}", location.slug),
            "name": format!("{PRACTICE_NAME} - {}", location.name),
            "parentOrganization": { "@id": org_id },
            "address": {
                "@type": "PostalAddress",
                "streetAddress": location.address_line,
                "addressLocality": location.suburb,
                "addressRegion": location.state,
                "postalCode": location.postcode,
                "addressCountry": "AU",
            },
            "telephone": location.phone.as_deref().unwrap_or(PRACTICE_PHONE),
        });
        if let (Some((lat, lng)), Some(obj)) = (location.coordinates(), business.as_object_mut()) {
            obj.insert(
                "geo".to_string(),
                json!({ "@type": "GeoCoordinates", "latitude": lat, "longitude": lng }),
            );
        }
        graph.push(business);
    }

    json!({ "@context": "https://schema.org", "@graph": graph })
}

/// A single service with its offer.
#[must_use]
pub fn service_json_ld(base_url: &str, service: &Service) -> Value {
    json!({
        "@context": "https://schema.org",
        "@type": "Service",
        "name": service.name,
        "description": service.summary,
        "serviceType": "Counselling",
        "url": format!("{base_url}{}", service.path()),
        "provider": { "@id": organization_id(base_url) },
        "offers": offer(base_url, service),
    })
}

/// The fee schedule as an offer catalogue.
#[must_use]
pub fn offer_catalog(base_url: &str, services: &[Service]) -> Value {
    let offers: Vec<Value> = services.iter().map(|s| offer(base_url, s)).collect();
    json!({
        "@context": "https://schema.org",
        "@type": "OfferCatalog",
        "name": format!("{PRACTICE_NAME} fees"),
        "url": format!("{base_url}/fees"),
        "itemListElement": offers,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stillwaters_core::LocationId;

    use super::*;
    use crate::catalog;

    const BASE: &str = "https://stillwaters.test";

    fn location(slug: &str, telehealth: bool) -> PracticeLocation {
        PracticeLocation {
            id: LocationId::new(1),
            slug: slug.to_string(),
            name: "North Hobart".to_string(),
            address_line: "12 Elizabeth St".to_string(),
            suburb: "North Hobart".to_string(),
            state: "TAS".to_string(),
            postcode: "7000".to_string(),
            phone: None,
            latitude: Some(-42.87),
            longitude: Some(147.31),
            is_telehealth: telehealth,
            active: true,
        }
    }

    #[test]
    fn script_json_cannot_close_the_element() {
        let value = json!({ "name": "</script><script>alert(1)</script>" });
        let escaped = script_json(&value);
        assert!(!escaped.contains("</"));
        assert!(!escaped.contains('<'));
        let back: Value = serde_json::from_str(&escaped).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn practice_graph_lists_in_person_locations() {
        let graph = practice_graph(BASE, &[location("north-hobart", false), location("telehealth", true)]);
        let nodes = graph["@graph"].as_array().unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0]["@type"], "ProfessionalService");
        assert_eq!(nodes[1]["@type"], "LocalBusiness");
        assert_eq!(nodes[1]["address"]["postalCode"], "7000");
        assert_eq!(nodes[1]["geo"]["latitude"], -42.87);
    }

    #[test]
    fn service_offer_is_priced_in_aud() {
        let service = catalog::service("individual-counselling").unwrap();
        let value = service_json_ld(BASE, service);
        assert_eq!(value["@type"], "Service");
        assert_eq!(value["offers"]["price"], "180.00");
        assert_eq!(value["offers"]["priceCurrency"], "AUD");
    }

    #[test]
    fn offer_catalog_covers_every_service() {
        let value = offer_catalog(BASE, catalog::services());
        assert_eq!(
            value["itemListElement"].as_array().unwrap().len(),
            catalog::services().len()
        );
    }

    #[test]
    fn full_title_is_suffixed() {
        let meta = SeoMeta::new(format!("{BASE}/fees"), "Fees", "Session fees");
        assert_eq!(meta.full_title(), "Fees | Still Waters Counselling");
        let home = SeoMeta::new(format!("{BASE}/"), PRACTICE_NAME, "");
        assert_eq!(home.full_title(), PRACTICE_NAME);
    }
}
