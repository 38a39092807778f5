//! The practice's service catalogue, fee schedule and testimonials.
//!
//! Fixed data compiled into the binary. Changing a fee is a code change and a
//! deploy; bookings keep the snapshot they were made with.

use std::sync::LazyLock;

use serde::Serialize;

use stillwaters_core::{Money, ServiceSnapshot, ValidationErrors};

/// Practice name used in titles and structured data.
pub const PRACTICE_NAME: &str = "Still Waters Counselling";
pub const PRACTICE_EMAIL: &str = "hello@stillwaterscounselling.com.au";
pub const PRACTICE_PHONE: &str = "03 6111 2040";
pub const PRACTITIONER: &str = "Dr Miriam Hale";

/// A service offered by the practice.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub slug: &'static str,
    pub name: &'static str,
    pub summary: &'static str,
    #[serde(skip)]
    pub description: &'static [&'static str],
    /// Session length in minutes.
    pub duration: i32,
    pub price: Money,
    pub rebate: Option<Money>,
    pub telehealth: bool,
}

impl Service {
    /// What the client pays after any Medicare rebate.
    #[must_use]
    pub fn gap(&self) -> Money {
        Money::out_of_pocket(self.price, self.rebate)
    }

    /// The snapshot stored with a booking.
    #[must_use]
    pub fn snapshot(&self) -> ServiceSnapshot {
        ServiceSnapshot {
            id: self.slug.to_string(),
            name: self.name.to_string(),
            duration: self.duration,
            price: self.price,
            rebate: self.rebate,
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        format!("/services/{}", self.slug)
    }
}

/// A short client testimonial, published with consent.
#[derive(Debug, Clone, Serialize)]
pub struct Testimonial {
    pub quote: &'static str,
    pub attribution: &'static str,
}

static SERVICES: LazyLock<Vec<Service>> = LazyLock::new(|| {
    vec![
        Service {
            slug: "individual-counselling",
            name: "Individual Counselling",
            summary: "One-to-one sessions for anxiety, low mood, grief, stress and life transitions.",
            description: &[
                "Individual sessions are a confidential space to talk through what is weighing on you \
                 and to build practical ways of coping.",
                "Sessions draw on CBT, ACT and person-centred approaches, adapted to what you want to change.",
                "With a GP referral and Mental Health Care Plan you can claim a Medicare rebate for up to \
                 ten sessions a calendar year.",
            ],
            duration: 50,
            price: Money::from_cents(18_000),
            rebate: Some(Money::from_cents(9_880)),
            telehealth: false,
        },
        Service {
            slug: "extended-session",
            name: "Extended Individual Session",
            summary: "A longer session for first appointments or complex situations.",
            description: &[
                "An 80 minute session gives room for a thorough first assessment or for work that \
                 benefits from more time.",
                "Extended sessions attract the same Medicare rebate as a standard session when you \
                 hold a Mental Health Care Plan.",
            ],
            duration: 80,
            price: Money::from_cents(26_000),
            rebate: Some(Money::from_cents(9_880)),
            telehealth: false,
        },
        Service {
            slug: "couples-counselling",
            name: "Couples Counselling",
            summary: "Support for partners working through conflict, distance or change together.",
            description: &[
                "Couples sessions help partners understand recurring patterns, communicate under \
                 pressure and rebuild trust.",
                "Medicare does not rebate couples counselling; some private health funds do.",
            ],
            duration: 80,
            price: Money::from_cents(24_000),
            rebate: None,
            telehealth: false,
        },
        Service {
            slug: "telehealth",
            name: "Telehealth Session",
            summary: "Secure video sessions from home, anywhere in Australia.",
            description: &[
                "Telehealth sessions run over a secure video link and suit clients outside Hobart or \
                 with limited time to travel.",
                "Medicare rebates apply to telehealth sessions under a Mental Health Care Plan.",
            ],
            duration: 50,
            price: Money::from_cents(18_000),
            rebate: Some(Money::from_cents(9_880)),
            telehealth: true,
        },
        Service {
            slug: "discovery-call",
            name: "Free Discovery Call",
            summary: "A 15 minute phone call to see whether we are a good fit.",
            description: &[
                "Not sure where to start? A short call lets you ask questions about how sessions work \
                 before committing to a booking.",
            ],
            duration: 15,
            price: Money::ZERO,
            rebate: None,
            telehealth: true,
        },
    ]
});

const TESTIMONIALS: &[Testimonial] = &[
    Testimonial {
        quote: "I came in not knowing how to explain what was wrong. I left each session with \
                something I could actually use that week.",
        attribution: "Client, 2025",
    },
    Testimonial {
        quote: "Telehealth made it possible for me to keep going when I moved to the north-west coast.",
        attribution: "Client, Burnie",
    },
    Testimonial {
        quote: "We stopped having the same argument. That alone was worth it.",
        attribution: "Couples clients, Sandy Bay",
    },
];

/// Every service, in display order.
#[must_use]
pub fn services() -> &'static [Service] {
    &SERVICES
}

/// Look up a service by slug.
#[must_use]
pub fn service(slug: &str) -> Option<&'static Service> {
    SERVICES.iter().find(|s| s.slug == slug)
}

/// Check a client-supplied snapshot against the fee schedule.
///
/// The snapshot must name a service on offer and carry its current name,
/// duration and fees.
pub fn check_snapshot(snapshot: &ServiceSnapshot, errors: &mut ValidationErrors) {
    let Some(service) = service(&snapshot.id) else {
        errors.push("service.id", "is not a service we offer");
        return;
    };
    if snapshot.name != service.name {
        errors.push("service.name", "does not match the fee schedule");
    }
    if snapshot.duration != service.duration {
        errors.push("service.duration", "does not match the fee schedule");
    }
    if snapshot.price != service.price {
        errors.push("service.price", "does not match the fee schedule");
    }
    if snapshot.rebate != service.rebate {
        errors.push("service.rebate", "does not match the fee schedule");
    }
}

/// Published testimonials.
#[must_use]
pub const fn testimonials() -> &'static [Testimonial] {
    TESTIMONIALS
}
