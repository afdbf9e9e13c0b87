//! Deterministic demo payments for the runner and the test suite.
//!
//! Same seed = same payments, in the same order, with the same purchase keys.

use crate::{
    error::ListingResult,
    payment::{BuyerInfo, LineItem, NewPayment, PaymentMode, PaymentStatus},
    rng::FixtureRng,
    store::SqliteStore,
    types::{OwnerRef, RecordId, UserId},
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

const FIRST_NAMES: &[&str] = &[
    "James", "Maria", "Wei", "Amara", "Lucas", "Sofia", "Mateo", "Aisha", "Noah", "Yuki",
    "Elena", "Omar", "Hannah", "Ravi", "Chloe", "Diego", "Ingrid", "Kwame", "Lena", "Tomas",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Garcia", "Chen", "Okafor", "Muller", "Rossi", "Silva", "Khan", "Brown", "Tanaka",
    "Novak", "Haddad", "Walsh", "Patel", "Martin", "Lopez", "Berg", "Mensah", "Fischer", "Costa",
];

/// Items a demo cart can hold: (item id, name, list price in cents).
const CATALOG: &[(i64, &str, i64)] = &[
    (101, "Ebook: Practical Systems", 1900),
    (102, "Theme: Minimal Store", 4900),
    (103, "Plugin: Advanced Reports", 7900),
    (104, "Icon Pack", 900),
    (105, "Video Course: Async Basics", 12900),
    (106, "Support Add-on", 2500),
];

const GATEWAYS: &[&str] = &["paypal", "stripe", "manual"];

/// Relative frequency of each status in generated data:
/// completed, pending, refunded, failed, revoked.
const STATUS_WEIGHTS: [f64; 5] = [0.60, 0.15, 0.08, 0.10, 0.07];

/// Registered demo users get ids 1..=REGISTERED_USERS.
pub const REGISTERED_USERS: UserId = 20;

pub struct PaymentGenerator {
    rng: FixtureRng,
    seed: u64,
    start: NaiveDateTime,
    /// Probability a payment belongs to a guest rather than a registered user.
    guest_share: f64,
    test_mode_share: f64,
}

impl PaymentGenerator {
    pub fn new(seed: u64) -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            rng: FixtureRng::new(seed, 0).with_name("payments"),
            seed,
            start,
            guest_share: 0.4,
            test_mode_share: 0.05,
        }
    }

    /// First day of the window generated payments fall into (365 days long).
    pub fn starting_at(mut self, start: NaiveDateTime) -> Self {
        self.start = start;
        self
    }

    /// Generate `count` payments. Statuses follow STATUS_WEIGHTS.
    pub fn generate(&mut self, count: usize) -> Vec<NewPayment> {
        (0..count).map(|_| self.next_payment()).collect()
    }

    /// Generate `count` payments that all share one status.
    pub fn generate_with_status(&mut self, count: usize, status: PaymentStatus) -> Vec<NewPayment> {
        (0..count)
            .map(|_| NewPayment {
                status: status.clone(),
                ..self.next_payment()
            })
            .collect()
    }

    /// Display names of the registered demo users, stable for a seed.
    pub fn registered_users(&self) -> Vec<(UserId, String)> {
        let mut rng = FixtureRng::new(self.seed, 1).with_name("users");
        (1..=REGISTERED_USERS)
            .map(|id| {
                let first = rng.pick(FIRST_NAMES);
                let last = rng.pick(LAST_NAMES);
                (id, format!("{first} {last}"))
            })
            .collect()
    }

    fn next_payment(&mut self) -> NewPayment {
        let rng = &mut self.rng;

        let status = PaymentStatus::KNOWN[rng.weighted_index(&STATUS_WEIGHTS)].clone();
        let first_name = rng.pick(FIRST_NAMES).to_string();
        let last_name = rng.pick(LAST_NAMES).to_string();
        let email = format!(
            "{}.{}{}@example.com",
            first_name.to_lowercase(),
            last_name.to_lowercase(),
            rng.next_u64_below(100)
        );

        let owner = if rng.chance(self.guest_share) {
            OwnerRef::Guest(email.clone())
        } else {
            OwnerRef::User(1 + rng.next_u64_below(REGISTERED_USERS as u64) as UserId)
        };

        let item_count = 1 + rng.next_u64_below(3) as usize;
        let line_items: Vec<LineItem> = (0..item_count)
            .map(|_| {
                let (item_id, name, list_cents) = *rng.pick(CATALOG);
                let variant = rng.chance(0.3).then(|| 1 + rng.next_u64_below(3) as u32);
                // Variable-price options cost more than the base price.
                let cents = list_cents + i64::from(variant.unwrap_or(1) - 1) * 1000;
                LineItem {
                    item_id,
                    name: name.to_string(),
                    price_override: Some(Decimal::new(cents, 2)),
                    variant,
                }
            })
            .collect();
        let amount = line_items
            .iter()
            .filter_map(|item| item.price_override)
            .sum::<Decimal>();

        let minutes = rng.next_u64_below(365 * 24 * 60) as i64;
        let created_at = self.start + Duration::minutes(minutes);

        let mode = if rng.chance(self.test_mode_share) {
            PaymentMode::Test
        } else {
            PaymentMode::Live
        };
        let discount = rng.chance(0.1).then(|| "SPRING10".to_string());
        let gateway = Some(rng.pick(GATEWAYS).to_string());
        let purchase_key = uuid::Builder::from_random_bytes(rng.bytes16())
            .into_uuid()
            .simple()
            .to_string();

        NewPayment {
            status,
            mode,
            amount,
            created_at,
            owner,
            email,
            buyer: BuyerInfo {
                first_name,
                last_name,
                discount,
            },
            purchase_key,
            gateway,
            line_items,
        }
    }
}

/// Insert generated payments into `store`, returning their ids in order.
pub fn seed_store(store: &SqliteStore, payments: &[NewPayment]) -> ListingResult<Vec<RecordId>> {
    let ids = payments
        .iter()
        .map(|p| store.insert_payment(p))
        .collect::<ListingResult<Vec<_>>>()?;
    log::debug!("seeded {} payments", ids.len());
    Ok(ids)
}
