use chrono::NaiveDate;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub nights: i64,
    pub effective_nightly_rate: f64,
    pub original_total: f64,
    pub discount_amount: f64,
    pub total_price: f64,
}

/// Number of nights billed for a stay. Same-day and inverted ranges clamp
/// to a single night: the absolute day difference is taken first, then the
/// minimum of 1 is applied. Order creation rejects inverted ranges before
/// anything is persisted, so the clamp only ever affects display math.
pub fn nights_between(check_in: NaiveDate, check_out: NaiveDate) -> i64 {
    (check_out - check_in).num_days().abs().max(1)
}

/// The rate all totals are computed from: the offer price when one is set
/// and strictly below the standard price, the standard price otherwise.
pub fn effective_nightly_rate(price_per_night: f64, offer_price: Option<f64>) -> f64 {
    match offer_price {
        Some(offer) if offer < price_per_night => offer,
        _ => price_per_night,
    }
}

pub fn quote(
    price_per_night: f64,
    offer_price: Option<f64>,
    check_in: NaiveDate,
    check_out: NaiveDate,
) -> Quote {
    let nights = nights_between(check_in, check_out);
    let rate = effective_nightly_rate(price_per_night, offer_price);
    let original_total = price_per_night * nights as f64;
    let total_price = rate * nights as f64;

    Quote {
        nights,
        effective_nightly_rate: rate,
        original_total,
        discount_amount: original_total - total_price,
        total_price,
    }
}

/// Percent saved by an effective offer, rounded. None when the offer is
/// absent or not below the standard price.
pub fn discount_percentage(price_per_night: f64, offer_price: Option<f64>) -> Option<i64> {
    match offer_price {
        Some(offer) if offer < price_per_night && price_per_night > 0.0 => {
            Some(((price_per_night - offer) / price_per_night * 100.0).round() as i64)
        }
        _ => None,
    }
}
