//! Billing: Medicaid/Medicare claims and the revenue summary.

use serde::{Deserialize, Serialize};

use crate::error::FixtureResult;
use crate::overrides::{apply_overrides, Overrides};
use crate::params::{filter_and_slice, ItemResponse, ListParams, ListResponse};
use crate::seed;

pub const CLAIM_POPULATION: usize = 60;

const DENIAL_REASONS: &[&str] = &[
    "CO-16 Missing information",
    "CO-97 Service included in another service",
    "CO-29 Time limit for filing expired",
    "PR-204 Service not covered",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Draft,
    Submitted,
    Pending,
    Paid,
    Denied,
}

impl ClaimStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Draft => "draft",
            ClaimStatus::Submitted => "submitted",
            ClaimStatus::Pending => "pending",
            ClaimStatus::Paid => "paid",
            ClaimStatus::Denied => "denied",
        }
    }
}

const STATUSES: &[ClaimStatus] = &[
    ClaimStatus::Draft,
    ClaimStatus::Submitted,
    ClaimStatus::Pending,
    ClaimStatus::Paid,
    ClaimStatus::Paid,
    ClaimStatus::Paid,
    ClaimStatus::Denied,
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Claim {
    pub id: String,
    pub claim_number: String,
    pub patient_id: String,
    pub patient_name: String,
    pub payer: String,
    pub service_code: String,
    pub service_date_from: String,
    pub service_date_to: String,
    pub units: u32,
    pub rate: f64,
    pub amount: f64,
    pub paid_amount: f64,
    pub status: ClaimStatus,
    pub submitted_date: String,
    pub denial_reason: String,
}

fn build_claim(status: ClaimStatus) -> Claim {
    let from = seed::date_offset(-90, -7);
    let to = from + chrono::Duration::days(6);
    let units = seed::int_between(4, 120);
    let rate = seed::money_between(4.5, 7.5);
    let amount = seed::round_cents(f64::from(units) * rate);
    Claim {
        id: seed::id("clm"),
        claim_number: format!("CLM-{}", seed::int_between(100_000, 999_999)),
        patient_id: seed::id("pat"),
        patient_name: format!("{} {}", seed::first_name(), seed::last_name()),
        payer: seed::pick(seed::PAYERS).to_string(),
        service_code: seed::pick(seed::SERVICE_CODES).to_string(),
        service_date_from: seed::date_string(from),
        service_date_to: seed::date_string(to),
        units,
        rate,
        amount,
        paid_amount: if status == ClaimStatus::Paid { amount } else { 0.0 },
        status,
        submitted_date: if status == ClaimStatus::Draft {
            String::new()
        } else {
            seed::date_string(to + chrono::Duration::days(i64::from(seed::int_between(1, 5))))
        },
        denial_reason: if status == ClaimStatus::Denied {
            seed::pick(DENIAL_REASONS).to_string()
        } else {
            String::new()
        },
    }
}

pub fn generate_claim() -> Claim {
    build_claim(seed::pick(STATUSES))
}

pub fn generate_claim_with(overrides: &Overrides) -> FixtureResult<Claim> {
    apply_overrides(generate_claim(), overrides)
}

pub fn generate_claims(count: usize) -> Vec<Claim> {
    (0..count).map(|_| generate_claim()).collect()
}

pub fn get_claims_response(params: &ListParams) -> ListResponse<Claim> {
    filter_and_slice(generate_claims(CLAIM_POPULATION), params, |c| {
        params.status_matches(c.status.as_str())
            && params.extra_matches("payer", &c.payer)
            && params.search_matches(&[&c.claim_number, &c.patient_name])
            && chrono::NaiveDate::parse_from_str(&c.service_date_from, "%Y-%m-%d")
                .map_or(true, |d| params.date_in_range(d))
    })
}

/// Response to `POST /billing/claims/:id/submit`.
pub fn submit_claim_response(id: &str) -> ItemResponse<Claim> {
    let mut claim = build_claim(ClaimStatus::Submitted);
    claim.id = id.to_string();
    claim.submitted_date = seed::date_string(seed::today());
    ItemResponse::new(claim)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSummary {
    pub total_billed: f64,
    pub total_paid: f64,
    pub total_pending: f64,
    pub total_denied: f64,
    pub claim_count: usize,
    pub denial_rate: f64,
}

/// `GET /billing/summary` returns a bare object, computed from one population.
pub fn get_billing_summary_response() -> BillingSummary {
    let claims = generate_claims(CLAIM_POPULATION);
    let sum = |keep: &dyn Fn(&Claim) -> bool| {
        seed::round_cents(claims.iter().filter(|c| keep(c)).map(|c| c.amount).sum())
    };
    let denied = claims.iter().filter(|c| c.status == ClaimStatus::Denied).count();
    BillingSummary {
        total_billed: sum(&|_| true),
        total_paid: seed::round_cents(claims.iter().map(|c| c.paid_amount).sum()),
        total_pending: sum(&|c| matches!(c.status, ClaimStatus::Submitted | ClaimStatus::Pending)),
        total_denied: sum(&|c| c.status == ClaimStatus::Denied),
        claim_count: claims.len(),
        denial_rate: seed::round_cents(denied as f64 / claims.len().max(1) as f64 * 100.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_is_units_times_rate() {
        for claim in generate_claims(100) {
            assert_eq!(claim.amount, seed::round_cents(f64::from(claim.units) * claim.rate));
            assert_eq!(claim.paid_amount > 0.0, claim.status == ClaimStatus::Paid);
            assert_eq!(claim.denial_reason.is_empty(), claim.status != ClaimStatus::Denied);
        }
    }

    #[test]
    fn test_status_filter() {
        let response = get_claims_response(&ListParams::new().with_status("denied"));
        assert!(response.data.iter().all(|c| c.status == ClaimStatus::Denied));
    }

    #[test]
    fn test_summary_totals() {
        let summary = get_billing_summary_response();
        assert_eq!(summary.claim_count, CLAIM_POPULATION);
        assert!(summary.total_paid <= summary.total_billed + 0.01);
    }
}
