use serde::Serialize;

/// Engine parameters, passed explicitly on every call. Rates are decimals
/// (0.02 = 2 %), ages are whole years.
#[derive(Debug, Clone)]
pub struct Assumptions {
    pub current_year: i32,
    pub income_base_amount: f64,
    pub inflation: f64,
    pub default_equity_return: f64,
    pub default_fixed_return: f64,
    pub withdrawal_rate: f64,
    pub pension_start_age: u32,
    pub occupational_access_age: u32,
    pub private_access_age: u32,
    pub state_pension_payout_years: u32,
    pub terminal_age: u32,
    pub max_horizon_years: u32,
    pub max_additional_years: u32,
    pub coast: Option<CoastContributions>,
}

/// Coast-FIRE mode: contributions continue at `factor` of their working-age
/// level for `years` years after the FIRE age before stopping.
#[derive(Debug, Clone, Copy)]
pub struct CoastContributions {
    pub factor: f64,
    pub years: u32,
}

/// One value per capital bucket. Used both for starting balances and for
/// per-bucket growth rates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketRates {
    pub available: f64,
    pub occ_pension: f64,
    pub premie_pension: f64,
    pub private_pension: f64,
    pub state_pension: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartingBalances {
    pub available: f64,
    pub occ_pension: f64,
    pub premie_pension: f64,
    pub private_pension: f64,
    pub state_pension: f64,
}

/// Monthly household contribution totals per pension bucket, as produced by
/// the contribution resolver. The private (IPS) bucket is deliberately
/// absent: it is funded only through directly entered assets and
/// `other_savings_monthly`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionStreams {
    pub state_monthly: f64,
    pub occupational_monthly: f64,
    pub premium_monthly: f64,
}

/// Nominal and real (nominal minus inflation, simple subtraction) growth
/// rates per bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedReturns {
    pub nominal: BucketRates,
    pub real: BucketRates,
}

/// Everything the estimator and validator need about the household at the
/// moment of invocation. Owned snapshot; the engine never mutates it.
#[derive(Debug, Clone)]
pub struct FireSnapshot {
    pub current_age: u32,
    pub balances: StartingBalances,
    pub contributions: ContributionStreams,
    pub monthly_savings: f64,
    pub target_monthly_expenses: f64,
    pub returns: BucketRates,
}

/// Inputs for one simulator run.
#[derive(Debug, Clone)]
pub struct SimulationSpec {
    pub current_age: u32,
    pub fire_age: u32,
    pub start: StartingBalances,
    pub contributions: ContributionStreams,
    pub monthly_savings: f64,
    pub returns: BucketRates,
    pub annual_expenses: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrajectoryPoint {
    pub age: u32,
    pub available: f64,
    pub occ_pension: f64,
    pub premie_pension: f64,
    pub private_pension: f64,
    pub state_pension: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FireResult {
    pub is_achievable: bool,
    pub years_to_fire: u32,
    pub estimated_age: u32,
    pub portfolio_at_fire: f64,
    pub required_at_pension: f64,
    pub available_at_start: f64,
    pub state_pension_at_start: f64,
    pub state_pension_annual_income: f64,
    pub state_pension_payout_years: u32,
    pub warnings: Vec<String>,
}

impl FireResult {
    pub fn not_achievable(snapshot_available: f64, state_pension: f64, warning: String) -> Self {
        Self {
            is_achievable: false,
            years_to_fire: 0,
            estimated_age: 0,
            portfolio_at_fire: 0.0,
            required_at_pension: 0.0,
            available_at_start: snapshot_available,
            state_pension_at_start: state_pension,
            state_pension_annual_income: 0.0,
            state_pension_payout_years: 0,
            warnings: vec![warning],
        }
    }
}
