use tracing::warn;

use super::household::{
    Asset, AssetCategory, ContributionOverride, IncomeType, Liability, LiabilityType,
    PensionAgreement, Person, round_percent, sanitize,
};
use super::types::{BucketRates, ContributionStreams, ResolvedReturns, StartingBalances};

/// State income pension: 16 % of pension-qualifying income.
const STATE_PENSION_RATE: f64 = 0.16;
/// State premium pension: 2.5 % of the same capped base.
const PREMIUM_PENSION_RATE: f64 = 0.025;
/// Pension-qualifying income is capped at 8.07 income base amounts per year.
const PGI_CEILING_IBB: f64 = 8.07;
/// Occupational agreements switch to their higher rate above 7.5 IBB.
const OCCUPATIONAL_BREAKPOINT_IBB: f64 = 7.5;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContributionResolution {
    pub streams: ContributionStreams,
    pub warnings: Vec<String>,
}

/// Monthly (base rate, rate above the 7.5 IBB break-point) for the fixed
/// percentage-of-salary agreements. Custom and unrecognized agreements have
/// no schedule; they resolve through the person-supplied override.
fn agreement_schedule(agreement: PensionAgreement) -> Option<(f64, f64)> {
    match agreement {
        PensionAgreement::Itp1 => Some((0.045, 0.30)),
        // ITP2 is defined-benefit; only its ITPK premium part is modeled.
        PensionAgreement::Itp2 => Some((0.02, 0.02)),
        PensionAgreement::SafLo => Some((0.045, 0.30)),
        PensionAgreement::AkapKr => Some((0.06, 0.315)),
        PensionAgreement::Pa16 => Some((0.045, 0.30)),
        PensionAgreement::Custom | PensionAgreement::Unknown => None,
    }
}

fn override_amount(monthly_income: f64, contribution_override: Option<ContributionOverride>) -> f64 {
    match contribution_override {
        Some(ContributionOverride::Percentage { rate }) => {
            monthly_income * round_percent(rate).clamp(0.0, 100.0) / 100.0
        }
        Some(ContributionOverride::Amount { value }) => sanitize(value),
        None => 0.0,
    }
}

/// Derives the household's monthly contribution streams for the state,
/// occupational and premium pension buckets. The private (IPS) bucket is
/// never auto-derived. Invalid numbers clamp to zero; an unrecognized
/// agreement falls back to "custom, 0 %" with a warning.
pub fn resolve_contributions(persons: &[Person], income_base_amount: f64) -> ContributionResolution {
    let ibb = sanitize(income_base_amount);
    let pgi_cap_monthly = PGI_CEILING_IBB * ibb / 12.0;
    let breakpoint_monthly = OCCUPATIONAL_BREAKPOINT_IBB * ibb / 12.0;

    let mut streams = ContributionStreams::default();
    let mut warnings = Vec::new();

    for person in persons {
        for income in &person.incomes {
            if income.income_type != IncomeType::Job {
                continue;
            }

            let monthly = sanitize(income.monthly_income);
            let capped = monthly.min(pgi_cap_monthly);
            streams.state_monthly += STATE_PENSION_RATE * capped;
            streams.premium_monthly += PREMIUM_PENSION_RATE * capped;

            let occupational = match agreement_schedule(income.pension_type) {
                Some((base_rate, high_rate)) => {
                    base_rate * monthly.min(breakpoint_monthly)
                        + high_rate * (monthly - breakpoint_monthly).max(0.0)
                }
                None => {
                    if income.pension_type == PensionAgreement::Unknown {
                        let message = format!(
                            "Unknown pension agreement on income {:?} for {:?}; assuming 0 % occupational contribution.",
                            income.label, person.name
                        );
                        warn!("{message}");
                        warnings.push(message);
                    }
                    override_amount(monthly, income.contribution_override)
                }
            };
            streams.occupational_monthly +=
                occupational + sanitize(income.salary_exchange_monthly);
        }
    }

    ContributionResolution { streams, warnings }
}

/// Net monthly household income through the caller-supplied tax function.
/// The tax function is opaque: monotonic, deterministic, 0 <= net <= gross.
pub fn net_household_income(persons: &[Person], tax: impl Fn(f64) -> f64) -> f64 {
    persons
        .iter()
        .flat_map(|p| &p.incomes)
        .map(|income| sanitize(tax(sanitize(income.monthly_income))))
        .sum()
}

/// Total monthly amortization across liabilities. Amortization is forced
/// saving, so it counts toward the household's savings stream.
pub fn monthly_amortization(liabilities: &[Liability]) -> f64 {
    liabilities
        .iter()
        .map(|l| sanitize(l.principal) * l.amortization_rate_apy.clamp(0.0, 1.0) / 12.0)
        .sum()
}

pub fn monthly_other_savings(persons: &[Person]) -> f64 {
    persons.iter().map(|p| sanitize(p.other_savings_monthly)).sum()
}

fn clamp_apy(apy: f64) -> f64 {
    if apy.is_finite() { apy.clamp(-1.0, 1.0) } else { 0.0 }
}

/// Value-weighted mean APY over (value, apy) components; `None` when the
/// components carry no weight.
fn weighted_apy(components: &[(f64, f64)]) -> Option<f64> {
    let total: f64 = components.iter().map(|(value, _)| value).sum();
    if total <= 0.0 {
        return None;
    }
    Some(
        components
            .iter()
            .map(|(value, apy)| value * apy)
            .sum::<f64>()
            / total,
    )
}

fn pension_bucket_apy(assets: &[Asset], category: AssetCategory, fallback: f64) -> f64 {
    let components: Vec<(f64, f64)> = assets
        .iter()
        .filter(|a| a.category == category)
        .map(|a| (sanitize(a.value), clamp_apy(a.expected_apy)))
        .collect();
    weighted_apy(&components).unwrap_or(fallback)
}

fn liability_total(liabilities: &[Liability], liability_type: LiabilityType) -> f64 {
    liabilities
        .iter()
        .filter(|l| l.liability_type == liability_type)
        .map(|l| sanitize(l.principal))
        .sum()
}

/// The liability type whose debt nets against a non-pension asset category.
fn attributed_liability_type(category: AssetCategory) -> LiabilityType {
    if category.is_housing() {
        LiabilityType::Housing
    } else if matches!(category, AssetCategory::Car | AssetCategory::OtherVehicles) {
        LiabilityType::Car
    } else {
        LiabilityType::Other
    }
}

/// Netted, counted (value, apy) components of available capital: each
/// non-pension asset nets its group's liabilities pro rata, and housing
/// counts at 40 % of its net value because it cannot be liquidated
/// piecemeal.
fn available_components(assets: &[Asset], liabilities: &[Liability]) -> Vec<(f64, f64)> {
    let mut group_values = [0.0_f64; 3];
    for asset in assets.iter().filter(|a| !a.category.is_pension()) {
        group_values[attributed_liability_type(asset.category) as usize] +=
            sanitize(asset.value);
    }

    let mut components = Vec::new();
    for asset in assets.iter().filter(|a| !a.category.is_pension()) {
        let value = sanitize(asset.value);
        let liability_type = attributed_liability_type(asset.category);
        let group_value = group_values[liability_type as usize];
        let debt = liability_total(liabilities, liability_type);
        let net = if group_value > 0.0 {
            (value - debt * value / group_value).max(0.0)
        } else {
            0.0
        };
        let counted = if asset.category.is_housing() { net * 0.4 } else { net };
        components.push((counted, clamp_apy(asset.expected_apy)));
    }
    components
}

/// Available capital for projection purposes: the sum of the netted,
/// counted component values used by the return blend.
pub fn available_capital(assets: &[Asset], liabilities: &[Liability]) -> f64 {
    available_components(assets, liabilities)
        .iter()
        .map(|(value, _)| value)
        .sum()
}

fn category_total(assets: &[Asset], category: AssetCategory) -> f64 {
    assets
        .iter()
        .filter(|a| a.category == category)
        .map(|a| sanitize(a.value))
        .sum()
}

/// Splits the asset snapshot into the five projection buckets: netted,
/// counted available capital plus the four pension-bucket totals.
pub fn starting_balances(assets: &[Asset], liabilities: &[Liability]) -> StartingBalances {
    StartingBalances {
        available: available_capital(assets, liabilities),
        occ_pension: category_total(assets, AssetCategory::OccupationalPension),
        premie_pension: category_total(assets, AssetCategory::PremiumPension),
        private_pension: category_total(assets, AssetCategory::PrivatePension),
        state_pension: category_total(assets, AssetCategory::StatePension),
    }
}

/// Blended nominal and real growth rates per capital bucket. Real rates are
/// nominal minus inflation, simple subtraction, consistently for every
/// bucket.
pub fn resolve_returns(
    assets: &[Asset],
    liabilities: &[Liability],
    inflation: f64,
    default_equity_return: f64,
    default_fixed_return: f64,
) -> ResolvedReturns {
    let equity = clamp_apy(default_equity_return);
    let fixed = clamp_apy(default_fixed_return);

    let nominal = BucketRates {
        available: weighted_apy(&available_components(assets, liabilities)).unwrap_or(fixed),
        occ_pension: pension_bucket_apy(assets, AssetCategory::OccupationalPension, equity),
        premie_pension: pension_bucket_apy(assets, AssetCategory::PremiumPension, equity),
        private_pension: pension_bucket_apy(assets, AssetCategory::PrivatePension, equity),
        // The state income pension follows the income index, not markets.
        state_pension: pension_bucket_apy(assets, AssetCategory::StatePension, fixed),
    };

    let inflation = if inflation.is_finite() { inflation } else { 0.0 };
    let real = BucketRates {
        available: nominal.available - inflation,
        occ_pension: nominal.occ_pension - inflation,
        premie_pension: nominal.premie_pension - inflation,
        private_pension: nominal.private_pension - inflation,
        state_pension: nominal.state_pension - inflation,
    };

    ResolvedReturns { nominal, real }
}
