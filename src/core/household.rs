use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HouseholdError {
    #[error("unknown asset category: {0:?}")]
    UnknownAssetCategory(String),
}

/// Clamp boundary numbers: negative, NaN and infinite inputs become 0.
pub(crate) fn sanitize(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// User-entered percentages are stored with one decimal so that stored and
/// displayed values never drift apart.
pub fn round_percent(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 10.0).round() / 10.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IncomeType {
    Job,
    #[serde(alias = "misc")]
    Other,
}

/// Occupational pension agreements. Deserializing an unrecognized agreement
/// lands on `Unknown`, which the contribution resolver treats as the
/// "custom, 0 %" fallback with a warning instead of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PensionAgreement {
    Itp1,
    Itp2,
    #[serde(alias = "saf-lo", alias = "saflo")]
    SafLo,
    #[serde(alias = "akap-kr", alias = "akap")]
    AkapKr,
    #[serde(alias = "pa-16")]
    Pa16,
    Custom,
    #[serde(other)]
    Unknown,
}

/// Custom occupational contribution, either a percentage of salary or a
/// fixed monthly amount. A tagged union so that "both set" is
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ContributionOverride {
    Percentage { rate: f64 },
    Amount { value: f64 },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Income {
    pub label: String,
    pub income_type: IncomeType,
    pub monthly_income: f64,
    pub pension_type: PensionAgreement,
    pub contribution_override: Option<ContributionOverride>,
    pub salary_exchange_monthly: f64,
}

impl Default for Income {
    fn default() -> Self {
        Self {
            label: String::new(),
            income_type: IncomeType::Job,
            monthly_income: 0.0,
            pension_type: PensionAgreement::Unknown,
            contribution_override: None,
            salary_exchange_monthly: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Person {
    pub name: String,
    pub birth_year: i32,
    pub incomes: Vec<Income>,
    pub other_savings_monthly: f64,
}

impl Person {
    pub fn age(&self, current_year: i32) -> u32 {
        (current_year - self.birth_year).max(0) as u32
    }
}

/// Canonical asset categories. Deprecated aliases from older records are
/// mapped here, once, at the ingestion boundary; consumers only ever see
/// the canonical variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", rename_all = "camelCase")]
pub enum AssetCategory {
    Housing,
    VacationHousing,
    Car,
    FundsStocks,
    SavingsCash,
    StatePension,
    OccupationalPension,
    PremiumPension,
    PrivatePension,
    Land,
    Machinery,
    OtherVehicles,
    PreciousMetals,
    Other,
}

impl AssetCategory {
    pub fn parse(raw: &str) -> Result<Self, HouseholdError> {
        let category = match raw.trim() {
            "housing" => Self::Housing,
            "vacationHousing" | "summerHouse" => Self::VacationHousing,
            "car" => Self::Car,
            "fundsStocks" | "fundsAndStocks" | "stocks" => Self::FundsStocks,
            "savingsCash" | "savingsAndCash" | "savings" | "cash" => Self::SavingsCash,
            "statePension" => Self::StatePension,
            // "marketPension" was the umbrella category before the three
            // pension pillars were split; occupational is its successor.
            "occupationalPension" | "marketPension" | "pension" => Self::OccupationalPension,
            "premiumPension" | "premiePension" => Self::PremiumPension,
            "privatePension" | "ips" => Self::PrivatePension,
            "land" => Self::Land,
            "machinery" => Self::Machinery,
            "otherVehicles" | "boat" => Self::OtherVehicles,
            "preciousMetals" => Self::PreciousMetals,
            "other" => Self::Other,
            other => return Err(HouseholdError::UnknownAssetCategory(other.to_string())),
        };
        Ok(category)
    }

    pub fn is_pension(self) -> bool {
        matches!(
            self,
            Self::StatePension | Self::OccupationalPension | Self::PremiumPension | Self::PrivatePension
        )
    }

    pub fn is_housing(self) -> bool {
        matches!(self, Self::Housing | Self::VacationHousing)
    }
}

impl TryFrom<String> for AssetCategory {
    type Error = HouseholdError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub category: AssetCategory,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: f64,
    /// Expected annual growth as a decimal in −1..1.
    #[serde(default)]
    pub expected_apy: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LiabilityType {
    Housing,
    Car,
    Other,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Liability {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub principal: f64,
    /// Annual amortization as a decimal in 0..1.
    #[serde(default)]
    pub amortization_rate_apy: f64,
    pub liability_type: LiabilityType,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Household {
    pub persons: Vec<Person>,
    pub assets: Vec<Asset>,
    pub liabilities: Vec<Liability>,
}

pub fn net_worth(assets: &[Asset], liabilities: &[Liability]) -> f64 {
    let asset_total: f64 = assets.iter().map(|a| sanitize(a.value)).sum();
    let debt_total: f64 = liabilities.iter().map(|l| sanitize(l.principal)).sum();
    asset_total - debt_total
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WealthLevel {
    pub level: u32,
    pub name: &'static str,
    pub range_start: Option<f64>,
    pub range_end: Option<f64>,
}

/// The wealth ladder, in SEK. Each step covers (start, end]; the first and
/// last steps are unbounded below and above.
const WEALTH_LEVELS: [(u32, &str, Option<f64>, Option<f64>); 8] = [
    (1, "In debt", None, Some(0.0)),
    (2, "Starting out", Some(0.0), Some(100_000.0)),
    (3, "Buffer", Some(100_000.0), Some(500_000.0)),
    (4, "Stability", Some(500_000.0), Some(1_000_000.0)),
    (5, "Security", Some(1_000_000.0), Some(3_000_000.0)),
    (6, "Flexibility", Some(3_000_000.0), Some(10_000_000.0)),
    (7, "Independence", Some(10_000_000.0), Some(30_000_000.0)),
    (8, "Abundance", Some(30_000_000.0), None),
];

pub fn current_level(net_worth: f64) -> WealthLevel {
    let net_worth = if net_worth.is_finite() { net_worth } else { 0.0 };
    let (level, name, range_start, range_end) = WEALTH_LEVELS
        .iter()
        .find(|(_, _, _, end)| end.map(|e| net_worth <= e).unwrap_or(true))
        .copied()
        .unwrap_or(WEALTH_LEVELS[0]);
    WealthLevel {
        level,
        name,
        range_start,
        range_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{any, prop_assert, proptest};

    fn asset(category: AssetCategory, value: f64) -> Asset {
        Asset {
            category,
            label: String::new(),
            value,
            expected_apy: 0.0,
        }
    }

    fn liability(liability_type: LiabilityType, principal: f64) -> Liability {
        Liability {
            label: String::new(),
            principal,
            amortization_rate_apy: 0.0,
            liability_type,
        }
    }

    #[test]
    fn net_worth_is_assets_minus_liabilities() {
        let assets = vec![
            asset(AssetCategory::Housing, 3_000_000.0),
            asset(AssetCategory::FundsStocks, 500_000.0),
        ];
        let liabilities = vec![liability(LiabilityType::Housing, 2_000_000.0)];
        assert_eq!(net_worth(&assets, &liabilities), 1_500_000.0);
    }

    #[test]
    fn net_worth_clamps_invalid_values_to_zero() {
        let assets = vec![
            asset(AssetCategory::Other, f64::NAN),
            asset(AssetCategory::Other, -50_000.0),
            asset(AssetCategory::SavingsCash, 10_000.0),
        ];
        let liabilities = vec![liability(LiabilityType::Other, f64::INFINITY)];
        assert_eq!(net_worth(&assets, &liabilities), 10_000.0);
    }

    #[test]
    fn net_worth_of_empty_household_is_zero() {
        assert_eq!(net_worth(&[], &[]), 0.0);
        assert_eq!(current_level(0.0).level, 1);
    }

    #[test]
    fn level_lookup_covers_boundaries() {
        assert_eq!(current_level(-1_000_000.0).level, 1);
        assert_eq!(current_level(0.0).level, 1);
        assert_eq!(current_level(0.01).level, 2);
        assert_eq!(current_level(100_000.0).level, 2);
        assert_eq!(current_level(100_000.01).level, 3);
        assert_eq!(current_level(2_999_999.0).level, 5);
        assert_eq!(current_level(50_000_000.0).level, 8);
    }

    #[test]
    fn top_level_has_open_upper_range() {
        let level = current_level(100_000_000.0);
        assert_eq!(level.level, 8);
        assert_eq!(level.range_end, None);
        assert_eq!(level.range_start, Some(30_000_000.0));
    }

    #[test]
    fn legacy_category_aliases_map_to_canonical_variants() {
        assert_eq!(
            AssetCategory::parse("marketPension"),
            Ok(AssetCategory::OccupationalPension)
        );
        assert_eq!(
            AssetCategory::parse("pension"),
            Ok(AssetCategory::OccupationalPension)
        );
        assert_eq!(
            AssetCategory::parse("fundsAndStocks"),
            Ok(AssetCategory::FundsStocks)
        );
        assert_eq!(
            AssetCategory::parse("premiePension"),
            Ok(AssetCategory::PremiumPension)
        );
        assert_eq!(AssetCategory::parse("ips"), Ok(AssetCategory::PrivatePension));
    }

    #[test]
    fn unknown_category_is_a_typed_error() {
        let err = AssetCategory::parse("cryptoZoo").expect_err("must reject");
        assert_eq!(
            err,
            HouseholdError::UnknownAssetCategory("cryptoZoo".to_string())
        );
    }

    #[test]
    fn category_deserialization_applies_alias_mapping() {
        let parsed: AssetCategory =
            serde_json::from_str("\"marketPension\"").expect("alias should deserialize");
        assert_eq!(parsed, AssetCategory::OccupationalPension);

        let err = serde_json::from_str::<AssetCategory>("\"nonsense\"");
        assert!(err.is_err());
    }

    #[test]
    fn unknown_pension_agreement_deserializes_to_fallback() {
        let parsed: PensionAgreement =
            serde_json::from_str("\"kap-kl\"").expect("unknown agreements must not fail");
        assert_eq!(parsed, PensionAgreement::Unknown);
    }

    #[test]
    fn contribution_override_is_a_tagged_union() {
        let pct: ContributionOverride =
            serde_json::from_str(r#"{"mode":"percentage","rate":4.5}"#).expect("percentage");
        assert_eq!(pct, ContributionOverride::Percentage { rate: 4.5 });

        let amount: ContributionOverride =
            serde_json::from_str(r#"{"mode":"amount","value":2500}"#).expect("amount");
        assert_eq!(amount, ContributionOverride::Amount { value: 2500.0 });

        assert!(serde_json::from_str::<ContributionOverride>(r#"{"rate":4.5}"#).is_err());
    }

    #[test]
    fn round_percent_keeps_one_decimal() {
        assert_eq!(round_percent(4.55), 4.6);
        assert_eq!(round_percent(4.54), 4.5);
        assert_eq!(round_percent(-0.04), -0.0);
        assert_eq!(round_percent(f64::NAN), 0.0);
    }

    #[test]
    fn person_age_is_relative_to_current_year() {
        let person = Person {
            birth_year: 1990,
            ..Person::default()
        };
        assert_eq!(person.age(2026), 36);
        assert_eq!(person.age(1980), 0);
    }

    proptest! {
        #[test]
        fn prop_net_worth_is_order_independent(values in proptest::collection::vec(any::<u32>(), 0..12)) {
            let assets: Vec<Asset> = values
                .iter()
                .map(|v| asset(AssetCategory::Other, *v as f64))
                .collect();
            let mut reversed = assets.clone();
            reversed.reverse();

            let forward = net_worth(&assets, &[]);
            let backward = net_worth(&reversed, &[]);
            prop_assert!((forward - backward).abs() < 1e-9);
        }
    }
}
