mod engine;
mod household;
mod resolve;
mod solver;
mod types;

pub use engine::{estimate_fire, simulate_portfolio};
pub use household::{
    Asset, AssetCategory, ContributionOverride, Household, HouseholdError, Income, IncomeType,
    Liability, LiabilityType, PensionAgreement, Person, WealthLevel, current_level, net_worth,
    round_percent,
};
pub use resolve::{
    ContributionResolution, available_capital, monthly_amortization, monthly_other_savings,
    net_household_income, resolve_contributions, resolve_returns, starting_balances,
};
pub use solver::find_safe_fire_year;
pub use types::{
    Assumptions, BucketRates, CoastContributions, ContributionStreams, FireResult, FireSnapshot,
    ResolvedReturns, SimulationSpec, StartingBalances, TrajectoryPoint,
};
