use super::household::sanitize;
use super::types::{Assumptions, FireResult, FireSnapshot, SimulationSpec, TrajectoryPoint};

#[derive(Debug, Clone, Copy)]
struct Balances {
    available: f64,
    occ_pension: f64,
    premie_pension: f64,
    private_pension: f64,
    state_pension: f64,
}

impl Balances {
    fn point(&self, age: u32) -> TrajectoryPoint {
        TrajectoryPoint {
            age,
            available: self.available,
            occ_pension: self.occ_pension,
            premie_pension: self.premie_pension,
            private_pension: self.private_pension,
            state_pension: self.state_pension,
        }
    }
}

fn grow(balance: f64, rate: f64) -> f64 {
    // Negative available is a solvency deficit, not an investment; it does
    // not compound.
    if balance <= 0.0 {
        return balance;
    }
    (balance * (1.0 + rate)).max(0.0)
}

/// Deterministic age-by-age forward simulation of the five capital buckets
/// in real (inflation-adjusted) terms.
///
/// Each year applies, in order: growth, contributions (full while working,
/// coast-scaled for an optional window after the FIRE age), unlock
/// transfers, and the expense withdrawal from available capital. Locked
/// buckets keep growing but cannot be spent; the state pension annuitizes
/// over the payout horizon from pension start, while the other pension
/// buckets fold into available capital as accessible drawdown capital at
/// their unlock ages. Available capital may go negative during the bridge
/// period; that is the solvency signal the validator scans for.
pub fn simulate_portfolio(spec: &SimulationSpec, assumptions: &Assumptions) -> Vec<TrajectoryPoint> {
    let terminal_age = assumptions.terminal_age.max(spec.current_age);
    let pension_age = assumptions.pension_start_age;

    let mut balances = Balances {
        available: sanitize(spec.start.available),
        occ_pension: sanitize(spec.start.occ_pension),
        premie_pension: sanitize(spec.start.premie_pension),
        private_pension: sanitize(spec.start.private_pension),
        state_pension: sanitize(spec.start.state_pension),
    };
    let annual_expenses = sanitize(spec.annual_expenses);
    let monthly_savings = spec.monthly_savings.max(0.0);

    let mut state_annuity = 0.0;
    let mut points = Vec::with_capacity((terminal_age - spec.current_age + 1) as usize);
    points.push(balances.point(spec.current_age));

    for age in (spec.current_age + 1)..=terminal_age {
        balances.available = grow(balances.available, spec.returns.available);
        balances.occ_pension = grow(balances.occ_pension, spec.returns.occ_pension);
        balances.premie_pension = grow(balances.premie_pension, spec.returns.premie_pension);
        balances.private_pension = grow(balances.private_pension, spec.returns.private_pension);
        balances.state_pension = grow(balances.state_pension, spec.returns.state_pension);

        let contribution_scale = if age <= spec.fire_age {
            1.0
        } else {
            match assumptions.coast {
                Some(coast) if age <= spec.fire_age + coast.years => coast.factor.clamp(0.0, 1.0),
                _ => 0.0,
            }
        };
        if contribution_scale > 0.0 {
            let scale = 12.0 * contribution_scale;
            balances.available += monthly_savings * scale;
            balances.occ_pension += sanitize(spec.contributions.occupational_monthly) * scale;
            balances.premie_pension += sanitize(spec.contributions.premium_monthly) * scale;
            balances.state_pension += sanitize(spec.contributions.state_monthly) * scale;
        }

        if age >= assumptions.occupational_access_age && balances.occ_pension > 0.0 {
            balances.available += balances.occ_pension;
            balances.occ_pension = 0.0;
        }
        if age >= assumptions.private_access_age && balances.private_pension > 0.0 {
            balances.available += balances.private_pension;
            balances.private_pension = 0.0;
        }
        if age >= pension_age && balances.premie_pension > 0.0 {
            balances.available += balances.premie_pension;
            balances.premie_pension = 0.0;
        }
        if age == pension_age {
            state_annuity =
                balances.state_pension / assumptions.state_pension_payout_years.max(1) as f64;
        }
        if age >= pension_age && balances.state_pension > 0.0 {
            let payment = state_annuity.min(balances.state_pension);
            balances.state_pension -= payment;
            balances.available += payment;
        }

        if age >= spec.fire_age {
            balances.available -= annual_expenses;
        }

        points.push(balances.point(age));
    }

    points
}

/// State-pension capital projected to pension start, with the contribution
/// stream accruing the whole way there. The simulator stops the stream at
/// the FIRE age instead; the validator reconciles the difference.
fn project_state_pension(snapshot: &FireSnapshot, assumptions: &Assumptions) -> f64 {
    let mut state_pension = sanitize(snapshot.balances.state_pension);
    let years_to_pension = assumptions
        .pension_start_age
        .saturating_sub(snapshot.current_age);
    let annual_state = sanitize(snapshot.contributions.state_monthly) * 12.0;
    for _ in 0..years_to_pension {
        state_pension = grow(state_pension, snapshot.returns.state_pension) + annual_state;
    }
    state_pension
}

/// Analytical years-to-FIRE estimate: the smallest integer N such that
/// available capital, compounded at its real return and fed by monthly
/// savings, reaches the 4 %-rule requirement net of the projected
/// state-pension annuity. Bounded by the maximum horizon; unreachable
/// targets come back as `is_achievable: false` with warnings, never as an
/// error.
pub fn estimate_fire(snapshot: &FireSnapshot, assumptions: &Assumptions) -> FireResult {
    let available_at_start = sanitize(snapshot.balances.available);
    let state_pension_at_start = sanitize(snapshot.balances.state_pension);
    let annual_expenses = sanitize(snapshot.target_monthly_expenses) * 12.0;
    let payout_years = assumptions.state_pension_payout_years.max(1);

    if annual_expenses <= 0.0 {
        return FireResult::not_achievable(
            available_at_start,
            state_pension_at_start,
            "Target expenses are zero; there is nothing to sustain.".to_string(),
        );
    }

    let withdrawal_rate = if assumptions.withdrawal_rate > 0.0 {
        assumptions.withdrawal_rate
    } else {
        0.04
    };

    let state_pension_annual_income =
        project_state_pension(snapshot, assumptions) / payout_years as f64;
    let required_at_pension =
        (annual_expenses - state_pension_annual_income).max(0.0) / withdrawal_rate;

    let mut warnings = Vec::new();
    if snapshot.monthly_savings <= 0.0 {
        warnings.push(
            "Monthly savings are zero or negative; the projection relies on growth alone."
                .to_string(),
        );
    }

    let annual_savings = snapshot.monthly_savings.max(0.0) * 12.0;
    let mut available = available_at_start;
    for years in 0..=assumptions.max_horizon_years {
        if available >= required_at_pension {
            return FireResult {
                is_achievable: true,
                years_to_fire: years,
                estimated_age: snapshot.current_age + years,
                portfolio_at_fire: available,
                required_at_pension,
                available_at_start,
                state_pension_at_start,
                state_pension_annual_income,
                state_pension_payout_years: payout_years,
                warnings,
            };
        }
        if years < assumptions.max_horizon_years {
            available = grow(available, snapshot.returns.available) + annual_savings;
        }
    }

    warnings.push(format!(
        "Financial independence is not reachable within {} years with the current savings and returns.",
        assumptions.max_horizon_years
    ));
    FireResult {
        is_achievable: false,
        years_to_fire: assumptions.max_horizon_years,
        estimated_age: snapshot.current_age + assumptions.max_horizon_years,
        portfolio_at_fire: available,
        required_at_pension,
        available_at_start,
        state_pension_at_start,
        state_pension_annual_income,
        state_pension_payout_years: payout_years,
        warnings,
    }
}
