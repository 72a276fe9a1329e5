use axum::{
    Router,
    extract::{Json, Query},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

use crate::core::{
    Assumptions, CoastContributions, ContributionStreams, FireResult, FireSnapshot, Household,
    ResolvedReturns, SimulationSpec, TrajectoryPoint, WealthLevel, current_level, estimate_fire,
    find_safe_fire_year, monthly_amortization, monthly_other_savings, net_household_income,
    net_worth, resolve_contributions, resolve_returns, simulate_portfolio, starting_balances,
};

/// Engine parameters. One flag set backs both the command line and the API
/// defaults; rates are percentages here and become decimals at the
/// conversion boundary.
#[derive(Parser, Debug)]
#[command(
    name = "trappan",
    about = "Net worth, wealth ladder and FIRE projection engine for Swedish multi-pillar pensions"
)]
struct Cli {
    #[arg(long, default_value_t = 2026)]
    current_year: i32,
    #[arg(
        long,
        default_value_t = 80600.0,
        help = "Income base amount (IBB) in SEK, used for contribution ceilings"
    )]
    income_base_amount: f64,
    #[arg(long, default_value_t = 2.0, help = "Expected annual inflation in percent")]
    inflation: f64,
    #[arg(
        long,
        default_value_t = 7.0,
        help = "Default nominal return in percent for equity-like buckets without assets"
    )]
    default_equity_return: f64,
    #[arg(
        long,
        default_value_t = 2.0,
        help = "Default nominal return in percent for fixed-income-like buckets without assets"
    )]
    default_fixed_return: f64,
    #[arg(long, default_value_t = 4.0, help = "Safe withdrawal rate in percent")]
    withdrawal_rate: f64,
    #[arg(long, default_value_t = 63, help = "State pension start age")]
    pension_start_age: u32,
    #[arg(
        long,
        default_value_t = 55,
        help = "Earliest occupational pension access age"
    )]
    occupational_access_age: u32,
    #[arg(long, default_value_t = 55, help = "Earliest private pension (IPS) access age")]
    private_access_age: u32,
    #[arg(
        long,
        default_value_t = 20,
        help = "Years the state pension capital is spread over"
    )]
    state_pension_payout_years: u32,
    #[arg(long, default_value_t = 100, help = "Age the simulation runs to")]
    terminal_age: u32,
    #[arg(
        long,
        default_value_t = 60,
        help = "Maximum years the analytical FIRE search looks ahead"
    )]
    max_horizon_years: u32,
    #[arg(
        long,
        default_value_t = 10,
        help = "Maximum extra years the solvency validator may add"
    )]
    max_additional_years: u32,
    #[arg(
        long,
        default_value_t = 30.0,
        help = "Flat tax rate in percent for the fallback net-income function"
    )]
    tax_rate: f64,
    #[arg(
        long,
        default_value_t = 0.0,
        help = "Coast FIRE: post-FIRE contribution level in percent of the working level"
    )]
    coast_factor: f64,
    #[arg(
        long,
        default_value_t = 0,
        help = "Coast FIRE: years contributions continue after the FIRE age"
    )]
    coast_years: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PlanPayload {
    persons: Vec<crate::core::Person>,
    assets: Vec<crate::core::Asset>,
    liabilities: Vec<crate::core::Liability>,

    current_year: Option<i32>,
    income_base_amount: Option<f64>,
    inflation: Option<f64>,
    default_equity_return: Option<f64>,
    default_fixed_return: Option<f64>,
    withdrawal_rate: Option<f64>,
    pension_start_age: Option<u32>,
    occupational_access_age: Option<u32>,
    private_access_age: Option<u32>,
    state_pension_payout_years: Option<u32>,
    terminal_age: Option<u32>,
    max_horizon_years: Option<u32>,
    max_additional_years: Option<u32>,
    tax_rate: Option<f64>,
    coast_factor: Option<f64>,
    coast_years: Option<u32>,

    /// Externally derived target; when absent it is computed as net income
    /// minus savings minus amortization.
    target_monthly_expenses: Option<f64>,
}

#[derive(Debug)]
struct PlanRequest {
    household: Household,
    assumptions: Assumptions,
    tax_rate: f64,
    target_monthly_expenses: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    net_worth: f64,
    level: WealthLevel,
    contributions: ContributionStreams,
    returns: ResolvedReturns,
    estimate: FireResult,
    fire: FireResult,
    trajectory: Vec<TrajectoryPoint>,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn default_cli_for_api() -> Cli {
    Cli::parse_from(["trappan"])
}

fn build_assumptions(cli: &Cli) -> Result<Assumptions, String> {
    if !cli.income_base_amount.is_finite() || cli.income_base_amount <= 0.0 {
        return Err("--income-base-amount must be > 0".to_string());
    }

    if !(-50.0..=100.0).contains(&cli.inflation) {
        return Err("--inflation must be between -50 and 100".to_string());
    }

    for (name, rate) in [
        ("--default-equity-return", cli.default_equity_return),
        ("--default-fixed-return", cli.default_fixed_return),
    ] {
        if !(-100.0..=100.0).contains(&rate) {
            return Err(format!("{name} must be between -100 and 100"));
        }
    }

    if !(0.0..=100.0).contains(&cli.withdrawal_rate) || cli.withdrawal_rate == 0.0 {
        return Err("--withdrawal-rate must be > 0 and <= 100".to_string());
    }

    if cli.state_pension_payout_years == 0 {
        return Err("--state-pension-payout-years must be > 0".to_string());
    }

    if cli.terminal_age <= cli.pension_start_age {
        return Err("--terminal-age must be > --pension-start-age".to_string());
    }

    if cli.max_horizon_years == 0 {
        return Err("--max-horizon-years must be > 0".to_string());
    }

    if !(0.0..=100.0).contains(&cli.tax_rate) {
        return Err("--tax-rate must be between 0 and 100".to_string());
    }

    if !(0.0..=100.0).contains(&cli.coast_factor) {
        return Err("--coast-factor must be between 0 and 100".to_string());
    }

    let coast = (cli.coast_years > 0).then_some(CoastContributions {
        factor: cli.coast_factor / 100.0,
        years: cli.coast_years,
    });

    Ok(Assumptions {
        current_year: cli.current_year,
        income_base_amount: cli.income_base_amount,
        inflation: cli.inflation / 100.0,
        default_equity_return: cli.default_equity_return / 100.0,
        default_fixed_return: cli.default_fixed_return / 100.0,
        withdrawal_rate: cli.withdrawal_rate / 100.0,
        pension_start_age: cli.pension_start_age,
        occupational_access_age: cli.occupational_access_age,
        private_access_age: cli.private_access_age,
        state_pension_payout_years: cli.state_pension_payout_years,
        terminal_age: cli.terminal_age,
        max_horizon_years: cli.max_horizon_years,
        max_additional_years: cli.max_additional_years,
        coast,
    })
}

fn plan_request_from_payload(payload: PlanPayload) -> Result<PlanRequest, String> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_year {
        cli.current_year = v;
    }
    if let Some(v) = payload.income_base_amount {
        cli.income_base_amount = v;
    }
    if let Some(v) = payload.inflation {
        cli.inflation = v;
    }
    if let Some(v) = payload.default_equity_return {
        cli.default_equity_return = v;
    }
    if let Some(v) = payload.default_fixed_return {
        cli.default_fixed_return = v;
    }
    if let Some(v) = payload.withdrawal_rate {
        cli.withdrawal_rate = v;
    }
    if let Some(v) = payload.pension_start_age {
        cli.pension_start_age = v;
    }
    if let Some(v) = payload.occupational_access_age {
        cli.occupational_access_age = v;
    }
    if let Some(v) = payload.private_access_age {
        cli.private_access_age = v;
    }
    if let Some(v) = payload.state_pension_payout_years {
        cli.state_pension_payout_years = v;
    }
    if let Some(v) = payload.terminal_age {
        cli.terminal_age = v;
    }
    if let Some(v) = payload.max_horizon_years {
        cli.max_horizon_years = v;
    }
    if let Some(v) = payload.max_additional_years {
        cli.max_additional_years = v;
    }
    if let Some(v) = payload.tax_rate {
        cli.tax_rate = v;
    }
    if let Some(v) = payload.coast_factor {
        cli.coast_factor = v;
    }
    if let Some(v) = payload.coast_years {
        cli.coast_years = v;
    }

    let tax_rate = cli.tax_rate / 100.0;
    let assumptions = build_assumptions(&cli)?;

    Ok(PlanRequest {
        household: Household {
            persons: payload.persons,
            assets: payload.assets,
            liabilities: payload.liabilities,
        },
        assumptions,
        tax_rate,
        target_monthly_expenses: payload.target_monthly_expenses,
    })
}

fn run_plan(request: &PlanRequest) -> PlanResponse {
    let household = &request.household;
    let assumptions = &request.assumptions;

    let net_worth = net_worth(&household.assets, &household.liabilities);
    let level = current_level(net_worth);

    let contributions =
        resolve_contributions(&household.persons, assumptions.income_base_amount);
    let returns = resolve_returns(
        &household.assets,
        &household.liabilities,
        assumptions.inflation,
        assumptions.default_equity_return,
        assumptions.default_fixed_return,
    );

    let monthly_savings = monthly_other_savings(&household.persons)
        + monthly_amortization(&household.liabilities);
    let tax_rate = request.tax_rate;
    let net_income = net_household_income(&household.persons, |gross| gross * (1.0 - tax_rate));
    let target_monthly_expenses = request
        .target_monthly_expenses
        .unwrap_or((net_income - monthly_savings).max(0.0));

    // Projections run against the person closest to pension age.
    let current_age = household
        .persons
        .iter()
        .map(|p| p.age(assumptions.current_year))
        .max()
        .unwrap_or(0);

    let snapshot = FireSnapshot {
        current_age,
        balances: starting_balances(&household.assets, &household.liabilities),
        contributions: contributions.streams,
        monthly_savings,
        target_monthly_expenses,
        returns: returns.real,
    };

    let estimate = estimate_fire(&snapshot, assumptions);
    let fire = find_safe_fire_year(&estimate, &snapshot, assumptions);

    let spec = SimulationSpec {
        current_age: snapshot.current_age,
        fire_age: snapshot.current_age + fire.years_to_fire,
        start: snapshot.balances,
        contributions: snapshot.contributions,
        monthly_savings: snapshot.monthly_savings,
        returns: snapshot.returns,
        annual_expenses: target_monthly_expenses * 12.0,
    };
    let trajectory = simulate_portfolio(&spec, assumptions);

    PlanResponse {
        net_worth,
        level,
        contributions: contributions.streams,
        returns,
        estimate,
        fire,
        trajectory,
        warnings: contributions.warnings,
    }
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = Router::new()
        .route("/api/plan", get(plan_get_handler).post(plan_post_handler))
        .fallback(not_found_handler);

    let listener = TcpListener::bind(addr).await?;
    info!("trappan HTTP API listening on http://{addr}");

    axum::serve(listener, app).await
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn plan_get_handler(Query(payload): Query<PlanPayload>) -> Response {
    plan_handler_impl(payload)
}

async fn plan_post_handler(Json(payload): Json<PlanPayload>) -> Response {
    plan_handler_impl(payload)
}

fn plan_handler_impl(payload: PlanPayload) -> Response {
    let request = match plan_request_from_payload(payload) {
        Ok(request) => request,
        Err(msg) => return error_response(StatusCode::BAD_REQUEST, &msg),
    };

    json_response(StatusCode::OK, run_plan(&request))
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn plan_request_from_json(json: &str) -> Result<PlanRequest, String> {
    let payload = serde_json::from_str::<PlanPayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    plan_request_from_payload(payload)
}
