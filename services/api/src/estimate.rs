use crate::infra::{build_orchestrator, load_baseline, parse_postal_code, OfflineRegion};
use clap::Args;
use home_value::config::AppConfig;
use home_value::error::AppError;
use home_value::telemetry;
use home_value::valuation::{
    format_currency, BaselineTable, EstimateRequest, RateSource, ValuationResponse,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EstimateArgs {
    /// JSON file shaped like the POST /api/estimate body
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Skip geocoding and price the property in this postal code
    #[arg(long, value_parser = parse_postal_code)]
    pub(crate) postal_code: Option<String>,
    /// County reported alongside --postal-code
    #[arg(long, requires = "postal_code")]
    pub(crate) county: Option<String>,
    /// Year used for age calculations (defaults to the configured or current year)
    #[arg(long)]
    pub(crate) current_year: Option<i32>,
    /// Print the full response as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct BaselineArgs {
    /// Show only the rate applied to this postal code
    #[arg(long, value_parser = parse_postal_code)]
    pub(crate) postal_code: Option<String>,
}

pub(crate) async fn run_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let EstimateArgs {
        input,
        postal_code,
        county,
        current_year,
        json,
    } = args;

    let mut config = AppConfig::load()?;
    if current_year.is_some() {
        config.valuation.current_year = current_year;
    }
    telemetry::init(&config.telemetry)?;

    let raw = std::fs::read_to_string(&input)?;
    let request: EstimateRequest = serde_json::from_str(&raw)
        .map_err(|err| AppError::Input(format!("{}: {err}", input.display())))?;

    let offline = postal_code.map(|postal_code| OfflineRegion {
        postal_code,
        county,
    });
    let orchestrator = build_orchestrator(&config, offline)?;
    let response = ValuationResponse::from(orchestrator.estimate_request(request).await?);

    if json {
        let rendered = serde_json::to_string_pretty(&response)?;
        println!("{rendered}");
    } else {
        render_valuation(&response);
    }

    Ok(())
}

pub(crate) fn run_baseline(args: BaselineArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let table = load_baseline(&config.valuation)?;
    for line in baseline_lines(&table, args.postal_code.as_deref()) {
        println!("{line}");
    }
    Ok(())
}

pub(crate) fn render_valuation(response: &ValuationResponse) {
    println!("Valuation for {}", response.subject.normalized_address);
    if let Some(county) = &response.subject.county {
        println!("County: {county}");
    }
    println!(
        "Estimate: {} (range {} - {})",
        format_currency(response.estimate),
        format_currency(response.low),
        format_currency(response.high)
    );
    println!("Uncertainty: +/-{:.1}%", response.band * 100.0);
    println!(
        "Rate used: {}/sqft",
        format_currency(response.price_per_area_used)
    );

    println!("\nBreakdown");
    for line in &response.breakdown {
        println!("- {line}");
    }
}

pub(crate) fn baseline_lines(table: &BaselineTable, postal_code: Option<&str>) -> Vec<String> {
    if let Some(code) = postal_code {
        let lookup = table.lookup(Some(code));
        let line = match lookup.source {
            RateSource::Table => format!("{code}: {}/sqft", format_currency(lookup.rate)),
            RateSource::Default => format!(
                "{code}: not in table, default {}/sqft applies",
                format_currency(lookup.rate)
            ),
        };
        return vec![line];
    }

    let mut lines = Vec::with_capacity(table.len() + 1);
    lines.push(format!(
        "{} postal codes (default {}/sqft)",
        table.len(),
        format_currency(table.default_rate())
    ));
    lines.extend(
        table
            .entries()
            .map(|(code, rate)| format!("{code}: {}/sqft", format_currency(rate))),
    );
    lines
}
