//! Job commands: start a local runtime, submit one job, stream its status
//! changes until the terminal state, then shut down.

use std::path::Path;

use tracing::info;

use super::command::{DepositArgs, RiskArgs, WithdrawArgs};
use super::output;
use super::positions::PositionsFile;
use crate::domain::{
    CalldataResult, DepositRequest, JobOutcome, JobOutput, JobPayload, OptionType, RiskRequest,
    RiskSnapshot, WithdrawRequest,
};
use crate::error::Result;
use crate::infrastructure::bootstrap::{build_local, LocalServices};
use crate::infrastructure::config::Config;
use crate::port::inbound::{JobApi, JobHandle, SubmitOrigin};
use crate::port::outbound::PositionStore;

/// Build calldata for a deposit. Returns whether the job completed.
pub async fn deposit(config_path: &Path, args: &DepositArgs) -> Result<bool> {
    let config = load_config(config_path)?;
    let services = build_local(&config)?;
    let payload = JobPayload::LpDeposit(DepositRequest {
        assets: args.assets.clone(),
        receiver: args.receiver.clone(),
    });
    run_job(&services, payload).await
}

/// Build calldata for a withdrawal. Returns whether the job completed.
pub async fn withdraw(config_path: &Path, args: &WithdrawArgs) -> Result<bool> {
    let config = load_config(config_path)?;
    let services = build_local(&config)?;
    let payload = JobPayload::LpWithdraw(WithdrawRequest {
        assets: args.assets.clone(),
        receiver: args.receiver.clone(),
        owner: args.owner.clone(),
    });
    run_job(&services, payload).await
}

/// Load the positions file into the local store and compute a snapshot.
pub async fn risk(config_path: &Path, args: &RiskArgs) -> Result<bool> {
    let config = load_config(config_path)?;
    let file = PositionsFile::load(&args.positions)?;
    let legs = file.legs()?;

    let request = RiskRequest {
        trader_address: args.trader.clone(),
    };
    let services = build_local(&config)?;
    for quote in &file.quotes {
        services
            .market
            .set_quote(quote.underlying.clone(), quote.price, quote.volatility);
    }

    // An invalid trader address fails the job itself; only load legs for
    // one that parses.
    if let Ok(trader) = request.trader() {
        let count = legs.len();
        for leg in legs {
            services.positions.record_leg(trader, leg).await?;
        }
        info!(%trader, legs = count, "Positions loaded");
    }

    run_job(&services, JobPayload::RiskSnapshot(request)).await
}

fn load_config(path: &Path) -> Result<Config> {
    let config = Config::load(path)?;
    config.init_logging();
    Ok(config)
}

async fn run_job(services: &LocalServices, payload: JobPayload) -> Result<bool> {
    let runtime = &services.runtime;
    runtime.start();

    let outcome = match runtime.submit(payload) {
        Ok(handle) => Ok(follow(handle).await),
        Err(err) => Err(err),
    };
    runtime.shutdown().await;
    Ok(report(&outcome?))
}

async fn follow(handle: JobHandle) -> JobOutcome {
    output::header(env!("CARGO_PKG_VERSION"));
    output::section("Job");
    output::field("Id", handle.job_id);
    output::field("Kind", handle.kind);
    output::field("Fingerprint", handle.fingerprint.short());
    if handle.origin == SubmitOrigin::Cached {
        output::note("Served from cache");
    }

    output::section("Status");
    let mut subscription = handle.into_subscription();
    while let Some(change) = subscription.next_change().await {
        output::status_change(&change);
        if let Some(outcome) = change.outcome() {
            return outcome;
        }
    }
    JobOutcome::Closed
}

fn report(outcome: &JobOutcome) -> bool {
    match outcome {
        JobOutcome::Completed(JobOutput::Calldata(result)) => {
            print_calldata(result);
            true
        }
        JobOutcome::Completed(JobOutput::Risk(snapshot)) => {
            print_snapshot(snapshot);
            true
        }
        JobOutcome::Failed(failure) => {
            output::json_value("failure", failure);
            output::error(&failure.to_string());
            false
        }
        JobOutcome::Cancelled => {
            output::warning("Job was cancelled");
            false
        }
        JobOutcome::Closed => {
            output::error("Status stream closed before the job finished");
            false
        }
    }
}

fn print_calldata(result: &CalldataResult) {
    output::json_value("calldata", result);
    if output::is_json() {
        return;
    }
    output::section("Calldata");
    output::field("Function", result.call.function_name());
    output::field("Target", result.target);
    output::field("Selector", result.selector);
    output::field("Assets", result.assets_display);
    output::field("Data", output::highlight(&result.data));
    output::success("Calldata ready for signing");
}

fn print_snapshot(snapshot: &RiskSnapshot) {
    output::json_value("risk", snapshot);
    if output::is_json() {
        return;
    }
    output::section("Risk");
    output::field("Owner", snapshot.owner);
    output::field("Version", snapshot.position_version);
    output::field("As of", snapshot.as_of.to_rfc3339());
    output::field("Legs priced", snapshot.legs_priced);
    if snapshot.expired_legs > 0 {
        output::field("Expired legs", snapshot.expired_legs);
    }
    output::field("Net delta", snapshot.net_delta);
    output::field("Net gamma", snapshot.net_gamma);
    output::field("Net vega", snapshot.net_vega);
    output::field("Net theta", snapshot.net_theta);
    output::field("Unrealized P&L", output::signed(snapshot.unrealized_pnl));
    output::field("Margin", snapshot.margin_required);

    if !snapshot.margin_by_underlying.is_empty() {
        output::section("Margin by underlying");
        let widths = [10, 16, 12, 10];
        output::table_header(&[
            ("Underlying", widths[0]),
            ("Margin", widths[1]),
            ("Price shock", widths[2]),
            ("Vol shock", widths[3]),
        ]);
        for (underlying, margin) in &snapshot.margin_by_underlying {
            output::table_row(
                &[
                    underlying.clone(),
                    margin.margin.to_string(),
                    margin.worst_price_shock.to_string(),
                    margin.worst_vol_shock.to_string(),
                ],
                &widths,
            );
        }
    }

    let open: Vec<_> = snapshot.positions.iter().filter(|p| !p.is_flat()).collect();
    if !open.is_empty() {
        output::section("Positions");
        let widths = [24, 6, 10, 8, 6];
        output::table_header(&[
            ("Series", widths[0]),
            ("Type", widths[1]),
            ("Strike", widths[2]),
            ("Net", widths[3]),
            ("Legs", widths[4]),
        ]);
        for position in open {
            let option_type = match position.option_type {
                OptionType::Call => "call",
                OptionType::Put => "put",
            };
            output::table_row(
                &[
                    position.series_id.to_string(),
                    option_type.to_string(),
                    position.strike.to_string(),
                    position.net_quantity.to_string(),
                    position.legs.to_string(),
                ],
                &widths,
            );
        }
    }
}
