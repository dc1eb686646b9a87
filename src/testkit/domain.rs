//! Builders for domain primitives used across tests.

use alloy_primitives::{address, Address};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;

use crate::domain::{
    DepositRequest, JobPayload, OptionType, RiskRequest, SeriesId, Side, StrategyLeg,
    WithdrawRequest,
};

/// Trader whose legs most tests record.
pub const OWNER: Address = address!("52908400098527886E0F7030069857D2E4169EE7");
/// A second, unrelated trader.
pub const OTHER_OWNER: Address = address!("8617E340B3D01FA5F11F306F4090FD50E238070D");
pub const RECEIVER: Address = address!("de709f2102306220921060314715629080e2fb77");
pub const VAULT: Address = address!("27b1fdb04752bbc536007a920d24acb045561c26");

/// Premium paid or received per contract by [`leg`].
pub const PREMIUM: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// An ETH leg expiring in 30 days.
pub fn leg(side: Side, option_type: OptionType, size: i64, strike: Decimal) -> StrategyLeg {
    leg_on("ETH", side, option_type, size, strike)
}

/// A leg on `underlying` expiring in 30 days.
pub fn leg_on(
    underlying: &str,
    side: Side,
    option_type: OptionType,
    size: i64,
    strike: Decimal,
) -> StrategyLeg {
    let expiry = Utc::now() + Duration::days(30);
    StrategyLeg::try_new(
        series(underlying, option_type, strike),
        underlying,
        side,
        option_type,
        size,
        strike,
        expiry,
        PREMIUM,
    )
    .expect("valid test leg")
}

/// A leg whose expiry has already passed.
pub fn expired_leg(side: Side, option_type: OptionType, size: i64, strike: Decimal) -> StrategyLeg {
    StrategyLeg::try_new(
        series("ETH", option_type, strike),
        "ETH",
        side,
        option_type,
        size,
        strike,
        Utc::now() - Duration::days(1),
        PREMIUM,
    )
    .expect("valid test leg")
}

fn series(underlying: &str, option_type: OptionType, strike: Decimal) -> SeriesId {
    let kind = match option_type {
        OptionType::Call => "C",
        OptionType::Put => "P",
    };
    SeriesId::new(format!("{underlying}-{strike}-{kind}"))
}

pub fn deposit(assets: &str, receiver: Address) -> JobPayload {
    JobPayload::LpDeposit(DepositRequest {
        assets: assets.to_string(),
        receiver: receiver.to_string(),
    })
}

pub fn withdraw(assets: &str, receiver: Address, owner: Address) -> JobPayload {
    JobPayload::LpWithdraw(WithdrawRequest {
        assets: assets.to_string(),
        receiver: receiver.to_string(),
        owner: owner.to_string(),
    })
}

pub fn risk(trader: Address) -> JobPayload {
    JobPayload::RiskSnapshot(RiskRequest {
        trader_address: trader.to_string(),
    })
}
