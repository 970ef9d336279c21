use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parse an amount that uses a comma as decimal separator, e.g. `11000,0000000` or `1500,50`.
pub fn parse_amount(content: &str) -> Result<Decimal, &'static str> {
    let content = content.trim();
    if content.is_empty() {
        return Err("Empty amount");
    }
    let content = content.replacen(',', ".", 1);
    Decimal::from_str(&content).map_err(|_| "Failed to parse amount")
}

pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
