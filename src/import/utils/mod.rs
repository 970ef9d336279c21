mod amount;
mod date;

pub use amount::{parse_amount, round_to_cents};
pub use date::{parse_date, parse_date_time};
