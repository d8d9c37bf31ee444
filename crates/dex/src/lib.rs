pub mod abi;
pub mod pair;
pub mod quote;
pub mod token;

pub use pair::{decode_pair_created, get_pair_address};
pub use quote::{get_amounts_out, min_amount_out};
pub use token::TokenHoldings;
