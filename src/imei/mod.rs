pub mod check_digit;
pub mod identifier;

pub use check_digit::{compute_check_digit, is_valid_imei, BASE_LEN, FULL_LEN};
pub use identifier::{Identifier, ValidationError};
