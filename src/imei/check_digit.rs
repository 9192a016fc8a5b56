use crate::error::{ImeiError, Result};

/// Digits in an IMEI without its check digit
pub const BASE_LEN: usize = 14;

/// Digits in a complete IMEI
pub const FULL_LEN: usize = 15;

/// Compute the Luhn check digit for a 14-digit IMEI base.
///
/// Positions are counted from the right end of the complete number, so the
/// check digit itself sits at position 0 and the last base digit at position 1.
/// Digits at odd positions are doubled (minus 9 when the result exceeds 9).
pub fn compute_check_digit(base: &str) -> Result<u8> {
    if base.len() != BASE_LEN || !base.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ImeiError::InvalidLength(base.to_string()));
    }

    let sum: u32 = base
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            // i is offset by one: the check digit occupies position 0
            if i % 2 == 0 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();

    Ok(((10 - (sum % 10)) % 10) as u8)
}

/// Check whether a 15-digit IMEI carries the correct Luhn check digit
pub fn is_valid_imei(imei: &str) -> bool {
    if imei.len() != FULL_LEN || !imei.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let (base, check) = imei.split_at(BASE_LEN);
    match compute_check_digit(base) {
        Ok(expected) => check.as_bytes()[0] - b'0' == expected,
        Err(_) => false,
    }
}
