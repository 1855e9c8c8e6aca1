//! CPF document number helpers.
//!
//! Registrations are written with the digits-only form. Older rows may hold
//! the masked form (`000.000.000-00`), so lookups query both.

/// Number of digits in a CPF.
pub const CPF_LEN: usize = 11;

/// Strip every non-digit character.
#[must_use]
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Validate a CPF: 11 digits, not all equal, both check digits correct.
#[must_use]
pub fn is_valid_cpf(raw: &str) -> bool {
    let digits: Vec<u32> = raw.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != CPF_LEN {
        return false;
    }
    if digits.iter().all(|d| *d == digits[0]) {
        return false;
    }

    check_digit(&digits[..9]) == digits[9] && check_digit(&digits[..10]) == digits[10]
}

/// Mod-11 check digit over `prefix` (weights run from `len + 1` down to 2).
fn check_digit(prefix: &[u32]) -> u32 {
    let mut weight = u32::try_from(prefix.len()).unwrap_or(0) + 1;
    let mut sum = 0;
    for digit in prefix {
        sum += digit * weight;
        weight -= 1;
    }

    let rest = (sum * 10) % 11;
    if rest == 10 {
        0
    } else {
        rest
    }
}

/// Render up to 11 digits as `000.000.000-00`, separators only between
/// digits that are present.
#[must_use]
pub fn mask_cpf(raw: &str) -> String {
    let digits: Vec<char> = raw
        .chars()
        .filter(char::is_ascii_digit)
        .take(CPF_LEN)
        .collect();

    let mut masked = String::with_capacity(14);
    for (i, digit) in digits.iter().enumerate() {
        match i {
            3 | 6 => masked.push('.'),
            9 => masked.push('-'),
            _ => {}
        }
        masked.push(*digit);
    }
    masked
}

/// Both stored forms of a CPF, for lookups.
#[must_use]
pub fn lookup_forms(raw: &str) -> Vec<String> {
    let clean = digits_only(raw);
    let masked = mask_cpf(&clean);
    if masked == clean {
        vec![clean]
    } else {
        vec![clean, masked]
    }
}
