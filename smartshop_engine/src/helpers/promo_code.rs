/// Promotional codes are the literal prefix `PROMO-` followed by exactly four uppercase alphanumerics.
/// Anything else (including lowercase) is invalid and must fail the order, not be ignored.
pub fn is_valid_promo_code(code: &str) -> bool {
    let promo = regex::Regex::new(r"^PROMO-[A-Z0-9]{4}$").unwrap();
    promo.is_match(code)
}
