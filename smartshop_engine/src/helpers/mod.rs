mod promo_code;

pub use promo_code::is_valid_promo_code;
