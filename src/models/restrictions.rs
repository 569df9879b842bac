pub const PRICE_MIN: i64 = 0;
pub const PRICE_MAX: i64 = 1_000_000;

pub const ABOUT_MAX_LEN: usize = 1000;
pub const LOCATION_NAME_MAX_LEN: usize = 100;
pub const FILE_ID_MAX_LEN: usize = 255;
pub const NAME_MAX_LEN: usize = 255;
