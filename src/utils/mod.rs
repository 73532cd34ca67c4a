pub mod code_generator;
pub mod jwt;
pub mod phone;

pub use code_generator::generate_referral_code;
pub use jwt::*;
pub use phone::*;
