pub mod admin;
pub mod auth;
pub mod business;
pub mod notification;
pub mod pagination;
pub mod referral;
pub mod spin;
pub mod task;
pub mod user;
pub mod vip;
pub mod wallet;

pub use admin::*;
pub use auth::*;
pub use business::*;
pub use notification::*;
pub use pagination::*;
pub use referral::*;
pub use spin::*;
pub use task::*;
pub use user::*;
pub use vip::*;
pub use wallet::*;
