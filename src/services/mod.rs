pub mod admin_service;
pub mod auth_service;
pub mod business_service;
pub mod fraud_service;
pub mod notification_service;
pub mod referral_service;
pub mod setting_service;
pub mod spin_service;
pub mod task_service;
pub mod user_service;
pub mod vip_service;
pub mod wallet_service;
pub mod withdrawal_service;

pub use admin_service::*;
pub use auth_service::*;
pub use business_service::*;
pub use fraud_service::*;
pub use notification_service::*;
pub use referral_service::*;
pub use setting_service::*;
pub use spin_service::*;
pub use task_service::*;
pub use user_service::*;
pub use vip_service::*;
pub use wallet_service::*;
pub use withdrawal_service::*;
