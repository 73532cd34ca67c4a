pub mod businesses;
pub mod fraud_logs;
pub mod login_logs;
pub mod notifications;
pub mod referrals;
pub mod settings;
pub mod spin_history;
pub mod spin_rewards;
pub mod task_completions;
pub mod tasks;
pub mod transactions;
pub mod users;
pub mod vip_levels;
pub mod wallets;
pub mod withdrawals;

pub use businesses as business_entity;
pub use fraud_logs as fraud_log_entity;
pub use login_logs as login_log_entity;
pub use notifications as notification_entity;
pub use referrals as referral_entity;
pub use settings as setting_entity;
pub use spin_history as spin_history_entity;
pub use spin_rewards as spin_reward_entity;
pub use task_completions as task_completion_entity;
pub use tasks as task_entity;
pub use transactions as transaction_entity;
pub use users as user_entity;
pub use vip_levels as vip_level_entity;
pub use wallets as wallet_entity;
pub use withdrawals as withdrawal_entity;

pub use fraud_logs::FraudSeverity;
pub use notifications::NotificationType;
pub use spin_rewards::SpinRewardType;
pub use task_completions::CompletionStatus;
pub use tasks::TaskStatus;
pub use transactions::TransactionType;
pub use users::UserRole;
pub use withdrawals::WithdrawalStatus;
