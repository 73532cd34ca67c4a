use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (type name, values) for every closed status/type set in the schema
const ENUM_TYPES: &[(&str, &[&str])] = &[
    ("user_role", &["user", "admin", "business"]),
    (
        "transaction_type",
        &[
            "task_reward",
            "referral_bonus",
            "spin_win",
            "withdrawal",
            "deposit",
            "admin_credit",
            "admin_debit",
        ],
    ),
    (
        "withdrawal_status",
        &["pending", "processing", "completed", "failed", "rejected"],
    ),
    (
        "task_status",
        &[
            "draft",
            "pending_approval",
            "active",
            "paused",
            "completed",
            "rejected",
        ],
    ),
    ("task_completion_status", &["pending", "approved", "rejected"]),
    ("fraud_severity", &["low", "medium", "high", "critical"]),
    ("spin_reward_type", &["cb_points", "free_spin", "bonus_multiplier"]),
    (
        "notification_type",
        &[
            "reward_earned",
            "withdrawal_processed",
            "vip_upgrade",
            "task_available",
        ],
    ),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, values) in ENUM_TYPES {
            manager
                .create_type(
                    Type::create()
                        .as_enum(Alias::new(*name))
                        .values(values.iter().map(|v| Alias::new(*v)))
                        .to_owned(),
                )
                .await?;
        }
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, _) in ENUM_TYPES.iter().rev() {
            manager
                .drop_type(Type::drop().if_exists().name(Alias::new(*name)).to_owned())
                .await?;
        }
        Ok(())
    }
}
