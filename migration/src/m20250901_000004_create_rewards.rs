use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum VipLevels {
    Table,
    Id,
    Level,
    Name,
    MinTasks,
    MinEarnings,
    TaskRewardMultiplier,
    WithdrawalCooldown,
    WithdrawalMinAmount,
    BadgeImage,
    Benefits,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Referrals {
    Table,
    Id,
    ReferrerId,
    ReferredId,
    BonusAmount,
    BonusPaid,
    MilestoneBonus,
    MilestonePaid,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SpinRewards {
    Table,
    Id,
    RewardType,
    RewardValue,
    Probability,
    DisplayText,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum SpinHistory {
    Table,
    Id,
    UserId,
    RewardId,
    RewardValue,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// - task_reward_multiplier: integer percent, 100 = 1x
/// - withdrawal_cooldown: days between withdrawals
/// - spin_rewards.probability: relative weight, not required to sum to 100
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(VipLevels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(VipLevels::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(VipLevels::Level)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(VipLevels::Name).string_len(50).not_null())
                    .col(
                        ColumnDef::new(VipLevels::MinTasks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VipLevels::MinEarnings)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(VipLevels::TaskRewardMultiplier)
                            .integer()
                            .not_null()
                            .default(100),
                    )
                    .col(
                        ColumnDef::new(VipLevels::WithdrawalCooldown)
                            .integer()
                            .not_null()
                            .default(7),
                    )
                    .col(
                        ColumnDef::new(VipLevels::WithdrawalMinAmount)
                            .big_integer()
                            .not_null()
                            .default(50),
                    )
                    .col(ColumnDef::new(VipLevels::BadgeImage).text().null())
                    .col(ColumnDef::new(VipLevels::Benefits).text().null())
                    .col(
                        ColumnDef::new(VipLevels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Referrals::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Referrals::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Referrals::ReferrerId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Referrals::ReferredId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Referrals::BonusAmount)
                            .big_integer()
                            .not_null()
                            .default(5),
                    )
                    .col(
                        ColumnDef::new(Referrals::BonusPaid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Referrals::MilestoneBonus)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Referrals::MilestonePaid)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Referrals::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_referrals_referrer")
                    .table(Referrals::Table)
                    .col(Referrals::ReferrerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SpinRewards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SpinRewards::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SpinRewards::RewardType)
                            .custom(Alias::new("spin_reward_type"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SpinRewards::RewardValue)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SpinRewards::Probability).integer().not_null())
                    .col(
                        ColumnDef::new(SpinRewards::DisplayText)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SpinRewards::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(SpinRewards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SpinHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SpinHistory::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SpinHistory::UserId).big_integer().not_null())
                    .col(
                        ColumnDef::new(SpinHistory::RewardId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SpinHistory::RewardValue)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SpinHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_spin_history_user_created")
                    .table(SpinHistory::Table)
                    .col(SpinHistory::UserId)
                    .col(SpinHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // history rows outlive catalog edits, so no cascade
        manager
            .alter_table(
                Table::alter()
                    .table(SpinHistory::Table)
                    .add_foreign_key(
                        TableForeignKey::new()
                            .name("fk_spin_history_reward")
                            .from_tbl(SpinHistory::Table)
                            .from_col(SpinHistory::RewardId)
                            .to_tbl(SpinRewards::Table)
                            .to_col(SpinRewards::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(SpinHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(SpinRewards::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Referrals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(VipLevels::Table).to_owned())
            .await?;
        Ok(())
    }
}
