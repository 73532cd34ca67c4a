use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    OpenId,
    Name,
    Email,
    Phone,
    PhoneVerified,
    LoginMethod,
    Role,
    VipLevel,
    ProfileImage,
    ReferralCode,
    ReferredBy,
    TwoFactorEnabled,
    DailyLoginStreak,
    LastLoginDate,
    IsActive,
    IsSuspended,
    CreatedAt,
    UpdatedAt,
    LastSignedIn,
}

#[derive(DeriveIden)]
enum LoginLogs {
    Table,
    Id,
    UserId,
    IpAddress,
    UserAgent,
    LoginMethod,
    IsNewDevice,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Wallets {
    Table,
    Id,
    UserId,
    Balance,
    TotalEarned,
    TotalWithdrawn,
    TotalSpent,
    LastWithdrawalDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    UserId,
    TransactionType,
    Amount,
    BalanceBefore,
    BalanceAfter,
    Description,
    ReferenceId,
    ReferenceType,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Withdrawals {
    Table,
    Id,
    UserId,
    Amount,
    PhoneNumber,
    Status,
    TransferReference,
    AdminNotes,
    ApprovedBy,
    ApprovedAt,
    CompletedAt,
    RejectedReason,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

fn created_at<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::cust("NOW()"))
        .to_owned()
}

fn id<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(&mut id(Users::Id))
                    .col(
                        ColumnDef::new(Users::OpenId)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Name).text().null())
                    .col(ColumnDef::new(Users::Email).string_len(320).null())
                    .col(ColumnDef::new(Users::Phone).string_len(20).null())
                    .col(
                        ColumnDef::new(Users::PhoneVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::LoginMethod).string_len(64).null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .custom(Alias::new("user_role"))
                            .not_null()
                            .default(Expr::cust("'user'::user_role")),
                    )
                    .col(
                        ColumnDef::new(Users::VipLevel)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Users::ProfileImage).text().null())
                    .col(
                        ColumnDef::new(Users::ReferralCode)
                            .string_len(20)
                            .null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::ReferredBy).big_integer().null())
                    .col(
                        ColumnDef::new(Users::TwoFactorEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::DailyLoginStreak)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Users::LastLoginDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Users::IsSuspended)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(&mut created_at(Users::CreatedAt))
                    .col(&mut created_at(Users::UpdatedAt))
                    .col(&mut created_at(Users::LastSignedIn))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LoginLogs::Table)
                    .if_not_exists()
                    .col(&mut id(LoginLogs::Id))
                    .col(ColumnDef::new(LoginLogs::UserId).big_integer().not_null())
                    .col(ColumnDef::new(LoginLogs::IpAddress).string_len(45).null())
                    .col(ColumnDef::new(LoginLogs::UserAgent).text().null())
                    .col(ColumnDef::new(LoginLogs::LoginMethod).string_len(64).null())
                    .col(
                        ColumnDef::new(LoginLogs::IsNewDevice)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(&mut created_at(LoginLogs::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_login_logs_user")
                    .table(LoginLogs::Table)
                    .col(LoginLogs::UserId)
                    .to_owned(),
            )
            .await?;

        // one wallet per user
        manager
            .create_table(
                Table::create()
                    .table(Wallets::Table)
                    .if_not_exists()
                    .col(&mut id(Wallets::Id))
                    .col(
                        ColumnDef::new(Wallets::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Wallets::Balance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Wallets::TotalEarned)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Wallets::TotalWithdrawn)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Wallets::TotalSpent)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Wallets::LastWithdrawalDate)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut created_at(Wallets::CreatedAt))
                    .col(&mut created_at(Wallets::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(&mut id(Transactions::Id))
                    .col(
                        ColumnDef::new(Transactions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::TransactionType)
                            .custom(Alias::new("transaction_type"))
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Transactions::BalanceBefore)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transactions::BalanceAfter)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transactions::Description).text().null())
                    .col(ColumnDef::new(Transactions::ReferenceId).big_integer().null())
                    .col(
                        ColumnDef::new(Transactions::ReferenceType)
                            .string_len(50)
                            .null(),
                    )
                    .col(&mut created_at(Transactions::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_user_created")
                    .table(Transactions::Table)
                    .col(Transactions::UserId)
                    .col(Transactions::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Withdrawals::Table)
                    .if_not_exists()
                    .col(&mut id(Withdrawals::Id))
                    .col(ColumnDef::new(Withdrawals::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Withdrawals::Amount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Withdrawals::PhoneNumber)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::Status)
                            .custom(Alias::new("withdrawal_status"))
                            .not_null()
                            .default(Expr::cust("'pending'::withdrawal_status")),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::TransferReference)
                            .string_len(100)
                            .null(),
                    )
                    .col(ColumnDef::new(Withdrawals::AdminNotes).text().null())
                    .col(ColumnDef::new(Withdrawals::ApprovedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Withdrawals::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Withdrawals::CompletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(Withdrawals::RejectedReason).text().null())
                    .col(&mut created_at(Withdrawals::CreatedAt))
                    .col(&mut created_at(Withdrawals::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_withdrawals_user")
                    .table(Withdrawals::Table)
                    .col(Withdrawals::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_withdrawals_status")
                    .table(Withdrawals::Table)
                    .col(Withdrawals::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Withdrawals::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Wallets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(LoginLogs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
