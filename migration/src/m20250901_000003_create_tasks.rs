use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Businesses {
    Table,
    Id,
    UserId,
    BusinessName,
    BusinessEmail,
    BusinessPhone,
    BusinessLogo,
    BusinessDescription,
    WalletBalance,
    IsVerified,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Tasks {
    Table,
    Id,
    BusinessId,
    Title,
    Description,
    Category,
    RewardAmount,
    TotalSlots,
    CompletedSlots,
    RequiresProof,
    ProofInstructions,
    TaskUrl,
    TaskImage,
    Status,
    AdminNotes,
    ApprovedBy,
    ApprovedAt,
    ExpiresAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TaskCompletions {
    Table,
    Id,
    TaskId,
    UserId,
    ProofUrl,
    ProofText,
    Status,
    RewardAmount,
    ReviewedBy,
    ReviewedAt,
    RejectionReason,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

fn timestamp_now<T: IntoIden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp_with_time_zone()
        .not_null()
        .default(Expr::cust("NOW()"))
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Businesses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Businesses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Businesses::UserId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Businesses::BusinessName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Businesses::BusinessEmail)
                            .string_len(320)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Businesses::BusinessPhone)
                            .string_len(20)
                            .null(),
                    )
                    .col(ColumnDef::new(Businesses::BusinessLogo).text().null())
                    .col(ColumnDef::new(Businesses::BusinessDescription).text().null())
                    .col(
                        ColumnDef::new(Businesses::WalletBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Businesses::IsVerified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Businesses::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(&mut timestamp_now(Businesses::CreatedAt))
                    .col(&mut timestamp_now(Businesses::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Tasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tasks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tasks::BusinessId).big_integer().not_null())
                    .col(ColumnDef::new(Tasks::Title).string_len(255).not_null())
                    .col(ColumnDef::new(Tasks::Description).text().not_null())
                    .col(ColumnDef::new(Tasks::Category).string_len(100).null())
                    .col(ColumnDef::new(Tasks::RewardAmount).big_integer().not_null())
                    .col(
                        ColumnDef::new(Tasks::TotalSlots)
                            .integer()
                            .not_null()
                            .default(100),
                    )
                    .col(
                        ColumnDef::new(Tasks::CompletedSlots)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Tasks::RequiresProof)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Tasks::ProofInstructions).text().null())
                    .col(ColumnDef::new(Tasks::TaskUrl).text().null())
                    .col(ColumnDef::new(Tasks::TaskImage).text().null())
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .custom(Alias::new("task_status"))
                            .not_null()
                            .default(Expr::cust("'draft'::task_status")),
                    )
                    .col(ColumnDef::new(Tasks::AdminNotes).text().null())
                    .col(ColumnDef::new(Tasks::ApprovedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Tasks::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Tasks::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(&mut timestamp_now(Tasks::CreatedAt))
                    .col(&mut timestamp_now(Tasks::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tasks_business")
                    .table(Tasks::Table)
                    .col(Tasks::BusinessId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_tasks_status")
                    .table(Tasks::Table)
                    .col(Tasks::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TaskCompletions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TaskCompletions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TaskCompletions::TaskId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TaskCompletions::UserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TaskCompletions::ProofUrl).text().null())
                    .col(ColumnDef::new(TaskCompletions::ProofText).text().null())
                    .col(
                        ColumnDef::new(TaskCompletions::Status)
                            .custom(Alias::new("task_completion_status"))
                            .not_null()
                            .default(Expr::cust("'pending'::task_completion_status")),
                    )
                    .col(
                        ColumnDef::new(TaskCompletions::RewardAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TaskCompletions::ReviewedBy)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(TaskCompletions::ReviewedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(TaskCompletions::RejectionReason).text().null())
                    .col(&mut timestamp_now(TaskCompletions::CreatedAt))
                    .col(&mut timestamp_now(TaskCompletions::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // at most one completion per (task, user)
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_task_completions_task_user_unique")
                    .table(TaskCompletions::Table)
                    .col(TaskCompletions::TaskId)
                    .col(TaskCompletions::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_task_completions_status")
                    .table(TaskCompletions::Table)
                    .col(TaskCompletions::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(TaskCompletions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Tasks::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().if_exists().table(Businesses::Table).to_owned())
            .await?;
        Ok(())
    }
}
