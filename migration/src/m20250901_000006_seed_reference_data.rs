use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Default VIP tiers, spin wheel catalog and platform settings.
///
/// VIP tiers (level / name / min tasks / min earnings / multiplier % / cooldown days / min withdrawal):
/// - 0 Starter    0 / 0      100  14  100
/// - 1 Bronze    10 / 500    110  10   75
/// - 2 Silver    50 / 2500   125   7   50
/// - 3 Gold     150 / 7500   150   5   50
/// - 4 Platinum 300 / 15000  175   3   50
/// - 5 Diamond  500 / 25000  200   1   50
///
/// Spin wheel: 5/10/20/50/100 CB Points weighted 30/25/20/15/7.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        let backend = manager.get_database_backend();

        let vip_sql = r#"
INSERT INTO vip_levels (level, name, min_tasks, min_earnings, task_reward_multiplier, withdrawal_cooldown, withdrawal_min_amount, badge_image, benefits)
VALUES
 (0, 'Starter',    0,     0, 100, 14, 100, '/images/badges/vip-0.png', '["Basic task access"]'),
 (1, 'Bronze',    10,   500, 110, 10,  75, '/images/badges/vip-1.png', '["10% bonus rewards"]'),
 (2, 'Silver',    50,  2500, 125,  7,  50, '/images/badges/vip-2.png', '["25% bonus rewards"]'),
 (3, 'Gold',     150,  7500, 150,  5,  50, '/images/badges/vip-3.png', '["50% bonus rewards"]'),
 (4, 'Platinum', 300, 15000, 175,  3,  50, '/images/badges/vip-4.png', '["75% bonus rewards"]'),
 (5, 'Diamond',  500, 25000, 200,  1,  50, '/images/badges/vip-5.png', '["100% bonus rewards"]')
ON CONFLICT (level) DO NOTHING;
"#;
        conn.execute(Statement::from_string(backend, vip_sql.to_string()))
            .await?;

        // spin_rewards has no natural key; only seed an empty catalog
        let spin_sql = r#"
INSERT INTO spin_rewards (reward_type, reward_value, probability, display_text, is_active)
SELECT v.reward_type::spin_reward_type, v.reward_value, v.probability, v.display_text, TRUE
FROM (VALUES
 ('cb_points',   5, 30, '5 CB Points'),
 ('cb_points',  10, 25, '10 CB Points'),
 ('cb_points',  20, 20, '20 CB Points'),
 ('cb_points',  50, 15, '50 CB Points'),
 ('cb_points', 100,  7, '100 CB Points')
) AS v(reward_type, reward_value, probability, display_text)
WHERE NOT EXISTS (SELECT 1 FROM spin_rewards);
"#;
        conn.execute(Statement::from_string(backend, spin_sql.to_string()))
            .await?;

        let settings_sql = r#"
INSERT INTO settings (key, value, description)
VALUES
 ('platform_name', 'CashBucks', 'Platform name'),
 ('referral_bonus', '5', 'Fixed referral bonus in Ksh')
ON CONFLICT (key) DO NOTHING;
"#;
        conn.execute(Statement::from_string(backend, settings_sql.to_string()))
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();
        let backend = manager.get_database_backend();
        conn.execute(Statement::from_string(
            backend,
            "DELETE FROM settings WHERE key IN ('platform_name', 'referral_bonus');".to_string(),
        ))
        .await?;
        Ok(())
    }
}
