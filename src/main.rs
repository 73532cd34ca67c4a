use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write;

use cashbucks_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::MpesaService,
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

fn init_logger() {
    // One JSON object per line
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&record.args().to_string())
                .unwrap_or_else(|_| "\"<unprintable>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let config =
        Config::from_toml().map_err(|e| anyhow::anyhow!("failed to load configuration: {e}"))?;

    let pool = create_pool(&config.database)
        .await
        .context("failed to connect to the database")?;
    run_migrations(&pool)
        .await
        .context("failed to run database migrations")?;

    let jwt_service = JwtService::new(
        &config.jwt.secret,
        config.jwt.access_token_expires_in,
        config.jwt.refresh_token_expires_in,
    );
    if config.identity.shared_secret.is_empty() {
        log::warn!("IDENTITY_SHARED_SECRET is empty, sign-in is disabled");
    }
    let mpesa = MpesaService::new(config.mpesa.clone());

    let wallet_service = WalletService::new(pool.clone());
    let user_service = UserService::new(pool.clone(), wallet_service.clone());
    let vip_service = VipService::new(pool.clone());
    let auth_service = AuthService::new(
        pool.clone(),
        jwt_service.clone(),
        config.identity.clone(),
    );
    let task_service = TaskService::new(pool.clone(), vip_service.clone(), user_service.clone());
    let withdrawal_service = WithdrawalService::new(pool.clone(), wallet_service.clone(), mpesa);
    let referral_service = ReferralService::new(pool.clone());
    let spin_service = SpinService::new(pool.clone());
    let notification_service = NotificationService::new(pool.clone());
    let business_service = BusinessService::new(pool.clone());
    let setting_service = SettingService::new(pool.clone());
    let fraud_service = FraudService::new(pool.clone());
    let admin_service = AdminService::new(pool.clone());

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(wallet_service.clone()))
            .app_data(web::Data::new(vip_service.clone()))
            .app_data(web::Data::new(task_service.clone()))
            .app_data(web::Data::new(withdrawal_service.clone()))
            .app_data(web::Data::new(referral_service.clone()))
            .app_data(web::Data::new(spin_service.clone()))
            .app_data(web::Data::new(notification_service.clone()))
            .app_data(web::Data::new(business_service.clone()))
            .app_data(web::Data::new(setting_service.clone()))
            .app_data(web::Data::new(fraud_service.clone()))
            .app_data(web::Data::new(admin_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::user_config)
                    .configure(handlers::wallet_config)
                    .configure(handlers::task_config)
                    .configure(handlers::vip_config)
                    .configure(handlers::referral_config)
                    .configure(handlers::spin_config)
                    .configure(handlers::notification_config)
                    .configure(handlers::business_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    Ok(())
}
