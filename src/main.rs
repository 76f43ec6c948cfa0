use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use local_basket_backend::{
    config::Config,
    database::{SchemaDescriptor, create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
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

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration");
    let commission_defaults = config
        .commission
        .settings()
        .expect("Invalid commission configuration");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 启动时读取一次表结构，之后只通过管理接口刷新
    let schema = SchemaDescriptor::load(&pool)
        .await
        .expect("Failed to read the sellers table schema");
    log::info!(
        "Seller schema loaded: bank details {}",
        if schema.has_bank_details() { "available" } else { "missing" }
    );
    let schema = schema.into_shared();

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 创建服务
    let audit_service = AuditService::new(pool.clone());
    let seller_service = SellerService::new(pool.clone(), schema);
    let commission_service = CommissionService::new(pool.clone(), commission_defaults);
    let order_service = OrderService::new(pool.clone());
    let payout_service = PayoutService::new(
        pool.clone(),
        seller_service.clone(),
        commission_service.clone(),
    );
    let import_service = ImportService::new(pool.clone());

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(audit_service.clone()))
            .app_data(web::Data::new(seller_service.clone()))
            .app_data(web::Data::new(commission_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .app_data(web::Data::new(payout_service.clone()))
            .app_data(web::Data::new(import_service.clone()))
            .configure(swagger_config)
            .configure(handlers::health_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::order_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
