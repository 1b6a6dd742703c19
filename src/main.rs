use abacus::routes::health;
use abacus::{db, routes, Config};
use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let pool = db::connect(&config.database_url)
        .await
        .expect("Failed to open the database");
    db::init_schema(&pool)
        .await
        .expect("Failed to initialize the database schema");

    log::info!("Starting Abacus server at {}", config.server_url());

    let bind_addr = (config.server_host.clone(), config.server_port);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(config.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::index)
            .service(health::health)
            .configure(routes::config)
    })
    .bind(bind_addr)?
    .run()
    .await
}
