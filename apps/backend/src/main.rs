use actix_web::{web, App, HttpServer};
use db_infra::config::db::{DbKind, RuntimeEnv};
use signup_backend::config::SignupConfig;
use signup_backend::infra::state::build_state;
use signup_backend::middleware::request_trace::RequestTrace;
use signup_backend::middleware::structured_logger::StructuredLogger;
use signup_backend::middleware::trace_span::TraceSpan;
use signup_backend::routes;

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment:
    // - Docker: docker-compose env_file or docker run --env-file
    // - Local dev: source env files manually (e.g., set -a; . ./.env; set +a)
    let config = match SignupConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };
    let db_kind = match DbKind::from_env() {
        Ok(kind) => kind,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    println!(
        "🚀 Starting sign-up backend on http://{}:{}",
        config.host, config.port
    );

    let app_state = match build_state()
        .with_env(RuntimeEnv::Prod)
        .with_db(db_kind)
        .with_config(config.clone())
        .build()
        .await
    {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Failed to build application state: {e}");
            std::process::exit(1);
        }
    };

    println!("✅ Database connected ({})", db_kind.engine());

    let data = web::Data::new(app_state);

    HttpServer::new(move || {
        App::new()
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
