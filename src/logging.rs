use env_logger::Env;

pub const TRACING_ENV: &str = "RATING_MATCHER_TRACING";

fn tracing_requested() -> bool {
    std::env::var(TRACING_ENV)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn init_tracing_from_env() {
    // Bridge log:: macros into tracing so library code keeps using the facade
    let _ = tracing_log::LogTracer::init();
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// env_logger by default; tracing-subscriber when `RATING_MATCHER_TRACING=1`.
pub fn init_logging() {
    if tracing_requested() {
        init_tracing_from_env();
    } else {
        let _ = env_logger::Builder::from_env(Env::default().default_filter_or("info")).try_init();
    }
}
