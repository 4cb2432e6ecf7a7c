use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub jwt_secret: String,
    pub scheduler_secret: String,

    pub scoring_endpoint: String,
    pub scoring_flow_id: String,
    pub scoring_flow_alias: String,
    pub scoring_timeout_secs: u64,

    pub neutral_threshold: f64,

    pub mail_relay_url: String,
    pub mail_from: String,

    pub batch_concurrency: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            scheduler_secret: env::var("SCHEDULER_SECRET").unwrap_or_else(|_| String::new()),

            scoring_endpoint: env::var("SCORING_ENDPOINT").unwrap_or_else(|_| String::new()),
            scoring_flow_id: env::var("SCORING_FLOW_ID").unwrap_or_else(|_| String::new()),
            scoring_flow_alias: env::var("SCORING_FLOW_ALIAS")
                .unwrap_or_else(|_| String::new()),
            scoring_timeout_secs: env::var("SCORING_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .expect("SCORING_TIMEOUT_SECS must be a number"),

            neutral_threshold: env::var("NEUTRAL_THRESHOLD")
                .unwrap_or_else(|_| "5.0".into())
                .parse()
                .unwrap_or(5.0),

            mail_relay_url: env::var("MAIL_RELAY_URL").unwrap_or_else(|_| String::new()),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "reports@diarypulse.app".into()),

            batch_concurrency: env::var("BATCH_CONCURRENCY")
                .unwrap_or_else(|_| "8".into())
                .parse()
                .unwrap_or(8),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
