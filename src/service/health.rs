//! Liveness endpoint for process supervisors.
//!
//! Carries no business logic: `GET /` answers with a fixed plaintext body no
//! matter what the chat listener or the model server are doing.

use axum::{Router, routing::get};
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::{error, info, instrument};

use crate::base::{
    config::Config,
    messages,
    types::{Res, Void},
};

/// Build the liveness router.
pub fn router() -> Router {
    Router::new().route("/", get(health))
}

/// `GET /` handler.
async fn health() -> &'static str {
    messages::HEALTH_BODY
}

/// Serve the liveness endpoint on an already bound listener until the process exits.
pub async fn serve(listener: TcpListener) -> Void {
    axum::serve(listener, router()).await?;
    Ok(())
}

/// Bind the liveness endpoint from the config and run it on its own task.
#[instrument(skip_all)]
pub async fn spawn(config: &Config) -> Res<JoinHandle<()>> {
    let addr = config.health_addr();
    let listener = TcpListener::bind(&addr).await.map_err(|e| anyhow::anyhow!("Failed to bind liveness endpoint to `{addr}`: {e}"))?;

    info!("Liveness endpoint listening on {} ...", addr);

    Ok(tokio::spawn(async move {
        if let Err(err) = serve(listener).await {
            error!("Liveness endpoint stopped: {}", err);
        }
    }))
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    async fn spawn_local() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(serve(listener));

        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn test_health_returns_plaintext_ok() {
        let url = spawn_local().await;

        let response = reqwest::get(&url).await.unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert!(response.headers()[reqwest::header::CONTENT_TYPE].to_str().unwrap().starts_with("text/plain"));

        let body = response.text().await.unwrap();
        assert!(!body.is_empty());
        assert_eq!(body, messages::HEALTH_BODY);
    }

    #[tokio::test]
    async fn test_health_unknown_path_is_not_found() {
        let url = spawn_local().await;

        let response = reqwest::get(format!("{url}nope")).await.unwrap();

        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }
}
