// Router assembly: public, protected (JWT) and elevated (cron secret) tiers
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, Uri},
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::config;
use crate::error::ApiError;
use crate::handlers::{elevated, protected, public};
use crate::middleware::{cron_secret_middleware, jwt_auth_middleware};

pub fn app() -> Router {
    let config = config();

    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/health", get(public::health))
        // Protected API
        .merge(protected_routes())
        // Scheduled jobs
        .merge(system_routes())
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn protected_routes() -> Router {
    Router::new()
        .merge(user_routes())
        .merge(attraction_routes())
        .merge(date_routes())
        .merge(calendar_routes())
        .merge(notification_routes())
        .merge(transaction_routes())
        .route_layer(middleware::from_fn(jwt_auth_middleware))
}

fn user_routes() -> Router {
    use protected::users;

    Router::new()
        .route("/api/users", post(users::user_create).patch(users::user_update))
        .route("/api/users/tokens", get(users::user_tokens))
        .route("/api/users/push-token", post(users::user_push_token))
        .route("/api/users/block", post(users::user_block))
        .route("/api/users/unblock", post(users::user_unblock))
        .route("/api/users/me", axum::routing::delete(users::user_delete))
        .route("/api/users/me/blocked", get(users::user_blocked_list))
        .route("/api/users/me/mark-calendar-tutorial-seen", post(users::user_tutorial_seen))
        .route("/api/users/:id", get(users::user_get))
}

fn attraction_routes() -> Router {
    use protected::attractions;

    Router::new()
        .route("/api/attraction", post(attractions::attraction_post))
        .route("/api/attraction/:userFrom/:userTo/:date", get(attractions::attraction_get))
        .route("/api/attractions/:userFrom/:userTo", get(attractions::attractions_between))
}

fn date_routes() -> Router {
    use protected::dates;

    Router::new()
        .route("/api/date", post(dates::date_post))
        .route("/api/date/:userFrom/:userTo/:date", get(dates::date_between))
        .route("/api/dates/me/upcoming", get(dates::dates_upcoming))
        .route("/api/dates/resolve-conflict", post(dates::date_resolve_conflict))
        .route("/api/dates/:dateId", get(dates::date_get).patch(dates::date_patch))
        .route("/api/dates/:dateId/cancel", patch(dates::date_cancel))
        .route("/api/dates/:dateId/feedback", patch(dates::date_feedback))
}

fn calendar_routes() -> Router {
    use protected::{calendar_days, stories, videos};

    Router::new()
        .route("/api/calendarDays", post(calendar_days::calendar_day_post))
        .route("/api/calendarDays/user", get(calendar_days::calendar_days_list))
        .route("/api/calendarDays/active-dates", get(calendar_days::calendar_active_dates))
        .route("/api/calendarDays/by-user/:userId/:date", get(calendar_days::calendar_day_get))
        .route(
            "/api/calendarDays/:date/video",
            put(calendar_days::calendar_video_put).delete(calendar_days::calendar_video_delete),
        )
        .route("/api/calendarDays/:date/refresh-status", post(calendar_days::calendar_video_refresh))
        .route("/api/stories/:date", get(stories::stories_get))
        .route("/api/videos/playable-url", get(videos::playable_url_get))
}

fn notification_routes() -> Router {
    use protected::notifications;

    Router::new()
        .route("/api/notifications", get(notifications::notifications_list))
        .route("/api/notifications/unread-count", get(notifications::notifications_unread_count))
        .route("/api/notifications/mark-as-read", post(notifications::notifications_mark_read))
}

fn transaction_routes() -> Router {
    use protected::transactions;

    Router::new()
        .route("/api/transactions/me", get(transactions::transactions_list))
        .route("/api/transactions/purchase", post(transactions::transactions_purchase))
        .route("/api/transactions/spend", post(transactions::transactions_spend))
}

fn system_routes() -> Router {
    Router::new()
        .route("/api/system/replenish-tokens", post(elevated::system::replenish_tokens))
        .route_layer(middleware::from_fn(cron_secret_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::not_found(format!("Route not found: {} {}", method, uri.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let request = Request::builder().uri("/api/nope").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Route not found: GET /api/nope");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn protected_route_requires_bearer_token() {
        let request = Request::builder().uri("/api/users/tokens").body(Body::empty()).unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn system_route_rejects_wrong_secret() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/system/replenish-tokens")
            .header("x-cron-secret", "definitely-not-the-secret")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Forbidden.");
    }
}
