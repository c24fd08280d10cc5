// handlers/public/root.rs - GET / handler

use axum::response::Json;
use serde_json::{json, Value};

pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "datecal-api",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Dating calendar backend: stories, attractions, dates and tokens",
            "endpoints": {
                "health": "/health, /api/health (public)",
                "users": "/api/users[/*] (protected)",
                "attractions": "/api/attraction, /api/attractions/* (protected)",
                "dates": "/api/date, /api/dates/* (protected)",
                "calendar": "/api/calendarDays/*, /api/stories/:date (protected)",
                "videos": "/api/videos/playable-url (protected)",
                "notifications": "/api/notifications[/*] (protected)",
                "transactions": "/api/transactions/* (protected)",
                "system": "/api/system/replenish-tokens (cron secret)"
            }
        }
    }))
}
