//! API v0 endpoints.
//!
//! Version 0 signals an unstable API -- breaking changes are expected
//! until the clock reaches 1.0.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::warn;
use utoipa_axum::{router::OpenApiRouter, routes};

use super::server::SharedState;
use super::types::{
    MessageResponse, OverrideCreate, OverrideFilter, SettingsPatch, SettingsResponse,
    StatusResponse,
};
use super::ApiError;
use crate::engine::monitor::apply_player_action;
use crate::error::Error;
use crate::store::{Alarm, AlarmPatch, NewAlarm, Override, OverridePatch};
use crate::types::{AlarmId, DayTag, OverrideId};

/// Build the v0 API routes with OpenAPI metadata.
pub fn routes() -> OpenApiRouter<SharedState> {
    OpenApiRouter::new()
        .routes(routes!(health))
        .routes(routes!(get_alarms, create_alarm))
        .routes(routes!(get_alarm, put_alarm, delete_alarm))
        .routes(routes!(toggle_alarm))
        .routes(routes!(get_overrides, create_override))
        .routes(routes!(get_override, put_override, delete_override))
        .routes(routes!(get_status))
        .routes(routes!(snooze))
        .routes(routes!(dismiss))
        .routes(routes!(get_sounds))
        .routes(routes!(preview_sound))
        .routes(routes!(stop_sound))
        .routes(routes!(get_settings, put_settings))
}

/// Reject a sound name the player has never heard of. An empty asset
/// list means the device has no sounds installed yet; anything is
/// accepted then so alarms can be set up in advance.
fn validate_sound(state: &SharedState, sound: Option<&str>) -> Result<(), ApiError> {
    let Some(sound) = sound else {
        return Ok(());
    };
    let sounds = state.player.available_sounds();
    if sounds.is_empty() || sounds.iter().any(|s| s == sound) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!("unknown sound: {sound}")).into())
    }
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = OK, description = "Server is running", body = String),
    ),
)]
async fn health() -> &'static str {
    "OK"
}

/// Return all alarms.
#[utoipa::path(
    get,
    path = "/alarms",
    tag = "alarms",
    responses(
        (status = OK, description = "All alarms", body = Vec<Alarm>),
    ),
)]
async fn get_alarms(State(state): State<SharedState>) -> Json<Vec<Alarm>> {
    Json(state.engine.lock().store().alarms().cloned().collect())
}

/// Create a new alarm.
#[utoipa::path(
    post,
    path = "/alarms",
    tag = "alarms",
    request_body = NewAlarm,
    responses(
        (status = CREATED, description = "Created alarm", body = Alarm),
        (status = BAD_REQUEST, description = "Invalid time, empty day set, or unknown sound"),
    ),
)]
async fn create_alarm(
    State(state): State<SharedState>,
    Json(new): Json<NewAlarm>,
) -> Result<(axum::http::StatusCode, Json<Alarm>), ApiError> {
    validate_sound(&state, Some(new.sound.as_str()))?;
    let alarm = state.engine.lock().store_mut().add(new)?;
    Ok((axum::http::StatusCode::CREATED, Json(alarm)))
}

/// Return a single alarm, or 404 if not found.
#[utoipa::path(
    get,
    path = "/alarms/{id}",
    tag = "alarms",
    params(
        ("id" = String, Path, description = "Alarm id"),
    ),
    responses(
        (status = OK, description = "Alarm details", body = Alarm),
        (status = NOT_FOUND, description = "Alarm not found"),
    ),
)]
async fn get_alarm(
    State(state): State<SharedState>,
    Path(id): Path<AlarmId>,
) -> Result<Json<Alarm>, ApiError> {
    let engine = state.engine.lock();
    let alarm = engine
        .store()
        .get(&id)
        .cloned()
        .ok_or(Error::AlarmNotFound(id))?;
    Ok(Json(alarm))
}

/// Apply partial updates to an alarm.
#[utoipa::path(
    put,
    path = "/alarms/{id}",
    tag = "alarms",
    params(
        ("id" = String, Path, description = "Alarm id"),
    ),
    request_body = AlarmPatch,
    responses(
        (status = OK, description = "Updated alarm", body = Alarm),
        (status = NOT_FOUND, description = "Alarm not found"),
        (status = BAD_REQUEST, description = "Invalid update"),
    ),
)]
async fn put_alarm(
    State(state): State<SharedState>,
    Path(id): Path<AlarmId>,
    Json(patch): Json<AlarmPatch>,
) -> Result<Json<Alarm>, ApiError> {
    validate_sound(&state, patch.sound.as_deref())?;
    let alarm = state.engine.lock().store_mut().update(&id, patch)?;
    Ok(Json(alarm))
}

/// Delete an alarm and all overrides referencing it.
#[utoipa::path(
    delete,
    path = "/alarms/{id}",
    tag = "alarms",
    params(
        ("id" = String, Path, description = "Alarm id"),
    ),
    responses(
        (status = OK, description = "Alarm deleted", body = MessageResponse),
        (status = NOT_FOUND, description = "Alarm not found"),
    ),
)]
async fn delete_alarm(
    State(state): State<SharedState>,
    Path(id): Path<AlarmId>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.engine.lock().store_mut().remove(&id)?;
    Ok(Json(MessageResponse::new("Alarm deleted")))
}

/// Toggle an alarm's enabled state.
#[utoipa::path(
    post,
    path = "/alarms/{id}/toggle",
    tag = "alarms",
    params(
        ("id" = String, Path, description = "Alarm id"),
    ),
    responses(
        (status = OK, description = "Toggled alarm", body = Alarm),
        (status = NOT_FOUND, description = "Alarm not found"),
    ),
)]
async fn toggle_alarm(
    State(state): State<SharedState>,
    Path(id): Path<AlarmId>,
) -> Result<Json<Alarm>, ApiError> {
    let alarm = state.engine.lock().store_mut().toggle(&id)?;
    Ok(Json(alarm))
}

/// Return overrides, optionally filtered by alarm.
#[utoipa::path(
    get,
    path = "/overrides",
    tag = "overrides",
    params(OverrideFilter),
    responses(
        (status = OK, description = "Overrides", body = Vec<Override>),
    ),
)]
async fn get_overrides(
    State(state): State<SharedState>,
    Query(filter): Query<OverrideFilter>,
) -> Json<Vec<Override>> {
    Json(
        state
            .engine
            .lock()
            .store()
            .overrides(filter.alarm_id.as_ref()),
    )
}

/// Create an override for one (alarm, date) occurrence.
///
/// If an override already exists for the pair, it is updated instead
/// of duplicated.
#[utoipa::path(
    post,
    path = "/overrides",
    tag = "overrides",
    request_body = OverrideCreate,
    responses(
        (status = CREATED, description = "Created or updated override", body = Override),
        (status = NOT_FOUND, description = "Referenced alarm not found"),
        (status = BAD_REQUEST, description = "Invalid date, time, or sound"),
    ),
)]
async fn create_override(
    State(state): State<SharedState>,
    Json(body): Json<OverrideCreate>,
) -> Result<(axum::http::StatusCode, Json<Override>), ApiError> {
    validate_sound(&state, body.override_sound.as_deref())?;
    let overridden = state.engine.lock().store_mut().upsert_override(
        &body.alarm_id,
        body.target_date,
        OverridePatch {
            override_time: body.override_time,
            override_sound: body.override_sound,
            skip: body.skip,
        },
    )?;
    Ok((axum::http::StatusCode::CREATED, Json(overridden)))
}

/// Return a single override, or 404 if not found.
#[utoipa::path(
    get,
    path = "/overrides/{id}",
    tag = "overrides",
    params(
        ("id" = String, Path, description = "Override id"),
    ),
    responses(
        (status = OK, description = "Override details", body = Override),
        (status = NOT_FOUND, description = "Override not found"),
    ),
)]
async fn get_override(
    State(state): State<SharedState>,
    Path(id): Path<OverrideId>,
) -> Result<Json<Override>, ApiError> {
    let engine = state.engine.lock();
    let overridden = engine
        .store()
        .get_override(&id)
        .cloned()
        .ok_or(Error::OverrideNotFound(id))?;
    Ok(Json(overridden))
}

/// Apply partial updates to an override.
#[utoipa::path(
    put,
    path = "/overrides/{id}",
    tag = "overrides",
    params(
        ("id" = String, Path, description = "Override id"),
    ),
    request_body = OverridePatch,
    responses(
        (status = OK, description = "Updated override", body = Override),
        (status = NOT_FOUND, description = "Override not found"),
    ),
)]
async fn put_override(
    State(state): State<SharedState>,
    Path(id): Path<OverrideId>,
    Json(patch): Json<OverridePatch>,
) -> Result<Json<Override>, ApiError> {
    validate_sound(&state, patch.override_sound.as_deref())?;
    let overridden = state.engine.lock().store_mut().update_override(&id, patch)?;
    Ok(Json(overridden))
}

/// Delete an override, restoring the recurring default.
#[utoipa::path(
    delete,
    path = "/overrides/{id}",
    tag = "overrides",
    params(
        ("id" = String, Path, description = "Override id"),
    ),
    responses(
        (status = OK, description = "Override deleted", body = MessageResponse),
        (status = NOT_FOUND, description = "Override not found"),
    ),
)]
async fn delete_override(
    State(state): State<SharedState>,
    Path(id): Path<OverrideId>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.engine.lock().store_mut().remove_override(&id)?;
    Ok(Json(MessageResponse::new("Override deleted")))
}

/// Return the current status snapshot.
#[utoipa::path(
    get,
    path = "/status",
    tag = "control",
    responses(
        (status = OK, description = "Current status", body = StatusResponse),
    ),
)]
async fn get_status(State(state): State<SharedState>) -> Json<StatusResponse> {
    let now = state.clock.now();
    let engine = state.engine.lock();
    let time = now.time();
    Json(StatusResponse {
        time: format!(
            "{:02}:{:02}:{:02}",
            time.hour(),
            time.minute(),
            time.second()
        ),
        date: now.date(),
        day: DayTag::from(now.date().weekday()),
        alarm_ringing: engine.is_ringing(),
        next_alarm: engine.next_alarm(now),
    })
}

/// Snooze the currently ringing alarm.
#[utoipa::path(
    post,
    path = "/snooze",
    tag = "control",
    responses(
        (status = OK, description = "Alarm snoozed", body = MessageResponse),
        (status = BAD_REQUEST, description = "No alarm currently ringing"),
    ),
)]
async fn snooze(State(state): State<SharedState>) -> Result<Json<MessageResponse>, ApiError> {
    let now = state.clock.now();
    let action = state.engine.lock().snooze(now)?;
    apply_player_action(&*state.player, &*state.display, action).await;
    Ok(Json(MessageResponse::new("Alarm snoozed")))
}

/// Dismiss the currently ringing (or snoozed) alarm.
#[utoipa::path(
    post,
    path = "/dismiss",
    tag = "control",
    responses(
        (status = OK, description = "Alarm dismissed", body = MessageResponse),
        (status = BAD_REQUEST, description = "No alarm currently ringing"),
    ),
)]
async fn dismiss(State(state): State<SharedState>) -> Result<Json<MessageResponse>, ApiError> {
    let action = state.engine.lock().dismiss()?;
    apply_player_action(&*state.player, &*state.display, action).await;
    Ok(Json(MessageResponse::new("Alarm dismissed")))
}

/// List the available alarm sounds.
#[utoipa::path(
    get,
    path = "/sounds",
    tag = "sounds",
    responses(
        (status = OK, description = "Available sounds", body = Vec<String>),
    ),
)]
async fn get_sounds(State(state): State<SharedState>) -> Json<Vec<String>> {
    Json(state.player.available_sounds())
}

/// Play a sound once for previewing.
#[utoipa::path(
    post,
    path = "/sounds/preview/{name}",
    tag = "sounds",
    params(
        ("name" = String, Path, description = "Sound name"),
    ),
    responses(
        (status = OK, description = "Playing preview", body = MessageResponse),
        (status = BAD_GATEWAY, description = "Playback failed"),
    ),
)]
async fn preview_sound(
    State(state): State<SharedState>,
    Path(name): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.player.preview(&name).await?;
    Ok(Json(MessageResponse::new("Playing preview")))
}

/// Stop any playing sound.
#[utoipa::path(
    post,
    path = "/sounds/stop",
    tag = "sounds",
    responses(
        (status = OK, description = "Sound stopped", body = MessageResponse),
    ),
)]
async fn stop_sound(State(state): State<SharedState>) -> Result<Json<MessageResponse>, ApiError> {
    state.player.stop().await?;
    Ok(Json(MessageResponse::new("Sound stopped")))
}

/// Return the current settings.
#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    responses(
        (status = OK, description = "Current settings", body = SettingsResponse),
    ),
)]
async fn get_settings(State(state): State<SharedState>) -> Json<SettingsResponse> {
    let config = state.config.lock();
    Json(SettingsResponse {
        snooze_minutes: config.snooze_minutes,
        display_brightness: config.display_brightness,
        volume: config.volume,
        default_sound: config.default_sound.clone(),
    })
}

/// Update settings and persist them to the config file.
#[utoipa::path(
    put,
    path = "/settings",
    tag = "settings",
    request_body = SettingsPatch,
    responses(
        (status = OK, description = "Updated settings", body = SettingsResponse),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to persist settings"),
    ),
)]
async fn put_settings(
    State(state): State<SharedState>,
    Json(patch): Json<SettingsPatch>,
) -> Result<Json<SettingsResponse>, ApiError> {
    // The config lock is released before the player call below.
    let (response, volume) = {
        let mut config = state.config.lock();

        if let Some(minutes) = patch.snooze_minutes {
            let minutes = minutes.clamp(1, 60);
            config.snooze_minutes = minutes;
            state.engine.lock().set_snooze_minutes(minutes);
        }
        if let Some(level) = patch.display_brightness {
            let level = level.min(15);
            config.display_brightness = level;
            state.display.set_brightness(level);
        }
        let volume = patch.volume.map(|v| v.min(100));
        if let Some(volume) = volume {
            config.volume = volume;
        }
        if let Some(sound) = patch.default_sound {
            config.default_sound = sound;
        }

        config.save(state.config_path.as_ref())?;

        (
            SettingsResponse {
                snooze_minutes: config.snooze_minutes,
                display_brightness: config.display_brightness,
                volume: config.volume,
                default_sound: config.default_sound.clone(),
            },
            volume,
        )
    };

    // Best-effort, like every player call: the persisted setting
    // stands even if the mixer is unreachable right now.
    if let Some(volume) = volume
        && let Err(err) = state.player.set_volume(volume).await
    {
        warn!(%err, volume, "Failed to apply volume");
    }

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::server::{router, SharedState};
    use crate::config::ClockConfig;
    use crate::engine::Engine;
    use crate::hw::{Clock, MockClock, MockDisplay, MockPlayer, PlayerEvent};
    use crate::store::testing::empty_store;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use parking_lot::Mutex;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use time::macros::datetime;
    use tower::ServiceExt;

    struct Fixture {
        state: SharedState,
        clock: Arc<MockClock>,
        player: Arc<MockPlayer>,
        _config_dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let config = ClockConfig::default();
        let engine = Arc::new(Mutex::new(Engine::new(empty_store(), &config)));
        let clock = Arc::new(MockClock::starting_at(datetime!(2026-03-02 06:00)));
        let player = Arc::new(MockPlayer::with_sounds(&["default.mp3", "gentle.mp3"]));
        let display = Arc::new(MockDisplay::default());
        let config_dir = tempfile::tempdir().unwrap();

        let state = SharedState {
            engine,
            clock: clock.clone(),
            player: player.clone(),
            display,
            config: Arc::new(Mutex::new(config)),
            config_path: Arc::new(config_dir.path().join("config.json")),
        };
        Fixture {
            state,
            clock,
            player,
            _config_dir: config_dir,
        }
    }

    async fn request(state: &SharedState, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(format!("/api/v0{uri}"))
            .header("content-type", "application/json");
        let req = match body {
            Some(body) => req.body(Body::from(body.to_string())).unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let response = router(state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        (status, value)
    }

    #[tokio::test]
    async fn create_then_list_alarms() {
        let f = fixture();

        let (status, created) = request(
            &f.state,
            "POST",
            "/alarms",
            Some(json!({"time": "07:00", "days": ["mon", "wed", "fri"]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["time"], "07:00");
        assert_eq!(created["sound"], "default.mp3");

        let (status, listed) = request(&f.state, "GET", "/alarms", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn create_alarm_with_empty_days_is_rejected() {
        let f = fixture();
        let (status, body) = request(
            &f.state,
            "POST",
            "/alarms",
            Some(json!({"time": "07:00", "days": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("days"));
    }

    #[tokio::test]
    async fn create_alarm_with_unknown_sound_is_rejected() {
        let f = fixture();
        let (status, _) = request(
            &f.state,
            "POST",
            "/alarms",
            Some(json!({"time": "07:00", "days": ["mon"], "sound": "unknown.mp3"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_alarm_is_404() {
        let f = fixture();
        let (status, _) = request(&f.state, "GET", "/alarms/deadbeef", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deleting_an_alarm_removes_its_overrides() {
        let f = fixture();
        let (_, alarm) = request(
            &f.state,
            "POST",
            "/alarms",
            Some(json!({"time": "07:00", "days": ["mon"]})),
        )
        .await;
        let id = alarm["id"].as_str().unwrap().to_owned();

        for date in ["2026-03-02", "2026-03-09"] {
            let (status, _) = request(
                &f.state,
                "POST",
                "/overrides",
                Some(json!({"alarm_id": id, "target_date": date, "skip": true})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, _) = request(&f.state, "DELETE", &format!("/alarms/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);

        let (_, overrides) = request(&f.state, "GET", "/overrides", None).await;
        assert!(overrides.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn override_upsert_returns_the_same_id() {
        let f = fixture();
        let (_, alarm) = request(
            &f.state,
            "POST",
            "/alarms",
            Some(json!({"time": "07:00", "days": ["mon"]})),
        )
        .await;
        let id = alarm["id"].as_str().unwrap().to_owned();

        let (_, first) = request(
            &f.state,
            "POST",
            "/overrides",
            Some(json!({"alarm_id": id, "target_date": "2026-03-02", "override_time": "08:00"})),
        )
        .await;
        let (_, second) = request(
            &f.state,
            "POST",
            "/overrides",
            Some(json!({"alarm_id": id, "target_date": "2026-03-02", "skip": true})),
        )
        .await;

        assert_eq!(first["id"], second["id"]);
        assert_eq!(second["override_time"], "08:00");
        assert_eq!(second["skip"], true);
    }

    #[tokio::test]
    async fn status_reports_the_next_alarm() {
        let f = fixture();
        request(
            &f.state,
            "POST",
            "/alarms",
            Some(json!({"time": "07:00", "days": ["mon"]})),
        )
        .await;

        let (status, body) = request(&f.state, "GET", "/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["alarm_ringing"], false);
        assert_eq!(body["next_alarm"]["time"], "07:00");
        assert_eq!(body["next_alarm"]["minutes_until"], 60);
    }

    #[tokio::test]
    async fn snooze_while_idle_is_a_400() {
        let f = fixture();
        let (status, body) = request(&f.state, "POST", "/snooze", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("ringing"));
    }

    #[tokio::test]
    async fn dismiss_stops_playback() {
        let f = fixture();
        request(
            &f.state,
            "POST",
            "/alarms",
            Some(json!({"time": "07:00", "days": ["mon"]})),
        )
        .await;

        // Drive the engine to the due minute, as the monitor would.
        f.clock.set(datetime!(2026-03-02 07:00));
        f.state.engine.lock().tick(f.clock.now()).unwrap();

        let (status, _) = request(&f.state, "POST", "/dismiss", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(f.player.events.lock().last(), Some(&PlayerEvent::Stopped));
        assert!(!f.state.engine.lock().is_ringing());
    }

    #[tokio::test]
    async fn settings_round_trip_and_persist() {
        let f = fixture();

        let (status, body) = request(
            &f.state,
            "PUT",
            "/settings",
            Some(json!({"snooze_minutes": 12})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["snooze_minutes"], 12);
        assert_eq!(body["volume"], 80);
        assert_eq!(f.state.engine.lock().snooze_minutes(), 12);

        let saved = ClockConfig::load(f.state.config_path.as_ref()).unwrap();
        assert_eq!(saved.snooze_minutes, 12);
    }

    #[tokio::test]
    async fn volume_update_is_clamped_and_pushed_to_the_player() {
        let f = fixture();

        let (status, body) =
            request(&f.state, "PUT", "/settings", Some(json!({"volume": 150}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["volume"], 100);
        assert_eq!(
            f.player.events.lock().last(),
            Some(&PlayerEvent::VolumeSet(100))
        );

        let saved = ClockConfig::load(f.state.config_path.as_ref()).unwrap();
        assert_eq!(saved.volume, 100);
    }

    #[tokio::test]
    async fn unreachable_mixer_does_not_fail_the_settings_write() {
        let f = fixture();
        *f.player.fail_calls.lock() = true;

        let (status, body) =
            request(&f.state, "PUT", "/settings", Some(json!({"volume": 30}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["volume"], 30);
        let saved = ClockConfig::load(f.state.config_path.as_ref()).unwrap();
        assert_eq!(saved.volume, 30);
    }

    #[tokio::test]
    async fn sounds_are_listed_from_the_player() {
        let f = fixture();
        let (status, body) = request(&f.state, "GET", "/sounds", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["default.mp3", "gentle.mp3"]));
    }
}
