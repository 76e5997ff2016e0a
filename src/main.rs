//! Courtside Back binary entrypoint wiring the session engine, its clock driver, REST and SSE.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courtside_back::{
    config::AppConfig,
    feedback::{
        FeedbackEmitter, FeedbackPort, FeedbackProfile,
        output::{AudioOutput, NullAudio, TracingHaptics},
    },
    routes,
    services::{clock_driver, session_events},
    state::{AppState, SharedState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let feedback = build_feedback(config.parameters.feedback);
    let app_state = AppState::new(config, feedback);

    clock_driver::spawn_clock_driver(app_state.clone());
    session_events::spawn_session_relay(app_state.clone()).await;
    // Build the HTTP router once the shared state is ready.
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Emitter on the default sound device when built with `speaker`, silent otherwise.
fn build_feedback(profile: FeedbackProfile) -> Arc<dyn FeedbackPort> {
    let audio: Arc<dyn AudioOutput> = speaker_output().unwrap_or_else(|| {
        warn!("no audio output compiled in; cues are dropped");
        Arc::new(NullAudio)
    });
    Arc::new(FeedbackEmitter::new(profile, audio, Arc::new(TracingHaptics)))
}

/// Starts opening the device right away so the first cue finds it ready.
#[cfg(feature = "speaker")]
fn speaker_output() -> Option<Arc<dyn AudioOutput>> {
    let speaker = courtside_back::feedback::speaker::SpeakerOutput::new();
    speaker.resume();
    Some(Arc::new(speaker))
}

#[cfg(not(feature = "speaker"))]
fn speaker_output() -> Option<Arc<dyn AudioOutput>> {
    None
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
