use crate::control_bridge::model::{
    ControlReply, EstimateModel, FrequencyRequest, StatusModel, WindowModel,
};
use crate::workflow::runner::{lock_session, SharedSession};
use anyhow::Context;
use chrono::Local;
use log::warn;
use serde::Serialize;
use serde_json::json;
use sinecore::session::Session;
use sinecore::telemetry::MetricsRecorder;
use std::{net::SocketAddr, sync::Arc};
use warp::{
    http::StatusCode,
    reply::{Json, WithStatus},
    Filter, Rejection, Reply,
};

type JsonReply = WithStatus<Json>;
type Failure = (StatusCode, String);

#[derive(Clone)]
struct BridgeState {
    session: SharedSession,
    metrics: Arc<MetricsRecorder>,
}

fn respond<T: Serialize>(result: Result<T, Failure>) -> JsonReply {
    match result {
        Ok(body) => warp::reply::with_status(warp::reply::json(&body), StatusCode::OK),
        Err((status, message)) => {
            warn!("bridge request failed: {}", message);
            warp::reply::with_status(warp::reply::json(&json!({ "error": message })), status)
        }
    }
}

fn with_session<T, F>(state: &BridgeState, action: F) -> JsonReply
where
    T: Serialize,
    F: FnOnce(&mut Session) -> Result<T, Failure>,
{
    let result = match lock_session(&state.session) {
        Ok(mut guard) => action(&mut guard),
        Err(err) => Err((StatusCode::INTERNAL_SERVER_ERROR, err.to_string())),
    };
    respond(result)
}

/// Control and telemetry routes over a shared session.
pub fn routes(
    session: SharedSession,
    metrics: Arc<MetricsRecorder>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let state = BridgeState { session, metrics };
    let state_filter = warp::any().map(move || state.clone());

    let status_route = warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: BridgeState| {
            let metrics = state.metrics.snapshot();
            with_session(&state, |session| Ok(StatusModel::capture(session, metrics)))
        });

    let plot_route = warp::path("window")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: BridgeState| {
            with_session(&state, |session| {
                Ok(WindowModel::new(
                    session.generator().frequency(),
                    session.plot_window(),
                ))
            })
        });

    let window_route = warp::path!("window" / f64)
        .and(warp::get())
        .and(state_filter.clone())
        .map(|seconds: f64, state: BridgeState| {
            with_session(&state, |session| {
                Ok(WindowModel::new(
                    session.generator().frequency(),
                    session.window(seconds),
                ))
            })
        });

    let estimate_route = warp::path("estimate")
        .and(warp::path::end())
        .and(warp::get())
        .and(state_filter.clone())
        .map(|state: BridgeState| {
            with_session(&state, |session| {
                let frequency = session
                    .estimate()
                    .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
                Ok(EstimateModel {
                    frequency,
                    samples: session.generator().len(),
                })
            })
        });

    let frequency_route = warp::path("frequency")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter.clone())
        .map(|request: FrequencyRequest, state: BridgeState| {
            with_session(&state, |session| {
                session.set_frequency(request.frequency);
                Ok(ControlReply::ok(session.is_running()))
            })
        });

    let start_route = warp::path("start")
        .and(warp::path::end())
        .and(warp::post())
        .and(state_filter.clone())
        .map(|state: BridgeState| {
            with_session(&state, |session| {
                session.start(Local::now().naive_local());
                Ok(ControlReply::ok(true))
            })
        });

    let stop_route = warp::path("stop")
        .and(warp::path::end())
        .and(warp::post())
        .and(state_filter.clone())
        .map(|state: BridgeState| {
            with_session(&state, |session| {
                session.stop();
                Ok(ControlReply::ok(false))
            })
        });

    let toggle_route = warp::path("toggle")
        .and(warp::path::end())
        .and(warp::post())
        .and(state_filter)
        .map(|state: BridgeState| {
            with_session(&state, |session| {
                let running = session.toggle(Local::now().naive_local());
                Ok(ControlReply::ok(running))
            })
        });

    status_route
        .or(plot_route)
        .unify()
        .or(window_route)
        .unify()
        .or(estimate_route)
        .unify()
        .or(frequency_route)
        .unify()
        .or(start_route)
        .unify()
        .or(stop_route)
        .unify()
        .or(toggle_route)
        .unify()
}

/// HTTP bridge serving [`routes`] on the current tokio runtime.
pub struct Bridge;

impl Bridge {
    /// Binds `addr` and spawns the server; returns the bound address.
    pub fn spawn(
        session: SharedSession,
        metrics: Arc<MetricsRecorder>,
        addr: SocketAddr,
    ) -> anyhow::Result<SocketAddr> {
        let (bound, server) = warp::serve(routes(session, metrics))
            .try_bind_ephemeral(addr)
            .with_context(|| format!("binding control bridge on {}", addr))?;
        tokio::spawn(server);
        Ok(bound)
    }
}
