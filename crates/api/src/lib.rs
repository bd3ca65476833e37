pub mod routes;
pub mod state;
pub mod ws;

use axum::Router;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    routes::router(state)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use core_sim::{HistoryRecord, PositionId, ScriptedSampler};
    use futures_util::StreamExt;
    use runtime::feed::ScriptedFeed;
    use runtime::history::InMemoryHistorySink;
    use runtime::{Session, SessionConfig, SessionEvent};
    use strategy::{ExitReason, RawRecord};
    use time::macros::datetime;
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::Message;
    use tower::ServiceExt;

    use crate::{app, AppState};

    fn session_with_one_candidate() -> Session {
        let feed = ScriptedFeed::new().with_batch(vec![RawRecord {
            name: Some("Bonk".to_string()),
            symbol: Some("BONK".to_string()),
            price: Some(0.5),
            liquidity_usd: Some(50_000.0),
            volume_24h_usd: Some(50_000.0),
            fdv: None,
        }]);
        Session::new(
            SessionConfig::default(),
            Box::new(feed),
            Box::new(ScriptedSampler::new([])),
            Box::new(InMemoryHistorySink::new()),
        )
    }

    async fn get_json(app: axum::Router, uri: &str) -> serde_json::Value {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn status_reports_capital_and_open_positions() {
        let mut session = session_with_one_candidate();
        let state = AppState::for_session(&session);
        session.run_cycle(datetime!(2026-03-01 00:00 UTC)).await;

        let status = get_json(app(state), "/status").await;

        assert_eq!(status["available_capital"], 950.0);
        assert_eq!(status["open_position_count"], 1);
        assert_eq!(status["cycles_completed"], 1);
        assert_eq!(status["last_result"], serde_json::Value::Null);
        assert_eq!(status["last_cycle_at"], "2026-03-01T00:00:00Z");
    }

    #[tokio::test]
    async fn positions_lists_open_positions() {
        let mut session = session_with_one_candidate();
        let state = AppState::for_session(&session);
        session.run_cycle(datetime!(2026-03-01 00:00 UTC)).await;

        let positions = get_json(app(state), "/positions").await;

        assert_eq!(positions.as_array().unwrap().len(), 1);
        assert_eq!(positions[0]["symbol"], "BONK");
        assert_eq!(positions[0]["status"], "open");
        assert_eq!(positions[0]["quantity"], 100.0);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let state = AppState::for_session(&session_with_one_candidate());

        let response = app(state)
            .oneshot(Request::get("/runs").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn websocket_streams_session_events_after_connected() {
        let session = session_with_one_candidate();
        let state = AppState::for_session(&session);
        let events_tx = session.event_sender();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app(state)).await.unwrap();
        });

        let (mut socket, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws/events"))
            .await
            .unwrap();

        let connected = next_json(&mut socket).await;
        assert_eq!(connected["event_type"], "connected");

        let record = HistoryRecord {
            position_id: PositionId(1),
            symbol: "BONK".to_string(),
            entry_price: 0.5,
            exit_price: 0.6,
            invested_amount: 50.0,
            realized_pnl: 1.5,
            capital_after: 1_001.5,
            exit_reason: ExitReason::TakeProfit,
            opened_at: datetime!(2026-03-01 00:00 UTC),
            closed_at: datetime!(2026-03-01 00:00:30 UTC),
        };
        events_tx
            .send(SessionEvent::PositionClosed { tick: 2, record })
            .unwrap();

        let closed = next_json(&mut socket).await;
        assert_eq!(closed["event_type"], "position_closed");
        assert_eq!(closed["record"]["exit_reason"], "take_profit");
    }

    async fn next_json<S>(socket: &mut S) -> serde_json::Value
    where
        S: futures_util::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>>
            + Unpin,
    {
        let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("event should arrive")
            .expect("socket should stay open")
            .expect("frame should be valid");
        match message {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}
