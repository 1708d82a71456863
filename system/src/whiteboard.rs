use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::event_log::{Event, EventStore, MemoryEventLog};
use crate::session::Session;
use crate::types::{new_event_id, EventId, Timestamp, UserId, WHITEBOARD_RETENTION};

pub const DEFAULT_COLOR: &str = "#000000";
pub const DEFAULT_BRUSH_SIZE: f64 = 2.0;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Draw,
    Clear,
}

impl FromStr for ActionKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draw" => Ok(ActionKind::Draw),
            "clear" => Ok(ActionKind::Clear),
            _ => Err(SyncError::validation("Invalid drawing action type")),
        }
    }
}

/// One line segment in canvas space, or a single point when `prev_*` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeData {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_y: Option<f64>,
    pub color: String,
    pub brush_size: f64,
}

/// Stroke payload as submitted; everything optional until validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeInput {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub prev_x: Option<f64>,
    pub prev_y: Option<f64>,
    pub color: Option<String>,
    pub brush_size: Option<f64>,
}

impl StrokeInput {
    pub fn segment(from: (f64, f64), to: (f64, f64)) -> Self {
        Self {
            x: Some(to.0),
            y: Some(to.1),
            prev_x: Some(from.0),
            prev_y: Some(from.1),
            ..Self::default()
        }
    }

    pub fn point(x: f64, y: f64) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Only coordinates are checked. The brush size is stored as sent, so a
    /// zero or negative size is accepted and left to the renderer.
    fn validate(self) -> SyncResult<StrokeData> {
        let invalid = || SyncError::validation("Invalid drawing data");
        let (x, y) = match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => (x, y),
            _ => return Err(invalid()),
        };
        let finite = |v: Option<f64>| v.map_or(true, f64::is_finite);
        if !finite(self.prev_x) || !finite(self.prev_y) {
            return Err(invalid());
        }
        let brush_size = self.brush_size.unwrap_or(DEFAULT_BRUSH_SIZE);
        let color = self
            .color
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COLOR.to_owned());
        Ok(StrokeData {
            x,
            y,
            prev_x: self.prev_x,
            prev_y: self.prev_y,
            color,
            brush_size,
        })
    }
}

/// A validated action, not yet stamped or attributed.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionDraft {
    Draw(StrokeData),
    Clear,
}

impl ActionDraft {
    /// `kind` is the raw `type` field. Data sent along with a clear is ignored.
    pub fn parse(kind: Option<&str>, data: Option<StrokeInput>) -> SyncResult<Self> {
        let kind = kind
            .ok_or_else(|| SyncError::validation("Invalid drawing action type"))?
            .parse::<ActionKind>()?;
        match kind {
            ActionKind::Clear => Ok(ActionDraft::Clear),
            ActionKind::Draw => data
                .ok_or_else(|| SyncError::validation("Invalid drawing data"))?
                .validate()
                .map(ActionDraft::Draw),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingAction {
    pub id: EventId,
    #[serde(rename = "type")]
    pub kind: ActionKind,
    pub user_id: UserId,
    pub user_name: String,
    #[serde(with = "crate::types::iso_millis")]
    pub timestamp: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<StrokeData>,
}

impl Event for DrawingAction {
    fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    fn stamped(self, timestamp: Timestamp) -> Self {
        DrawingAction { timestamp, ..self }
    }
}

pub struct WhiteboardChannel<S = MemoryEventLog<DrawingAction>> {
    log: S,
}

impl WhiteboardChannel {
    pub fn new() -> Self {
        Self::with_store(MemoryEventLog::new(WHITEBOARD_RETENTION))
    }
}

impl Default for WhiteboardChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventStore<DrawingAction>> WhiteboardChannel<S> {
    pub fn with_store(log: S) -> Self {
        Self { log }
    }

    pub fn store(&self) -> &S {
        &self.log
    }

    pub fn record_action(
        &self,
        session: &Session,
        user_id: &str,
        kind: Option<&str>,
        data: Option<StrokeInput>,
    ) -> SyncResult<DrawingAction> {
        let draft = ActionDraft::parse(kind, data)?;
        self.record(session, user_id, draft)
    }

    pub fn record(
        &self,
        session: &Session,
        user_id: &str,
        draft: ActionDraft,
    ) -> SyncResult<DrawingAction> {
        let user_name = session.authorize(user_id)?;
        let make = |kind: ActionKind, data: Option<StrokeData>| {
            move |timestamp: Timestamp| DrawingAction {
                id: new_event_id(),
                kind,
                user_id: user_id.to_owned(),
                user_name: user_name.to_owned(),
                timestamp,
                data,
            }
        };

        let action = match draft {
            ActionDraft::Clear => {
                let action = self
                    .log
                    .replace_with(&session.id, make(ActionKind::Clear, None));
                log::info!("Session {}: whiteboard cleared by {}", session.id, user_id);
                action
            }
            ActionDraft::Draw(data) => self
                .log
                .append_with(&session.id, make(ActionKind::Draw, Some(data))),
        };
        Ok(action)
    }

    pub fn list_actions(
        &self,
        session: &Session,
        caller_id: &str,
        since: Option<Timestamp>,
    ) -> SyncResult<Vec<DrawingAction>> {
        session.authorize(caller_id)?;
        Ok(self.log.list_since(&session.id, since))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn session() -> Session {
        Session::new("s-1", ("1", "Alice"), ("2", "Bob"))
    }

    #[test]
    fn it_rejects_unknown_or_missing_type() {
        let board = WhiteboardChannel::new();
        for kind in [None, Some("erase"), Some("DRAW"), Some("")] {
            let err = board
                .record_action(&session(), "1", kind, Some(StrokeInput::point(1.0, 1.0)))
                .unwrap_err();
            assert_eq!(err.kind, ErrorKind::Validation);
            assert_eq!(err.message, "Invalid drawing action type");
        }
    }

    #[test]
    fn it_requires_coordinates_for_draw() {
        let board = WhiteboardChannel::new();
        let s = session();
        let missing_y = StrokeInput {
            x: Some(3.0),
            ..StrokeInput::default()
        };
        for data in [None, Some(missing_y), Some(StrokeInput::point(f64::NAN, 1.0))] {
            let err = board.record_action(&s, "1", Some("draw"), data).unwrap_err();
            assert_eq!(err.message, "Invalid drawing data");
        }
        assert_eq!(board.store().len(&s.id), 0);
    }

    #[test]
    fn it_fills_stroke_defaults() {
        let board = WhiteboardChannel::new();
        let action = board
            .record_action(&session(), "2", Some("draw"), Some(StrokeInput::point(4.0, 5.0)))
            .expect("recorded");
        let data = action.data.expect("draw carries data");
        assert_eq!(data.color, DEFAULT_COLOR);
        assert_eq!(data.brush_size, DEFAULT_BRUSH_SIZE);
        assert_eq!(action.user_name, "Bob");
    }

    #[test]
    fn it_keeps_the_submitted_brush_size() {
        let board = WhiteboardChannel::new();
        for size in [0.0, -1.0, 7.5] {
            let data = StrokeInput {
                brush_size: Some(size),
                color: Some("#ff0000".to_owned()),
                ..StrokeInput::point(1.0, 1.0)
            };
            let action = board
                .record_action(&session(), "1", Some("draw"), Some(data))
                .expect("recorded");
            let data = action.data.expect("draw carries data");
            assert_eq!(data.brush_size, size);
            assert_eq!(data.color, "#ff0000");
        }
    }

    #[test]
    fn it_retains_the_most_recent_thousand_until_cleared() {
        let board = WhiteboardChannel::new();
        let s = session();
        let extra = 25;
        for n in 0..(WHITEBOARD_RETENTION + extra) {
            board
                .record_action(&s, "1", Some("draw"), Some(StrokeInput::point(n as f64, 0.0)))
                .expect("recorded");
        }
        let actions = board.list_actions(&s, "2", None).expect("listed");
        assert_eq!(actions.len(), WHITEBOARD_RETENTION);
        let xs: Vec<f64> = actions
            .iter()
            .map(|a| a.data.as_ref().expect("draw carries data").x)
            .collect();
        let expected: Vec<f64> = (extra..WHITEBOARD_RETENTION + extra).map(|n| n as f64).collect();
        assert_eq!(xs, expected);
        assert!(actions.windows(2).all(|w| w[0].timestamp < w[1].timestamp));

        let clear = board.record_action(&s, "2", Some("clear"), None).expect("cleared");
        assert_eq!(board.list_actions(&s, "1", None).expect("listed"), vec![clear]);
        assert_eq!(board.store().len(&s.id), 1);
    }

    #[test]
    fn it_collapses_history_on_clear() {
        let board = WhiteboardChannel::new();
        let s = session();
        for i in 0..5 {
            let p = i as f64;
            board
                .record_action(&s, "1", Some("draw"), Some(StrokeInput::segment((p, p), (p + 1.0, p + 1.0))))
                .expect("recorded");
        }
        let clear = board
            .record_action(&s, "2", Some("clear"), Some(StrokeInput::point(1.0, 1.0)))
            .expect("cleared");
        assert_eq!(clear.data, None);
        assert_eq!(board.list_actions(&s, "1", None).expect("listed"), vec![clear]);
    }

    #[test]
    fn it_rejects_outsiders_without_mutation() {
        let board = WhiteboardChannel::new();
        let s = session();
        board
            .record_action(&s, "1", Some("draw"), Some(StrokeInput::point(1.0, 1.0)))
            .expect("recorded");
        let err = board.record_action(&s, "9", Some("clear"), None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert_eq!(board.store().len(&s.id), 1);
    }

    #[test]
    fn it_serializes_clear_without_data() {
        let board = WhiteboardChannel::new();
        let clear = board
            .record_action(&session(), "1", Some("clear"), None)
            .expect("cleared");
        let json = serde_json::to_value(&clear).expect("serializable");
        assert_eq!(json["type"], "clear");
        assert_eq!(json["userName"], "Alice");
        assert!(json.get("data").is_none());
    }
}
