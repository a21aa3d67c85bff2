use std::fmt;

use serde::{Deserialize, Serialize};

/// Calculation ids arrive from browsers as numbers or strings; both name the
/// same room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CalculationId {
    Number(i64),
    Text(String),
}

impl fmt::Display for CalculationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl CalculationId {
    pub fn room(&self) -> String {
        format!("calculation-{}", self)
    }
}

/// Commands sent FROM client TO server over the `/ws` socket.
///
/// Wire form: `{"event": "join-calculation", "data": {"calculationId": 7}}`.
/// Payload objects (`calculation`, `user`, `message`) are opaque and relayed
/// as received.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum RoomCommand {
    JoinCalculation {
        #[serde(rename = "calculationId")]
        calculation_id: CalculationId,
    },
    LeaveCalculation {
        #[serde(rename = "calculationId")]
        calculation_id: CalculationId,
    },
    ShareCalculation {
        #[serde(rename = "calculationId")]
        calculation_id: CalculationId,
        #[serde(default)]
        calculation: serde_json::Value,
        #[serde(default)]
        user: serde_json::Value,
    },
    CalculationUpdate {
        #[serde(rename = "calculationId")]
        calculation_id: CalculationId,
        #[serde(default)]
        calculation: serde_json::Value,
        #[serde(default)]
        user: serde_json::Value,
    },
    CalculationChat {
        #[serde(rename = "calculationId")]
        calculation_id: CalculationId,
        #[serde(default)]
        message: serde_json::Value,
        #[serde(default)]
        user: serde_json::Value,
    },
    UserOnline {
        #[serde(rename = "userId")]
        user_id: serde_json::Value,
    },
    UserOffline {
        #[serde(rename = "userId")]
        user_id: serde_json::Value,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// Events sent FROM server TO clients. Every relay carries the server's
/// timestamp at the moment it was fanned out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum RoomEvent {
    CalculationShared {
        calculation: serde_json::Value,
        user: serde_json::Value,
        timestamp: String,
    },
    CalculationUpdated {
        calculation: serde_json::Value,
        user: serde_json::Value,
        timestamp: String,
    },
    CalculationMessage {
        message: serde_json::Value,
        user: serde_json::Value,
        timestamp: String,
    },
    UserStatus {
        #[serde(rename = "userId")]
        user_id: serde_json::Value,
        status: PresenceStatus,
        timestamp: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_command_accepts_numeric_and_text_ids() {
        let numeric: RoomCommand = serde_json::from_value(json!({
            "event": "join-calculation",
            "data": { "calculationId": 42 }
        }))
        .unwrap();
        let text: RoomCommand = serde_json::from_value(json!({
            "event": "join-calculation",
            "data": { "calculationId": "42" }
        }))
        .unwrap();

        let room_of = |cmd: RoomCommand| match cmd {
            RoomCommand::JoinCalculation { calculation_id } => calculation_id.room(),
            other => panic!("unexpected command {:?}", other),
        };
        assert_eq!(room_of(numeric), "calculation-42");
        assert_eq!(room_of(text), "calculation-42");
    }

    #[test]
    fn user_status_event_uses_socket_names() {
        let event = RoomEvent::UserStatus {
            user_id: json!(3),
            status: PresenceStatus::Offline,
            timestamp: "2024-01-01T00:00:00.000Z".into(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "user-status");
        assert_eq!(value["data"]["userId"], 3);
        assert_eq!(value["data"]["status"], "offline");
    }
}
