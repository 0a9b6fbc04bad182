use serde_json::Value;

use crate::types::{Command, Direction};

#[derive(Debug, PartialEq)]
pub enum ParsedClientMessage {
    Input { dir: Direction },
    TogglePause,
    Restart { level: Option<i64>, keep_score: bool },
    NextLevel,
    Ping { t: f64 },
}

impl ParsedClientMessage {
    /// Engine command carried by this message, if any. `current_level` fills in
    /// a restart that names no level.
    pub fn into_command(self, current_level: usize) -> Option<Command> {
        match self {
            Self::Input { dir } => Some(Command::SetPlayerIntent(dir)),
            Self::TogglePause => Some(Command::TogglePause),
            Self::Restart { level, keep_score } => Some(Command::Restart {
                level: level
                    .map(crate::server_utils::normalize_level_index)
                    .unwrap_or(current_level),
                keep_score,
            }),
            Self::NextLevel => Some(Command::AdvanceToNextLevel),
            Self::Ping { .. } => None,
        }
    }
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "input" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Input { dir })
        }
        "toggle_pause" => Some(ParsedClientMessage::TogglePause),
        "restart" => {
            let level = parse_optional_i64(object.get("level"))?;
            let keep_score = match object.get("keepScore") {
                None => false,
                Some(value) => value.as_bool()?,
            };
            Some(ParsedClientMessage::Restart { level, keep_score })
        }
        "next_level" => Some(ParsedClientMessage::NextLevel),
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

fn parse_optional_i64(value: Option<&Value>) -> Option<Option<i64>> {
    const MAX_SAFE_INTEGER_F64: f64 = 9_007_199_254_740_991.0;

    let Some(value) = value else {
        return Some(None);
    };
    if let Some(number) = value.as_i64() {
        return Some(Some(number));
    }
    if let Some(number) = value.as_u64() {
        return i64::try_from(number).ok().map(Some);
    }
    if let Some(number) = value.as_f64() {
        if number.is_finite() {
            let floored = number.floor();
            if floored.abs() > MAX_SAFE_INTEGER_F64 {
                return None;
            }
            return Some(Some(floored as i64));
        }
    }
    None
}
