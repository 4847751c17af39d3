//! Commands typed on stdin during `play`.

use anyhow::{Context, Result};
use pw_proto::PlayerCommand;

#[derive(Debug, PartialEq)]
pub enum Input {
    Command(PlayerCommand),
    Raw(String),
    Quit,
}

pub fn parse_input(line: &str) -> Result<Input> {
    let line = line.trim();
    if line.starts_with('{') {
        let command = serde_json::from_str(line).context("invalid JSON command")?;
        return Ok(Input::Command(command));
    }

    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let input = match word {
        "quit" | "stop" => Input::Quit,
        "pause" => Input::Command(PlayerCommand::TogglePause),
        "step" => Input::Command(PlayerCommand::FrameStep),
        "screenshot" => Input::Command(PlayerCommand::Screenshot),
        "raw" if !rest.trim().is_empty() => Input::Raw(rest.trim().to_string()),
        _ => anyhow::bail!("unknown command '{line}'"),
    };
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_map_to_commands() {
        assert_eq!(parse_input("quit").unwrap(), Input::Quit);
        assert_eq!(
            parse_input(" pause ").unwrap(),
            Input::Command(PlayerCommand::TogglePause)
        );
        assert_eq!(
            parse_input("raw set volume 20").unwrap(),
            Input::Raw("set volume 20".into())
        );
    }

    #[test]
    fn json_commands() {
        let input = parse_input(r#"{"command": "set_volume", "volume": 40}"#).unwrap();
        assert_eq!(input, Input::Command(PlayerCommand::SetVolume { volume: 40 }));
    }

    #[test]
    fn rejects_unknown_and_empty_raw() {
        assert!(parse_input("rewind").is_err());
        assert!(parse_input("raw").is_err());
        assert!(parse_input("{broken").is_err());
    }
}
