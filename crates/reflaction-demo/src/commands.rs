//! Parsing of the line commands read from stdin

use crate::counter::{DECREMENT, INCREMENT, RESET};
use anyhow::{bail, Context, Result};
use reflaction::Action;

pub const HELP: &str = "\
commands:
  inc [n]          increment by n (default: configured step)
  dec [n]          decrement by n
  reset            set the counter to zero
  flow <name> [n]  trigger a flow (double, delayed, countdown)
  state            print the current state as JSON
  help             show this help
  quit             exit";

#[derive(Debug, PartialEq)]
pub enum Command {
    Dispatch(Action<i64>),
    Flow { name: String, payload: i64 },
    State,
    Help,
    Quit,
    Empty,
}

/// Parse one input line; `step` is the amount used when none is given
pub fn parse(line: &str, step: i64) -> Result<Command> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Command::Empty);
    };
    let amount = |word: Option<&str>| -> Result<i64> {
        match word {
            Some(word) => word
                .parse()
                .with_context(|| format!("`{}` is not a number", word)),
            None => Ok(step),
        }
    };

    let command = match verb {
        "inc" | "+" => Command::Dispatch(Action::new(INCREMENT, amount(words.next())?)),
        "dec" | "-" => Command::Dispatch(Action::new(DECREMENT, amount(words.next())?)),
        "reset" => Command::Dispatch(Action::new(RESET, 0)),
        "flow" => {
            let name = words.next().context("usage: flow <name> [n]")?;
            Command::Flow {
                name: name.to_string(),
                payload: amount(words.next())?,
            }
        }
        "state" => Command::State,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("unknown command `{}` (try `help`)", other),
    };

    if let Some(extra) = words.next() {
        bail!("unexpected argument `{}`", extra);
    }
    Ok(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_dispatch_commands() {
        assert_eq!(
            parse("inc 5", 1).unwrap(),
            Command::Dispatch(Action::new(INCREMENT, 5))
        );
        assert_eq!(
            parse("  dec  ", 3).unwrap(),
            Command::Dispatch(Action::new(DECREMENT, 3))
        );
        assert_eq!(
            parse("reset", 1).unwrap(),
            Command::Dispatch(Action::new(RESET, 0))
        );
    }

    #[test]
    fn test_parse_flow_command() {
        assert_eq!(
            parse("flow countdown 0", 1).unwrap(),
            Command::Flow {
                name: "countdown".to_string(),
                payload: 0,
            }
        );
        assert!(parse("flow", 1).is_err());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse("inc lots", 1).is_err());
        assert!(parse("jump", 1).is_err());
        assert!(parse("inc 1 2", 1).is_err());
        assert_eq!(parse("", 1).unwrap(), Command::Empty);
        assert_eq!(parse("q", 1).unwrap(), Command::Quit);
    }
}
