use std::str::FromStr;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::character::CharacterId;
use crate::client::CharacterApi;
use crate::ui::{App, Confirm, Field};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub const HELP: &str = "\
Commands:
  name <value>        set the character name
  real-name <value>   set the real name
  universe <value>    set the universe
  submit              add the character, or save the one being edited
  edit <id>           load a character into the form
  cancel              stop editing
  delete <id>         delete a character
  show                redraw the page
  help                show this text
  quit                leave";

#[derive(Error, Debug, PartialEq)]
pub enum ParseCommandError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command: {0}")]
    Unknown(String),
    #[error("Missing value for {0}")]
    MissingValue(String),
    #[error("Invalid character id: {0}")]
    InvalidId(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set(Field, String),
    Submit,
    Edit(CharacterId),
    Cancel,
    Delete(CharacterId),
    Show,
    Help,
    Quit,
}

fn parse_id(input: &str) -> Result<CharacterId, ParseCommandError> {
    input
        .parse()
        .map_err(|_| ParseCommandError::InvalidId(input.to_string()))
}

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        lazy_static! {
            static ref RE: Regex = Regex::new(r"^\s*([A-Za-z-]+)(?:\s+(.*?))?\s*$").unwrap();
        }
        if input.trim().is_empty() {
            return Err(ParseCommandError::Empty);
        }
        let captures = RE.captures(input).ok_or_else(|| {
            log::debug!("Command match failure for {}", input);
            ParseCommandError::Unknown(input.trim().to_string())
        })?;
        let verb = captures.get(1).expect("to exist").as_str();
        let argument = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

        let require = |argument: &str| {
            if argument.is_empty() {
                Err(ParseCommandError::MissingValue(verb.to_string()))
            } else {
                Ok(argument.to_string())
            }
        };

        match verb.to_ascii_lowercase().as_str() {
            "submit" | "save" => Ok(Command::Submit),
            "edit" => Ok(Command::Edit(parse_id(&require(argument)?)?)),
            "cancel" => Ok(Command::Cancel),
            "delete" | "rm" => Ok(Command::Delete(parse_id(&require(argument)?)?)),
            "show" | "list" => Ok(Command::Show),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => match Field::from_str(other) {
                Ok(field) => Ok(Command::Set(field, require(argument)?)),
                Err(_) => Err(ParseCommandError::Unknown(verb.to_string())),
            },
        }
    }
}

/// Line oriented front for [`App`].
pub struct Console<R, W> {
    reader: R,
    writer: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    /// Next input line without its terminator, `None` at end of input.
    async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(&['\r', '\n'][..]).to_string()))
    }

    async fn write(&mut self, text: &str) -> std::io::Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.flush().await
    }

    async fn draw<A: CharacterApi>(&mut self, app: &mut App<A>) -> std::io::Result<()> {
        if app.take_scroll_request() {
            self.write(CLEAR_SCREEN).await?;
        }
        self.write(&format!("{}\n", app)).await
    }

    /// Mounts the app, then applies commands until `quit` or end of input.
    pub async fn run<A: CharacterApi>(&mut self, app: &mut App<A>) -> std::io::Result<()> {
        app.begin_loading();
        self.draw(app).await?;
        app.mount().await;
        self.draw(app).await?;

        loop {
            self.write("> ").await?;
            let Some(line) = self.read_line().await? else {
                break;
            };
            let command = match Command::from_str(&line) {
                Ok(command) => command,
                Err(ParseCommandError::Empty) => continue,
                Err(e) => {
                    self.write(&format!("{}\n", e)).await?;
                    continue;
                }
            };
            log::debug!("Command: {:?}", command);

            match command {
                Command::Set(field, value) => app.set_field(field, value),
                Command::Submit => app.submit().await,
                Command::Edit(id) => {
                    if !app.edit(id) {
                        self.write(&format!("No listed character with id {}\n", id))
                            .await?;
                        continue;
                    }
                }
                Command::Cancel => app.cancel(),
                Command::Delete(id) => app.delete(id, &mut *self).await,
                Command::Show => {}
                Command::Help => {
                    self.write(&format!("{}\n", HELP)).await?;
                    continue;
                }
                Command::Quit => break,
            }
            self.draw(app).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<R, W> Confirm for Console<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn confirm(&mut self, message: &str) -> bool {
        if let Err(e) = self.write(&format!("{} [y/N] ", message)).await {
            log::warn!("Could not write confirmation prompt: {}", e);
            return false;
        }
        match self.read_line().await {
            Ok(Some(answer)) => {
                matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
            }
            Ok(None) => false,
            Err(e) => {
                log::warn!("Could not read confirmation: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterDraft;
    use crate::ui::tests::FakeApi;

    #[test]
    fn parses_commands() {
        let cases = [
            ("submit", Ok(Command::Submit)),
            ("  cancel  ", Ok(Command::Cancel)),
            ("edit 3", Ok(Command::Edit(3))),
            ("delete 12", Ok(Command::Delete(12))),
            (
                "name Iron Man",
                Ok(Command::Set(Field::Name, "Iron Man".to_string())),
            ),
            (
                "real-name   Tony Stark ",
                Ok(Command::Set(Field::RealName, "Tony Stark".to_string())),
            ),
            (
                "universe Earth-616",
                Ok(Command::Set(Field::Universe, "Earth-616".to_string())),
            ),
            ("QUIT", Ok(Command::Quit)),
            ("", Err(ParseCommandError::Empty)),
            ("fly away", Err(ParseCommandError::Unknown("fly".to_string()))),
            (
                "edit",
                Err(ParseCommandError::MissingValue("edit".to_string())),
            ),
            (
                "delete one",
                Err(ParseCommandError::InvalidId("one".to_string())),
            ),
            (
                "name",
                Err(ParseCommandError::MissingValue("name".to_string())),
            ),
            ("42", Err(ParseCommandError::Unknown("42".to_string()))),
        ];

        for (input, expected) in cases {
            assert_eq!(Command::from_str(input), expected, "input: {:?}", input);
        }
    }

    async fn run_script(api: FakeApi, script: &str) -> (App<FakeApi>, String) {
        let mut app = App::new(api);
        let mut console = Console::new(script.as_bytes(), Vec::new());
        console.run(&mut app).await.unwrap();
        let (_, output) = console.into_inner();
        (app, String::from_utf8(output).unwrap())
    }

    #[tokio::test]
    async fn scripted_session_adds_and_edits() {
        let script = "\
name Iron Man
real-name Tony Stark
universe Earth-616
submit
edit 1
universe Earth-1610
submit
quit
";
        let (app, output) = run_script(FakeApi::default(), script).await;

        assert_eq!(app.characters().len(), 1);
        assert_eq!(app.characters()[0].universe(), "Earth-1610");
        assert!(output.contains("Loading..."));
        assert!(output.contains(CLEAR_SCREEN));
        assert!(output.contains("== Edit Character =="));
        assert!(output.contains("#1 Iron Man"));
    }

    #[tokio::test]
    async fn delete_waits_for_confirmation() {
        let characters = vec![
            CharacterDraft::new("Hulk", "Bruce Banner", "Earth-616").into_character(1),
            CharacterDraft::new("Thor", "Thor Odinson", "Earth-616").into_character(2),
        ];
        let script = "delete 1\nn\ndelete 2\ny\n";
        let (app, output) = run_script(FakeApi::with(characters), script).await;

        assert_eq!(app.characters().len(), 1);
        assert_eq!(app.characters()[0].id, 1);
        assert_eq!(output.matches("[y/N]").count(), 2);
    }

    #[tokio::test]
    async fn reports_bad_input_and_unknown_ids() {
        let script = "jump\nedit 5\nhelp\n";
        let (_, output) = run_script(FakeApi::default(), script).await;

        assert!(output.contains("Unknown command: jump"));
        assert!(output.contains("No listed character with id 5"));
        assert!(output.contains(HELP));
    }
}
