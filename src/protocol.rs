use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected two `,`-separated fields")]
    MissingComma,
    #[error("expected `{0}=<value>`")]
    BadField(&'static str),
}

/// Parsed form of the auth request line `username=<u>,password=<p>`.
#[derive(Debug, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

pub fn parse_credentials(line: &str) -> Result<Credentials, ParseError> {
    let (username, password) = parse_fields(line, "username", "password")?;

    Ok(Credentials { username, password })
}

/// Parses the `.addword` payload line `word=<w>,hint=<h>`.
pub fn parse_word_entry(line: &str) -> Result<(String, String), ParseError> {
    parse_fields(line, "word", "hint")
}

// Splits on the first comma only, so the second value may itself
// contain commas (hints often do).
fn parse_fields(
    line: &str,
    first: &'static str,
    second: &'static str,
) -> Result<(String, String), ParseError> {
    let (a, b) = line.trim().split_once(',').ok_or(ParseError::MissingComma)?;

    Ok((field(a, first)?, field(b, second)?))
}

fn field(part: &str, key: &'static str) -> Result<String, ParseError> {
    let (k, v) = part.split_once('=').ok_or(ParseError::BadField(key))?;

    if k.trim() != key {
        return Err(ParseError::BadField(key));
    }

    Ok(v.to_string())
}

/// Commands the worker answers out of the shared directory, before the
/// game session ever sees the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryCommand {
    AddWord,
    Leaderboard,
    HighScore,
}

pub fn directory_command(line: &str) -> Option<DirectoryCommand> {
    let line = line.trim();

    if line.eq_ignore_ascii_case(".addword") {
        Some(DirectoryCommand::AddWord)
    } else if line.eq_ignore_ascii_case(".leaderboard") {
        Some(DirectoryCommand::Leaderboard)
    } else if line.eq_ignore_ascii_case(".highscore") {
        Some(DirectoryCommand::HighScore)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_credentials() {
        let creds = parse_credentials("username=alice,password=secret").unwrap();

        assert_eq!(creds.username, "alice");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn rejects_missing_comma() {
        assert_eq!(
            parse_credentials("username=alice password=secret"),
            Err(ParseError::MissingComma)
        );
    }

    #[test]
    fn rejects_wrong_keys() {
        assert_eq!(
            parse_credentials("user=alice,password=secret"),
            Err(ParseError::BadField("username"))
        );
        assert_eq!(
            parse_credentials("username=alice,pw=secret"),
            Err(ParseError::BadField("password"))
        );
    }

    #[test]
    fn rejects_missing_equals() {
        assert!(parse_credentials("username,password").is_err());
    }

    #[test]
    fn word_entry_hint_may_contain_commas() {
        let (word, hint) = parse_word_entry("word=ferris,hint=small, orange, a crab").unwrap();

        assert_eq!(word, "ferris");
        assert_eq!(hint, "small, orange, a crab");
    }

    #[test]
    fn directory_commands_match_case_insensitively() {
        assert_eq!(
            directory_command(".addword"),
            Some(DirectoryCommand::AddWord)
        );
        assert_eq!(
            directory_command(".AddWord"),
            Some(DirectoryCommand::AddWord)
        );
        assert_eq!(
            directory_command(".highScore"),
            Some(DirectoryCommand::HighScore)
        );
        assert_eq!(
            directory_command(".LEADERBOARD"),
            Some(DirectoryCommand::Leaderboard)
        );
        assert_eq!(directory_command(".skip"), None);
        assert_eq!(directory_command("addword"), None);
    }
}
