use dashmap::DashMap;
use log::warn;
use std::cmp::Reverse;
use std::sync::{Arc, RwLock};
use tokio::net::TcpStream;

use crate::handoff::Handoff;
use crate::protocol::{self, ParseError};

/// One seeded account. Passwords are stored and compared as plain
/// bytes, same as the wire format carries them.
#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub password: String,
    pub score: u32,
    pub best_streak: u32,
    connected: bool,
}

impl User {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
            score: 0,
            best_streak: 0,
            connected: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordEntry {
    pub word: String,
    pub hint: String,
}

impl WordEntry {
    pub fn new(word: &str, hint: &str) -> Self {
        Self {
            word: word.to_string(),
            hint: hint.to_string(),
        }
    }
}

/// Shared directory of users, scores, and the word corpus, plus the
/// handoff slot the acceptor uses to pass sockets to workers.
///
/// Cloning is cheap; every worker holds its own handle. The user table
/// and corpus each sit behind their own lock, kept strictly separate
/// from the handoff slot: those are recurring reads/writes over a whole
/// session, not one-shot exchanges.
#[derive(Clone, Default)]
pub struct Directory {
    inner: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    users: RwLock<Vec<User>>,
    by_name: DashMap<String, usize>,
    words: RwLock<Vec<WordEntry>>,
    handoff: Handoff<TcpStream>,
}

impl Directory {
    pub fn new(users: Vec<User>, words: Vec<WordEntry>) -> Self {
        let by_name = DashMap::new();
        for (i, user) in users.iter().enumerate() {
            by_name.insert(user.username.clone(), i);
        }

        Self {
            inner: Arc::new(Shared {
                users: RwLock::new(users),
                by_name,
                words: RwLock::new(words),
                handoff: Handoff::new(),
            }),
        }
    }

    /// The stock directory: a handful of accounts and a starter corpus.
    pub fn with_defaults() -> Self {
        let users = vec![
            User::new("alice", "secret"),
            User::new("bob", "hunter2"),
            User::new("carol", "letmein"),
            User::new("audrey", "wordasaurus"),
        ];

        let words = vec![
            WordEntry::new("cat", "a small furry pet that purrs"),
            WordEntry::new("ocean", "covers most of the planet"),
            WordEntry::new("violin", "four strings and a bow"),
            WordEntry::new("compass", "points north"),
            WordEntry::new("lantern", "portable light source"),
            WordEntry::new("glacier", "a very slow river of ice"),
        ];

        Self::new(users, words)
    }

    /// Validates `username=<u>,password=<p>` and returns the user's
    /// index. Fails on malformed input, an unknown user, a wrong
    /// password, or a user who already has a live session. Success
    /// marks the user connected.
    pub fn check_authentication(&self, auth_line: &str) -> Option<usize> {
        let creds = protocol::parse_credentials(auth_line).ok()?;

        let index = *self.inner.by_name.get(&creds.username)?;

        let mut users = self.inner.users.write().expect("user table lock poisoned");
        let user = &mut users[index];

        if user.password != creds.password {
            return None;
        }
        if user.connected {
            warn!("rejected second concurrent session for '{}'", user.username);
            return None;
        }

        user.connected = true;
        Some(index)
    }

    pub fn log_out_user(&self, index: usize) {
        let mut users = self.inner.users.write().expect("user table lock poisoned");

        if let Some(user) = users.get_mut(index) {
            user.connected = false;
        }
    }

    /// Last-writer-wins overwrite of a user's score and best streak. A
    /// user holds at most one session, so their own updates are totally
    /// ordered.
    pub fn update_user_scores(&self, score: u32, best_streak: u32, index: usize) {
        let mut users = self.inner.users.write().expect("user table lock poisoned");

        match users.get_mut(index) {
            Some(user) => {
                user.score = score;
                user.best_streak = best_streak;
            }
            None => warn!("score update for unknown user index {index}"),
        }
    }

    /// Word at `index`, wrapping around once the corpus is exhausted.
    pub fn word(&self, index: usize) -> Option<WordEntry> {
        let words = self.inner.words.read().expect("corpus lock poisoned");

        if words.is_empty() {
            return None;
        }
        Some(words[index % words.len()].clone())
    }

    /// Parses `word=<w>,hint=<h>` and appends it to the corpus.
    pub fn add_word(&self, raw_entry: &str) -> Result<(), ParseError> {
        let (word, hint) = protocol::parse_word_entry(raw_entry)?;

        let mut words = self.inner.words.write().expect("corpus lock poisoned");
        words.push(WordEntry { word, hint });

        Ok(())
    }

    /// All users as `username: score` lines, best score first, ties
    /// broken alphabetically.
    pub fn leaderboard(&self) -> String {
        let users = self.inner.users.read().expect("user table lock poisoned");

        let mut ranked: Vec<_> = users
            .iter()
            .map(|u| (u.username.clone(), u.score))
            .collect();
        ranked.sort_by_key(|(name, score)| (Reverse(*score), name.clone()));

        ranked
            .into_iter()
            .map(|(name, score)| format!("{name}: {score}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn high_score(&self, index: usize) -> String {
        let users = self.inner.users.read().expect("user table lock poisoned");

        match users.get(index) {
            Some(user) => format!("Your high score: {}", user.score),
            None => "unknown user".to_string(),
        }
    }

    /// Acceptor side of the socket handoff. Waits while a previously
    /// accepted socket is still unclaimed.
    pub async fn publish_socket(&self, stream: TcpStream) {
        self.inner.handoff.publish(stream).await;
    }

    /// Worker side of the socket handoff.
    pub async fn claim_socket(&self) -> Option<TcpStream> {
        self.inner.handoff.claim().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_user_directory() -> Directory {
        Directory::new(
            vec![User::new("alice", "secret"), User::new("bob", "hunter2")],
            vec![WordEntry::new("cat", "purrs")],
        )
    }

    #[test]
    fn auth_accepts_seeded_credentials() {
        let dir = two_user_directory();

        assert_eq!(dir.check_authentication("username=alice,password=secret"), Some(0));
        assert_eq!(dir.check_authentication("username=bob,password=hunter2"), Some(1));
    }

    #[test]
    fn auth_rejects_bad_input() {
        let dir = two_user_directory();

        // wrong password
        assert_eq!(dir.check_authentication("username=alice,password=wrong"), None);
        // unknown user
        assert_eq!(dir.check_authentication("username=mallory,password=secret"), None);
        // malformed
        assert_eq!(dir.check_authentication("alice/secret"), None);
        assert_eq!(dir.check_authentication(""), None);
    }

    #[test]
    fn auth_rejects_duplicate_session_until_logout() {
        let dir = two_user_directory();

        assert_eq!(dir.check_authentication("username=alice,password=secret"), Some(0));
        assert_eq!(dir.check_authentication("username=alice,password=secret"), None);

        dir.log_out_user(0);
        assert_eq!(dir.check_authentication("username=alice,password=secret"), Some(0));
    }

    #[test]
    fn added_word_comes_back_at_its_index() {
        let dir = two_user_directory();

        dir.add_word("word=glacier,hint=slow ice").unwrap();

        assert_eq!(dir.word(1), Some(WordEntry::new("glacier", "slow ice")));
    }

    #[test]
    fn malformed_word_entry_is_rejected_without_appending() {
        let dir = two_user_directory();

        assert!(dir.add_word("glacier: slow ice").is_err());
        // corpus still has just the seed word, so index 1 wraps to it
        assert_eq!(dir.word(1), Some(WordEntry::new("cat", "purrs")));
    }

    #[test]
    fn word_lookup_wraps_around() {
        let dir = two_user_directory();

        assert_eq!(dir.word(0), dir.word(1));
        assert_eq!(dir.word(0), dir.word(7));
    }

    #[test]
    fn leaderboard_sorts_by_score_then_name() {
        let dir = Directory::new(
            vec![
                User::new("alice", "x"),
                User::new("carol", "x"),
                User::new("bob", "x"),
            ],
            vec![],
        );

        dir.update_user_scores(5, 2, 0); // alice: 5
        dir.update_user_scores(9, 3, 1); // carol: 9
        dir.update_user_scores(9, 1, 2); // bob: 9, ties with carol

        assert_eq!(dir.leaderboard(), "bob: 9\ncarol: 9\nalice: 5");
    }

    #[test]
    fn high_score_reflects_latest_update() {
        let dir = two_user_directory();

        dir.update_user_scores(4, 2, 0);

        assert_eq!(dir.high_score(0), "Your high score: 4");
        assert_eq!(dir.high_score(1), "Your high score: 0");
    }
}
