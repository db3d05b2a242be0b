use crate::directory::{Directory, WordEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Active,
    Ended,
}

/// One user's in-progress guessing game. Pure state machine: consumes
/// input lines, produces reply text, and only ever touches the
/// directory to fetch the next word. All network I/O stays in the
/// worker.
pub struct GameSession {
    directory: Directory,
    cursor: usize,
    current: WordEntry,
    score: u32,
    streak: u32,
    best_streak: u32,
    status: Status,
}

impl GameSession {
    /// Starts a session on the first word of the corpus. `None` when
    /// the corpus is empty.
    pub fn new(directory: Directory) -> Option<Self> {
        let current = directory.word(0)?;

        Some(Self {
            directory,
            cursor: 1,
            current,
            score: 0,
            streak: 0,
            best_streak: 0,
            status: Status::Active,
        })
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    /// Forced termination, used by the worker when the peer vanishes.
    pub fn end(&mut self) {
        self.status = Status::Ended;
    }

    pub fn start_message(&self) -> String {
        format!(
            "Welcome to Wordasaurus!\n\
             This is a guessing word game. Just type your best guess!\n\
             {}\n{}",
            commands(),
            self.prompt()
        )
    }

    /// Feeds one client line through the state machine and returns the
    /// reply to send back.
    pub fn handle_input(&mut self, input: &str) -> String {
        let input = input.trim();

        if input.is_empty() {
            // An empty line is a no-op guess, not a disconnect.
            return self.prompt();
        }
        if input.starts_with('.') {
            return self.handle_command(input);
        }
        self.check_guess(input)
    }

    fn handle_command(&mut self, input: &str) -> String {
        if is_match(input, ".skip") {
            self.select_word();
            self.streak = 0;
            format!("Let's try a different word.\n{}", self.prompt())
        } else if is_match(input, ".score") {
            format!("{}\n{}", self.display_score(), self.prompt())
        } else if is_match(input, ".help") {
            format!("{}\n{}", commands(), self.prompt())
        } else if is_match(input, ".exit") {
            self.status = Status::Ended;
            format!("{}\nThank you for playing! Goodbye.", self.display_score())
        } else {
            format!("Invalid command.\n{}\n{}", commands(), self.prompt())
        }
    }

    fn check_guess(&mut self, guess: &str) -> String {
        if is_match(guess, &self.current.word) {
            self.score += 1;
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
            self.select_word();
            format!(
                "Congrats, you win!\n{}\n\nLet's try a new word.\n{}",
                self.display_score(),
                self.prompt()
            )
        } else {
            self.streak = 0;
            format!("Nope, wrong word. Try again.\n{}", self.prompt())
        }
    }

    fn select_word(&mut self) {
        // The corpus was non-empty at construction and only grows, so
        // the lookup cannot fail.
        if let Some(entry) = self.directory.word(self.cursor) {
            self.current = entry;
        }
        self.cursor += 1;
    }

    pub fn prompt(&self) -> String {
        let blanks = "__ ".repeat(self.current.word.len());
        format!("Guess the word: {}: {}", blanks, self.current.hint)
    }

    fn display_score(&self) -> String {
        format!(
            "Your score: {}\nYour best streak: {}",
            self.score, self.best_streak
        )
    }
}

fn commands() -> String {
    "Options:\n  \
     .skip \t to skip the current word\n  \
     .score \t to display the current score and best streak\n  \
     .help \t to display commands again\n  \
     .leaderboard \t to see everyone's scores\n  \
     .highScore \t to see your own stored score\n  \
     .addword \t to add a word to the bank\n  \
     .exit \t to log out and exit"
        .to_string()
}

/// Case-insensitive, length-exact comparison used for both guesses and
/// command tokens.
pub fn is_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
