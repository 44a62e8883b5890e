//! Terminal utilities for the chat binary.

use std::io::Write;

/// Redisplay the prompt after printing an event
pub fn redisplay_prompt(user: &str) {
    print!("{}> ", user);
    std::io::stdout().flush().ok();
}
