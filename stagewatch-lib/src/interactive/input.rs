use super::KeyInput;
use core::fmt::Debug;
use core::time::Duration;
use crossterm::event::{self, Event};
use std::collections::VecDeque;
use std::io;

/// A blocking source of key presses.
pub trait InputSource: Send + Debug {
    /// Wait up to `timeout` for a key. `Ok(None)` means nothing arrived in time.
    ///
    /// # Errors
    ///
    /// Returns an error if the input stream can no longer be read.
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyInput>>;
}

/// Reads keys from the terminal. The terminal must be in raw mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalInput;

impl InputSource for TerminalInput {
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyInput>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }

        match event::read()? {
            Event::Key(key) => Ok(KeyInput::from_event(&key)),
            _ => Ok(None),
        }
    }
}

/// Replays a fixed sequence of keys, then behaves like an idle keyboard.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    keys: VecDeque<(Duration, KeyInput)>,
}

impl ScriptedInput {
    #[must_use]
    pub fn new(keys: impl IntoIterator<Item = KeyInput>) -> Self {
        Self {
            keys: keys.into_iter().map(|key| (Duration::ZERO, key)).collect(),
        }
    }

    /// Queue a key that arrives after `delay`.
    #[must_use]
    pub fn then_after(mut self, delay: Duration, key: KeyInput) -> Self {
        self.keys.push_back((delay, key));
        self
    }
}

impl InputSource for ScriptedInput {
    fn poll_key(&mut self, timeout: Duration) -> io::Result<Option<KeyInput>> {
        let Some((delay, _)) = self.keys.front_mut() else {
            std::thread::sleep(timeout);
            return Ok(None);
        };

        if *delay > timeout {
            *delay -= timeout;
            std::thread::sleep(timeout);
            return Ok(None);
        }

        std::thread::sleep(*delay);
        Ok(self.keys.pop_front().map(|(_, key)| key))
    }
}
