// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::command::Command;
use std::collections::VecDeque;

/// An ordered batch of commands describing one logical frame.
///
/// The buffer has no internal locking: it is filled by the renderer, then
/// moved as a whole to the render device, which pops commands in the exact
/// order they were pushed.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    name: String,
    commands: VecDeque<Command>,
}

impl CommandBuffer {
    /// Creates an empty, unnamed buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty buffer labelled `name` for diagnostics.
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: VecDeque::new(),
        }
    }

    /// The diagnostic label. Empty for unnamed buffers.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends `command` at the back.
    pub fn push_command(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    /// Removes and returns the front command, or `None` when empty.
    pub fn pop_command(&mut self) -> Option<Command> {
        self.commands.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Iterates over the queued commands, front first, without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }
}

impl Iterator for CommandBuffer {
    type Item = Command;

    fn next(&mut self) -> Option<Command> {
        self.pop_command()
    }
}
