use tracing::debug;

use super::convert::Args;
use super::matcher::{resolve, MatchError};
use super::pattern::tokenize;
use super::table::CommandTable;

/// The uniform result of one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    pub ok: bool,
    pub payload: String,
}

impl CommandResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            payload: String::new(),
        }
    }

    pub fn ok_with(payload: impl Into<String>) -> Self {
        Self {
            ok: true,
            payload: payload.into(),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            payload: message.into(),
        }
    }

    /// Text-protocol form: `OK`, `OK <payload>` or `Error: <message>`.
    pub fn to_wire(&self) -> String {
        match (self.ok, self.payload.is_empty()) {
            (true, true) => "OK".to_string(),
            (true, false) => format!("OK {}", self.payload),
            (false, _) => format!("Error: {}", self.payload),
        }
    }
}

/// Top-level entry point over a built table. Holds no cross-call state, so a
/// single instance may be shared freely once registration is complete.
pub struct Dispatcher<W> {
    table: CommandTable<W>,
}

impl<W> Dispatcher<W> {
    pub fn new(table: CommandTable<W>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CommandTable<W> {
        &self.table
    }

    /// Tokenizes `line`, finds the overload set, matches, converts, and runs
    /// the bound handler. Exactly one handler runs on success; every failure
    /// path returns before any handler is invoked.
    pub fn execute(&self, world: &mut W, line: &str) -> CommandResponse {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            return CommandResponse::err("empty command");
        }

        let Some(candidates) = self.table.lookup(&tokens) else {
            let mut message = format!("Unknown command `{}`", line.trim());
            if let Some(closest) = self.table.closest_pattern(&tokens) {
                message.push_str(&format!(", closest registered pattern is `{closest}`"));
            }
            return CommandResponse::err(message);
        };

        let (entry, raw_args) = match resolve(candidates, &tokens) {
            Ok(matched) => matched,
            Err(MatchError::NoMatch) => {
                return CommandResponse::err(format!(
                    "Can not find a command match `{}`",
                    line.trim()
                ));
            }
            Err(MatchError::Ambiguous { patterns }) => {
                return CommandResponse::err(format!(
                    "Ambiguous command `{}`, matches: {}",
                    line.trim(),
                    patterns.join(", ")
                ));
            }
        };

        let args = Args::convert(&entry.pattern().param_kinds(), &raw_args);
        debug!(pattern = entry.pattern().source(), "dispatching command");
        match entry.invoke(world, &args) {
            Ok(payload) if payload.is_empty() => CommandResponse::ok(),
            Ok(payload) => CommandResponse::ok_with(payload),
            Err(message) => CommandResponse::err(message),
        }
    }
}
