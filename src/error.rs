// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use thiserror::Error;

/// Errors raised while loading a cue description.
#[derive(Error, Debug)]
pub enum CueError {
    #[error("cue schema init failed: {0}")]
    SchemaInit(String),
    #[error("cue parse error at {path}: {message}")]
    Parse { path: String, message: String },
    #[error("cue document is empty or has no root element")]
    Empty,
    #[error("invalid number in {field}: {value}")]
    InvalidNumber { field: String, value: String },
}

/// Errors raised while starting the DMX output backend.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("DMX backend setup failed: {0}")]
    DmxBackendSetup(String),
    #[error("DMX backend select-server failed: {0}")]
    DmxBackendServer(String),
}

/// Process exit codes, one per fatal failure kind in the external interface.
///
/// These are distinct non-zero codes so a supervising process (systemd, a
/// show-control wrapper) can distinguish failure classes without parsing logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    WrongParameters = 1,
    MissingFile = 2,
    CueSchemaInit = 3,
    CueParse = 4,
    CueEmpty = 5,
    DmxBackendSetup = 6,
    DmxBackendServer = 7,
}

impl From<&CueError> for ExitCode {
    fn from(err: &CueError) -> Self {
        match err {
            CueError::SchemaInit(_) => ExitCode::CueSchemaInit,
            CueError::Parse { .. } => ExitCode::CueParse,
            CueError::Empty => ExitCode::CueEmpty,
            CueError::InvalidNumber { .. } => ExitCode::CueParse,
        }
    }
}

impl From<&EngineError> for ExitCode {
    fn from(err: &EngineError) -> Self {
        match err {
            EngineError::DmxBackendSetup(_) => ExitCode::DmxBackendSetup,
            EngineError::DmxBackendServer(_) => ExitCode::DmxBackendServer,
        }
    }
}
