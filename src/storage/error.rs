// Copyright 2025 coScene
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

// Errors raised while locating and opening storage backends

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("requested storage id '{backend}' is not registered")]
    BackendNotRegistered { backend: String },

    #[error("unable to instantiate storage backend '{backend}': {message}")]
    InstantiationFailed { backend: String, message: String },

    #[error("could not open '{location}' with '{backend}': {message}")]
    OpenFailed {
        backend: String,
        location: String,
        message: String,
    },

    #[error("no registered storage backend could open '{location}'")]
    ResolutionExhausted { location: String },

    #[error("storage backend '{backend}' is already registered")]
    DuplicateBackend { backend: String },

    #[error("storage plugin registry unavailable: {0}")]
    RegistryUnavailable(String),
}

impl StorageError {
    /// Resolution kind of this error, if it is one the resolver recovers from
    pub fn kind(&self) -> Option<ResolutionErrorKind> {
        match self {
            StorageError::BackendNotRegistered { .. } => {
                Some(ResolutionErrorKind::BackendNotRegistered)
            }
            StorageError::InstantiationFailed { .. } => {
                Some(ResolutionErrorKind::InstantiationFailed)
            }
            StorageError::OpenFailed { .. } => Some(ResolutionErrorKind::OpenFailed),
            StorageError::ResolutionExhausted { .. } => {
                Some(ResolutionErrorKind::ResolutionExhausted)
            }
            StorageError::DuplicateBackend { .. } | StorageError::RegistryUnavailable(_) => None,
        }
    }
}

/// Recoverable failures observed during one resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionErrorKind {
    BackendNotRegistered,
    InstantiationFailed,
    OpenFailed,
    ResolutionExhausted,
}

impl fmt::Display for ResolutionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolutionErrorKind::BackendNotRegistered => "backend not registered",
            ResolutionErrorKind::InstantiationFailed => "instantiation failed",
            ResolutionErrorKind::OpenFailed => "open failed",
            ResolutionErrorKind::ResolutionExhausted => "resolution exhausted",
        };
        f.write_str(name)
    }
}

/// Record of one recovered failure, kept for the caller's inspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: ResolutionErrorKind,
    /// Candidate backend, `None` for `ResolutionExhausted`
    pub backend: Option<String>,
    pub message: String,
}

impl From<&StorageError> for Diagnostic {
    fn from(error: &StorageError) -> Self {
        let backend = match error {
            StorageError::BackendNotRegistered { backend }
            | StorageError::InstantiationFailed { backend, .. }
            | StorageError::OpenFailed { backend, .. } => Some(backend.clone()),
            _ => None,
        };

        Self {
            kind: error
                .kind()
                .unwrap_or(ResolutionErrorKind::ResolutionExhausted),
            backend,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.backend {
            Some(backend) => write!(f, "[{}] {}: {}", self.kind, backend, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}
