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

use crate::config::StorageSettings;

/// What to open: a location plus an optional backend to force
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageRequest {
    location: String,
    explicit_backend_id: Option<String>,
}

impl StorageRequest {
    /// Request that auto-detects the backend
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            explicit_backend_id: None,
        }
    }

    /// Request committed to one named backend
    pub fn with_backend(location: impl Into<String>, backend_id: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            explicit_backend_id: Some(backend_id.into()),
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// The explicit backend id, treating an empty string as absent
    pub fn explicit_backend_id(&self) -> Option<&str> {
        self.explicit_backend_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}

impl From<&StorageSettings> for StorageRequest {
    fn from(settings: &StorageSettings) -> Self {
        match &settings.storage_id {
            Some(id) => Self::with_backend(settings.uri.clone(), id.clone()),
            None => Self::new(settings.uri.clone()),
        }
    }
}
