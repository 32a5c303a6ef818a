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

use serde::{Deserialize, Serialize};

/// A single recorded message as handed to and returned by storage backends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedMessage {
    pub topic: String,
    pub timestamp_ns: i64,
    pub payload: Vec<u8>,
}

impl SerializedMessage {
    pub fn new(topic: impl Into<String>, timestamp_ns: i64, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            timestamp_ns,
            payload,
        }
    }
}

/// Topic description stored alongside messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicMetadata {
    pub name: String,
    #[serde(default)]
    pub message_type: String,
    #[serde(default = "default_serialization_format")]
    pub serialization_format: String, // "raw", "protobuf", "json", ...
}

impl TopicMetadata {
    pub fn new(name: impl Into<String>, message_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message_type: message_type.into(),
            serialization_format: default_serialization_format(),
        }
    }

    pub fn with_format(mut self, serialization_format: impl Into<String>) -> Self {
        self.serialization_format = serialization_format.into();
        self
    }
}

fn default_serialization_format() -> String {
    "raw".to_string()
}
