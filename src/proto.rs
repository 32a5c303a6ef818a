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

// Protobuf messages for the framed record file.
//
// Declared with prost derives instead of a build script so the crate
// builds without protoc.

use crate::message::{SerializedMessage, TopicMetadata};

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TopicInfo {
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub message_type: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub serialization_format: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StoredMessage {
    #[prost(string, tag = "1")]
    pub topic: ::prost::alloc::string::String,
    #[prost(int64, tag = "2")]
    pub timestamp_ns: i64,
    #[prost(bytes = "vec", tag = "3")]
    pub payload: ::prost::alloc::vec::Vec<u8>,
}

impl From<&TopicMetadata> for TopicInfo {
    fn from(topic: &TopicMetadata) -> Self {
        Self {
            name: topic.name.clone(),
            message_type: topic.message_type.clone(),
            serialization_format: topic.serialization_format.clone(),
        }
    }
}

impl From<TopicInfo> for TopicMetadata {
    fn from(info: TopicInfo) -> Self {
        Self {
            name: info.name,
            message_type: info.message_type,
            serialization_format: info.serialization_format,
        }
    }
}

impl From<&SerializedMessage> for StoredMessage {
    fn from(message: &SerializedMessage) -> Self {
        Self {
            topic: message.topic.clone(),
            timestamp_ns: message.timestamp_ns,
            payload: message.payload.clone(),
        }
    }
}

impl From<StoredMessage> for SerializedMessage {
    fn from(stored: StoredMessage) -> Self {
        Self {
            topic: stored.topic,
            timestamp_ns: stored.timestamp_ns,
            payload: stored.payload,
        }
    }
}
