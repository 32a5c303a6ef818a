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

// File extension matching for backend auto-detection

/// Extension token of a location, without the leading dot
///
/// Only the last path segment is inspected. Dot-files (".hidden") and
/// names ending in a dot have no extension.
///
/// - `/data/trace.log` -> `log`
/// - `archive.tar.gz` -> `gz`
/// - `/data.dir/trace` -> ``
pub fn extension_of(location: &str) -> &str {
    let segment = location
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(location);

    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext,
        _ => "",
    }
}

/// Whether a backend declaring `declared` claims the location
///
/// `declared` may carry a leading dot. An empty token on either side
/// never matches.
pub fn matches_extension(location: &str, declared: &str) -> bool {
    let token = extension_of(location);
    let declared = declared.strip_prefix('.').unwrap_or(declared);
    !token.is_empty() && token == declared
}
