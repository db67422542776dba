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
//! Small helpers over the `/`-separated filenames the pipeline passes around.

/// Returns the lowercase extension of the last path component, if any.
pub fn extension(filename: &str) -> Option<String> {
    let name = file_name(filename);
    let (stem, extension) = name.rsplit_once('.')?;
    if stem.is_empty() || extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

/// Returns the last path component.
pub fn file_name(filename: &str) -> &str {
    filename
        .rsplit_once(['/', '\\'])
        .map_or(filename, |(_, name)| name)
}

/// Returns everything before the last path component, without the trailing
/// separator. A bare filename has an empty folder.
pub fn folder(filename: &str) -> &str {
    filename
        .rsplit_once(['/', '\\'])
        .map_or("", |(folder, _)| folder)
}

/// Joins `folder` and `filename`. An empty folder or an absolute filename
/// yields `filename`.
pub fn join(folder: &str, filename: &str) -> String {
    let folder = folder.trim_end_matches(['/', '\\']);
    if folder.is_empty() || is_absolute(filename) {
        filename.to_string()
    } else {
        format!("{folder}/{filename}")
    }
}

/// Returns `true` for filenames that must not be combined with include paths.
pub fn is_absolute(filename: &str) -> bool {
    filename.starts_with('/')
        || filename.contains("://")
        || std::path::Path::new(filename).is_absolute()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_and_taken_from_the_last_component() {
        assert_eq!(extension("models/Cube.SCENE").as_deref(), Some("scene"));
        assert_eq!(extension("dir.v2/README"), None);
        assert_eq!(extension(".hidden"), None);
    }

    #[test]
    fn folder_and_join() {
        assert_eq!(folder("effects/lit/Phong.effect"), "effects/lit");
        assert_eq!(folder("Phong.effect"), "");
        assert_eq!(join("effects/lit/", "Common.glsl"), "effects/lit/Common.glsl");
        assert_eq!(join("", "Common.glsl"), "Common.glsl");
        assert_eq!(join("effects", "/opt/Common.glsl"), "/opt/Common.glsl");
    }
}
