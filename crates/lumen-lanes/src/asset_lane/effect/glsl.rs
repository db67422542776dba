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
//! Shader sources split around their `#pragma include` directives.

use lumen_io::ParserError;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// One piece of a shader source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlslBlock {
    /// Literal GLSL text.
    Text(String),
    /// An include that has not been resolved yet.
    Include {
        /// Identifies the block across splices.
        id: u64,
        /// The included filename, as written.
        filename: String,
    },
}

/// A shader source as a sequence of text and include blocks.
///
/// Resolving an include splices the parsed contents of the included file in
/// place of its block, so nested includes show up as new include blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlslBlockList {
    blocks: Vec<GlslBlock>,
}

/// A block list shared by every copy of the pass that uses it.
pub type GlslBlockListRef = Rc<RefCell<GlslBlockList>>;

const PRAGMA: &str = "#pragma";
const INCLUDE: &str = "include";

impl GlslBlockList {
    /// Splits `source` into blocks. Include ids are taken from `ids`.
    pub fn parse(source: &str, ids: &Cell<u64>) -> Result<Self, ParserError> {
        let mut blocks = Vec::new();
        let mut text = String::new();

        for line in source.split_inclusive('\n') {
            match include_directive(line)? {
                Some(filename) => {
                    if !text.is_empty() {
                        blocks.push(GlslBlock::Text(std::mem::take(&mut text)));
                    }
                    let id = ids.get();
                    ids.set(id + 1);
                    blocks.push(GlslBlock::Include {
                        id,
                        filename: filename.to_string(),
                    });
                }
                None => text.push_str(line),
            }
        }

        if !text.is_empty() {
            if !text.ends_with('\n') {
                text.push('\n');
            }
            blocks.push(GlslBlock::Text(text));
        }
        Ok(Self { blocks })
    }

    /// The blocks, in source order.
    pub fn blocks(&self) -> &[GlslBlock] {
        &self.blocks
    }

    /// The unresolved includes, in source order.
    pub fn includes(&self) -> Vec<(u64, String)> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                GlslBlock::Include { id, filename } => Some((*id, filename.clone())),
                GlslBlock::Text(_) => None,
            })
            .collect()
    }

    /// Replaces the include block `id` with `contents`. Returns `false` if no
    /// such block exists.
    pub fn resolve(&mut self, id: u64, contents: GlslBlockList) -> bool {
        let position = self
            .blocks
            .iter()
            .position(|block| matches!(block, GlslBlock::Include { id: i, .. } if *i == id));
        match position {
            Some(index) => {
                self.blocks.splice(index..=index, contents.blocks);
                true
            }
            None => false,
        }
    }

    /// Returns `true` once every include has been resolved.
    pub fn is_resolved(&self) -> bool {
        self.blocks
            .iter()
            .all(|block| matches!(block, GlslBlock::Text(_)))
    }

    /// Concatenates the text, or returns `None` while an include is pending.
    pub fn source(&self) -> Option<String> {
        self.blocks
            .iter()
            .map(|block| match block {
                GlslBlock::Text(text) => Some(text.as_str()),
                GlslBlock::Include { .. } => None,
            })
            .collect()
    }
}

/// Reads the filename of a `#pragma include "file"` line. Both quote styles
/// are accepted, with or without parentheses.
fn include_directive(line: &str) -> Result<Option<&str>, ParserError> {
    let Some(rest) = line.trim().strip_prefix(PRAGMA) else {
        return Ok(None);
    };
    let Some(argument) = rest.trim_start().strip_prefix(INCLUDE) else {
        return Ok(None);
    };

    let mut argument = argument.trim();
    if let Some(inner) = argument
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
    {
        argument = inner.trim();
    }

    let unquoted = ['"', '\'']
        .iter()
        .find_map(|quote| argument.strip_prefix(*quote)?.strip_suffix(*quote));
    match unquoted {
        Some(filename) if !filename.is_empty() => Ok(Some(filename)),
        _ => Err(ParserError::InvalidValue {
            property: "#pragma include".to_string(),
            reason: format!("expected a quoted filename, found '{argument}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_split_the_source() {
        let ids = Cell::new(0);
        let list = GlslBlockList::parse(
            "#version 100\n#pragma include \"Common.glsl\"\nvoid main() {}",
            &ids,
        )
        .unwrap();

        assert_eq!(
            list.blocks(),
            [
                GlslBlock::Text("#version 100\n".to_string()),
                GlslBlock::Include {
                    id: 0,
                    filename: "Common.glsl".to_string()
                },
                GlslBlock::Text("void main() {}\n".to_string()),
            ]
        );
        assert_eq!(list.source(), None);
    }

    #[test]
    fn nested_includes_are_spliced_in_place() {
        let ids = Cell::new(0);
        let mut list =
            GlslBlockList::parse("a\n#pragma include('outer.glsl')\nb\n", &ids).unwrap();
        let outer = GlslBlockList::parse("o1\n#pragma include 'inner.glsl'\no2", &ids).unwrap();
        let inner = GlslBlockList::parse("i", &ids).unwrap();

        assert!(list.resolve(0, outer));
        assert_eq!(list.includes(), vec![(1, "inner.glsl".to_string())]);
        assert!(list.resolve(1, inner));
        assert!(!list.resolve(1, GlslBlockList::default()));

        assert!(list.is_resolved());
        assert_eq!(list.source().as_deref(), Some("a\no1\ni\no2\nb\n"));
    }

    #[test]
    fn malformed_includes_are_rejected() {
        let ids = Cell::new(0);
        let error = GlslBlockList::parse("#pragma include Common.glsl\n", &ids).unwrap_err();
        assert_eq!(error.type_tag(), "InvalidValue");
    }

    #[test]
    fn other_pragmas_are_text() {
        let ids = Cell::new(0);
        let list = GlslBlockList::parse("#pragma optimize(off)\n", &ids).unwrap();
        assert!(list.is_resolved());
    }
}
