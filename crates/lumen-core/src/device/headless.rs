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

use super::{DeviceError, RenderContext, TextureDescriptor, TextureId};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

/// One operation received by a [`HeadlessContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCall {
    /// A texture was created.
    CreateTexture {
        /// The assigned ID.
        id: TextureId,
        /// The descriptor it was created from.
        descriptor: TextureDescriptor,
    },
    /// A mip level was uploaded.
    UploadTexture {
        /// The written texture.
        id: TextureId,
        /// The written level.
        mip_level: u32,
        /// Number of bytes uploaded.
        size: usize,
    },
    /// A texture was released.
    DeleteTexture {
        /// The released texture.
        id: TextureId,
    },
}

/// A [`RenderContext`] without a GPU.
///
/// It validates calls the way a real backend would (unknown IDs, upload sizes)
/// and records them, so callers can assert on what reached the device.
#[derive(Debug, Default)]
pub struct HeadlessContext {
    next_id: Cell<u64>,
    textures: RefCell<HashMap<TextureId, TextureDescriptor>>,
    calls: RefCell<Vec<DeviceCall>>,
}

impl HeadlessContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every call received so far, oldest first.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.borrow().clone()
    }

    /// Returns the number of textures currently alive on the device.
    pub fn live_textures(&self) -> usize {
        self.textures.borrow().len()
    }

    fn level_size(descriptor: &TextureDescriptor, mip_level: u32) -> usize {
        let width = (descriptor.width >> mip_level).max(1) as usize;
        let height = (descriptor.height >> mip_level).max(1) as usize;
        width * height * descriptor.format.bytes_per_texel()
    }
}

impl RenderContext for HeadlessContext {
    fn create_texture(&self, descriptor: &TextureDescriptor) -> Result<TextureId, DeviceError> {
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(DeviceError::InvalidDescriptor {
                label: descriptor.label.clone(),
                reason: "zero-sized texture".to_string(),
            });
        }
        if descriptor.mip_level_count == 0 {
            return Err(DeviceError::InvalidDescriptor {
                label: descriptor.label.clone(),
                reason: "a texture needs at least one mip level".to_string(),
            });
        }

        let id = TextureId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.textures.borrow_mut().insert(id, descriptor.clone());
        self.calls.borrow_mut().push(DeviceCall::CreateTexture {
            id,
            descriptor: descriptor.clone(),
        });
        log::trace!("HeadlessContext: created texture {id:?} '{}'", descriptor.label);
        Ok(id)
    }

    fn upload_texture(
        &self,
        id: TextureId,
        mip_level: u32,
        data: &[u8],
    ) -> Result<(), DeviceError> {
        let expected = {
            let textures = self.textures.borrow();
            let descriptor = textures
                .get(&id)
                .ok_or(DeviceError::TextureNotFound { id })?;
            if mip_level >= descriptor.mip_level_count {
                return Err(DeviceError::InvalidDescriptor {
                    label: descriptor.label.clone(),
                    reason: format!("mip level {mip_level} out of range"),
                });
            }
            Self::level_size(descriptor, mip_level)
        };

        if expected != data.len() {
            return Err(DeviceError::SizeMismatch {
                id,
                mip_level,
                expected,
                actual: data.len(),
            });
        }

        self.calls.borrow_mut().push(DeviceCall::UploadTexture {
            id,
            mip_level,
            size: data.len(),
        });
        Ok(())
    }

    fn delete_texture(&self, id: TextureId) -> Result<(), DeviceError> {
        if self.textures.borrow_mut().remove(&id).is_none() {
            return Err(DeviceError::TextureNotFound { id });
        }
        self.calls.borrow_mut().push(DeviceCall::DeleteTexture { id });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::TextureFormat;

    fn descriptor(width: u32, height: u32, mips: u32) -> TextureDescriptor {
        TextureDescriptor {
            label: "test".to_string(),
            width,
            height,
            format: TextureFormat::Rgba8Unorm,
            mip_level_count: mips,
            render_target: false,
        }
    }

    #[test]
    fn uploads_are_checked_against_level_size() {
        let context = HeadlessContext::new();
        let id = context.create_texture(&descriptor(4, 2, 2)).unwrap();

        assert!(context.upload_texture(id, 0, &[0; 32]).is_ok());
        assert!(context.upload_texture(id, 1, &[0; 8]).is_ok());
        assert_eq!(
            context.upload_texture(id, 1, &[0; 9]),
            Err(DeviceError::SizeMismatch {
                id,
                mip_level: 1,
                expected: 8,
                actual: 9
            })
        );
    }

    #[test]
    fn deleted_textures_are_unknown() {
        let context = HeadlessContext::new();
        let id = context.create_texture(&descriptor(1, 1, 1)).unwrap();
        context.delete_texture(id).unwrap();

        assert_eq!(context.live_textures(), 0);
        assert_eq!(
            context.delete_texture(id),
            Err(DeviceError::TextureNotFound { id })
        );
        assert_eq!(context.calls().len(), 2);
    }

    #[test]
    fn zero_sized_textures_are_rejected() {
        let context = HeadlessContext::new();
        assert!(matches!(
            context.create_texture(&descriptor(0, 4, 1)),
            Err(DeviceError::InvalidDescriptor { .. })
        ));
    }
}
