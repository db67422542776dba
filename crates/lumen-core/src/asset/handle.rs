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

use super::Asset;
use std::{fmt, ops::Deref, sync::Arc};

/// A thread-safe, reference-counted handle to a loaded asset.
///
/// This acts as a smart pointer, providing shared ownership of an asset's data.
/// Cloning a handle is cheap, as it only increments the reference count
/// and does not duplicate the underlying asset data.
///
/// Two handles are equal when they point to the same asset instance. This is
/// the identity the dependency tables rely on: resolving the same reference id
/// twice must yield handles that compare equal.
pub struct AssetHandle<T: Asset>(Arc<T>);

impl<T: Asset> AssetHandle<T> {
    /// Creates a new `AssetHandle` that takes ownership of the asset data.
    pub fn new(asset: T) -> Self {
        Self(Arc::new(asset))
    }

    /// Returns `true` if both handles point to the same asset instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns a key identifying the asset instance behind this handle.
    ///
    /// The key is only meaningful while at least one handle is alive.
    pub fn identity(&self) -> AssetIdentity {
        AssetIdentity(Arc::as_ptr(&self.0) as *const () as usize)
    }
}

/// An opaque key identifying one asset instance, see [`AssetHandle::identity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetIdentity(usize);

impl<T: Asset> Clone for AssetHandle<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: Asset> PartialEq for AssetHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T: Asset> Eq for AssetHandle<T> {}

impl<T: Asset + fmt::Debug> fmt::Debug for AssetHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AssetHandle").field(&self.0).finish()
    }
}

impl<T: Asset> Deref for AssetHandle<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Blob(Vec<u8>);
    impl Asset for Blob {}

    #[test]
    fn clones_share_identity() {
        let a = AssetHandle::new(Blob(vec![1, 2, 3]));
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a, b);
    }

    #[test]
    fn equal_contents_are_distinct_assets() {
        let a = AssetHandle::new(Blob(vec![1]));
        let b = AssetHandle::new(Blob(vec![1]));
        assert_ne!(a, b);
        assert_ne!(a.identity(), b.identity());
        assert_eq!(*a, *b);
    }
}
