//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;

// One stored resource with its metadata, as served by the HTTP handler.
// `last_modified` keeps the RFC-1123 textual form it is compared and
// served in.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Resource {
    pub last_modified: String,
    pub file_size: usize,
    pub etag: String,
    pub data: String,
}

// The server's keyed store of named resources. When created from a file,
// every mutation is written back as a JSON object mapping resource name to
// entry; the in-memory form is for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct ResourceStore {
    resources: BTreeMap<String, Resource>,
    path: Option<PathBuf>,
}

// ===== impl ResourceStore =====

impl ResourceStore {
    // Load the store from a JSON file.
    pub fn load(path: &Path) -> Result<ResourceStore, Error> {
        let data = std::fs::read_to_string(path).map_err(Error::StoreIoError)?;
        let resources =
            serde_json::from_str(&data).map_err(Error::StoreFormatError)?;

        Ok(ResourceStore {
            resources,
            path: Some(path.to_path_buf()),
        })
    }

    // Create a file-backed store with the given initial contents.
    pub fn create(
        path: &Path,
        resources: BTreeMap<String, Resource>,
    ) -> Result<ResourceStore, Error> {
        let store = ResourceStore {
            resources,
            path: Some(path.to_path_buf()),
        };
        store.persist()?;

        Ok(store)
    }

    // Create an in-memory store.
    pub fn memory(resources: BTreeMap<String, Resource>) -> ResourceStore {
        ResourceStore {
            resources,
            path: None,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    // Insert or replace a resource, writing the store back if it is
    // file-backed.
    pub fn put(&mut self, name: &str, resource: Resource) -> Result<(), Error> {
        self.resources.insert(name.to_owned(), resource);
        self.persist()
    }

    fn persist(&self) -> Result<(), Error> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let data = serde_json::to_string_pretty(&self.resources)
            .map_err(Error::StoreFormatError)?;
        std::fs::write(path, data).map_err(Error::StoreIoError)?;

        Ok(())
    }
}

// ===== tests =====
