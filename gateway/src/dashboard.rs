// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Per-user dashboard persistence.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Dashboard is a named graph layout owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    /// Assigned by the store, ignored on insert.
    #[serde(default)]
    pub id: i64,
    /// Unique per user.
    #[serde(default)]
    pub name: String,
    /// Stored verbatim.
    #[serde(default)]
    pub graphs: serde_json::Value,
}

/// Errors reported by a [`DashboardStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `(user, name)` is already taken.
    #[error("dashboard {0:?} already exists")]
    Conflict(String),
    /// The backing storage failed.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// DashboardStore persists dashboards keyed by user.
///
/// Every operation is scoped to `user`: a dashboard owned by someone else
/// behaves as if it didn't exist.
#[async_trait]
pub trait DashboardStore: std::fmt::Debug + Send + Sync + 'static {
    /// All dashboards of the user, ordered by id.
    async fn list(&self, user: &str) -> Result<Vec<Dashboard>, StoreError>;

    /// One dashboard of the user.
    async fn get(&self, user: &str, id: i64) -> Result<Option<Dashboard>, StoreError>;

    /// Insert a dashboard and return its id.
    async fn insert(
        &self,
        user: &str,
        name: &str,
        graphs: serde_json::Value,
    ) -> Result<i64, StoreError>;

    /// Replace name and graphs of the dashboard with `dashboard.id`.
    ///
    /// Updating an unknown id is not an error.
    async fn update(&self, user: &str, dashboard: Dashboard) -> Result<(), StoreError>;

    /// Delete a dashboard, unknown ids are ignored.
    async fn delete(&self, user: &str, id: i64) -> Result<(), StoreError>;
}

#[derive(Debug)]
struct Row {
    user: String,
    dashboard: Dashboard,
}

#[derive(Debug, Default)]
struct Rows {
    last_id: i64,
    rows: BTreeMap<i64, Row>,
}

impl Rows {
    fn name_taken(&self, user: &str, name: &str, except: Option<i64>) -> bool {
        self.rows.iter().any(|(id, row)| {
            Some(*id) != except && row.user == user && row.dashboard.name == name
        })
    }
}

/// MemoryDashboardStore keeps dashboards for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryDashboardStore {
    inner: RwLock<Rows>,
}

impl MemoryDashboardStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DashboardStore for MemoryDashboardStore {
    async fn list(&self, user: &str) -> Result<Vec<Dashboard>, StoreError> {
        Ok(self
            .inner
            .read()
            .rows
            .values()
            .filter(|row| row.user == user)
            .map(|row| row.dashboard.clone())
            .collect())
    }

    async fn get(&self, user: &str, id: i64) -> Result<Option<Dashboard>, StoreError> {
        Ok(self
            .inner
            .read()
            .rows
            .get(&id)
            .filter(|row| row.user == user)
            .map(|row| row.dashboard.clone()))
    }

    async fn insert(
        &self,
        user: &str,
        name: &str,
        graphs: serde_json::Value,
    ) -> Result<i64, StoreError> {
        let mut inner = self.inner.write();
        if inner.name_taken(user, name, None) {
            return Err(StoreError::Conflict(name.to_string()));
        }

        inner.last_id += 1;
        let id = inner.last_id;
        inner.rows.insert(
            id,
            Row {
                user: user.to_string(),
                dashboard: Dashboard {
                    id,
                    name: name.to_string(),
                    graphs,
                },
            },
        );
        Ok(id)
    }

    async fn update(&self, user: &str, dashboard: Dashboard) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.name_taken(user, &dashboard.name, Some(dashboard.id)) {
            return Err(StoreError::Conflict(dashboard.name));
        }

        if let Some(row) = inner
            .rows
            .get_mut(&dashboard.id)
            .filter(|row| row.user == user)
        {
            row.dashboard.name = dashboard.name;
            row.dashboard.graphs = dashboard.graphs;
        }
        Ok(())
    }

    async fn delete(&self, user: &str, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        if inner.rows.get(&id).is_some_and(|row| row.user == user) {
            inner.rows.remove(&id);
        }
        Ok(())
    }
}
