// Copyright 2025 Fernando Borretti
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

//! The configuration file.
//!
//! ```toml
//! database = "zhquiz.sqlite3"
//! user = "alice"
//!
//! [srs]
//! intervals_hours = [4, 8, 24, 72, 168, 336, 672, 2688]
//! repeat_minutes = 10
//! ```
//!
//! Every key is optional.

use std::path::Path;

use chrono::TimeDelta;
use serde::Deserialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::review::Scheduler;
use crate::srs::DEFAULT_INTERVAL_HOURS;
use crate::srs::LevelTable;

pub const DEFAULT_CONFIG_PATH: &str = "zhquiz.toml";

#[derive(Deserialize, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path to the SQLite database.
    pub database: String,
    /// The user to act as when none is given on the command line.
    pub user: Option<String>,
    pub srs: SrsConfig,
}

#[derive(Deserialize, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SrsConfig {
    /// The review interval of each level, in hours.
    pub intervals_hours: Vec<u32>,
    /// How long until a card that was never reviewed right is due.
    pub repeat_minutes: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: "zhquiz.sqlite3".to_string(),
            user: None,
            srs: SrsConfig::default(),
        }
    }
}

impl Default for SrsConfig {
    fn default() -> Self {
        Self {
            intervals_hours: DEFAULT_INTERVAL_HOURS.to_vec(),
            repeat_minutes: 10,
        }
    }
}

impl Config {
    /// Load the configuration. A missing file means the defaults.
    pub fn load(path: &Path) -> Fallible<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults.", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
            .map_err(|e| ErrorReport::new(format!("{}: {e}", path.display())))
    }

    pub fn parse(content: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(content)?;
        config.scheduler()?;
        Ok(config)
    }

    pub fn scheduler(&self) -> Fallible<Scheduler> {
        Ok(Scheduler {
            levels: LevelTable::from_hours(&self.srs.intervals_hours)?,
            repeat_delay: TimeDelta::minutes(self.srs.repeat_minutes as i64),
        })
    }
}
