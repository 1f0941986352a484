//! Sidecar scheduling descriptors
//!
//! A template may sit next to a TOML descriptor with the same stem
//! (`spring.txt` + `spring.toml`) declaring its scheduling mode, date, and
//! subject line. No descriptor means immediate.
//!
//! ```toml
//! mode = "scheduled"
//! date = "2026-09-01"
//! subject = "Spring catalogue"
//! ```

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::{
    campaign::ScheduleMode,
    error::{CatalogError, Result},
};

/// Scheduling mode as written in a descriptor file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DescriptorMode {
    #[default]
    Immediate,
    ScheduleNow,
    Scheduled,
}

/// Parsed sidecar descriptor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Descriptor {
    #[serde(default)]
    pub mode: DescriptorMode,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub subject: Option<String>,
}

impl Descriptor {
    /// Load the descriptor next to `template_path`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DescriptorInvalid`] when the file exists but
    /// cannot be parsed, or declares `scheduled` without a date.
    pub fn load_for(template_path: &Path) -> Result<Self> {
        let path = template_path.with_extension("toml");
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(CatalogError::DescriptorInvalid {
                    path,
                    detail: e.to_string(),
                });
            }
        };

        let descriptor: Self =
            toml::from_str(&content).map_err(|e| CatalogError::DescriptorInvalid {
                path: path.clone(),
                detail: e.to_string(),
            })?;

        if descriptor.mode == DescriptorMode::Scheduled && descriptor.date.is_none() {
            return Err(CatalogError::DescriptorInvalid {
                path,
                detail: "mode = \"scheduled\" requires a date".to_string(),
            });
        }

        Ok(descriptor)
    }

    /// Resolve the descriptor into a campaign scheduling mode.
    #[must_use]
    pub fn schedule_mode(&self) -> ScheduleMode {
        match (self.mode, self.date) {
            (DescriptorMode::Scheduled, Some(date)) => ScheduleMode::Scheduled(date),
            (DescriptorMode::ScheduleNow, _) => ScheduleMode::ScheduleNow,
            // `scheduled` without a date is rejected at load time.
            (DescriptorMode::Immediate | DescriptorMode::Scheduled, _) => ScheduleMode::Immediate,
        }
    }
}
