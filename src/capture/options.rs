//! Capture configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use fullpage_pdf::{CaptureOptions, WaitPolicy};
//!
//! # fn example() -> fullpage_pdf::Result<()> {
//! let options = CaptureOptions::builder()
//!     .wait_policy(WaitPolicy::Fixed(Duration::from_secs(3)))
//!     .max_filename_len(60)
//!     .build()?;
//!
//! assert_eq!(options.max_filename_len(), 60);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::error::{Error, Result};

use super::filename::DEFAULT_MAX_FILENAME_LEN;
use super::geometry::DEFAULT_DPI;
use super::wait::WaitPolicy;

// ============================================================================
// Constants
// ============================================================================

/// Debugger protocol version requested when attaching.
pub const DEFAULT_PROTOCOL_VERSION: &str = "1.3";

// ============================================================================
// CaptureOptions
// ============================================================================

/// Validated capture settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOptions {
    wait_policy: WaitPolicy,
    dpi: f64,
    max_filename_len: usize,
    protocol_version: String,
    save_as: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            wait_policy: WaitPolicy::default(),
            dpi: DEFAULT_DPI,
            max_filename_len: DEFAULT_MAX_FILENAME_LEN,
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            save_as: false,
        }
    }
}

impl CaptureOptions {
    /// Creates a builder starting from the defaults.
    #[inline]
    #[must_use]
    pub fn builder() -> CaptureOptionsBuilder {
        CaptureOptionsBuilder::new()
    }

    /// Returns the wait policy.
    #[inline]
    #[must_use]
    pub fn wait_policy(&self) -> WaitPolicy {
        self.wait_policy
    }

    /// Returns the pixels-per-inch used for the paper height.
    #[inline]
    #[must_use]
    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    /// Returns the filename length limit, excluding the extension.
    #[inline]
    #[must_use]
    pub fn max_filename_len(&self) -> usize {
        self.max_filename_len
    }

    /// Returns the protocol version requested when attaching.
    #[inline]
    #[must_use]
    pub fn protocol_version(&self) -> &str {
        &self.protocol_version
    }

    /// Returns whether the download asks for a save dialog.
    #[inline]
    #[must_use]
    pub fn save_as(&self) -> bool {
        self.save_as
    }
}

// ============================================================================
// CaptureOptionsBuilder
// ============================================================================

/// Builder for [`CaptureOptions`].
#[derive(Debug, Clone, Default)]
pub struct CaptureOptionsBuilder {
    wait_policy: Option<WaitPolicy>,
    dpi: Option<f64>,
    max_filename_len: Option<usize>,
    protocol_version: Option<String>,
    save_as: Option<bool>,
}

impl CaptureOptionsBuilder {
    /// Creates a builder with every setting at its default.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long to wait after scrolling.
    #[inline]
    #[must_use]
    pub fn wait_policy(mut self, policy: WaitPolicy) -> Self {
        self.wait_policy = Some(policy);
        self
    }

    /// Sets the pixels-per-inch conversion.
    #[inline]
    #[must_use]
    pub fn dpi(mut self, dpi: f64) -> Self {
        self.dpi = Some(dpi);
        self
    }

    /// Sets the filename length limit.
    #[inline]
    #[must_use]
    pub fn max_filename_len(mut self, len: usize) -> Self {
        self.max_filename_len = Some(len);
        self
    }

    /// Sets the protocol version requested when attaching.
    #[inline]
    #[must_use]
    pub fn protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = Some(version.into());
        self
    }

    /// Sets whether the download asks for a save dialog.
    #[inline]
    #[must_use]
    pub fn save_as(mut self, save_as: bool) -> Self {
        self.save_as = Some(save_as);
        self
    }

    /// Builds the options.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if a numeric setting is out of range, a
    /// stable-height wait could never settle properly, or the protocol
    /// version is not `major.minor`.
    pub fn build(self) -> Result<CaptureOptions> {
        let defaults = CaptureOptions::default();

        let dpi = positive("dpi", self.dpi.unwrap_or(defaults.dpi))?;
        let wait_policy = self.wait_policy.unwrap_or(defaults.wait_policy);
        validate_wait_policy(&wait_policy)?;

        let max_filename_len = self.max_filename_len.unwrap_or(defaults.max_filename_len);
        if max_filename_len == 0 {
            return Err(Error::config("Filename length limit must be at least 1"));
        }

        let protocol_version = self.protocol_version.unwrap_or(defaults.protocol_version);
        validate_protocol_version(&protocol_version)?;

        Ok(CaptureOptions {
            wait_policy,
            dpi,
            max_filename_len,
            protocol_version,
            save_as: self.save_as.unwrap_or(defaults.save_as),
        })
    }
}

// ============================================================================
// Validation
// ============================================================================

fn positive(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(Error::config(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

fn validate_wait_policy(policy: &WaitPolicy) -> Result<()> {
    match *policy {
        WaitPolicy::StableHeight {
            stable_samples: 0, ..
        } => Err(Error::config("Stable-height wait needs at least 1 stable sample")),
        WaitPolicy::StableHeight { interval, .. } if interval.is_zero() => Err(Error::config(
            "Stable-height wait needs a non-zero sampling interval",
        )),
        _ => Ok(()),
    }
}

fn validate_protocol_version(version: &str) -> Result<()> {
    let valid = version
        .split_once('.')
        .is_some_and(|(major, minor)| {
            major.parse::<u32>().is_ok() && minor.parse::<u32>().is_ok()
        });

    if valid {
        Ok(())
    } else {
        Err(Error::config(format!(
            "Protocol version must look like \"1.3\", got {version:?}"
        )))
    }
}

// ============================================================================
// Tests
// ============================================================================
