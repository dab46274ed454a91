use crate::particle::FieldConfig;
use crate::surface::DeviceClass;
use crate::widget::DriverConfig;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(version, about = "An interactive particle-field animation for the terminal")]
pub struct Args {
    /// Logical pixels per terminal cell, horizontally
    #[arg(long, default_value_t = 8.0)]
    pub cell_width: f64,

    /// Logical pixels per terminal cell, vertically
    #[arg(long, default_value_t = 16.0)]
    pub cell_height: f64,

    /// Physical pixels averaged into each half-block pixel, per axis
    #[arg(long, default_value_t = 1)]
    pub supersample: u32,

    /// Form factor used to size the particle budget
    #[arg(long, value_enum, default_value_t = DeviceClassArg::Auto)]
    pub device_class: DeviceClassArg,

    /// Start with the reduced-motion preference set (toggle with `m`)
    #[arg(long)]
    pub reduced_motion: bool,

    /// Display refresh rate in Hz
    #[arg(long, default_value_t = 60)]
    pub refresh_rate: u32,

    /// Frame rate cap for mobile-class viewports
    #[arg(long, default_value_t = 30)]
    pub mobile_fps: u32,

    /// Seed for particle placement; random when omitted
    #[arg(long)]
    pub seed: Option<u64>,

    /// Opacity of the particle layer over the backdrop
    #[arg(long, default_value_t = 0.7)]
    pub opacity: f64,

    /// Pointer influence radius in logical pixels
    #[arg(long, default_value_t = 100.0)]
    pub interaction_radius: f64,

    /// Hide the ring-and-dot pointer cursor
    #[arg(long)]
    pub no_cursor: bool,

    /// Write logs to this file (terminal output is taken by the animation)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Start with the debug overlay visible (toggle with `d`)
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DeviceClassArg {
    Auto,
    Mobile,
    Desktop,
}

impl DeviceClassArg {
    fn resolve(self) -> Option<DeviceClass> {
        match self {
            DeviceClassArg::Auto => None,
            DeviceClassArg::Mobile => Some(DeviceClass::Mobile),
            DeviceClassArg::Desktop => Some(DeviceClass::Desktop),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("cell size must be positive, got {width}x{height}")]
    CellSize { width: f64, height: f64 },
    #[error("supersample must be between 1 and 4, got {0}")]
    Supersample(u32),
    #[error("{name} must be at least 1, got {value}")]
    Rate { name: &'static str, value: u32 },
    #[error("opacity must be within [0, 1], got {0}")]
    Opacity(f64),
    #[error("interaction radius must be positive, got {0}")]
    InteractionRadius(f64),
}

/// Validated application settings
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub cell_size: (f64, f64),
    pub supersample: u32,
    pub reduced_motion: bool,
    pub refresh_interval: Duration,
    pub seed: Option<u64>,
    pub opacity: f64,
    pub cursor: bool,
    pub log_file: Option<PathBuf>,
    pub debug: bool,
    pub driver: DriverConfig,
}

impl AppConfig {
    /// Physical pixels per logical pixel for the terminal surface
    pub fn device_pixel_ratio(&self) -> f64 {
        self.supersample as f64 / self.cell_size.0
    }
}

impl Args {
    pub fn validate(self) -> Result<AppConfig, ConfigError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.cell_width) || !positive(self.cell_height) {
            return Err(ConfigError::CellSize {
                width: self.cell_width,
                height: self.cell_height,
            });
        }
        if !(1..=4).contains(&self.supersample) {
            return Err(ConfigError::Supersample(self.supersample));
        }
        if self.refresh_rate == 0 {
            return Err(ConfigError::Rate {
                name: "refresh rate",
                value: self.refresh_rate,
            });
        }
        if self.mobile_fps == 0 {
            return Err(ConfigError::Rate {
                name: "mobile fps",
                value: self.mobile_fps,
            });
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ConfigError::Opacity(self.opacity));
        }
        if !positive(self.interaction_radius) {
            return Err(ConfigError::InteractionRadius(self.interaction_radius));
        }

        Ok(AppConfig {
            cell_size: (self.cell_width, self.cell_height),
            supersample: self.supersample,
            reduced_motion: self.reduced_motion,
            refresh_interval: Duration::from_secs_f64(1.0 / self.refresh_rate as f64),
            seed: self.seed,
            opacity: self.opacity,
            cursor: !self.no_cursor,
            log_file: self.log_file,
            debug: self.debug,
            driver: DriverConfig {
                device_class: self.device_class.resolve(),
                mobile_fps: self.mobile_fps,
                field: FieldConfig {
                    interaction_radius: self.interaction_radius,
                    ..FieldConfig::default()
                },
            },
        })
    }
}
