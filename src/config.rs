use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::Deserialize;
use thiserror::Error;

use crate::camera::{Camera, CameraError};
use crate::frame::{FrameContext, PhongSettings, SkySettings};
use crate::transform::Transform;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid camera: {0}")]
    Camera(#[from] CameraError),
    #[error("window size must be non-zero, got {width}x{height}")]
    WindowSize { width: u32, height: u32 },
    #[error("frames per second must be positive, got {0}")]
    FrameRate(f32),
}

/// Window, camera and scene settings for the demo.
///
/// Every field has a default, so a JSON file only needs the keys it changes:
///
/// ```
/// use skylit::AppConfig;
///
/// let config = AppConfig::from_json(r#"{ "title": "Teapot", "fov_y_deg": 45.0 }"#)?;
/// assert_eq!(config.width, 800);
/// # Ok::<(), skylit::ConfigError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Fallback when the monitor does not report a refresh rate.
    pub frames_per_second: f32,

    pub camera_position: [f32; 3],
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,

    /// STL or OBJ model to import. `None` renders the sky alone.
    pub model_path: Option<PathBuf>,
    /// Image applied to the model. `None` uses plain white.
    pub texture_path: Option<PathBuf>,
    pub model_position: [f32; 3],
    /// Euler angles in degrees.
    pub model_rotation_deg: [f32; 3],
    pub model_scale: [f32; 3],

    /// Light pitch rate in degrees per second. The default of 45 turns the
    /// light once every eight seconds. A pitch of `45 * seconds` radians, the
    /// classic rate of this demo, is `2578.31`.
    pub light_speed_deg: f32,
    pub light_color: [f32; 3],
    pub sky_color: [f32; 3],
    pub horizon_color: [f32; 3],
    pub ground_color: [f32; 3],
    pub sun_size: f32,
    pub ambient_color: [f32; 3],
    pub specular_intensity: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let sky = SkySettings::default();
        let phong = PhongSettings::default();
        Self {
            title: "Skylit".to_string(),
            width: 800,
            height: 600,
            frames_per_second: 60.0,
            camera_position: [0.0, 0.0, -5.0],
            fov_y_deg: 60.0,
            near: 0.1,
            far: 100.0,
            model_path: None,
            texture_path: None,
            model_position: [0.0, -0.3, -3.0],
            model_rotation_deg: [0.0; 3],
            model_scale: [0.3; 3],
            light_speed_deg: 45.0,
            light_color: sky.light_color.to_array(),
            sky_color: sky.sky_color.to_array(),
            horizon_color: sky.horizon_color.to_array(),
            ground_color: sky.ground_color.to_array(),
            sun_size: sky.sun_size,
            ambient_color: phong.ambient_color.to_array(),
            specular_intensity: phong.specular_intensity,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn frames_per_second(mut self, fps: f32) -> Self {
        self.frames_per_second = fps;
        self
    }

    pub fn model(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = Some(path.into());
        self
    }

    pub fn texture(mut self, path: impl Into<PathBuf>) -> Self {
        self.texture_path = Some(path.into());
        self
    }

    /// Rejects settings that would only fail once the window is up.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::WindowSize {
                width: self.width,
                height: self.height,
            });
        }
        if !(self.frames_per_second > 0.0) {
            return Err(ConfigError::FrameRate(self.frames_per_second));
        }
        self.camera().validate()?;
        Ok(())
    }

    /// The perspective camera described by this config, sized to the window.
    pub fn camera(&self) -> Camera {
        Camera::perspective(self.fov_y_deg.to_radians())
            .at(Vec3::from(self.camera_position))
            .aspect_ratio(self.width as f32 / self.height as f32)
            .clip_planes(self.near, self.far)
    }

    pub fn model_transform(&self) -> Transform {
        Transform::new()
            .position(Vec3::from(self.model_position))
            .rotation(Vec3::from(self.model_rotation_deg.map(f32::to_radians)))
            .scale(Vec3::from(self.model_scale))
    }

    pub fn sky_settings(&self) -> SkySettings {
        SkySettings {
            light_color: Vec3::from(self.light_color),
            sky_color: Vec3::from(self.sky_color),
            horizon_color: Vec3::from(self.horizon_color),
            ground_color: Vec3::from(self.ground_color),
            sun_size: self.sun_size,
        }
    }

    pub fn phong_settings(&self) -> PhongSettings {
        PhongSettings {
            ambient_color: Vec3::from(self.ambient_color),
            specular_intensity: self.specular_intensity,
        }
    }

    /// Initial per-frame state for this scene.
    pub fn frame_context(&self) -> FrameContext {
        FrameContext::new(self.camera(), self.model_transform())
            .with_sky(self.sky_settings())
            .with_phong(self.phong_settings())
            .with_light_speed(self.light_speed_deg.to_radians())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_demo_scene() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let ctx = config.frame_context();
        assert_eq!(ctx.camera.position(), Vec3::new(0.0, 0.0, -5.0));
        assert_eq!(ctx.model_transform.position, Vec3::new(0.0, -0.3, -3.0));
        assert_eq!(ctx.model_transform.scale, Vec3::splat(0.3));
        assert_eq!(ctx.light.color, Vec3::new(1.0, 1.0, 0.6));
        assert_eq!(ctx.sky, SkySettings::default());
        assert_eq!(ctx.phong, PhongSettings::default());
        assert!((ctx.light_speed - 45f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn light_speed_is_read_in_degrees() {
        let fast = AppConfig::from_json(r#"{ "light_speed_deg": 2578.31 }"#).unwrap();
        assert!((fast.frame_context().light_speed - 45.0).abs() < 1e-3);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AppConfig::from_json(
            r#"{
                "title": "Bunny",
                "model_path": "assets/bunny.stl",
                "camera_position": [1.0, 2.0, -8.0],
                "sun_size": 0.05
            }"#,
        )
        .unwrap();

        assert_eq!(config.title, "Bunny");
        assert_eq!(config.model_path, Some(PathBuf::from("assets/bunny.stl")));
        assert_eq!(config.camera_position, [1.0, 2.0, -8.0]);
        assert_eq!(config.sun_size, 0.05);
        assert_eq!(config.width, 800);
        assert_eq!(config.texture_path, None);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = AppConfig::from_json(r#"{ "width": "wide" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = AppConfig::from_file("no/such/config.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("no/such/config.json"));
    }

    #[test]
    fn validate_catches_bad_camera() {
        let mut config = AppConfig::new();
        config.far = config.near;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Camera(CameraError::ClipRange { .. }))
        ));

        let config = AppConfig {
            fov_y_deg: 200.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Camera(CameraError::FieldOfView(_)))
        ));
    }

    #[test]
    fn validate_catches_window_and_frame_rate() {
        assert!(matches!(
            AppConfig::new().size(0, 600).validate(),
            Err(ConfigError::WindowSize { width: 0, .. })
        ));
        assert!(matches!(
            AppConfig::new().frames_per_second(0.0).validate(),
            Err(ConfigError::FrameRate(_))
        ));
    }

    #[test]
    fn camera_matches_window_aspect() {
        let camera = AppConfig::new().size(1600, 900).camera();
        assert!((camera.aspect_ratio - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn model_rotation_is_read_in_degrees() {
        let config = AppConfig {
            model_rotation_deg: [90.0, 0.0, 0.0],
            ..Default::default()
        };
        let rotation = config.model_transform().rotation;
        assert!((rotation.x - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    }
}
