//! Per-frame scene state and uniform assembly.
//!
//! [`FrameContext`] is the single owner of everything that changes between
//! frames. Each frame the host calls [`FrameContext::advance`] with the current
//! frame rate and then [`FrameContext::assemble`], which derives every matrix
//! and vector from scratch and packs them into a [`FrameUniforms`] ready for
//! [`Renderer::render`](crate::Renderer::render). Only the animation angle
//! survives from one frame to the next.

use glam::Vec3;
use log::{trace, warn};

use crate::camera::Camera;
use crate::light::DirectionalLight;
use crate::transform::Transform;
use crate::uniforms::{PhongUniforms, SkyboxUniforms, Uniforms};

/// Colours and sun size of the procedural sky.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SkySettings {
    pub light_color: Vec3,
    pub sky_color: Vec3,
    pub horizon_color: Vec3,
    pub ground_color: Vec3,
    /// Sun disc size as `1 - cos(angular radius)`.
    pub sun_size: f32,
}

impl Default for SkySettings {
    fn default() -> Self {
        Self {
            light_color: Vec3::new(1.0, 1.0, 0.6),
            sky_color: Vec3::new(0.2, 0.4, 1.0),
            horizon_color: Vec3::new(0.3, 0.7, 0.9),
            ground_color: Vec3::new(0.2, 0.6, 0.2),
            sun_size: 0.03,
        }
    }
}

/// Material-independent lighting terms for the model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhongSettings {
    pub ambient_color: Vec3,
    pub specular_intensity: f32,
}

impl Default for PhongSettings {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::new(0.05, 0.05, 0.2),
            specular_intensity: 0.1,
        }
    }
}

/// Everything the renderer uploads for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameUniforms {
    /// Matrices for the skybox sphere.
    pub skybox: Uniforms,
    /// Matrices for the imported model.
    pub model: Uniforms,
    pub sky: SkyboxUniforms,
    pub phong: PhongUniforms,
}

/// Scene state carried across frames.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameContext {
    /// Accumulated animation time in seconds.
    pub angle: f32,
    pub camera: Camera,
    pub model_transform: Transform,
    pub light: DirectionalLight,
    /// Light pitch rate in radians per second of `angle`.
    pub light_speed: f32,
    pub sky: SkySettings,
    pub phong: PhongSettings,
}

impl FrameContext {
    pub fn new(camera: Camera, model_transform: Transform) -> Self {
        let sky = SkySettings::default();
        Self {
            angle: 0.0,
            camera,
            model_transform,
            light: DirectionalLight::new(sky.light_color),
            light_speed: 45f32.to_radians(),
            sky,
            phong: PhongSettings::default(),
        }
    }

    pub fn with_sky(mut self, sky: SkySettings) -> Self {
        self.light.color = sky.light_color;
        self.sky = sky;
        self
    }

    pub fn with_phong(mut self, phong: PhongSettings) -> Self {
        self.phong = phong;
        self
    }

    pub fn with_light_speed(mut self, light_speed: f32) -> Self {
        self.light_speed = light_speed;
        self
    }

    /// Steps the animation by one frame at `frames_per_second`.
    ///
    /// A non-positive rate leaves the angle untouched.
    pub fn advance(&mut self, frames_per_second: f32) {
        if frames_per_second > 0.0 {
            self.angle += 1.0 / frames_per_second;
        } else {
            warn!(
                "ignoring non-positive frame rate {}, animation paused",
                frames_per_second
            );
        }
    }

    /// Keeps the camera's aspect ratio in step with the surface.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.camera.aspect_ratio = aspect_ratio;
    }

    /// Derives this frame's uniform records from the current state.
    ///
    /// # Panics
    ///
    /// Panics if the camera is degenerate, see [`Camera::projection_matrix`].
    pub fn assemble(&mut self) -> FrameUniforms {
        let view = self.camera.view_matrix();
        let projection = self.camera.projection_matrix();
        let camera_position = self.camera.position();

        let skybox_transform = Transform::from_position(camera_position);
        let skybox = Uniforms::new(skybox_transform.matrix(), view, projection);
        let model = Uniforms::new(self.model_transform.matrix(), view, projection);

        self.light.rotation.x = self.light_speed * self.angle;
        let light_dir = self.light.direction();
        trace!("frame angle {:.3}, light dir {:?}", self.angle, light_dir);

        let sky = SkyboxUniforms::new(
            light_dir,
            self.light.color,
            self.sky.sky_color,
            self.sky.horizon_color,
            self.sky.ground_color,
            self.sky.sun_size,
        );
        let phong = PhongUniforms::new(
            self.phong.ambient_color,
            camera_position,
            light_dir,
            self.light.color,
            self.phong.specular_intensity,
        );

        FrameUniforms {
            skybox,
            model,
            sky,
            phong,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::tests::approx_vec3;
    use glam::Mat4;

    fn scene() -> FrameContext {
        let camera = Camera::perspective(60f32.to_radians()).at(Vec3::new(0.0, 0.0, -5.0));
        let model = Transform::from_position(Vec3::new(0.0, -0.3, -3.0)).uniform_scale(0.3);
        FrameContext::new(camera, model)
    }

    #[test]
    fn advance_accumulates_frame_time() {
        let mut ctx = scene();
        for _ in 0..60 {
            ctx.advance(60.0);
        }
        assert!((ctx.angle - 1.0).abs() < 1e-4);
    }

    #[test]
    fn non_positive_frame_rate_pauses_animation() {
        let mut ctx = scene();
        ctx.advance(30.0);
        let before = ctx.angle;
        ctx.advance(0.0);
        ctx.advance(-60.0);
        assert_eq!(ctx.angle, before);
    }

    #[test]
    fn light_pitch_follows_angle() {
        let mut ctx = scene().with_light_speed(2.0);
        ctx.angle = 0.25;
        let frame = ctx.assemble();

        assert_eq!(ctx.light.rotation.x, 0.5);
        let expected = ctx.light.direction().to_array();
        assert_eq!(frame.sky.light_dir, expected);
        assert_eq!(frame.phong.light_dir, expected);
    }

    #[test]
    fn light_starts_along_z() {
        let frame = scene().assemble();
        assert_eq!(frame.sky.light_dir, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn skybox_is_centred_on_camera() {
        let mut ctx = scene();
        ctx.camera.transform.position = Vec3::new(3.0, 1.0, -7.0);
        let frame = ctx.assemble();

        let skybox_model = Mat4::from_cols_array_2d(&frame.skybox.model);
        assert_eq!(skybox_model, Mat4::from_translation(Vec3::new(3.0, 1.0, -7.0)));
        assert_eq!(frame.phong.view_position, [3.0, 1.0, -7.0]);
    }

    #[test]
    fn both_drawables_share_camera_matrices() {
        let mut ctx = scene();
        let frame = ctx.assemble();
        assert_eq!(frame.skybox.view, frame.model.view);
        assert_eq!(frame.skybox.projection, frame.model.projection);
        assert_eq!(
            Mat4::from_cols_array_2d(&frame.model.view),
            ctx.camera.view_matrix()
        );
    }

    #[test]
    fn model_matrix_places_scaled_model() {
        let mut ctx = scene();
        let model = Mat4::from_cols_array_2d(&ctx.assemble().model.model);

        assert_eq!(model.w_axis.to_array(), [0.0, -0.3, -3.0, 1.0]);
        assert!(approx_vec3(model.x_axis.truncate(), Vec3::X * 0.3));
        assert!(approx_vec3(model.y_axis.truncate(), Vec3::Y * 0.3));
        assert!(approx_vec3(model.z_axis.truncate(), Vec3::Z * 0.3));
    }

    #[test]
    fn settings_reach_the_records() {
        let sky = SkySettings {
            light_color: Vec3::new(0.9, 0.8, 0.7),
            sun_size: 0.05,
            ..Default::default()
        };
        let phong = PhongSettings {
            ambient_color: Vec3::splat(0.1),
            specular_intensity: 0.5,
        };
        let frame = scene().with_sky(sky).with_phong(phong).assemble();

        assert_eq!(frame.sky.light_color, [0.9, 0.8, 0.7]);
        assert_eq!(frame.phong.light_color, [0.9, 0.8, 0.7]);
        assert_eq!(frame.sky.sun_size, 0.05);
        assert_eq!(frame.sky.sky_color, [0.2, 0.4, 1.0]);
        assert_eq!(frame.phong.ambient_color, [0.1, 0.1, 0.1]);
        assert_eq!(frame.phong.specular_intensity, 0.5);
    }

    #[test]
    fn resize_updates_projection() {
        let mut ctx = scene();
        let square = ctx.assemble().model.projection;
        ctx.set_aspect_ratio(2.0);
        let wide = ctx.assemble().model.projection;
        assert_ne!(square, wide);
        assert_eq!(square[1], wide[1]);
    }

    #[test]
    #[should_panic(expected = "invalid camera")]
    fn degenerate_camera_panics_during_assembly() {
        let mut ctx = scene();
        ctx.set_aspect_ratio(0.0);
        ctx.assemble();
    }
}
