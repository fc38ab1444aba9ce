use std::time::Duration;

use cgmath::{Deg, InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use winit::{
    event::{ElementState, KeyEvent, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

pub const WORLD_UP: Vector3<f32> = Vector3::new(0.0, 1.0, 0.0);

/// Maps GL clip space (z in [-1, 1]) to wgpu clip space (z in [0, 1]).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Axis-aligned box the camera position is kept in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Bounds {
    pub fn new<P: Into<Point3<f32>>>(min: P, max: P) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    /// Clamps each axis on its own so a blocked axis does not cancel the others.
    pub fn clamp(&self, p: Point3<f32>) -> Point3<f32> {
        Point3::new(
            p.x.max(self.min.x).min(self.max.x),
            p.y.max(self.min.y).min(self.max.y),
            p.z.max(self.min.z).min(self.max.z),
        )
    }

    pub fn contains(&self, p: Point3<f32>) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }
}

/// Start pose, movement limits and lens of the walking camera.
#[derive(Clone, Debug)]
pub struct CameraSettings {
    pub start: Point3<f32>,
    pub yaw: Deg<f32>,
    pub pitch: Deg<f32>,
    pub bounds: Bounds,
    /// World units per second.
    pub speed: f32,
    /// Degrees per frame while a yaw key is held.
    pub rotation_speed: Deg<f32>,
    pub yaw_limit: Deg<f32>,
    pub fovy: Deg<f32>,
    pub viewport: [u32; 2],
    pub znear: f32,
    pub zfar: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            start: Point3::new(-15.0, 1.0, 0.0),
            yaw: Deg(0.0),
            pitch: Deg(0.0),
            bounds: Bounds::new(Point3::new(-15.0, 1.0, -3.0), Point3::new(5.0, 1.0, 3.0)),
            speed: 2.5,
            rotation_speed: Deg(0.2),
            yaw_limit: Deg(45.0),
            fovy: Deg(60.0),
            viewport: [800, 600],
            znear: 0.1,
            zfar: 50.0,
        }
    }
}

impl CameraSettings {
    pub fn camera(&self) -> Camera {
        let limit = self.yaw_limit.0.abs();
        Camera::new(self.start, Deg(self.yaw.0.clamp(-limit, limit)), self.pitch)
    }

    pub fn projection(&self) -> Projection {
        Projection::new(
            self.viewport[0],
            self.viewport[1],
            self.fovy,
            self.znear,
            self.zfar,
        )
    }

    pub fn controller(&self) -> CameraController {
        CameraController::new(self)
    }
}

/// First-person camera. `front` is derived from yaw and pitch and refreshed
/// whenever either changes.
#[derive(Clone, Debug)]
pub struct Camera {
    pub position: Point3<f32>,
    yaw: Deg<f32>,
    pitch: Deg<f32>,
    front: Vector3<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Deg<f32>>, P: Into<Deg<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        let yaw = yaw.into();
        let pitch = pitch.into();
        Self {
            position: position.into(),
            yaw,
            pitch,
            front: front_from(yaw, pitch),
        }
    }

    pub fn yaw(&self) -> Deg<f32> {
        self.yaw
    }

    pub fn pitch(&self) -> Deg<f32> {
        self.pitch
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn set_yaw(&mut self, yaw: Deg<f32>) {
        self.yaw = yaw;
        self.front = front_from(self.yaw, self.pitch);
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.position + self.front, WORLD_UP)
    }
}

/// `normalize(cos(yaw)cos(pitch), sin(pitch), sin(yaw)cos(pitch))`
pub fn front_from(yaw: Deg<f32>, pitch: Deg<f32>) -> Vector3<f32> {
    let Rad(yaw) = Rad::from(yaw);
    let Rad(pitch) = Rad::from(pitch);
    Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
}

/// Fixed perspective lens. The aspect ratio is taken once from the configured
/// viewport and does not follow window resizes.
#[derive(Clone, Debug)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Key-down state of the six navigation keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MovementKeys {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub yaw_left: bool,
    pub yaw_right: bool,
}

#[derive(Debug)]
pub struct CameraController {
    pub keys: MovementKeys,
    speed: f32,
    rotation_speed: Deg<f32>,
    yaw_limit: Deg<f32>,
    bounds: Bounds,
}

impl CameraController {
    pub fn new(settings: &CameraSettings) -> Self {
        Self {
            keys: MovementKeys::default(),
            speed: settings.speed,
            rotation_speed: settings.rotation_speed,
            yaw_limit: Deg(settings.yaw_limit.0.abs()),
            bounds: settings.bounds,
        }
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Returns `true` when the key is one of W/S/A/D/Q/E.
    pub fn handle_key(&mut self, key: KeyCode, state: ElementState) -> bool {
        let pressed = state.is_pressed();
        let slot = match key {
            KeyCode::KeyW => &mut self.keys.forward,
            KeyCode::KeyS => &mut self.keys.back,
            KeyCode::KeyA => &mut self.keys.left,
            KeyCode::KeyD => &mut self.keys.right,
            KeyCode::KeyQ => &mut self.keys.yaw_left,
            KeyCode::KeyE => &mut self.keys.yaw_right,
            _ => return false,
        };
        *slot = pressed;
        true
    }

    pub fn handle_window_events(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state,
                        ..
                    },
                ..
            } => self.handle_key(*key, *state),
            // Released keys never arrive once focus is gone.
            WindowEvent::Focused(false) => {
                self.keys = MovementKeys::default();
                false
            }
            _ => false,
        }
    }

    /// Moves, clamps, then turns the camera and returns the fresh view matrix.
    pub fn update(&mut self, camera: &mut Camera, dt: Duration) -> Matrix4<f32> {
        let step = self.speed * dt.as_secs_f32();
        let front = camera.front();
        let mut candidate = camera.position;
        if self.keys.forward {
            candidate += front * step;
        }
        if self.keys.back {
            candidate -= front * step;
        }
        if self.keys.left || self.keys.right {
            let right = front.cross(WORLD_UP).normalize();
            if self.keys.left {
                candidate -= right * step;
            }
            if self.keys.right {
                candidate += right * step;
            }
        }
        camera.position = self.bounds.clamp(candidate);

        let mut yaw = camera.yaw();
        if self.keys.yaw_left {
            yaw -= self.rotation_speed;
        }
        if self.keys.yaw_right {
            yaw += self.rotation_speed;
        }
        camera.set_yaw(Deg(yaw.0.clamp(-self.yaw_limit.0, self.yaw_limit.0)));

        camera.calc_matrix()
    }
}
