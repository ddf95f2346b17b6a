// Copyright 2025 the Reticle Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared value types: pointer identity, device poses, cameras, and input samples.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

use glam::{Affine3A, Mat4, Quat, Vec3};
use kurbo::{Point, Rect};
use reticle_geometry::Ray3;

/// Pointer identifier. One per input device or input source.
pub type PointerId = u64;

/// Button code, using DOM numbering (0 primary, 1 auxiliary, 2 secondary, 3 back, 4 forward).
pub type Button = u8;

/// Target of an intersection or event: a scene node, or the empty space around it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventTarget<K> {
    /// A scene node.
    Node(K),
    /// The sentinel "void" target hit when nothing else is.
    ///
    /// Its only ancestor is the scene root, so listeners on the root observe
    /// pointer activity over empty space as well.
    Void,
}

impl<K: Copy> EventTarget<K> {
    /// The node, if this target is not the void.
    pub fn node(&self) -> Option<K> {
        match self {
            Self::Node(k) => Some(*k),
            Self::Void => None,
        }
    }

    /// Whether this is the void target.
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }
}

/// Discriminates kinds of pointers, for example emulated, native, forwarded, or teleport pointers.
///
/// Nodes can allow or deny pointer types through
/// [`PointerTypeFilter`](crate::policy::PointerTypeFilter).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PointerType(&'static str);

impl PointerType {
    /// Mouse cursor over a canvas.
    pub const MOUSE: Self = Self("mouse");
    /// Touch screen contact.
    pub const TOUCH: Self = Self("touch");
    /// Stylus.
    pub const PEN: Self = Self("pen");
    /// Far-field controller or hand ray.
    pub const RAY: Self = Self("ray");
    /// Near-field grab volume around a hand or controller.
    pub const GRAB: Self = Self("grab");
    /// Multi-segment teleport arc.
    pub const TELEPORT: Self = Self("teleport");
    /// Pointer fed by a host event forwarder.
    pub const FORWARD: Self = Self("forward");

    /// A custom pointer type.
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Type name.
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for PointerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Opaque device state attached to a pointer, for example the XR input source it belongs to.
#[derive(Clone, Default)]
pub struct PointerState(Option<Arc<dyn Any + Send + Sync>>);

impl PointerState {
    /// Wrap a device-specific value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Some(Arc::new(value)))
    }

    /// No device state.
    pub const fn empty() -> Self {
        Self(None)
    }

    /// Borrow the state as `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_deref().and_then(|v| v.downcast_ref::<T>())
    }
}

impl fmt::Debug for PointerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(_) => f.write_str("PointerState(..)"),
            None => f.write_str("PointerState(None)"),
        }
    }
}

/// Identity of a pointer as seen by policies and listeners.
#[derive(Clone, Debug)]
pub struct PointerInfo {
    /// Pointer id.
    pub id: PointerId,
    /// Pointer type.
    pub pointer_type: PointerType,
    /// Opaque device state.
    pub state: PointerState,
}

impl PointerInfo {
    /// Create pointer info without device state.
    pub fn new(id: PointerId, pointer_type: PointerType) -> Self {
        Self {
            id,
            pointer_type,
            state: PointerState::empty(),
        }
    }
}

/// World-space pose of a probing device.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    /// Device position.
    pub position: Vec3,
    /// Device orientation.
    pub orientation: Quat,
}

impl Pose {
    /// Identity pose at the origin, looking down -Z.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        orientation: Quat::IDENTITY,
    };

    /// Create a pose.
    pub const fn new(position: Vec3, orientation: Quat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    /// Decompose an affine transform; scale is discarded.
    pub fn from_affine(transform: &Affine3A) -> Self {
        let (_, orientation, position) = transform.to_scale_rotation_translation();
        Self {
            position,
            orientation,
        }
    }

    /// Rigid transform of this pose.
    pub fn affine(&self) -> Affine3A {
        Affine3A::from_rotation_translation(self.orientation, self.position)
    }

    /// Direction the device points at (local -Z).
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }
}

/// Camera projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Projection {
    /// Perspective projection.
    Perspective {
        /// Vertical field of view in radians.
        fov_y: f32,
        /// Width over height.
        aspect: f32,
        /// Near plane distance.
        near: f32,
        /// Far plane distance.
        far: f32,
    },
    /// Orthographic projection.
    Orthographic {
        /// Half width of the view volume.
        half_width: f32,
        /// Half height of the view volume.
        half_height: f32,
        /// Near plane distance.
        near: f32,
        /// Far plane distance.
        far: f32,
    },
}

/// A camera: world transform plus projection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    /// Camera-to-world transform. The camera looks down its local -Z.
    pub world: Affine3A,
    /// Projection.
    pub projection: Projection,
}

impl Camera {
    /// Perspective camera at `world`.
    pub fn perspective(world: Affine3A, fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            world,
            projection: Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            },
        }
    }

    /// Orthographic camera at `world`.
    pub fn orthographic(
        world: Affine3A,
        half_width: f32,
        half_height: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            world,
            projection: Projection::Orthographic {
                half_width,
                half_height,
                near,
                far,
            },
        }
    }

    /// Projection matrix with a `[0, 1]` depth range.
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective {
                fov_y,
                aspect,
                near,
                far,
            } => Mat4::perspective_rh(fov_y, aspect, near, far),
            Projection::Orthographic {
                half_width,
                half_height,
                near,
                far,
            } => Mat4::orthographic_rh(
                -half_width,
                half_width,
                -half_height,
                half_height,
                near,
                far,
            ),
        }
    }

    /// Camera position in world space.
    pub fn position(&self) -> Vec3 {
        self.world.translation.into()
    }

    /// World-space view direction.
    pub fn forward(&self) -> Vec3 {
        self.world.transform_vector3(Vec3::NEG_Z).normalize_or_zero()
    }

    /// Pose of the camera, ignoring scale.
    pub fn pose(&self) -> Pose {
        Pose::from_affine(&self.world)
    }

    /// World-space ray through a point in normalized device coordinates (`[-1, 1]`, +Y up).
    pub fn ray_from_ndc(&self, ndc: Point) -> Ray3 {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Screen coordinates are narrowed to the f32 math used for 3D probes."
        )]
        let (x, y) = (ndc.x as f32, ndc.y as f32);
        let inverse = self.projection_matrix().inverse();
        match self.projection {
            Projection::Perspective { .. } => {
                let view_point = inverse.project_point3(Vec3::new(x, y, 0.5));
                let world_point = self.world.transform_point3(view_point);
                let origin = self.position();
                Ray3::new(origin, world_point - origin)
            }
            Projection::Orthographic { .. } => {
                let view_point = inverse.project_point3(Vec3::new(x, y, 0.0));
                Ray3::new(self.world.transform_point3(view_point), self.forward())
            }
        }
    }

    /// Signed distance of `point` in front of the camera's view plane.
    pub fn view_depth(&self, point: Vec3) -> f32 {
        (point - self.position()).dot(self.forward())
    }
}

/// Convert a pixel position inside `viewport` to normalized device coordinates.
///
/// Pixel space has +Y down; NDC has +Y up. Positions outside the viewport map
/// outside `[-1, 1]`, which keeps captured drags continuous off-canvas.
pub fn ndc_from_viewport(viewport: Rect, pixel: Point) -> Point {
    let w = viewport.width();
    let h = viewport.height();
    if w <= 0.0 || h <= 0.0 {
        return Point::ZERO;
    }
    Point::new(
        (pixel.x - viewport.x0) / w * 2.0 - 1.0,
        -((pixel.y - viewport.y0) / h * 2.0 - 1.0),
    )
}

/// One raw input sample for a pointer.
///
/// Which fields matter depends on the pointer's intersector: device-pose
/// intersectors read [`PointerSample::pose`], the camera-ray intersector reads
/// [`PointerSample::screen`] and [`PointerSample::camera`]. A sample missing
/// what the intersector needs is "not ready" and is dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct PointerSample {
    /// Timestamp in milliseconds.
    pub timestamp: u64,
    /// Button for down/up samples.
    pub button: Button,
    /// Device pose, if known.
    pub pose: Option<Pose>,
    /// Position in normalized device coordinates, for screen-space pointers.
    pub screen: Option<Point>,
    /// Camera the sample was observed through.
    pub camera: Option<Camera>,
    /// Wheel delta (x, y, z) for wheel samples.
    pub wheel_delta: Vec3,
}

impl PointerSample {
    /// Empty sample at `timestamp`.
    pub fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            button: 0,
            pose: None,
            screen: None,
            camera: None,
            wheel_delta: Vec3::ZERO,
        }
    }

    /// Sample carrying a device pose.
    pub fn at_pose(timestamp: u64, pose: Pose) -> Self {
        Self::new(timestamp).with_pose(pose)
    }

    /// Sample at a screen position seen through `camera`.
    pub fn on_screen(timestamp: u64, camera: Camera, ndc: Point) -> Self {
        Self::new(timestamp).with_screen(camera, ndc)
    }

    /// Set the device pose.
    pub fn with_pose(mut self, pose: Pose) -> Self {
        self.pose = Some(pose);
        self
    }

    /// Set the screen position and camera.
    pub fn with_screen(mut self, camera: Camera, ndc: Point) -> Self {
        self.camera = Some(camera);
        self.screen = Some(ndc);
        self
    }

    /// Set the camera reported on events.
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = Some(camera);
        self
    }

    /// Set the button.
    pub fn with_button(mut self, button: Button) -> Self {
        self.button = button;
        self
    }

    /// Set the wheel delta.
    pub fn with_wheel_delta(mut self, delta: Vec3) -> Self {
        self.wheel_delta = delta;
        self
    }
}
