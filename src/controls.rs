use glam::Vec3;

/// Every input the render loop reacts to. Each one is held between a start
/// and a stop edge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Axis {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    PitchUp,
    PitchDown,
    YawLeft,
    YawRight,
    RollLeft,
    RollRight,
    FovIncrease,
    FovDecrease,
}

impl Axis {
    pub const ALL: [Axis; 14] = [
        Axis::MoveForward,
        Axis::MoveBackward,
        Axis::MoveLeft,
        Axis::MoveRight,
        Axis::MoveUp,
        Axis::MoveDown,
        Axis::PitchUp,
        Axis::PitchDown,
        Axis::YawLeft,
        Axis::YawRight,
        Axis::RollLeft,
        Axis::RollRight,
        Axis::FovIncrease,
        Axis::FovDecrease,
    ];

    fn bit(self) -> u16 {
        1 << self as u16
    }
}

/// The set of currently held axes.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Controls {
    held: u16,
}

impl Controls {
    pub fn start(&mut self, axis: Axis) {
        self.held |= axis.bit();
    }

    pub fn stop(&mut self, axis: Axis) {
        self.held &= !axis.bit();
    }

    pub fn is_held(&self, axis: Axis) -> bool {
        self.held & axis.bit() != 0
    }

    pub fn release_all(&mut self) {
        self.held = 0;
    }

    fn signed(&self, positive: Axis, negative: Axis) -> f32 {
        self.is_held(positive) as i32 as f32 - self.is_held(negative) as i32 as f32
    }

    /// Unit movement direction in camera space (+Z forward, +Y up), zero when
    /// nothing is held or opposite axes cancel.
    pub fn movement_direction(&self) -> Vec3 {
        Vec3::new(
            self.signed(Axis::MoveRight, Axis::MoveLeft),
            self.signed(Axis::MoveUp, Axis::MoveDown),
            self.signed(Axis::MoveForward, Axis::MoveBackward),
        )
        .normalize_or_zero()
    }

    /// Per-angle rotation sign as `(pitch, yaw, roll)`. Positive pitch tips the
    /// view down, positive yaw turns right, positive roll banks left.
    pub fn rotation_direction(&self) -> Vec3 {
        Vec3::new(
            self.signed(Axis::PitchDown, Axis::PitchUp),
            self.signed(Axis::YawRight, Axis::YawLeft),
            self.signed(Axis::RollLeft, Axis::RollRight),
        )
    }

    pub fn fov_delta(&self) -> f32 {
        self.signed(Axis::FovIncrease, Axis::FovDecrease)
    }
}
