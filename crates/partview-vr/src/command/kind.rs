use glam::Vec3;

use crate::actor::ActorId;
use crate::material::Rgb;

/// Command tags understood by the render loop.
///
/// Tags are stable integers so scalar commands can be issued as a plain
/// `(tag, value)` pair; see [`Command::from_raw`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CommandKind {
    EndRender,
    RotateX,
    RotateY,
    RotateZ,
    StartRender,
    ChangeColor,
    Fence,
}

impl CommandKind {
    pub const ALL: [CommandKind; 7] = [
        CommandKind::EndRender,
        CommandKind::RotateX,
        CommandKind::RotateY,
        CommandKind::RotateZ,
        CommandKind::StartRender,
        CommandKind::ChangeColor,
        CommandKind::Fence,
    ];

    #[inline]
    pub const fn tag(self) -> u32 {
        match self {
            CommandKind::EndRender => 0,
            CommandKind::RotateX => 1,
            CommandKind::RotateY => 2,
            CommandKind::RotateZ => 3,
            CommandKind::StartRender => 4,
            CommandKind::ChangeColor => 5,
            CommandKind::Fence => 6,
        }
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

/// Rotation axis for the spin commands.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
        }
    }
}

/// A queued instruction for the render loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Resume presenting frames (the loop starts presenting unless configured otherwise).
    StartRender,
    /// Sentinel: the loop stops at the end of the frame that observes it.
    EndRender,
    /// Recolor the VR clone made from `actor`. Unknown actors are ignored.
    ChangeColor { actor: ActorId, color: Rgb },
    /// Spin the mirrored scene around `axis`. Zero stops the spin.
    Rotate { axis: Axis, degrees_per_second: f32 },
    /// Echoed back as an event once everything queued before it was applied.
    Fence(u64),
    /// A tag this build does not understand. Ignored by the loop.
    Unknown { tag: u32, value: f64 },
}

impl Command {
    /// Decodes a scalar command.
    ///
    /// `ChangeColor` needs an actor and a color, which a single scalar cannot
    /// carry; it decodes to `Unknown` like any other tag without a scalar form.
    pub fn from_raw(tag: u32, value: f64) -> Self {
        let Some(kind) = CommandKind::from_tag(tag) else {
            return Command::Unknown { tag, value };
        };

        match kind {
            CommandKind::EndRender => Command::EndRender,
            CommandKind::StartRender => Command::StartRender,
            CommandKind::RotateX => Command::rotate(Axis::X, value),
            CommandKind::RotateY => Command::rotate(Axis::Y, value),
            CommandKind::RotateZ => Command::rotate(Axis::Z, value),
            CommandKind::Fence if value.is_finite() && value >= 0.0 => Command::Fence(value as u64),
            CommandKind::Fence | CommandKind::ChangeColor => Command::Unknown { tag, value },
        }
    }

    fn rotate(axis: Axis, value: f64) -> Self {
        let degrees_per_second = if value.is_finite() { value as f32 } else { 0.0 };
        Command::Rotate {
            axis,
            degrees_per_second,
        }
    }

    pub fn kind(&self) -> Option<CommandKind> {
        Some(match self {
            Command::StartRender => CommandKind::StartRender,
            Command::EndRender => CommandKind::EndRender,
            Command::ChangeColor { .. } => CommandKind::ChangeColor,
            Command::Rotate { axis: Axis::X, .. } => CommandKind::RotateX,
            Command::Rotate { axis: Axis::Y, .. } => CommandKind::RotateY,
            Command::Rotate { axis: Axis::Z, .. } => CommandKind::RotateZ,
            Command::Fence(_) => CommandKind::Fence,
            Command::Unknown { .. } => return None,
        })
    }

    #[inline]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Command::EndRender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_round_trip() {
        for kind in CommandKind::ALL {
            assert_eq!(CommandKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(CommandKind::from_tag(99), None);
    }

    #[test]
    fn raw_rotation_carries_rate() {
        assert_eq!(
            Command::from_raw(CommandKind::RotateY.tag(), 45.0),
            Command::Rotate { axis: Axis::Y, degrees_per_second: 45.0 }
        );
    }

    #[test]
    fn raw_change_color_has_no_scalar_form() {
        let cmd = Command::from_raw(CommandKind::ChangeColor.tag(), 1.0);
        assert!(matches!(cmd, Command::Unknown { tag: 5, .. }));
        assert_eq!(cmd.kind(), None);
    }

    #[test]
    fn unknown_tag_is_preserved() {
        assert_eq!(
            Command::from_raw(4242, 0.5),
            Command::Unknown { tag: 4242, value: 0.5 }
        );
    }

    #[test]
    fn end_render_is_the_only_sentinel() {
        assert!(Command::from_raw(0, 0.0).is_sentinel());
        assert!(!Command::StartRender.is_sentinel());
    }
}
