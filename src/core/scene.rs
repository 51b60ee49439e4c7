use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use super::error::HarnessError;

/// One of the fixed benchmark workloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Scene {
    Room,
    Sala,
    LuxBallHdr,
    #[default]
    LuxBall,
    LuxBallSky,
}

impl Scene {
    pub const ALL: [Scene; 5] = [
        Scene::Room,
        Scene::Sala,
        Scene::LuxBallHdr,
        Scene::LuxBall,
        Scene::LuxBallSky,
    ];

    /// Identifier accepted on the command line.
    pub fn id(&self) -> &'static str {
        match self {
            Scene::Room => "room",
            Scene::Sala => "sala",
            Scene::LuxBallHdr => "luxball-hdr",
            Scene::LuxBall => "luxball",
            Scene::LuxBallSky => "luxball-sky",
        }
    }

    pub fn credits(&self) -> &'static str {
        match self {
            Scene::Room => "Scene modeling/texturing by Mourelas Konstantinos \"Moure\"",
            Scene::Sala => {
                "Scene designed by Daniel \"ZanQdo\" Salazar, adapted by Michael \"neo2068\" Klemm"
            }
            Scene::LuxBallHdr | Scene::LuxBall | Scene::LuxBallSky => {
                "Scene designed by LuxRender project"
            }
        }
    }

    /// Film size (width, height) the workload renders at.
    pub fn film_size(&self) -> (usize, usize) {
        match self {
            Scene::Room => (800, 600),
            Scene::Sala => (640, 480),
            Scene::LuxBallHdr | Scene::LuxBall | Scene::LuxBallSky => (512, 512),
        }
    }

    /// Geometry size reported alongside the ray rate.
    pub fn triangle_count(&self) -> u32 {
        match self {
            Scene::Room => 2_016_000,
            Scene::Sala => 488_000,
            Scene::LuxBallHdr | Scene::LuxBall | Scene::LuxBallSky => 262_000,
        }
    }

    /// The complex room scene needs a 64-bit address space.
    pub fn is_available(&self) -> bool {
        match self {
            Scene::Room => cfg!(target_pointer_width = "64"),
            _ => true,
        }
    }
}

impl Display for Scene {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Scene::Room => write!(f, "Room"),
            Scene::Sala => write!(f, "Sala"),
            Scene::LuxBallHdr => write!(f, "LuxBall HDR"),
            Scene::LuxBall => write!(f, "LuxBall"),
            Scene::LuxBallSky => write!(f, "LuxBall Sky"),
        }
    }
}

impl FromStr for Scene {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Scene::ALL
            .iter()
            .copied()
            .find(|scene| {
                scene.id().eq_ignore_ascii_case(wanted)
                    || scene.to_string().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| HarnessError::InvalidScene {
                name: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_and_display_names() {
        assert_eq!("luxball-hdr".parse::<Scene>().unwrap(), Scene::LuxBallHdr);
        assert_eq!("LuxBall Sky".parse::<Scene>().unwrap(), Scene::LuxBallSky);
        assert_eq!(" SALA ".parse::<Scene>().unwrap(), Scene::Sala);
    }

    #[test]
    fn unknown_scene_is_rejected() {
        let err = "teapot".parse::<Scene>().unwrap_err();
        assert!(matches!(err, HarnessError::InvalidScene { ref name } if name == "teapot"));
    }

    #[test]
    fn small_scenes_are_always_available() {
        for scene in [Scene::Sala, Scene::LuxBall, Scene::LuxBallHdr, Scene::LuxBallSky] {
            assert!(scene.is_available());
        }
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn room_is_available_on_64_bit() {
        assert!(Scene::Room.is_available());
    }
}
