//! Object and file classification.
//!
//! Every rule consumes these tags instead of probing names on its own.
//! Matching is case-insensitive; the naming rules are what enforce exact
//! spelling.

use crate::mesh::MeshObject;
use crate::scene::{ModelFile, Tier};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Light object naming family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightRole {
    Omni,
    Spot,
}

/// What an object is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Main,
    MainGlass,
    Ground,
    GroundGlass,
    /// Low tier ground element.
    GroundEl,
    GroundElGlass,
    /// Low tier vegetation.
    Flora,
    /// Collision proxy; `ground` marks proxies of the ground file.
    Collision { ground: bool },
    Light(LightRole),
    /// Locator that parents the lights of a light file.
    Root,
    Unknown,
}

impl Role {
    /// Classifies an object of a high tier file.
    pub fn classify_high(object: &MeshObject) -> Self {
        let name = object.name.to_lowercase();
        let ground = name.contains("ground");
        let glass = name.contains("glass");
        if name.contains("ucx") {
            Role::Collision { ground }
        } else if name.contains("root") {
            Role::Root
        } else if name.contains("omni") {
            Role::Light(LightRole::Omni)
        } else if name.contains("spot") {
            Role::Light(LightRole::Spot)
        } else if ground && glass {
            Role::GroundGlass
        } else if ground {
            Role::Ground
        } else if glass {
            Role::MainGlass
        } else if name.contains("main") {
            Role::Main
        } else {
            Role::Unknown
        }
    }

    /// Classifies an object of a low tier file. First match wins, falling
    /// back to `Main`.
    pub fn classify_low(object: &MeshObject) -> Self {
        let name = object.name.to_lowercase();
        let glass = name.contains("glass");
        if name.contains("flora") {
            Role::Flora
        } else if name.contains("groundel") && glass {
            Role::GroundElGlass
        } else if name.contains("groundel") {
            Role::GroundEl
        } else if name.contains("groundglass") {
            Role::GroundGlass
        } else if name.contains("ground") {
            Role::Ground
        } else if glass {
            Role::MainGlass
        } else {
            Role::Main
        }
    }

    pub fn classify(object: &MeshObject, tier: Tier) -> Self {
        match tier {
            Tier::High => Self::classify_high(object),
            Tier::Low => Self::classify_low(object),
        }
    }

    pub fn is_collision(self) -> bool {
        matches!(self, Role::Collision { .. })
    }

    pub fn is_glass(self) -> bool {
        matches!(
            self,
            Role::MainGlass | Role::GroundGlass | Role::GroundElGlass
        )
    }

    pub fn is_light(self) -> bool {
        matches!(self, Role::Light(_) | Role::Root)
    }

    /// Name suffix pattern of a low tier object, as a regex fragment.
    pub fn low_suffix(self) -> &'static str {
        match self {
            Role::Flora => "_Flora",
            Role::GroundElGlass => "_GroundElGlass",
            Role::GroundEl => "_GroundEl",
            Role::GroundGlass => "_GroundGlass",
            Role::Ground => "_Ground",
            Role::MainGlass => r"_\d\d\d_MainGlass",
            _ => r"_\d\d\d_Main",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Main => write!(f, "Main"),
            Role::MainGlass => write!(f, "MainGlass"),
            Role::Ground => write!(f, "Ground"),
            Role::GroundGlass => write!(f, "GroundGlass"),
            Role::GroundEl => write!(f, "GroundEl"),
            Role::GroundElGlass => write!(f, "GroundElGlass"),
            Role::Flora => write!(f, "Flora"),
            Role::Collision { .. } => write!(f, "UCX"),
            Role::Light(LightRole::Omni) => write!(f, "Omni"),
            Role::Light(LightRole::Spot) => write!(f, "Spot"),
            Role::Root => write!(f, "Root"),
            Role::Unknown => write!(f, "Unknown"),
        }
    }
}

/// What a geometry file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileKind {
    Ground,
    GroundLight,
    BuildingLight,
    Building,
}

impl FileKind {
    pub fn classify(file_name: &str) -> Self {
        let name = file_name.to_lowercase();
        match (name.contains("ground"), name.contains("light")) {
            (true, true) => FileKind::GroundLight,
            (true, false) => FileKind::Ground,
            (false, true) => FileKind::BuildingLight,
            (false, false) => FileKind::Building,
        }
    }

    pub fn is_ground(self) -> bool {
        matches!(self, FileKind::Ground | FileKind::GroundLight)
    }

    pub fn is_light(self) -> bool {
        matches!(self, FileKind::GroundLight | FileKind::BuildingLight)
    }
}

/// A file with its kind and per-object roles resolved once.
#[derive(Debug, Clone)]
pub struct ClassifiedFile<'a> {
    pub file: &'a ModelFile,
    pub kind: FileKind,
    roles: Vec<Role>,
}

impl<'a> ClassifiedFile<'a> {
    pub fn new(file: &'a ModelFile) -> Self {
        let tier = file.tier();
        Self {
            file,
            kind: FileKind::classify(&file.file_name),
            roles: file.meshes.iter().map(|m| Role::classify(m, tier)).collect(),
        }
    }

    /// File name without extension.
    pub fn name(&self) -> &'a str {
        self.file.name()
    }

    pub fn role(&self, index: usize) -> Role {
        self.roles.get(index).copied().unwrap_or(Role::Unknown)
    }

    /// Objects paired with their roles.
    pub fn objects(&self) -> impl Iterator<Item = (&'a MeshObject, Role)> + '_ {
        self.file.meshes.iter().zip(self.roles.iter().copied())
    }

    /// Mesh objects paired with their roles.
    pub fn meshes(&self) -> impl Iterator<Item = (&'a MeshObject, Role)> + '_ {
        self.objects().filter(|(o, _)| o.is_mesh())
    }

    /// Mesh objects with the given role predicate.
    pub fn meshes_where(
        &self,
        predicate: impl Fn(Role) -> bool + 'a,
    ) -> impl Iterator<Item = &'a MeshObject> + '_ {
        self.meshes()
            .filter(move |(_, r)| predicate(*r))
            .map(|(o, _)| o)
    }
}
