//! UDIM tile sets built from `<name>.<tile>.png` texture files.

use crate::texture::TextureImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// First tile number of a UDIM grid.
pub const FIRST_TILE: u32 = 1001;

/// Last tile number of a UDIM grid (ten columns, 99 rows).
pub const LAST_TILE: u32 = 1999;

/// Texture role inside a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TileChannel {
    Diffuse,
    Erm,
    Normal,
}

impl TileChannel {
    pub const ALL: [TileChannel; 3] = [TileChannel::Diffuse, TileChannel::Erm, TileChannel::Normal];

    /// Classifies a texture file name. `ERM` is matched case-sensitively,
    /// the other markers are not.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        if lower.contains("diffuse") || lower.replace(' ', "").contains("basecolor") {
            Some(TileChannel::Diffuse)
        } else if name.contains("ERM") {
            Some(TileChannel::Erm)
        } else if lower.contains("normal") {
            Some(TileChannel::Normal)
        } else {
            None
        }
    }
}

impl fmt::Display for TileChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileChannel::Diffuse => write!(f, "Diffuse"),
            TileChannel::Erm => write!(f, "ERM"),
            TileChannel::Normal => write!(f, "Normal"),
        }
    }
}

/// Parses the tile number from `<name>.<NNNN>.<ext>`.
///
/// Returns 0 when the segment after the first dot is not a number in
/// `FIRST_TILE..=LAST_TILE`; callers treat 0 as unresolved.
pub fn udim_tile_number(file_name: &str) -> u32 {
    file_name
        .split('.')
        .nth(1)
        .and_then(|segment| segment.parse::<u32>().ok())
        .filter(|n| (FIRST_TILE..=LAST_TILE).contains(n))
        .unwrap_or(0)
}

/// Maps a UV coordinate to the tile whose unit square contains it.
pub fn uv_tile_number(u: f64, v: f64) -> i64 {
    FIRST_TILE as i64 + u.floor() as i64 + 10 * v.floor() as i64
}

/// The diffuse/ERM/normal triple of one tile number.
#[derive(Debug, Clone, PartialEq)]
pub struct UdimTile {
    pub number: u32,
    pub diffuse: Option<TextureImage>,
    pub erm: Option<TextureImage>,
    pub normal: Option<TextureImage>,
}

impl UdimTile {
    fn empty(number: u32) -> Self {
        Self {
            number,
            diffuse: None,
            erm: None,
            normal: None,
        }
    }

    pub fn get(&self, channel: TileChannel) -> Option<&TextureImage> {
        match channel {
            TileChannel::Diffuse => self.diffuse.as_ref(),
            TileChannel::Erm => self.erm.as_ref(),
            TileChannel::Normal => self.normal.as_ref(),
        }
    }

    fn slot_mut(&mut self, channel: TileChannel) -> &mut Option<TextureImage> {
        match channel {
            TileChannel::Diffuse => &mut self.diffuse,
            TileChannel::Erm => &mut self.erm,
            TileChannel::Normal => &mut self.normal,
        }
    }

    /// Present textures in channel order.
    pub fn textures(&self) -> impl Iterator<Item = (TileChannel, &TextureImage)> {
        TileChannel::ALL
            .into_iter()
            .filter_map(move |c| self.get(c).map(|t| (c, t)))
    }

    pub fn is_complete(&self) -> bool {
        self.diffuse.is_some() && self.erm.is_some() && self.normal.is_some()
    }

    /// Largest width among the present textures.
    pub fn resolution(&self) -> Option<u32> {
        self.textures().map(|(_, t)| t.width).max()
    }
}

/// Ordered tile slots from 1001 up to the highest tile found.
///
/// Serialized as the flat list of texture images so importers only need to
/// list the files; slots are rebuilt on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TextureImage>", into = "Vec<TextureImage>")]
pub struct UdimTileSet {
    tiles: Vec<UdimTile>,
    /// Files whose tile number could not be parsed.
    unresolved: Vec<TextureImage>,
    /// Files with a tile number but no recognisable channel marker.
    unclassified: Vec<TextureImage>,
}

impl UdimTileSet {
    /// Builds the slot table from texture files. Non-PNG entries are
    /// ignored; a later file of the same channel and tile replaces an
    /// earlier one.
    pub fn from_textures(textures: impl IntoIterator<Item = TextureImage>) -> Self {
        let mut set = Self::default();
        let mut placed: Vec<(u32, TextureImage)> = Vec::new();
        for texture in textures {
            if !texture.file_name.to_lowercase().contains(".png") {
                continue;
            }
            let number = udim_tile_number(&texture.file_name);
            if number < FIRST_TILE {
                log::debug!("no tile number in '{}'", texture.file_name);
                set.unresolved.push(texture);
            } else {
                placed.push((number, texture));
            }
        }

        let max = placed.iter().map(|(n, _)| *n).max().unwrap_or(FIRST_TILE - 1);
        set.tiles = (FIRST_TILE..=max).map(UdimTile::empty).collect();
        for (number, texture) in placed {
            let index = (number - FIRST_TILE) as usize;
            match TileChannel::from_file_name(&texture.file_name) {
                Some(channel) => *set.tiles[index].slot_mut(channel) = Some(texture),
                None => set.unclassified.push(texture),
            }
        }
        set
    }

    pub fn tiles(&self) -> &[UdimTile] {
        &self.tiles
    }

    pub fn tile(&self, number: u32) -> Option<&UdimTile> {
        number
            .checked_sub(FIRST_TILE)
            .and_then(|i| self.tiles.get(i as usize))
    }

    pub fn unresolved(&self) -> &[TextureImage] {
        &self.unresolved
    }

    pub fn unclassified(&self) -> &[TextureImage] {
        &self.unclassified
    }

    /// Number of slots, the highest tile number minus 1000.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Every texture present in the set, tile by tile.
    pub fn textures(&self) -> impl Iterator<Item = (u32, TileChannel, &TextureImage)> {
        self.tiles
            .iter()
            .flat_map(|tile| tile.textures().map(move |(c, t)| (tile.number, c, t)))
    }

    /// Textures of one channel across all tiles.
    pub fn channel(&self, channel: TileChannel) -> impl Iterator<Item = &TextureImage> {
        self.tiles.iter().filter_map(move |tile| tile.get(channel))
    }

    /// Tile numbers with at least one missing channel.
    pub fn gaps(&self) -> Vec<u32> {
        self.tiles
            .iter()
            .filter(|tile| !tile.is_complete())
            .map(|tile| tile.number)
            .collect()
    }

    /// All slots filled and every file resolved to a tile.
    pub fn is_contiguous(&self) -> bool {
        self.unresolved.is_empty() && self.gaps().is_empty()
    }

    /// Largest texture width per tile, for tiles with any texture.
    pub fn resolution_by_tile(&self) -> BTreeMap<u32, u32> {
        self.tiles
            .iter()
            .filter_map(|tile| tile.resolution().map(|r| (tile.number, r)))
            .collect()
    }
}

impl From<Vec<TextureImage>> for UdimTileSet {
    fn from(textures: Vec<TextureImage>) -> Self {
        Self::from_textures(textures)
    }
}

impl From<UdimTileSet> for Vec<TextureImage> {
    fn from(set: UdimTileSet) -> Self {
        let mut out: Vec<TextureImage> = Vec::new();
        for tile in set.tiles {
            out.extend(tile.diffuse);
            out.extend(tile.erm);
            out.extend(tile.normal);
        }
        out.extend(set.unresolved);
        out.extend(set.unclassified);
        out
    }
}
