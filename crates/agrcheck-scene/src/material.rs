//! Materials and principled-shader input linkage.

use crate::texture::TextureImage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Semantic input channel of the principled shader.
///
/// Declaration order is the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderChannel {
    BaseColor,
    Metallic,
    Roughness,
    Alpha,
    Normal,
    Emission,
}

impl ShaderChannel {
    /// Channels whose texture names are validated for the low tier, in
    /// naming order.
    pub const TEXTURED: [ShaderChannel; 5] = [
        ShaderChannel::BaseColor,
        ShaderChannel::Metallic,
        ShaderChannel::Roughness,
        ShaderChannel::Alpha,
        ShaderChannel::Normal,
    ];

    /// Single-letter symbol used in low tier texture names.
    pub fn symbol(self) -> &'static str {
        match self {
            ShaderChannel::BaseColor => "d",
            ShaderChannel::Metallic => "m",
            ShaderChannel::Roughness => "r",
            ShaderChannel::Alpha => "o",
            ShaderChannel::Normal => "n",
            ShaderChannel::Emission => "e",
        }
    }
}

impl fmt::Display for ShaderChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderChannel::BaseColor => "Base Color",
            ShaderChannel::Metallic => "Metallic",
            ShaderChannel::Roughness => "Roughness",
            ShaderChannel::Alpha => "Alpha",
            ShaderChannel::Normal => "Normal",
            ShaderChannel::Emission => "Emission",
        };
        f.write_str(name)
    }
}

/// State of one shader input socket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShaderInput {
    /// Something is plugged into the socket.
    #[serde(default)]
    pub linked: bool,
    /// The image texture feeding the socket, resolved through a normal-map
    /// node when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_texture: Option<TextureImage>,
}

impl ShaderInput {
    pub fn linked_to(texture: TextureImage) -> Self {
        Self {
            linked: true,
            source_texture: Some(texture),
        }
    }
}

/// A material with an optional principled shader.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Principled shader inputs, absent when the material has no principled
    /// node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shader_inputs: Option<BTreeMap<ShaderChannel, ShaderInput>>,
    /// Every image-texture node in the node tree, linked or not.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub texture_nodes: Vec<TextureImage>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shader_inputs: None,
            texture_nodes: Vec::new(),
        }
    }

    /// Sets a shader input, creating the principled shader if needed.
    pub fn with_input(mut self, channel: ShaderChannel, input: ShaderInput) -> Self {
        self.shader_inputs
            .get_or_insert_with(BTreeMap::new)
            .insert(channel, input);
        self
    }

    pub fn with_texture_node(mut self, texture: TextureImage) -> Self {
        self.texture_nodes.push(texture);
        self
    }

    pub fn has_principled(&self) -> bool {
        self.shader_inputs.is_some()
    }

    pub fn input(&self, channel: ShaderChannel) -> Option<&ShaderInput> {
        self.shader_inputs.as_ref()?.get(&channel)
    }

    pub fn is_linked(&self, channel: ShaderChannel) -> bool {
        self.input(channel).is_some_and(|i| i.linked)
    }

    /// Linked inputs in channel order.
    pub fn linked_channels(&self) -> Vec<ShaderChannel> {
        self.shader_inputs
            .iter()
            .flat_map(|inputs| inputs.iter())
            .filter(|(_, input)| input.linked)
            .map(|(channel, _)| *channel)
            .collect()
    }

    /// Number of texture-sampling nodes.
    pub fn node_count(&self) -> usize {
        self.texture_nodes.len()
    }
}
