//! Component descriptors

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::shared::models::Range;

/// Component entry files, probed in this order
pub const INDEX_FILES: &[&str] = &["index.ts", "index.tsx", "index.js"];

/// Render file of one platform next to a component's entry file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Platform {
    #[serde(rename = "web")]
    Web,
    #[serde(rename = "web.pc")]
    WebPc,
    #[serde(rename = "wechatMp")]
    WechatMp,
    #[serde(rename = "native")]
    Native,
    #[serde(rename = "ios")]
    Ios,
    #[serde(rename = "android")]
    Android,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Web,
        Platform::WebPc,
        Platform::WechatMp,
        Platform::Native,
        Platform::Ios,
        Platform::Android,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Platform::Web => "web.tsx",
            Platform::WebPc => "web.pc.tsx",
            Platform::WechatMp => "index.xml",
            Platform::Native => "render.native.tsx",
            Platform::Ios => "render.ios.tsx",
            Platform::Android => "render.android.tsx",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderFile {
    #[serde(rename = "type")]
    pub platform: Platform,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    /// Component directory
    pub path: PathBuf,

    /// File holding the `OakComponent(...)` call
    #[serde(skip)]
    pub entry_file: PathBuf,

    pub entity_name: String,

    /// Range of the `entity` value inside `entry_file`
    #[serde(skip)]
    pub entity_range: Range,

    pub is_list: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_data_attrs: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub method_names: Option<Vec<String>>,

    pub components: Vec<RenderFile>,
}

impl ComponentDescriptor {
    pub fn render_file(&self, platform: Platform) -> Option<&Path> {
        self.components
            .iter()
            .find(|render| render.platform == platform)
            .map(|render| render.path.as_path())
    }
}
