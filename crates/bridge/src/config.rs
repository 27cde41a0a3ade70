use crate::UserInfo;
use node::FontName;
use serde::{Deserialize, Serialize};

/// Settings the bridge needs from its host.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// The signed-in user, reported in plugin info.
    pub user: Option<UserInfo>,
    /// Font used for text nodes when the caller doesn't name one.
    pub default_font: FontName,
}
