// ─── Launch Arguments ───
// Platform JVM flag and game argument substitution.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::core::auth::LaunchSession;
use crate::core::error::LauncherResult;
use crate::core::platform::TargetOs;
use crate::core::version::VersionDescriptor;

/// Everything the game argument template can refer to.
#[derive(Debug, Clone)]
pub struct LaunchConfiguration<'a> {
    /// Launcher root, used as the game directory.
    pub root: PathBuf,
    pub descriptor: &'a VersionDescriptor,
    pub version_number: String,
    pub version_type: String,
    pub os: TargetOs,
    pub session: &'a LaunchSession,
}

/// The one JVM flag each platform needs, keyed by descriptor OS name.
pub fn select_platform_flag(os: &str) -> LauncherResult<&'static str> {
    let os: TargetOs = os.parse()?;
    Ok(os.jvm_flag())
}

/// Substitute the descriptor's game argument template.
///
/// Substitution is per whole token: a token equal to a known placeholder is
/// replaced, anything else (including unknown placeholders) is kept as is.
/// Template order is preserved.
pub fn build_game_arguments(config: &LaunchConfiguration<'_>) -> Vec<String> {
    let values = placeholder_values(config);

    config
        .descriptor
        .game_argument_template(config.os)
        .into_iter()
        .map(|token| match values.get(token.as_str()) {
            Some(value) => value.clone(),
            None => token,
        })
        .collect()
}

fn placeholder_values(config: &LaunchConfiguration<'_>) -> HashMap<&'static str, String> {
    let session = config.session;
    let root = config.root.to_string_lossy().to_string();
    let assets_root = config.root.join("assets").to_string_lossy().to_string();

    HashMap::from([
        ("${auth_access_token}", session.access_token.clone()),
        ("${auth_session}", session.access_token.clone()),
        ("${auth_player_name}", session.name.clone()),
        ("${auth_uuid}", session.uuid.clone()),
        ("${user_properties}", session.user_properties.clone()),
        ("${user_type}", "mojang".to_string()),
        ("${version_name}", config.version_number.clone()),
        ("${assets_index_name}", config.descriptor.asset_index.id.clone()),
        ("${game_directory}", root),
        ("${assets_root}", assets_root),
        ("${version_type}", config.version_type.clone()),
    ])
}
