// ─── Version Descriptor ───
// Strict schema for a version JSON plus OS rule evaluation for libraries
// and conditional arguments.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::platform::{arch_bits, TargetOs};

/// A fully parsed version descriptor.
///
/// Fields the pipeline cannot work without are required, so a truncated or
/// foreign document fails at parse time rather than during substitution.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDescriptor {
    pub id: String,
    #[serde(rename = "type", default)]
    pub version_type: Option<String>,
    pub main_class: String,
    pub downloads: VersionDownloads,
    pub asset_index: AssetIndexInfo,
    #[serde(default)]
    pub libraries: Vec<Library>,
    #[serde(default)]
    pub arguments: Option<Arguments>,
    /// Legacy space-delimited template (pre-1.13).
    #[serde(default)]
    pub minecraft_arguments: Option<String>,
    #[serde(default)]
    pub minimum_launcher_version: Option<u32>,
    #[serde(default)]
    pub release_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VersionDownloads {
    pub client: DownloadArtifact,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DownloadArtifact {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndexInfo {
    pub id: String,
    pub url: String,
    #[serde(default)]
    pub sha1: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Arguments {
    #[serde(default)]
    pub game: Vec<ArgumentValue>,
}

/// One element of a modern argument list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValue {
    Plain(String),
    Conditional { rules: Vec<Rule>, value: ArgumentValues },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ArgumentValues {
    One(String),
    Many(Vec<String>),
}

// ─── Library Entry with Rules ───

#[derive(Debug, Clone, Deserialize)]
pub struct Library {
    pub name: String,
    #[serde(default)]
    pub downloads: Option<LibraryDownloads>,
    #[serde(default)]
    pub rules: Option<Vec<Rule>>,
    /// OS name → classifier template, e.g. `"windows": "natives-windows-${arch}"`.
    #[serde(default)]
    pub natives: Option<HashMap<String, String>>,
    #[serde(default)]
    pub extract: Option<ExtractRules>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryDownloads {
    #[serde(default)]
    pub artifact: Option<LibraryArtifact>,
    #[serde(default)]
    pub classifiers: Option<HashMap<String, LibraryArtifact>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LibraryArtifact {
    pub path: String,
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractRules {
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Rule {
    pub action: RuleAction,
    #[serde(default)]
    pub os: Option<OsRule>,
    /// Optional launcher features (demo mode, custom resolution, ...).
    #[serde(default)]
    pub features: Option<HashMap<String, bool>>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleAction {
    Allow,
    Disallow,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
}

impl Rule {
    fn applies_to(&self, os: TargetOs) -> bool {
        // No optional feature is ever enabled by this launcher.
        if self.features.as_ref().is_some_and(|f| !f.is_empty()) {
            return false;
        }

        match &self.os {
            None => true,
            Some(rule) => {
                let name_matches = rule.name.as_deref().map_or(true, |n| n == os.as_str());
                let arch_matches = rule
                    .arch
                    .as_deref()
                    .map_or(true, |a| a != "x86" || arch_bits() == "32");
                name_matches && arch_matches
            }
        }
    }
}

/// Mojang rule semantics: start disallowed, every applicable rule
/// overrides the verdict, the last one wins.
pub fn rules_allow(rules: &[Rule], os: TargetOs) -> bool {
    let mut allowed = false;
    for rule in rules {
        if rule.applies_to(os) {
            allowed = rule.action == RuleAction::Allow;
        }
    }
    allowed
}

impl Library {
    /// Whether this library belongs on `os`. No rules means everywhere.
    pub fn is_allowed_for(&self, os: TargetOs) -> bool {
        match &self.rules {
            None => true,
            Some(rules) => rules_allow(rules, os),
        }
    }

    pub fn artifact(&self) -> Option<&LibraryArtifact> {
        self.downloads.as_ref()?.artifact.as_ref()
    }

    /// The native archive for `os`, if this library ships one.
    ///
    /// The `natives` map names the classifier when present (with `${arch}`
    /// filled in); otherwise `natives-<os>` is looked up directly.
    pub fn native_for(&self, os: TargetOs) -> Option<&LibraryArtifact> {
        let classifiers = self.downloads.as_ref()?.classifiers.as_ref()?;

        let classifier = self
            .natives
            .as_ref()
            .and_then(|natives| natives.get(os.as_str()))
            .map(|template| template.replace("${arch}", arch_bits()))
            .unwrap_or_else(|| os.native_classifier());

        classifiers.get(&classifier)
    }

    /// Archive entry prefixes that must not be unpacked.
    pub fn extract_excludes(&self) -> Vec<String> {
        match &self.extract {
            Some(rules) => rules.exclude.clone(),
            None => vec!["META-INF/".to_string()],
        }
    }
}

impl ArgumentValue {
    fn tokens_for(&self, os: TargetOs) -> Vec<String> {
        match self {
            ArgumentValue::Plain(arg) => vec![arg.clone()],
            ArgumentValue::Conditional { rules, value } => {
                if !rules_allow(rules, os) {
                    return vec![];
                }
                match value {
                    ArgumentValues::One(arg) => vec![arg.clone()],
                    ArgumentValues::Many(args) => args.clone(),
                }
            }
        }
    }
}

impl VersionDescriptor {
    /// Parse a descriptor, reporting schema violations as `ManifestParse`.
    pub fn parse(raw: &str, source_url: &str) -> LauncherResult<Self> {
        serde_json::from_str(raw).map_err(|e| LauncherError::ManifestParse {
            document: "version descriptor",
            source_url: source_url.to_string(),
            reason: e.to_string(),
        })
    }

    /// Game argument template, before placeholder substitution.
    ///
    /// Legacy descriptors carry one whitespace-delimited string; modern
    /// ones a token list whose conditional entries are resolved for `os`.
    pub fn game_argument_template(&self, os: TargetOs) -> Vec<String> {
        if let Some(legacy) = &self.minecraft_arguments {
            return legacy.split_whitespace().map(str::to_string).collect();
        }

        match &self.arguments {
            Some(args) => args.game.iter().flat_map(|a| a.tokens_for(os)).collect(),
            None => vec![],
        }
    }

    /// `type` field, `release` when absent.
    pub fn version_type(&self) -> &str {
        self.version_type.as_deref().unwrap_or("release")
    }
}

/// Minimal descriptor used across module tests. Every artifact hash is the
/// SHA-1 of [`fixture_body`] for its URL; the asset index hash is set per
/// test with [`set_asset_index_body`].
#[cfg(test)]
pub(crate) fn sample_descriptor_json() -> serde_json::Value {
    use crate::core::downloader::testing::{fixture_body, sha1_hex};

    let artifact = |path: &str, url: &str| {
        serde_json::json!({
            "path": path,
            "sha1": sha1_hex(&fixture_body(url)),
            "size": fixture_body(url).len(),
            "url": url
        })
    };
    let client_url = "https://launcher.test/client.jar";

    serde_json::json!({
        "id": "1.12.2",
        "type": "release",
        "mainClass": "net.minecraft.client.main.Main",
        "minimumLauncherVersion": 18,
        "releaseTime": "2017-09-18T08:39:46+00:00",
        "minecraftArguments": "--username ${auth_player_name} --version ${version_name} --gameDir ${game_directory} --assetsDir ${assets_root} --assetIndex ${assets_index_name} --uuid ${auth_uuid} --accessToken ${auth_access_token} --userType ${user_type}",
        "downloads": {
            "client": { "sha1": sha1_hex(&fixture_body(client_url)), "size": 10180113, "url": client_url }
        },
        "assetIndex": { "id": "1.12", "sha1": "98c88fb2e5a6b5b5e3d3c8e2b1c6f1d8f1c4a1b2", "size": 169337, "url": "https://launcher.test/indexes/1.12.json" },
        "libraries": [
            {
                "name": "com.mojang:patchy:1.1",
                "downloads": { "artifact": artifact("com/mojang/patchy/1.1/patchy-1.1.jar", "https://libraries.test/com/mojang/patchy/1.1/patchy-1.1.jar") }
            },
            {
                "name": "ca.weblite:java-objc-bridge:1.0.0",
                "downloads": { "artifact": artifact("ca/weblite/java-objc-bridge/1.0.0/java-objc-bridge-1.0.0.jar", "https://libraries.test/ca/weblite/java-objc-bridge-1.0.0.jar") },
                "rules": [ { "action": "allow", "os": { "name": "osx" } } ]
            },
            {
                "name": "org.lwjgl.lwjgl:lwjgl-platform:2.9.4",
                "natives": { "linux": "natives-linux", "osx": "natives-osx", "windows": "natives-windows" },
                "extract": { "exclude": ["META-INF/"] },
                "downloads": {
                    "classifiers": {
                        "natives-linux": artifact("org/lwjgl/lwjgl-platform-2.9.4-natives-linux.jar", "https://libraries.test/natives/lwjgl-platform-2.9.4-natives-linux.jar"),
                        "natives-windows": artifact("org/lwjgl/lwjgl-platform-2.9.4-natives-windows.jar", "https://libraries.test/natives/lwjgl-platform-2.9.4-natives-windows.jar")
                    }
                }
            },
            {
                "name": "com.google.code.gson:gson:2.8.0",
                "downloads": { "artifact": artifact("com/google/code/gson/gson/2.8.0/gson-2.8.0.jar", "https://libraries.test/com/google/code/gson/gson-2.8.0.jar") }
            }
        ]
    })
}

/// Point the sample's asset index hash at `body`.
#[cfg(test)]
pub(crate) fn set_asset_index_body(json: &mut serde_json::Value, body: &[u8]) {
    json["assetIndex"]["sha1"] = crate::core::downloader::testing::sha1_hex(body).into();
}

/// Point the hash of the sample's lwjgl native `classifier` at `body`.
#[cfg(test)]
pub(crate) fn set_native_body(json: &mut serde_json::Value, classifier: &str, body: &[u8]) {
    json["libraries"][2]["downloads"]["classifiers"][classifier]["sha1"] =
        crate::core::downloader::testing::sha1_hex(body).into();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VersionDescriptor {
        serde_json::from_value(sample_descriptor_json()).unwrap()
    }

    fn rule(action: RuleAction, os: Option<&str>) -> Rule {
        Rule {
            action,
            os: os.map(|name| OsRule {
                name: Some(name.to_string()),
                arch: None,
            }),
            features: None,
        }
    }

    #[test]
    fn parses_typed_descriptor() {
        let descriptor = sample();
        assert_eq!(descriptor.id, "1.12.2");
        assert_eq!(descriptor.asset_index.id, "1.12");
        assert_eq!(descriptor.minimum_launcher_version, Some(18));
        assert_eq!(descriptor.libraries.len(), 4);
        assert_eq!(descriptor.version_type(), "release");
        assert!(descriptor.release_time.is_some());
    }

    #[test]
    fn unmodelled_download_fields_are_ignored() {
        let mut json = sample_descriptor_json();
        json["downloads"]["server"] = serde_json::json!({
            "sha1": "886945bfb2b978778c3a0288fd7fab09d315b25f",
            "size": 30222121,
            "url": "https://launcher.test/server.jar"
        });
        json["assetIndex"]["totalSize"] = 127210297.into();

        let descriptor = VersionDescriptor::parse(&json.to_string(), "https://launcher.test/v.json")
            .unwrap();
        assert_eq!(descriptor.downloads.client.url, "https://launcher.test/client.jar");
        assert_eq!(descriptor.asset_index.id, "1.12");
    }

    #[test]
    fn missing_required_fields_fail_fast() {
        let mut json = sample_descriptor_json();
        json.as_object_mut().unwrap().remove("assetIndex");

        let err = VersionDescriptor::parse(&json.to_string(), "https://launcher.test/v.json")
            .unwrap_err();
        match err {
            LauncherError::ManifestParse { reason, .. } => assert!(reason.contains("assetIndex")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn no_rules_means_allowed() {
        let descriptor = sample();
        assert!(descriptor.libraries[0].is_allowed_for(TargetOs::Linux));
        assert!(descriptor.libraries[0].is_allowed_for(TargetOs::Windows));
    }

    #[test]
    fn allow_only_named_os() {
        let descriptor = sample();
        let objc = &descriptor.libraries[1];
        assert!(objc.is_allowed_for(TargetOs::Osx));
        assert!(!objc.is_allowed_for(TargetOs::Linux));
    }

    #[test]
    fn later_disallow_overrides_allow() {
        let rules = vec![
            rule(RuleAction::Allow, None),
            rule(RuleAction::Disallow, Some("osx")),
        ];
        assert!(rules_allow(&rules, TargetOs::Linux));
        assert!(!rules_allow(&rules, TargetOs::Osx));
    }

    #[test]
    fn feature_gated_rules_never_apply() {
        let rules = vec![Rule {
            action: RuleAction::Allow,
            os: None,
            features: Some(HashMap::from([("is_demo_user".to_string(), true)])),
        }];
        assert!(!rules_allow(&rules, TargetOs::Linux));
    }

    #[test]
    fn native_classifier_follows_natives_map() {
        let descriptor = sample();
        let lwjgl = &descriptor.libraries[2];
        assert_eq!(
            lwjgl.native_for(TargetOs::Linux).map(|a| a.path.as_str()),
            Some("org/lwjgl/lwjgl-platform-2.9.4-natives-linux.jar")
        );
        assert!(lwjgl.native_for(TargetOs::Osx).is_none());
        assert!(descriptor.libraries[0].native_for(TargetOs::Linux).is_none());
        assert_eq!(lwjgl.extract_excludes(), vec!["META-INF/".to_string()]);
    }

    #[test]
    fn natives_arch_template_is_expanded() {
        let lib: Library = serde_json::from_value(serde_json::json!({
            "name": "tv.twitch:twitch-platform:6.5",
            "natives": { "windows": "natives-windows-${arch}" },
            "downloads": {
                "classifiers": {
                    "natives-windows-32": { "path": "t-32.jar", "sha1": "a", "size": 1, "url": "https://x/t-32.jar" },
                    "natives-windows-64": { "path": "t-64.jar", "sha1": "b", "size": 1, "url": "https://x/t-64.jar" }
                }
            }
        }))
        .unwrap();

        let expected = format!("t-{}.jar", arch_bits());
        assert_eq!(
            lib.native_for(TargetOs::Windows).map(|a| a.path.clone()),
            Some(expected)
        );
    }

    #[test]
    fn legacy_template_is_split_on_whitespace() {
        let descriptor = sample();
        let template = descriptor.game_argument_template(TargetOs::Linux);
        assert_eq!(&template[..2], &["--username", "${auth_player_name}"]);
        assert_eq!(template.len(), 16);
    }

    #[test]
    fn modern_template_resolves_conditional_entries() {
        let mut json = sample_descriptor_json();
        let obj = json.as_object_mut().unwrap();
        obj.remove("minecraftArguments");
        obj.insert(
            "arguments".into(),
            serde_json::json!({
                "game": [
                    "--username",
                    "${auth_player_name}",
                    { "rules": [{ "action": "allow", "features": { "is_demo_user": true } }], "value": "--demo" },
                    { "rules": [{ "action": "allow", "os": { "name": "linux" } }], "value": ["--linux-only", "yes"] }
                ],
                "jvm": ["-Djava.library.path=${natives_directory}"]
            }),
        );
        let descriptor: VersionDescriptor = serde_json::from_value(json).unwrap();

        assert_eq!(
            descriptor.game_argument_template(TargetOs::Linux),
            vec!["--username", "${auth_player_name}", "--linux-only", "yes"]
        );
        assert_eq!(
            descriptor.game_argument_template(TargetOs::Windows),
            vec!["--username", "${auth_player_name}"]
        );
    }
}
