//! Butane to Ignition translation
//!
//! Accepts a Butane document of the `fcos` or `flatcar` variant and emits
//! the equivalent Ignition config. Inline file contents become `data:` URLs,
//! percent-encoded or base64, whichever is shorter. Keys the translator
//! does not know are ignored.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Translate Butane JSON text into Ignition JSON text.
pub fn translate(text: &str) -> Result<String> {
    let config: Config =
        serde_json::from_str(text).map_err(|e| Error::Translate(format!("error parsing config: {e}")))?;
    let ignition = config.into_ignition()?;
    Ok(serde_json::to_string(&ignition)?)
}

/// Ignition spec version produced for a Butane variant and version.
pub fn ignition_version(variant: &str, version: &str) -> Result<&'static str> {
    let target = match (variant, version) {
        ("fcos", "1.0.0") => "3.0.0",
        ("fcos", "1.1.0") => "3.1.0",
        ("fcos", "1.2.0") | ("fcos", "1.3.0") => "3.2.0",
        ("fcos", "1.4.0") => "3.3.0",
        ("fcos", "1.5.0") => "3.4.0",
        ("flatcar", "1.0.0") => "3.3.0",
        ("flatcar", "1.1.0") => "3.4.0",
        _ => {
            return Err(Error::Translate(format!(
                "unsupported config variant and version: {variant:?} {version:?}"
            )))
        }
    };
    Ok(target)
}

/// Encode file contents as a `data:` URL.
pub fn data_url(contents: &[u8]) -> String {
    let plain = format!("data:,{}", urlencoding::encode_binary(contents));
    let encoded = format!("data:;base64,{}", STANDARD.encode(contents));
    if encoded.len() < plain.len() {
        encoded
    } else {
        plain
    }
}

fn translate_error(path: &str, msg: &str) -> Error {
    Error::Translate(format!("{path}: {msg}"))
}

// =============================================================================
// Butane input
// =============================================================================

#[derive(Debug, Deserialize)]
struct Config {
    variant: String,
    version: String,
    #[serde(default)]
    ignition: Option<IgnitionSection>,
    #[serde(default)]
    passwd: Option<Passwd>,
    #[serde(default)]
    storage: Option<Storage>,
    #[serde(default)]
    systemd: Option<Systemd>,
}

#[derive(Debug, Default, Deserialize)]
struct IgnitionSection {
    #[serde(default)]
    config: Option<IgnitionConfig>,
    #[serde(default)]
    proxy: Option<Proxy>,
    #[serde(default)]
    security: Option<Security>,
    #[serde(default)]
    timeouts: Option<Timeouts>,
}

#[derive(Debug, Default, Deserialize)]
struct IgnitionConfig {
    #[serde(default)]
    merge: Vec<Resource>,
    #[serde(default)]
    replace: Option<Resource>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
struct Proxy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    http_proxy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    https_proxy: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    no_proxy: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Security {
    #[serde(default)]
    tls: Option<Tls>,
}

#[derive(Debug, Default, Deserialize)]
struct Tls {
    #[serde(default)]
    certificate_authorities: Vec<Resource>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all(serialize = "camelCase"))]
struct Timeouts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    http_response_headers: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    http_total: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct Resource {
    #[serde(default)]
    compression: Option<String>,
    #[serde(default)]
    http_headers: Vec<HttpHeader>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    inline: Option<String>,
    #[serde(default)]
    local: Option<String>,
    #[serde(default)]
    verification: Option<Verification>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
struct HttpHeader {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct Verification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hash: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Passwd {
    #[serde(default)]
    users: Vec<User>,
    #[serde(default)]
    groups: Vec<Group>,
}

#[derive(Debug, Default, Deserialize)]
struct User {
    name: String,
    #[serde(default)]
    gecos: Option<String>,
    #[serde(default)]
    groups: Vec<String>,
    #[serde(default)]
    home_dir: Option<String>,
    #[serde(default)]
    no_create_home: Option<bool>,
    #[serde(default)]
    no_log_init: Option<bool>,
    #[serde(default)]
    no_user_group: Option<bool>,
    #[serde(default)]
    password_hash: Option<String>,
    #[serde(default)]
    primary_group: Option<String>,
    #[serde(default)]
    shell: Option<String>,
    #[serde(default)]
    should_exist: Option<bool>,
    #[serde(default)]
    ssh_authorized_keys: Vec<String>,
    #[serde(default)]
    system: Option<bool>,
    #[serde(default)]
    uid: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct Group {
    name: String,
    #[serde(default)]
    gid: Option<i64>,
    #[serde(default)]
    password_hash: Option<String>,
    #[serde(default)]
    should_exist: Option<bool>,
    #[serde(default)]
    system: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct Storage {
    #[serde(default)]
    directories: Vec<Directory>,
    #[serde(default)]
    files: Vec<File>,
    #[serde(default)]
    links: Vec<Link>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct NodeOwner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct File {
    path: String,
    #[serde(default)]
    overwrite: Option<bool>,
    #[serde(default)]
    user: Option<NodeOwner>,
    #[serde(default)]
    group: Option<NodeOwner>,
    #[serde(default)]
    contents: Option<Resource>,
    #[serde(default)]
    append: Vec<Resource>,
    #[serde(default)]
    mode: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct Directory {
    path: String,
    #[serde(default)]
    overwrite: Option<bool>,
    #[serde(default)]
    user: Option<NodeOwner>,
    #[serde(default)]
    group: Option<NodeOwner>,
    #[serde(default)]
    mode: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct Link {
    path: String,
    #[serde(default)]
    overwrite: Option<bool>,
    #[serde(default)]
    user: Option<NodeOwner>,
    #[serde(default)]
    group: Option<NodeOwner>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    hard: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct Systemd {
    #[serde(default)]
    units: Vec<Unit>,
}

#[derive(Debug, Default, Deserialize)]
struct Unit {
    name: String,
    #[serde(default)]
    contents: Option<String>,
    #[serde(default)]
    dropins: Vec<Dropin>,
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    mask: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct Dropin {
    name: String,
    #[serde(default)]
    contents: Option<String>,
}

// =============================================================================
// Ignition output
// =============================================================================

#[derive(Debug, Serialize)]
struct Ignition {
    ignition: IgnitionMeta,
    passwd: OutPasswd,
    storage: OutStorage,
    systemd: OutSystemd,
}

#[derive(Debug, Serialize)]
struct IgnitionMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<OutIgnitionConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    proxy: Option<Proxy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    security: Option<OutSecurity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeouts: Option<Timeouts>,
    version: &'static str,
}

#[derive(Debug, Serialize)]
struct OutIgnitionConfig {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    merge: Vec<OutResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    replace: Option<OutResource>,
}

#[derive(Debug, Serialize)]
struct OutSecurity {
    tls: OutTls,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutTls {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    certificate_authorities: Vec<OutResource>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutResource {
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    http_headers: Vec<HttpHeader>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verification: Option<Verification>,
}

#[derive(Debug, Default, Serialize)]
struct OutPasswd {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    groups: Vec<OutGroup>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    users: Vec<OutUser>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    gecos: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    home_dir: Option<String>,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    no_create_home: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    no_log_init: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    no_user_group: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    primary_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    shell: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    should_exist: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ssh_authorized_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    uid: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    gid: Option<i64>,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    should_exist: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<bool>,
}

#[derive(Debug, Default, Serialize)]
struct OutStorage {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    directories: Vec<OutDirectory>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    files: Vec<OutFile>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    links: Vec<OutLink>,
}

#[derive(Debug, Serialize)]
struct OutFile {
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<NodeOwner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    overwrite: Option<bool>,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<NodeOwner>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    append: Vec<OutResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    contents: Option<OutResource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<i64>,
}

#[derive(Debug, Serialize)]
struct OutDirectory {
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<NodeOwner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    overwrite: Option<bool>,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<NodeOwner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<i64>,
}

#[derive(Debug, Serialize)]
struct OutLink {
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<NodeOwner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    overwrite: Option<bool>,
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<NodeOwner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hard: Option<bool>,
    target: String,
}

#[derive(Debug, Default, Serialize)]
struct OutSystemd {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    units: Vec<OutUnit>,
}

#[derive(Debug, Serialize)]
struct OutUnit {
    #[serde(skip_serializing_if = "Option::is_none")]
    contents: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dropins: Vec<OutDropin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mask: Option<bool>,
    name: String,
}

#[derive(Debug, Serialize)]
struct OutDropin {
    #[serde(skip_serializing_if = "Option::is_none")]
    contents: Option<String>,
    name: String,
}

// =============================================================================
// Translation
// =============================================================================

impl Config {
    fn into_ignition(self) -> Result<Ignition> {
        let version = ignition_version(&self.variant, &self.version)?;
        debug!(variant = %self.variant, version = %self.version, ignition = version, "Translating butane config");

        let meta = match self.ignition {
            None => IgnitionMeta {
                config: None,
                proxy: None,
                security: None,
                timeouts: None,
                version,
            },
            Some(section) => section.translate(version)?,
        };

        Ok(Ignition {
            ignition: meta,
            passwd: self.passwd.unwrap_or_default().translate()?,
            storage: self.storage.unwrap_or_default().translate()?,
            systemd: self.systemd.unwrap_or_default().translate()?,
        })
    }
}

impl IgnitionSection {
    fn translate(self, version: &'static str) -> Result<IgnitionMeta> {
        let config = match self.config {
            None => None,
            Some(config) => Some(OutIgnitionConfig {
                merge: config
                    .merge
                    .into_iter()
                    .enumerate()
                    .map(|(i, r)| r.translate(&format!("ignition.config.merge[{i}]")))
                    .collect::<Result<_>>()?,
                replace: config
                    .replace
                    .map(|r| r.translate("ignition.config.replace"))
                    .transpose()?,
            }),
        };

        let security = match self.security.and_then(|s| s.tls) {
            None => None,
            Some(tls) => Some(OutSecurity {
                tls: OutTls {
                    certificate_authorities: tls
                        .certificate_authorities
                        .into_iter()
                        .enumerate()
                        .map(|(i, r)| {
                            r.translate(&format!("ignition.security.tls.certificate_authorities[{i}]"))
                        })
                        .collect::<Result<_>>()?,
                },
            }),
        };

        Ok(IgnitionMeta {
            config,
            proxy: self.proxy,
            security,
            timeouts: self.timeouts,
            version,
        })
    }
}

impl Resource {
    fn translate(self, path: &str) -> Result<OutResource> {
        let set = [self.source.is_some(), self.inline.is_some(), self.local.is_some()]
            .iter()
            .filter(|set| **set)
            .count();
        if set > 1 {
            return Err(translate_error(path, "only one of source, inline or local may be specified"));
        }
        if self.local.is_some() {
            return Err(translate_error(path, "local file references are not supported"));
        }

        let (source, compression) = match self.inline {
            Some(inline) => (Some(data_url(inline.as_bytes())), Some(String::new())),
            None => (self.source, self.compression),
        };

        Ok(OutResource {
            compression,
            http_headers: self.http_headers,
            source,
            verification: self.verification,
        })
    }
}

impl Passwd {
    fn translate(self) -> Result<OutPasswd> {
        let users = self
            .users
            .into_iter()
            .enumerate()
            .map(|(i, u)| {
                if u.name.is_empty() {
                    return Err(translate_error(&format!("passwd.users[{i}].name"), "field is required"));
                }
                Ok(OutUser {
                    gecos: u.gecos,
                    groups: u.groups,
                    home_dir: u.home_dir,
                    name: u.name,
                    no_create_home: u.no_create_home,
                    no_log_init: u.no_log_init,
                    no_user_group: u.no_user_group,
                    password_hash: u.password_hash,
                    primary_group: u.primary_group,
                    shell: u.shell,
                    should_exist: u.should_exist,
                    ssh_authorized_keys: u.ssh_authorized_keys,
                    system: u.system,
                    uid: u.uid,
                })
            })
            .collect::<Result<_>>()?;

        let groups = self
            .groups
            .into_iter()
            .enumerate()
            .map(|(i, g)| {
                if g.name.is_empty() {
                    return Err(translate_error(&format!("passwd.groups[{i}].name"), "field is required"));
                }
                Ok(OutGroup {
                    gid: g.gid,
                    name: g.name,
                    password_hash: g.password_hash,
                    should_exist: g.should_exist,
                    system: g.system,
                })
            })
            .collect::<Result<_>>()?;

        Ok(OutPasswd { groups, users })
    }
}

fn check_absolute(path: &str, field: &str) -> Result<()> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(translate_error(field, "path not absolute"))
    }
}

impl Storage {
    fn translate(self) -> Result<OutStorage> {
        let mut directories = Vec::with_capacity(self.directories.len());
        for (i, d) in self.directories.into_iter().enumerate() {
            check_absolute(&d.path, &format!("storage.directories[{i}].path"))?;
            directories.push(OutDirectory {
                group: d.group,
                overwrite: d.overwrite,
                path: d.path,
                user: d.user,
                mode: d.mode,
            });
        }

        let mut files = Vec::with_capacity(self.files.len());
        for (i, f) in self.files.into_iter().enumerate() {
            let base = format!("storage.files[{i}]");
            check_absolute(&f.path, &format!("{base}.path"))?;
            let contents = f
                .contents
                .map(|c| c.translate(&format!("{base}.contents")))
                .transpose()?;
            let append = f
                .append
                .into_iter()
                .enumerate()
                .map(|(j, r)| r.translate(&format!("{base}.append[{j}]")))
                .collect::<Result<_>>()?;
            files.push(OutFile {
                group: f.group,
                overwrite: f.overwrite,
                path: f.path,
                user: f.user,
                append,
                contents,
                mode: f.mode,
            });
        }

        let mut links = Vec::with_capacity(self.links.len());
        for (i, l) in self.links.into_iter().enumerate() {
            let base = format!("storage.links[{i}]");
            check_absolute(&l.path, &format!("{base}.path"))?;
            let target = l
                .target
                .filter(|t| !t.is_empty())
                .ok_or_else(|| translate_error(&format!("{base}.target"), "field is required"))?;
            links.push(OutLink {
                group: l.group,
                overwrite: l.overwrite,
                path: l.path,
                user: l.user,
                hard: l.hard,
                target,
            });
        }

        Ok(OutStorage {
            directories,
            files,
            links,
        })
    }
}

impl Systemd {
    fn translate(self) -> Result<OutSystemd> {
        let mut units = Vec::with_capacity(self.units.len());
        for (i, u) in self.units.into_iter().enumerate() {
            if u.name.is_empty() {
                return Err(translate_error(&format!("systemd.units[{i}].name"), "field is required"));
            }
            units.push(OutUnit {
                contents: u.contents,
                dropins: u
                    .dropins
                    .into_iter()
                    .map(|d| OutDropin {
                        contents: d.contents,
                        name: d.name,
                    })
                    .collect(),
                enabled: u.enabled,
                mask: u.mask,
                name: u.name,
            });
        }
        Ok(OutSystemd { units })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::{json, Value};

    fn translate_value(input: Value) -> Result<Value> {
        let out = translate(&input.to_string())?;
        Ok(serde_json::from_str(&out).unwrap())
    }

    #[test]
    fn test_data_url_prefers_shorter_encoding() {
        assert_eq!(data_url(b"machine-0\n"), "data:,machine-0%0A");
        assert_eq!(
            data_url(b"[Resolve]\nDNS=1.2.3.4\nDNS=5.6.7.8"),
            "data:,%5BResolve%5D%0ADNS%3D1.2.3.4%0ADNS%3D5.6.7.8"
        );
        let binary = [0xffu8; 32];
        assert!(data_url(&binary).starts_with("data:;base64,"));
    }

    #[test]
    fn test_versions() {
        assert_eq!(ignition_version("fcos", "1.3.0").unwrap(), "3.2.0");
        assert_eq!(ignition_version("fcos", "1.5.0").unwrap(), "3.4.0");
        assert_eq!(ignition_version("flatcar", "1.0.0").unwrap(), "3.3.0");
        assert_matches!(ignition_version("fcos", "9.9.9"), Err(Error::Translate(_)));
        assert_matches!(ignition_version("rhcos", "1.0.0"), Err(Error::Translate(_)));
    }

    #[test]
    fn test_translate_minimal() {
        let out = translate_value(json!({"variant": "fcos", "version": "1.3.0"})).unwrap();
        assert_eq!(
            out,
            json!({"ignition": {"version": "3.2.0"}, "passwd": {}, "storage": {}, "systemd": {}})
        );
    }

    #[test]
    fn test_translate_files_and_users() {
        let out = translate_value(json!({
            "variant": "fcos",
            "version": "1.3.0",
            "passwd": {"users": [{"name": "core", "ssh_authorized_keys": ["ssh-ed25519 AAAA"]}]},
            "storage": {
                "files": [
                    {"path": "/etc/motd", "mode": 420, "contents": {"inline": "hi"}},
                    {"path": "/opt/bin/tool", "contents": {"source": "https://example.com/tool"}}
                ],
                "links": [{"path": "/usr/local/bin/tool", "target": "/opt/bin/tool"}]
            },
            "systemd": {"units": [{"name": "a.service", "dropins": [{"name": "10-x.conf", "contents": "[Service]"}]}]}
        }))
        .unwrap();

        assert_eq!(out["passwd"]["users"][0]["sshAuthorizedKeys"][0], "ssh-ed25519 AAAA");
        assert_eq!(
            out["storage"]["files"][0],
            json!({"path": "/etc/motd", "contents": {"compression": "", "source": "data:,hi"}, "mode": 420})
        );
        assert_eq!(
            out["storage"]["files"][1]["contents"],
            json!({"source": "https://example.com/tool"})
        );
        assert_eq!(out["storage"]["links"][0]["target"], "/opt/bin/tool");
        assert_eq!(out["systemd"]["units"][0]["dropins"][0]["name"], "10-x.conf");
    }

    #[test]
    fn test_translate_ignition_section() {
        let out = translate_value(json!({
            "variant": "fcos",
            "version": "1.4.0",
            "ignition": {
                "config": {"merge": [{"inline": "{}"}]},
                "timeouts": {"http_total": 30},
                "proxy": {"https_proxy": "http://proxy:3128", "no_proxy": ["localhost"]}
            }
        }))
        .unwrap();

        assert_eq!(out["ignition"]["version"], "3.3.0");
        assert_eq!(out["ignition"]["config"]["merge"][0]["source"], "data:,%7B%7D");
        assert_eq!(out["ignition"]["timeouts"]["httpTotal"], 30);
        assert_eq!(out["ignition"]["proxy"]["httpsProxy"], "http://proxy:3128");
        assert_eq!(out["ignition"]["proxy"]["noProxy"][0], "localhost");
    }

    #[test]
    fn test_translate_rejects_invalid_documents() {
        let both = json!({
            "variant": "fcos", "version": "1.3.0",
            "storage": {"files": [{"path": "/a", "contents": {"inline": "x", "source": "data:,x"}}]}
        });
        assert_matches!(translate_value(both), Err(Error::Translate(msg)) if msg.contains("storage.files[0].contents"));

        let local = json!({
            "variant": "fcos", "version": "1.3.0",
            "storage": {"files": [{"path": "/a", "contents": {"local": "a.txt"}}]}
        });
        assert_matches!(translate_value(local), Err(Error::Translate(_)));

        let relative = json!({
            "variant": "fcos", "version": "1.3.0",
            "storage": {"files": [{"path": "etc/a"}]}
        });
        assert_matches!(translate_value(relative), Err(Error::Translate(msg)) if msg.contains("path not absolute"));

        assert_matches!(translate("not json"), Err(Error::Translate(_)));
        assert_matches!(translate(r#"{"version": "1.3.0"}"#), Err(Error::Translate(_)));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let out = translate_value(json!({
            "variant": "fcos", "version": "1.3.0",
            "passwd": {"users": [{"name": "xyz", "sshAuthorizedKeys": "ssh-ed25519 AAAA", "shell": "/bin/bash"}]}
        }))
        .unwrap();
        assert_eq!(out["passwd"]["users"][0], json!({"name": "xyz", "shell": "/bin/bash"}));
    }
}
