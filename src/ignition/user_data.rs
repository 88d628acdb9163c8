//! Cloud-init user data decoration

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{Error, Result};

const SHEBANG: &str = "#!/";
const SSH_KEYS_SECTION: &str = "ssh_authorized_keys:";

/// Prepare user data for cloud-init.
///
/// Shell scripts are wrapped into a cloud-config that runs them once. If
/// `ssh_keys` is not empty an `ssh_authorized_keys` section is appended.
pub fn prepare_user_data(user_data: &str, ssh_keys: &[String]) -> Result<String> {
    let text = if user_data.starts_with(SHEBANG) {
        package_in_cloud_init(user_data)
    } else {
        user_data.to_string()
    };
    add_ssh_keys_section(text, ssh_keys)
}

fn package_in_cloud_init(script: &str) -> String {
    let content = STANDARD.encode(script.as_bytes());
    format!(
        "#cloud-config
write_files:
- encoding: b64
  content: {content}
  owner: root:root
  path: /root/cloud-init-script
  permissions: '0555'
runcmd:
- /root/cloud-init-script
- rm /root/cloud-init-script
"
    )
}

fn add_ssh_keys_section(mut text: String, ssh_keys: &[String]) -> Result<String> {
    if ssh_keys.is_empty() {
        return Ok(text);
    }
    if text.contains(SSH_KEYS_SECTION) {
        return Err(Error::DuplicateKeysSection);
    }

    text.push('\n');
    text.push_str(SSH_KEYS_SECTION);
    text.push('\n');
    for key in ssh_keys {
        text.push_str("- ");
        text.push_str(&serde_json::to_string(key)?);
        text.push('\n');
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SCRIPT: &str = "#!/bin/bash\necho hello\n";

    #[test]
    fn test_script_is_wrapped() {
        let out = prepare_user_data(SCRIPT, &[]).unwrap();
        assert!(out.starts_with("#cloud-config\n"));
        assert!(out.contains(&format!("  content: {}\n", STANDARD.encode(SCRIPT))));
        assert!(out.contains("  path: /root/cloud-init-script\n"));
        assert!(out.ends_with("- rm /root/cloud-init-script\n"));
        assert!(!out.contains(SSH_KEYS_SECTION));
    }

    #[test]
    fn test_cloud_config_is_kept() {
        let data = "#cloud-config\nhostname: foo\n";
        assert_eq!(prepare_user_data(data, &[]).unwrap(), data);
    }

    #[test]
    fn test_ssh_keys_are_appended() {
        let keys = vec!["ssh-ed25519 AAAA one".to_string(), "ssh-rsa BBBB two".to_string()];
        let out = prepare_user_data(SCRIPT, &keys).unwrap();
        assert!(out.ends_with(
            "\nssh_authorized_keys:\n- \"ssh-ed25519 AAAA one\"\n- \"ssh-rsa BBBB two\"\n"
        ));
    }

    #[test]
    fn test_duplicate_keys_section() {
        let keys = vec!["ssh-ed25519 AAAA".to_string()];
        let once = prepare_user_data(SCRIPT, &keys).unwrap();
        assert_matches!(prepare_user_data(&once, &keys), Err(Error::DuplicateKeysSection));
    }

    #[test]
    fn test_existing_section_without_keys_is_fine() {
        let data = "#cloud-config\nssh_authorized_keys:\n- a\n";
        assert_eq!(prepare_user_data(data, &[]).unwrap(), data);
    }
}
