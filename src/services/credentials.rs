//! Encrypted service credentials
//!
//! Secrets are written with `systemd-creds encrypt` into the credentials
//! directory and only ever decrypted by systemd when the service starts,
//! where they appear under `$CREDENTIALS_DIRECTORY`.

use std::fs;
use std::os::unix::fs::PermissionsExt;

use tracing::info;

use crate::config::InstallPaths;
use crate::error::{SetupError, SetupResult};
use crate::exec::{CommandRunner, CommandSpec};
use crate::models::RemoteSecrets;
use crate::secret::SecretString;

/// Repository passphrase credential
pub const PASSWORD_CREDENTIAL: &str = "backrest-password";
/// Remote share login credential
pub const REMOTE_LOGIN_CREDENTIAL: &str = "remote-login";
/// Remote share password credential
pub const REMOTE_PASSWORD_CREDENTIAL: &str = "remote-password";

/// Random bytes behind the generated passphrase
const PASSPHRASE_BYTES: usize = 32;

/// Names of the credentials an install writes
pub fn credential_names(with_remote: bool) -> Vec<&'static str> {
    let mut names = vec![PASSWORD_CREDENTIAL];
    if with_remote {
        names.push(REMOTE_LOGIN_CREDENTIAL);
        names.push(REMOTE_PASSWORD_CREDENTIAL);
    }
    names
}

/// Create the credentials directory with mode 0700
pub fn ensure_credentials_dir(paths: &InstallPaths) -> SetupResult<()> {
    let dir = paths.credentials_dir();
    fs::create_dir_all(&dir)
        .map_err(|e| SetupError::io(format!("Failed to create {}", dir.display()), e))?;
    fs::set_permissions(&dir, fs::Permissions::from_mode(0o700))
        .map_err(|e| SetupError::io(format!("Failed to chmod {}", dir.display()), e))?;
    Ok(())
}

/// Encrypt one secret into `<credentials dir>/<name>.cred`
pub fn encrypt_credential<R: CommandRunner>(
    runner: &mut R,
    paths: &InstallPaths,
    name: &str,
    secret: &SecretString,
) -> SetupResult<()> {
    let target = paths.credential_file(name);
    runner.run_checked(
        &CommandSpec::new("systemd-creds")
            .arg("encrypt")
            .arg(format!("--name={}", name))
            .arg("-")
            .arg(target.to_string_lossy())
            .stdin(secret.to_bytes()),
    )?;
    Ok(())
}

/// Generate the repository passphrase and write every credential
///
/// Takes the remote secrets by value; they and the passphrase are dropped,
/// and so zeroed, before this returns.
pub fn provision_credentials<R: CommandRunner>(
    runner: &mut R,
    paths: &InstallPaths,
    remote: Option<RemoteSecrets>,
) -> SetupResult<()> {
    ensure_credentials_dir(paths)?;

    let passphrase = SecretString::generate(PASSPHRASE_BYTES);
    encrypt_credential(runner, paths, PASSWORD_CREDENTIAL, &passphrase)?;
    drop(passphrase);

    if let Some(secrets) = remote {
        encrypt_credential(runner, paths, REMOTE_LOGIN_CREDENTIAL, &secrets.login)?;
        encrypt_credential(runner, paths, REMOTE_PASSWORD_CREDENTIAL, &secrets.password)?;
        drop(secrets);
    }

    info!(dir = %paths.credentials_dir().display(), "credentials written");
    Ok(())
}
