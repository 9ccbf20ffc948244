use crate::{
    common::{
        constants::BASIC_AUTH_SECRET_KEY,
        error::{InvalidSecretRequest, Result, SecretOperationFailed},
        kube_client::ClusterClient,
    },
    deploy::ensure_namespace,
};
use md5::{Digest, Md5};
use rand::Rng;
use snafu::{ensure, ResultExt};
use std::{collections::BTreeMap, fmt};
use tracing::info;

/// Credentials for HTTP basic authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuthCredential {
    pub user: String,
    pub password: String,
}

impl fmt::Debug for BasicAuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthCredential")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl BasicAuthCredential {
    pub fn new<U, P>(user: U, password: P) -> Self
    where
        U: ToString,
        P: ToString,
    {
        Self {
            user: user.to_string(),
            password: password.to_string(),
        }
    }

    /// An htpasswd line for this credential, hashed with Apache's salted MD5 scheme (`$apr1$`).
    /// Every call draws a fresh salt.
    pub fn htpasswd_line(&self) -> String {
        let mut rng = rand::thread_rng();
        let salt: String = (0..APR1_SALT_LEN)
            .map(|_| ITOA64[rng.gen_range(0..ITOA64.len())] as char)
            .collect();
        format!("{}:{}\n", self.user, apr1_crypt(&self.password, &salt))
    }
}

const APR1_MAGIC: &str = "$apr1$";
const APR1_SALT_LEN: usize = 8;
const APR1_ROUNDS: usize = 1000;
const ITOA64: &[u8; 64] = b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Apache's variant of the FreeBSD MD5 crypt, as written by `htpasswd -m`. Only the first eight
/// bytes of the salt are used.
pub(crate) fn apr1_crypt(password: &str, salt: &str) -> String {
    let password = password.as_bytes();
    let salt = &salt.as_bytes()[..salt.len().min(APR1_SALT_LEN)];

    let alternate = Md5::new()
        .chain_update(password)
        .chain_update(salt)
        .chain_update(password)
        .finalize();

    let mut context = Md5::new()
        .chain_update(password)
        .chain_update(APR1_MAGIC)
        .chain_update(salt);
    for chunk in password.chunks(alternate.len()) {
        context.update(&alternate[..chunk.len()]);
    }
    let mut bits = password.len();
    while bits > 0 {
        if bits & 1 == 1 {
            context.update([0u8]);
        } else {
            context.update(&password[..1]);
        }
        bits >>= 1;
    }
    let mut digest = context.finalize();

    for round in 0..APR1_ROUNDS {
        let mut context = Md5::new();
        if round & 1 == 1 {
            context.update(password);
        } else {
            context.update(&digest);
        }
        if round % 3 != 0 {
            context.update(salt);
        }
        if round % 7 != 0 {
            context.update(password);
        }
        if round & 1 == 1 {
            context.update(&digest);
        } else {
            context.update(password);
        }
        digest = context.finalize();
    }

    let mut encoded = String::with_capacity(22);
    for (a, b, c) in [(0, 6, 12), (1, 7, 13), (2, 8, 14), (3, 9, 15), (4, 10, 5)] {
        let group =
            (u32::from(digest[a]) << 16) | (u32::from(digest[b]) << 8) | u32::from(digest[c]);
        push_itoa64(&mut encoded, group, 4);
    }
    push_itoa64(&mut encoded, u32::from(digest[11]), 2);

    format!("{APR1_MAGIC}{}${encoded}", String::from_utf8_lossy(salt))
}

fn push_itoa64(out: &mut String, mut value: u32, chars: usize) {
    for _ in 0..chars {
        out.push(ITOA64[(value & 0x3f) as usize] as char);
        value >>= 6;
    }
}

/// Creates a Secret holding an htpasswd entry for the credential under the key 'auth', creating
/// the Namespace first if needed. An existing Secret of the same name is left as it is.
pub async fn create_basic_auth_secret<C>(
    client: &C,
    secret_name: &str,
    namespace: &str,
    credential: &BasicAuthCredential,
) -> Result<()>
where
    C: ClusterClient + ?Sized,
{
    ensure!(
        !secret_name.is_empty(),
        InvalidSecretRequest {
            reason: "secret name must not be empty"
        }
    );
    ensure!(
        !namespace.is_empty(),
        InvalidSecretRequest {
            reason: "namespace must not be empty"
        }
    );

    ensure_namespace(client, namespace).await?;

    let exists = client
        .secret_exists(secret_name, namespace)
        .await
        .context(SecretOperationFailed {
            operation: "get",
            name: secret_name,
            namespace,
        })?;
    if exists {
        info!(
            secret = secret_name,
            namespace, "Secret already exists, leaving it unchanged"
        );
        return Ok(());
    }

    let data = BTreeMap::from([(
        BASIC_AUTH_SECRET_KEY.to_string(),
        credential.htpasswd_line(),
    )]);
    client
        .put_secret(secret_name, namespace, data)
        .await
        .context(SecretOperationFailed {
            operation: "create",
            name: secret_name,
            namespace,
        })?;

    info!(secret = secret_name, namespace, "Created basic-auth Secret");
    Ok(())
}
