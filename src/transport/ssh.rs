//! SSH transport implementation using russh.

use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use log::{debug, trace};
use russh::client::{self, Handle, Msg};
use russh::keys::{load_secret_key, PrivateKeyWithHashAlg, PublicKey};
use russh::{Channel, ChannelMsg};

use super::config::{AuthMethod, SshConfig};
use super::{Transport, TryRead};
use crate::error::TransportError;

/// SSH shell channel wrapping russh, exposed through [`Transport`].
///
/// Incoming channel messages are drained into an internal queue by
/// `wait_ready`, so `try_read` can stay strictly non-blocking.
pub struct SshTransport {
    session: Handle<AcceptAllHandler>,
    channel: Channel<Msg>,
    pending: BytesMut,
    eof: bool,
}

impl SshTransport {
    /// Connect, authenticate, and open a shell on a fresh PTY.
    pub async fn connect(config: SshConfig) -> Result<Self, TransportError> {
        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            ..Default::default()
        });

        let handler = AcceptAllHandler;

        let mut session = tokio::time::timeout(
            config.timeout,
            client::connect(ssh_config, (config.host.as_str(), config.port), handler),
        )
        .await
        .map_err(|_| TransportError::ConnectTimeout(config.timeout))?
        .map_err(TransportError::Ssh)?;

        Self::authenticate(&mut session, &config).await?;

        let channel = session
            .channel_open_session()
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_pty(
                true,
                &config.terminal_type,
                config.terminal_width,
                config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::Ssh)?;

        channel
            .request_shell(true)
            .await
            .map_err(TransportError::Ssh)?;

        debug!(
            "shell opened on {} ({} pty)",
            config.socket_addr(),
            config.terminal_type
        );

        Ok(Self {
            session,
            channel,
            pending: BytesMut::new(),
            eof: false,
        })
    }

    /// Authenticate with the server.
    async fn authenticate(
        session: &mut Handle<AcceptAllHandler>,
        config: &SshConfig,
    ) -> Result<(), TransportError> {
        let success = match &config.auth {
            AuthMethod::None => session
                .authenticate_none(&config.username)
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::Password(password) => session
                .authenticate_password(&config.username, password)
                .await
                .map_err(TransportError::Ssh)?
                .success(),
            AuthMethod::PrivateKey { path, passphrase } => {
                let key = load_secret_key(path, passphrase.as_deref())
                    .map_err(|e| TransportError::Key(e.to_string()))?;

                let hash_alg = session
                    .best_supported_rsa_hash()
                    .await
                    .map_err(TransportError::Ssh)?
                    .flatten();

                session
                    .authenticate_publickey(
                        &config.username,
                        PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg),
                    )
                    .await
                    .map_err(TransportError::Ssh)?
                    .success()
            }
        };

        if !success {
            return Err(TransportError::AuthenticationFailed {
                user: config.username.clone(),
            });
        }

        Ok(())
    }

}

impl Transport for SshTransport {
    fn try_read(&mut self, buf: &mut [u8]) -> Result<TryRead, TransportError> {
        if self.pending.is_empty() {
            if self.eof {
                return Ok(TryRead::Eof);
            }
            return Ok(TryRead::WouldBlock);
        }

        let n = self.pending.len().min(buf.len());
        self.pending.copy_to_slice(&mut buf[..n]);
        Ok(TryRead::Data(n))
    }

    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.channel.data(data).await.map_err(TransportError::Ssh)
    }

    async fn wait_ready(&mut self, tick: Duration) -> Result<(), TransportError> {
        if self.eof {
            return Ok(());
        }
        match tokio::time::timeout(tick, self.channel.wait()).await {
            // Tick elapsed with nothing to report; the caller loops.
            Err(_) => Ok(()),
            Ok(None) => {
                self.eof = true;
                Ok(())
            }
            Ok(Some(msg)) => {
                match msg {
                    ChannelMsg::Data { data } => {
                        trace!("buffered {} bytes", data.len());
                        self.pending.extend_from_slice(&data);
                    }
                    // Interleaved stderr arrives as extended data; ordering
                    // beyond what the channel provides is not guaranteed.
                    ChannelMsg::ExtendedData { data, .. } => {
                        self.pending.extend_from_slice(&data);
                    }
                    ChannelMsg::Eof | ChannelMsg::Close => {
                        debug!("channel closed by peer");
                        self.eof = true;
                    }
                    _ => {}
                }
                Ok(())
            }
        }
    }

    /// Close the shell channel and disconnect.
    async fn close(self) -> Result<(), TransportError> {
        let _ = self.channel.eof().await;
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// Host key handler that accepts any key with a debug log.
///
/// Matches the behavior of interactive use against lab machines where the
/// fingerprint is not checked; known-hosts verification belongs to the
/// layer that assembles [`SshConfig`].
struct AcceptAllHandler;

impl client::Handler for AcceptAllHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!("accepting host key: {}", server_public_key.algorithm());
        Ok(true)
    }
}
