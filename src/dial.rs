//! Handing `tel:` URIs to the system

use anyhow::{Context, Result};

use crate::recognition::DialUri;

/// Something that can place a call for a `tel:` URI
pub trait Dialer {
    fn dial(&mut self, uri: &DialUri) -> Result<()>;
}

impl<D: Dialer + ?Sized> Dialer for Box<D> {
    fn dial(&mut self, uri: &DialUri) -> Result<()> {
        (**self).dial(uri)
    }
}

/// Opens the URI with the desktop's handler (`xdg-open` by default)
#[derive(Debug, Clone)]
pub struct SystemDialer {
    opener: String,
}

impl SystemDialer {
    pub fn new(opener: impl Into<String>) -> Self {
        Self {
            opener: opener.into(),
        }
    }
}

impl Dialer for SystemDialer {
    fn dial(&mut self, uri: &DialUri) -> Result<()> {
        log::info!("Opening {} with {}", uri, self.opener);
        let mut child = std::process::Command::new(&self.opener)
            .arg(uri.as_str())
            .spawn()
            .with_context(|| format!("Failed to run {} for {}", self.opener, uri))?;

        // Reap the opener in the background
        let opener = self.opener.clone();
        std::thread::spawn(move || match child.wait() {
            Ok(status) if !status.success() => log::warn!("{} exited with {}", opener, status),
            Ok(_) => {}
            Err(err) => log::warn!("Failed to wait for {}: {}", opener, err),
        });
        Ok(())
    }
}

/// Logs the URI instead of dialing
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDialer;

impl Dialer for LogDialer {
    fn dial(&mut self, uri: &DialUri) -> Result<()> {
        log::info!("Dry run, not dialing {}", uri);
        Ok(())
    }
}
